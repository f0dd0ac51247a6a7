//! # Augur Configuration System
//!
//! Layered configuration for the orchestrator. Values come from built-in
//! defaults, an optional configuration file, then `AUGUR__`-prefixed
//! environment variables, in increasing order of precedence.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use augur_core::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new().with_file("config/augur.toml").load()?;
//!
//! let timeout = config.orchestrator.module_timeout();
//! let strategy = config.cache.eviction_strategy;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::cache::EvictionStrategy;
use crate::constants::defaults;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AugurConfig {
    /// Dispatch, timeout and recovery settings
    pub orchestrator: OrchestratorConfig,

    /// Retry policy for the environment context fetch
    #[serde(default = "RetryConfig::for_context_fetch")]
    pub context_retry: RetryConfig,

    /// Result cache sizing and eviction
    pub cache: CacheConfig,

    /// Performance monitor settings
    pub monitoring: MonitoringConfig,

    /// Classified error ring buffer settings
    pub error_log: ErrorLogConfig,
}

impl Default for AugurConfig {
    fn default() -> Self {
        Self {
            orchestrator: OrchestratorConfig::default(),
            context_retry: RetryConfig::for_context_fetch(),
            cache: CacheConfig::default(),
            monitoring: MonitoringConfig::default(),
            error_log: ErrorLogConfig::default(),
        }
    }
}

impl AugurConfig {
    /// Validate every section, returning the first offending field
    pub fn validate(&self) -> ConfigResult<()> {
        self.orchestrator.validate()?;
        self.context_retry.validate("context_retry")?;
        self.cache.validate()?;

        if self.monitoring.window_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "monitoring.window_size",
                "0",
                "window size must be greater than 0",
            ));
        }

        if self.error_log.capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "error_log.capacity",
                "0",
                "capacity must be greater than 0",
            ));
        }

        Ok(())
    }
}

/// Orchestrator dispatch configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Hard bound on simultaneously running module invocations
    pub max_concurrency: usize,
    /// Timeout applied to every module invocation, in milliseconds
    pub module_timeout_ms: u64,
    /// Wait before a delayed recovery re-invocation, in milliseconds
    pub recovery_cooldown_ms: u64,
    /// Recovery attempts allowed per failed tag
    pub max_recovery_attempts: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: defaults::MAX_CONCURRENCY,
            module_timeout_ms: defaults::MODULE_TIMEOUT_MS,
            recovery_cooldown_ms: defaults::RECOVERY_COOLDOWN_MS,
            max_recovery_attempts: defaults::MAX_RECOVERY_ATTEMPTS,
        }
    }
}

impl OrchestratorConfig {
    pub fn module_timeout(&self) -> Duration {
        Duration::from_millis(self.module_timeout_ms)
    }

    pub fn recovery_cooldown(&self) -> Duration {
        Duration::from_millis(self.recovery_cooldown_ms)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.max_concurrency == 0 {
            return Err(ConfigurationError::invalid_value(
                "orchestrator.max_concurrency",
                "0",
                "max concurrency must be greater than 0",
            ));
        }

        if self.module_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "orchestrator.module_timeout_ms",
                "0",
                "module timeout must be greater than 0",
            ));
        }

        Ok(())
    }
}

/// Retry policy: attempts, initial delay and capped exponential backoff
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::RETRY_MAX_ATTEMPTS,
            initial_delay_ms: defaults::RETRY_INITIAL_DELAY_MS,
            backoff_multiplier: defaults::RETRY_BACKOFF_MULTIPLIER,
            max_delay_ms: defaults::RETRY_MAX_DELAY_MS,
        }
    }
}

impl RetryConfig {
    /// Policy used for the environment context fetch (500ms initial delay)
    pub fn for_context_fetch() -> Self {
        Self {
            initial_delay_ms: defaults::CONTEXT_RETRY_INITIAL_DELAY_MS,
            ..Self::default()
        }
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Delay to use after `current`, capped at `max_delay`
    pub fn next_delay(&self, current: Duration) -> Duration {
        let scaled = current.as_secs_f64() * self.backoff_multiplier;
        Duration::try_from_secs_f64(scaled)
            .unwrap_or(self.max_delay())
            .min(self.max_delay())
    }

    pub(crate) fn validate(&self, section: &str) -> ConfigResult<()> {
        if self.max_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                format!("{section}.max_attempts"),
                "0",
                "at least one attempt is required",
            ));
        }

        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(ConfigurationError::invalid_value(
                format!("{section}.backoff_multiplier"),
                self.backoff_multiplier.to_string(),
                "backoff multiplier must be a finite number >= 1.0",
            ));
        }

        Ok(())
    }
}

/// Result cache configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: usize,
    /// Entry lifetime in milliseconds; 0 disables expiry
    pub ttl_ms: u64,
    pub eviction_strategy: EvictionStrategy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: defaults::CACHE_MAX_ENTRIES,
            ttl_ms: defaults::CACHE_TTL_MS,
            eviction_strategy: EvictionStrategy::Lru,
        }
    }
}

impl CacheConfig {
    pub fn new(max_entries: usize, ttl: Duration, eviction_strategy: EvictionStrategy) -> Self {
        Self {
            max_entries,
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            eviction_strategy,
        }
    }

    /// `None` when entries never expire
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_ms > 0).then(|| Duration::from_millis(self.ttl_ms))
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.max_entries == 0 {
            return Err(ConfigurationError::invalid_value(
                "cache.max_entries",
                "0",
                "cache must hold at least one entry",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub window_size: usize,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            window_size: defaults::PERFORMANCE_WINDOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ErrorLogConfig {
    pub capacity: usize,
}

impl Default for ErrorLogConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::ERROR_LOG_CAPACITY,
        }
    }
}

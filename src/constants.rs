//! # System Constants
//!
//! Defaults and metric labels that define the operational boundaries of the
//! orchestrator. Configuration values fall back to [`defaults`] when not
//! supplied.

/// Default values for every tunable in [`crate::config::AugurConfig`]
pub mod defaults {
    /// Maximum simultaneously in-flight module invocations
    pub const MAX_CONCURRENCY: usize = 4;
    /// Per-module invocation timeout
    pub const MODULE_TIMEOUT_MS: u64 = 30_000;

    pub const RETRY_MAX_ATTEMPTS: u32 = 3;
    pub const RETRY_INITIAL_DELAY_MS: u64 = 1_000;
    pub const RETRY_BACKOFF_MULTIPLIER: f64 = 2.0;
    pub const RETRY_MAX_DELAY_MS: u64 = 10_000;

    /// Context fetches start retrying sooner than the generic policy
    pub const CONTEXT_RETRY_INITIAL_DELAY_MS: u64 = 500;

    pub const CACHE_MAX_ENTRIES: usize = 500;
    pub const CACHE_TTL_MS: u64 = 3_600_000;

    /// Durations retained per performance label
    pub const PERFORMANCE_WINDOW: usize = 100;
    /// Classified errors retained by the error log
    pub const ERROR_LOG_CAPACITY: usize = 100;

    pub const RECOVERY_COOLDOWN_MS: u64 = 250;
    pub const MAX_RECOVERY_ATTEMPTS: u32 = 1;
}

/// Performance monitor labels
pub mod metrics {
    pub const EXECUTE: &str = "orchestrator.execute";
    pub const CONTEXT_FETCH: &str = "context.fetch";
    /// Prefix for per-module timings, e.g. `module.tarot`
    pub const MODULE_PREFIX: &str = "module.";

    pub fn module_label(type_tag: &str) -> String {
        format!("{MODULE_PREFIX}{type_tag}")
    }
}

/// Environment variable names read at startup
pub mod env {
    pub const ENVIRONMENT: &str = "AUGUR_ENV";
    pub const LOG_FILTER: &str = "AUGUR_LOG";
    pub const LOG_FORMAT: &str = "AUGUR_LOG_FORMAT";
    pub const CONFIG_PREFIX: &str = "AUGUR";
    pub const CONFIG_SEPARATOR: &str = "__";
    pub const DEFAULT_CONFIG_FILE: &str = "augur";
}

//! Configuration Loader
//!
//! Merges built-in defaults, an optional configuration file and
//! `AUGUR__`-prefixed environment variables into a validated [`AugurConfig`].

use super::error::ConfigResult;
use super::AugurConfig;
use crate::constants::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Builder-style loader for [`AugurConfig`]
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env_prefix: String,
    read_environment: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            env_prefix: env::CONFIG_PREFIX.to_string(),
            read_environment: true,
        }
    }

    /// Load from an explicit file; the file must exist
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip environment variable overrides (useful for tests)
    pub fn without_environment(mut self) -> Self {
        self.read_environment = false;
        self
    }

    /// Merge all sources and validate the result
    pub fn load(&self) -> ConfigResult<AugurConfig> {
        let defaults = config::Config::try_from(&AugurConfig::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        builder = match &self.file {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration file");
                builder.add_source(config::File::from(path.as_path()).required(true))
            }
            None => builder
                .add_source(config::File::with_name(env::DEFAULT_CONFIG_FILE).required(false)),
        };

        if self.read_environment {
            builder = builder.add_source(
                config::Environment::with_prefix(&self.env_prefix)
                    .separator(env::CONFIG_SEPARATOR)
                    .try_parsing(true),
            );
        }

        let loaded: AugurConfig = builder.build()?.try_deserialize()?;
        loaded.validate()?;

        debug!(
            max_concurrency = loaded.orchestrator.max_concurrency,
            module_timeout_ms = loaded.orchestrator.module_timeout_ms,
            cache_max_entries = loaded.cache.max_entries,
            eviction_strategy = %loaded.cache.eviction_strategy,
            "Configuration loaded successfully"
        );

        Ok(loaded)
    }
}

#![allow(dead_code)]

pub mod modules;
pub mod providers;
pub mod strategies;

pub use modules::*;
pub use providers::*;

use augur_core::config::AugurConfig;
use augur_core::orchestration::{
    ComputationModule, EnvironmentProvider, ModuleRegistry, Orchestrator,
    StaticEnvironmentProvider,
};
use serde_json::json;
use std::sync::Arc;

/// Configuration with short timeouts and delays so failure paths run quickly
pub fn fast_config() -> AugurConfig {
    let mut config = AugurConfig::default();
    config.orchestrator.module_timeout_ms = 200;
    config.orchestrator.recovery_cooldown_ms = 5;
    config.context_retry.initial_delay_ms = 1;
    config.context_retry.max_delay_ms = 4;
    config
}

pub fn registry_with(modules: Vec<Arc<MockModule>>) -> Arc<ModuleRegistry> {
    let registry = Arc::new(ModuleRegistry::new());
    for module in modules {
        let module: Arc<dyn ComputationModule> = module;
        registry
            .register(module)
            .expect("mock module registration should succeed");
    }
    registry
}

pub fn orchestrator_with(
    modules: Vec<Arc<MockModule>>,
    provider: Arc<dyn EnvironmentProvider>,
    config: AugurConfig,
) -> Orchestrator {
    Orchestrator::with_config(config, registry_with(modules), provider)
        .expect("test configuration should be valid")
}

/// Orchestrator over `modules` with a healthy provider and fast configuration
pub fn orchestrator(modules: Vec<Arc<MockModule>>) -> Orchestrator {
    orchestrator_with(
        modules,
        Arc::new(StaticEnvironmentProvider::new(json!({ "moon": "waxing" }))),
        fast_config(),
    )
}

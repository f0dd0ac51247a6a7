//! Environment context providers.

use crate::orchestration::types::EnvironmentContext;
use async_trait::async_trait;
use serde_json::Value;

/// Source of the expensive, shared environment snapshot; may fail
#[async_trait]
pub trait EnvironmentProvider: Send + Sync {
    async fn fetch(&self) -> anyhow::Result<EnvironmentContext>;

    fn provider_name(&self) -> &'static str {
        "custom"
    }
}

/// Provider returning a fixed snapshot body on every fetch
#[derive(Debug, Clone)]
pub struct StaticEnvironmentProvider {
    data: Value,
}

impl StaticEnvironmentProvider {
    pub fn new(data: Value) -> Self {
        Self { data }
    }
}

impl Default for StaticEnvironmentProvider {
    fn default() -> Self {
        Self::new(Value::Object(serde_json::Map::new()))
    }
}

#[async_trait]
impl EnvironmentProvider for StaticEnvironmentProvider {
    async fn fetch(&self) -> anyhow::Result<EnvironmentContext> {
        Ok(EnvironmentContext::new(self.data.clone()))
    }

    fn provider_name(&self) -> &'static str {
        "static"
    }
}

//! # Computation Module Registry
//!
//! Maps type tags to pluggable [`ComputationModule`] implementations.
//!
//! Registration order is significant: it is the default execution order used
//! whenever a request does not name a priority for a tag.
//!
//! ## Usage
//!
//! ```rust
//! use augur_core::orchestration::registry::{ComputationModule, ModuleRegistry};
//! use augur_core::orchestration::types::{ComputationInput, EnvironmentContext, ModuleOutput};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct Numerology;
//!
//! #[async_trait]
//! impl ComputationModule for Numerology {
//!     fn type_tag(&self) -> &str {
//!         "numerology"
//!     }
//!
//!     async fn compute(
//!         &self,
//!         input: &ComputationInput,
//!         _context: &EnvironmentContext,
//!     ) -> anyhow::Result<ModuleOutput> {
//!         Ok(ModuleOutput::Numeric(input.subject.len() as f64))
//!     }
//! }
//!
//! let registry = ModuleRegistry::new();
//! registry.register(Arc::new(Numerology)).unwrap();
//! assert_eq!(registry.type_tags(), vec!["numerology".to_string()]);
//! ```

use crate::error::{panic_message, OrchestratorError, OrchestratorResult};
use crate::orchestration::types::{ComputationInput, EnvironmentContext, ModuleOutput};
use crate::resilience::ClassifiedError;
use anyhow::anyhow;
use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// An externally supplied computation, opaque to the orchestrator
#[async_trait]
pub trait ComputationModule: Send + Sync {
    /// Identifier selecting this module in a request
    fn type_tag(&self) -> &str;

    async fn compute(
        &self,
        input: &ComputationInput,
        context: &EnvironmentContext,
    ) -> anyhow::Result<ModuleOutput>;
}

#[derive(Default)]
struct RegistryInner {
    modules: HashMap<String, Arc<dyn ComputationModule>>,
    order: Vec<String>,
}

/// Thread-safe type tag → module map preserving registration order
#[derive(Default)]
pub struct ModuleRegistry {
    inner: RwLock<RegistryInner>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("type_tags", &self.type_tags())
            .finish()
    }
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module` under its type tag; each tag may be registered once
    pub fn register(&self, module: Arc<dyn ComputationModule>) -> OrchestratorResult<()> {
        let type_tag = module.type_tag().trim().to_string();
        if type_tag.is_empty() {
            return Err(OrchestratorError::invalid_input(
                "type_tag",
                "module type tag must not be empty",
            ));
        }

        let mut inner = self.inner.write();
        if inner.modules.contains_key(&type_tag) {
            return Err(OrchestratorError::DuplicateModule { tag: type_tag });
        }

        info!(type_tag = %type_tag, position = inner.order.len(), "Registering computation module");
        inner.order.push(type_tag.clone());
        inner.modules.insert(type_tag, module);
        Ok(())
    }

    pub fn get(&self, type_tag: &str) -> Option<Arc<dyn ComputationModule>> {
        self.inner.read().modules.get(type_tag).cloned()
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.inner.read().modules.contains_key(type_tag)
    }

    /// Registered tags in registration order
    pub fn type_tags(&self) -> Vec<String> {
        self.inner.read().order.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Invoke `module` racing it against `limit`.
///
/// Expiry yields a `module-timeout` [`ClassifiedError`] and drops the module
/// future. A panic inside the module is caught and returned as an error.
pub async fn invoke_with_timeout(
    module: &dyn ComputationModule,
    input: &ComputationInput,
    context: &EnvironmentContext,
    limit: Duration,
) -> anyhow::Result<ModuleOutput> {
    let invocation = AssertUnwindSafe(module.compute(input, context)).catch_unwind();

    match tokio::time::timeout(limit, invocation).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(payload)) => Err(anyhow!(
            "module {} panicked: {}",
            module.type_tag(),
            panic_message(payload.as_ref())
        )),
        Err(_) => Err(ClassifiedError::timeout(
            &crate::constants::metrics::module_label(module.type_tag()),
            limit,
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::ErrorKind;
    use serde_json::json;

    struct Fixed(&'static str);

    #[async_trait]
    impl ComputationModule for Fixed {
        fn type_tag(&self) -> &str {
            self.0
        }

        async fn compute(
            &self,
            _input: &ComputationInput,
            _context: &EnvironmentContext,
        ) -> anyhow::Result<ModuleOutput> {
            Ok(ModuleOutput::Text(self.0.to_string()))
        }
    }

    struct Stalled;

    #[async_trait]
    impl ComputationModule for Stalled {
        fn type_tag(&self) -> &str {
            "stalled"
        }

        async fn compute(
            &self,
            _input: &ComputationInput,
            _context: &EnvironmentContext,
        ) -> anyhow::Result<ModuleOutput> {
            std::future::pending().await
        }
    }

    struct Panicking;

    #[async_trait]
    impl ComputationModule for Panicking {
        fn type_tag(&self) -> &str {
            "panicking"
        }

        async fn compute(
            &self,
            _input: &ComputationInput,
            _context: &EnvironmentContext,
        ) -> anyhow::Result<ModuleOutput> {
            panic!("ephemeris table missing")
        }
    }

    #[test]
    fn test_registration_order_is_preserved() {
        let registry = ModuleRegistry::new();
        for tag in ["tarot", "astrology", "runes"] {
            registry.register(Arc::new(Fixed(tag))).unwrap();
        }

        assert_eq!(registry.type_tags(), vec!["tarot", "astrology", "runes"]);
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("runes"));
        assert!(registry.get("iching").is_none());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let registry = ModuleRegistry::new();
        registry.register(Arc::new(Fixed("tarot"))).unwrap();
        let error = registry.register(Arc::new(Fixed("tarot"))).unwrap_err();
        assert_eq!(
            error,
            OrchestratorError::DuplicateModule {
                tag: "tarot".to_string()
            }
        );
    }

    #[test]
    fn test_blank_tag_rejected() {
        let registry = ModuleRegistry::new();
        assert!(registry.register(Arc::new(Fixed("  "))).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_invoke_success() {
        let output = tokio_test::block_on(invoke_with_timeout(
            &Fixed("tarot"),
            &ComputationInput::new("Ada"),
            &EnvironmentContext::new(json!({})),
            Duration::from_secs(1),
        ));
        assert_eq!(tokio_test::assert_ok!(output), ModuleOutput::Text("tarot".into()));
    }

    #[tokio::test]
    async fn test_invoke_timeout_is_classified() {
        let error = invoke_with_timeout(
            &Stalled,
            &ComputationInput::new("Ada"),
            &EnvironmentContext::new(json!({})),
            Duration::from_millis(20),
        )
        .await
        .unwrap_err();

        let classified = error.downcast_ref::<ClassifiedError>().unwrap();
        assert_eq!(classified.kind, ErrorKind::ModuleTimeout);
        assert!(classified.message.contains("module.stalled"));
    }

    #[tokio::test]
    async fn test_invoke_panic_becomes_error() {
        let error = invoke_with_timeout(
            &Panicking,
            &ComputationInput::new("Ada"),
            &EnvironmentContext::new(json!({})),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(error.to_string().contains("ephemeris table missing"));
    }
}

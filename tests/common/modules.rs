use async_trait::async_trait;
use augur_core::error::ModuleError;
use augur_core::orchestration::{
    ComputationInput, ComputationModule, EnvironmentContext, ModuleOutput,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed(Value),
    Fail(ModuleError),
    /// Never completes
    Hang,
    Panic(&'static str),
    /// Fails with `ContextInvalid` unless handed the static default context
    RequireDefaultContext,
    /// Fails the first `failures` calls, then succeeds
    FailFirst {
        failures: u32,
        error: ModuleError,
        payload: Value,
    },
}

/// Scriptable computation module that counts its invocations
#[derive(Debug)]
pub struct MockModule {
    tag: String,
    delay: Duration,
    behavior: Behavior,
    calls: AtomicU32,
}

impl MockModule {
    pub fn new(tag: &str, behavior: Behavior) -> Self {
        Self {
            tag: tag.to_string(),
            delay: Duration::ZERO,
            behavior,
            calls: AtomicU32::new(0),
        }
    }

    pub fn succeeding(tag: &str) -> Self {
        Self::new(tag, Behavior::Succeed(json!({ "reading": format!("{tag} reading") })))
    }

    pub fn failing(tag: &str, error: ModuleError) -> Self {
        Self::new(tag, Behavior::Fail(error))
    }

    pub fn hanging(tag: &str) -> Self {
        Self::new(tag, Behavior::Hang)
    }

    pub fn with_delay(mut self, millis: u64) -> Self {
        self.delay = Duration::from_millis(millis);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ComputationModule for MockModule {
    fn type_tag(&self) -> &str {
        &self.tag
    }

    async fn compute(
        &self,
        input: &ComputationInput,
        context: &EnvironmentContext,
    ) -> anyhow::Result<ModuleOutput> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.behavior {
            Behavior::Succeed(payload) => {
                let mut payload = payload.clone();
                payload["subject"] = json!(input.subject);
                Ok(ModuleOutput::from(payload))
            }
            Behavior::Fail(error) => Err(error.clone().into()),
            Behavior::Hang => std::future::pending().await,
            Behavior::Panic(message) => panic!("{message}"),
            Behavior::RequireDefaultContext => {
                if context.is_default() {
                    Ok(ModuleOutput::Text("approximate reading".into()))
                } else {
                    Err(ModuleError::ContextInvalid("context snapshot rejected".into()).into())
                }
            }
            Behavior::FailFirst {
                failures,
                error,
                payload,
            } => {
                if call < *failures {
                    Err(error.clone().into())
                } else {
                    Ok(ModuleOutput::from(payload.clone()))
                }
            }
        }
    }
}

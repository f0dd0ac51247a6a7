//! Contextual recovery attempted between a module failure and fallback.

use super::error_classifier::{ClassifiedError, ErrorKind};
use crate::config::OrchestratorConfig;
use crate::orchestration::registry::{invoke_with_timeout, ComputationModule};
use crate::orchestration::types::{ComputationInput, ComputationResult, EnvironmentContext};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// How a failure of a given kind may be recovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStrategy {
    /// Re-invoke once with the static default context
    DefaultContext,
    /// Re-invoke once with the same context after a cooldown
    DelayedRetry,
    None,
}

impl RecoveryStrategy {
    pub fn for_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::ContextInvalid | ErrorKind::ContextFetchFailed => Self::DefaultContext,
            ErrorKind::ResourceExhausted | ErrorKind::RateLimited => Self::DelayedRetry,
            _ => Self::None,
        }
    }
}

/// Everything a recovery attempt needs to re-invoke a module
#[derive(Debug, Clone, Copy)]
pub struct RecoveryContext<'a> {
    pub type_tag: &'a str,
    pub input: &'a ComputationInput,
    pub context: &'a EnvironmentContext,
    /// 1-based number of the recovery attempt about to be made
    pub attempt: u32,
}

#[derive(Debug, Clone)]
pub struct RecoveryManager {
    cooldown: Duration,
    max_attempts: u32,
    timeout: Duration,
}

impl RecoveryManager {
    pub fn new(cooldown: Duration, max_attempts: u32, timeout: Duration) -> Self {
        Self {
            cooldown,
            max_attempts,
            timeout,
        }
    }

    pub fn from_config(config: &OrchestratorConfig) -> Self {
        Self::new(
            config.recovery_cooldown(),
            config.max_recovery_attempts,
            config.module_timeout(),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Try to produce a result for a failed module; `None` means fall back
    pub async fn attempt_recovery(
        &self,
        error: &ClassifiedError,
        ctx: RecoveryContext<'_>,
        module: &dyn ComputationModule,
    ) -> Option<ComputationResult> {
        if ctx.attempt == 0 || ctx.attempt > self.max_attempts {
            return None;
        }

        let strategy = RecoveryStrategy::for_kind(error.kind);
        let outcome = match strategy {
            RecoveryStrategy::DefaultContext => {
                if ctx.context.is_default() {
                    debug!(
                        type_tag = ctx.type_tag,
                        "Skipping default-context recovery; request already used the default"
                    );
                    return None;
                }
                let default_context = EnvironmentContext::static_default();
                invoke_with_timeout(module, ctx.input, &default_context, self.timeout).await
            }
            RecoveryStrategy::DelayedRetry => {
                sleep(self.cooldown).await;
                invoke_with_timeout(module, ctx.input, ctx.context, self.timeout).await
            }
            RecoveryStrategy::None => return None,
        };

        match outcome {
            Ok(output) => {
                info!(
                    type_tag = ctx.type_tag,
                    strategy = ?strategy,
                    error_kind = %error.kind,
                    attempt = ctx.attempt,
                    "Module recovered"
                );
                Some(ComputationResult::recovered(
                    ctx.type_tag,
                    output.normalize(),
                    error,
                ))
            }
            Err(recovery_error) => {
                debug!(
                    type_tag = ctx.type_tag,
                    strategy = ?strategy,
                    error = %recovery_error,
                    "Recovery attempt failed"
                );
                None
            }
        }
    }
}

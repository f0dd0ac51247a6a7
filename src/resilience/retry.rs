//! Retry with capped exponential backoff.

use super::error_classifier::{
    ClassifiedError, ErrorClassifier, ErrorOrigin, StandardErrorClassifier,
};
use crate::config::RetryConfig;
use std::future::Future;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Drives an operation until it succeeds, fails permanently or runs out of attempts
#[derive(Clone)]
pub struct RetryHandler {
    classifier: Arc<dyn ErrorClassifier>,
}

impl std::fmt::Debug for RetryHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryHandler")
            .field("classifier", &self.classifier.classifier_name())
            .finish()
    }
}

impl Default for RetryHandler {
    fn default() -> Self {
        Self::new(Arc::new(StandardErrorClassifier::new()))
    }
}

impl RetryHandler {
    pub fn new(classifier: Arc<dyn ErrorClassifier>) -> Self {
        Self { classifier }
    }

    /// Run `attempt_fn` (called with the 1-based attempt number) under `policy`.
    ///
    /// Each failure is classified. A non-retryable failure, or a failure on the
    /// last allowed attempt, is returned immediately; otherwise the handler
    /// sleeps for the current delay and grows it by the backoff multiplier,
    /// capped at the policy's maximum delay.
    pub async fn with_retry<T, F, Fut>(
        &self,
        operation: &str,
        origin: ErrorOrigin,
        policy: &RetryConfig,
        mut attempt_fn: F,
    ) -> Result<T, ClassifiedError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let max_attempts = policy.max_attempts.max(1);
        let mut delay = policy.initial_delay();
        let mut attempt = 1;

        loop {
            let error = match attempt_fn(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => self.classifier.classify(&error, origin),
            };

            if !error.retryable {
                warn!(
                    operation,
                    attempt,
                    error_kind = %error.kind,
                    error = %error.message,
                    "Operation failed with non-retryable error"
                );
                return Err(error);
            }

            if attempt >= max_attempts {
                warn!(
                    operation,
                    attempts = attempt,
                    error_kind = %error.kind,
                    error = %error.message,
                    "Operation failed after exhausting retries"
                );
                return Err(error);
            }

            debug!(
                operation,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error_kind = %error.kind,
                "Retrying operation after backoff"
            );
            sleep(delay).await;
            delay = policy.next_delay(delay);
            attempt += 1;
        }
    }
}

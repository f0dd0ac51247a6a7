//! Error types for the orchestration core.
//!
//! Request-level failures surface as [`OrchestratorError`]. Failures inside a
//! single module's pipeline never reach the caller as errors; they are
//! classified (see [`crate::resilience::ClassifiedError`]) and turned into
//! degraded results instead.

use crate::config::ConfigurationError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrchestratorError {
    #[error("Request contains no type tags")]
    EmptyRequest,
    #[error("Unknown type tag: {tag}")]
    UnknownTypeTag { tag: String },
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },
    #[error("A module is already registered for type tag {tag}")]
    DuplicateModule { tag: String },
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl OrchestratorError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<ConfigurationError> for OrchestratorError {
    fn from(error: ConfigurationError) -> Self {
        OrchestratorError::Configuration(error.to_string())
    }
}

pub type OrchestratorResult<T> = std::result::Result<T, OrchestratorError>;

/// Typed failures a computation module may raise.
///
/// Modules are free to return any `anyhow::Error`; raising one of these
/// variants lets the classifier skip message heuristics and pick the exact
/// error kind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModuleError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Environment context rejected: {0}")]
    ContextInvalid(String),
    #[error("Computation failed: {0}")]
    Failed(String),
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),
    #[error("Rate limited: {0}")]
    RateLimited(String),
}

/// Failures reported by the bounded executor for a single task slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    #[error("Task panicked: {message}")]
    TaskPanicked { message: String },
    #[error("Task was cancelled before completing")]
    TaskCancelled,
    #[error("Executor is closed")]
    Closed,
}

impl ExecutorError {
    pub(crate) fn from_join(error: tokio::task::JoinError) -> Self {
        if error.is_panic() {
            let payload = error.into_panic();
            ExecutorError::TaskPanicked {
                message: panic_message(payload.as_ref()),
            }
        } else {
            ExecutorError::TaskCancelled
        }
    }
}

/// Best-effort extraction of a panic payload's message.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_display() {
        let error = OrchestratorError::invalid_input("subject", "must not be empty");
        assert_eq!(
            error.to_string(),
            "Invalid input for subject: must not be empty"
        );
    }

    #[test]
    fn test_configuration_error_conversion() {
        let error: OrchestratorError = ConfigurationError::invalid_value(
            "orchestrator.max_concurrency",
            "0",
            "must be greater than zero",
        )
        .into();
        assert!(matches!(error, OrchestratorError::Configuration(_)));
        assert!(error.to_string().contains("max_concurrency"));
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(panic_message(payload.as_ref()), "owned boom");

        let payload: Box<dyn std::any::Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}

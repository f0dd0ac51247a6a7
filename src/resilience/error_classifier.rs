//! # Error Classification
//!
//! Turns arbitrary failures raised by computation modules or the environment
//! provider into a [`ClassifiedError`] carrying a fixed [`ErrorKind`] and the
//! retry/fallback attributes that kind implies.
//!
//! ## Classification order
//!
//! ```text
//! anyhow::Error ─▶ already ClassifiedError? ─▶ ModuleError? ─▶ timer expiry?
//!              ─▶ io::Error kind? ─▶ message heuristics ─▶ origin default
//! ```
//!
//! The first step that recognizes the failure wins.

use crate::error::ModuleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Every failure is normalized into one of these kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// The environment provider could not produce a context
    ContextFetchFailed,
    /// A module rejected the environment context it was given
    ContextInvalid,
    /// The shared input is unusable; retrying cannot help
    InvalidInput,
    /// The module raised an error of its own
    ModuleFailed,
    /// The module did not finish within its timeout
    ModuleTimeout,
    ResourceExhausted,
    RateLimited,
    Unknown,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 8] = [
        ErrorKind::ContextFetchFailed,
        ErrorKind::ContextInvalid,
        ErrorKind::InvalidInput,
        ErrorKind::ModuleFailed,
        ErrorKind::ModuleTimeout,
        ErrorKind::ResourceExhausted,
        ErrorKind::RateLimited,
        ErrorKind::Unknown,
    ];

    /// Stable kebab-case code, e.g. `module-timeout`
    pub fn code(&self) -> &'static str {
        match self {
            Self::ContextFetchFailed => "context-fetch-failed",
            Self::ContextInvalid => "context-invalid",
            Self::InvalidInput => "invalid-input",
            Self::ModuleFailed => "module-failed",
            Self::ModuleTimeout => "module-timeout",
            Self::ResourceExhausted => "resource-exhausted",
            Self::RateLimited => "rate-limited",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::ContextInvalid | Self::InvalidInput | Self::ModuleFailed
        )
    }

    pub fn is_fallback_available(&self) -> bool {
        !matches!(self, Self::InvalidInput)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Where a failure was raised; decides the kind when nothing else does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorOrigin {
    ContextFetch,
    Module,
    Other,
}

impl ErrorOrigin {
    fn default_kind(&self) -> ErrorKind {
        match self {
            Self::ContextFetch => ErrorKind::ContextFetchFailed,
            Self::Module => ErrorKind::ModuleFailed,
            Self::Other => ErrorKind::Unknown,
        }
    }

    fn timeout_kind(&self) -> ErrorKind {
        match self {
            Self::ContextFetch => ErrorKind::ContextFetchFailed,
            Self::Module | Self::Other => ErrorKind::ModuleTimeout,
        }
    }

    // Transport failures must stay retryable for every origin.
    fn network_kind(&self) -> ErrorKind {
        match self {
            Self::ContextFetch => ErrorKind::ContextFetchFailed,
            Self::Module | Self::Other => ErrorKind::Unknown,
        }
    }
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContextFetch => write!(f, "context_fetch"),
            Self::Module => write!(f, "module"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A failure normalized into a known kind with retry/fallback metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind}: {message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
    pub fallback_available: bool,
    /// Root cause text when it differs from `message`
    pub cause: Option<String>,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: kind.is_retryable(),
            fallback_available: kind.is_fallback_available(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn timeout(operation: &str, limit: Duration) -> Self {
        Self::new(
            ErrorKind::ModuleTimeout,
            format!(
                "Operation '{operation}' timed out after {}ms",
                limit.as_millis()
            ),
        )
    }
}

/// Strategy for turning failures into classified errors
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, error: &anyhow::Error, origin: ErrorOrigin) -> ClassifiedError;

    fn classifier_name(&self) -> &'static str;
}

/// Default classifier: typed errors first, then message heuristics
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardErrorClassifier;

impl StandardErrorClassifier {
    pub fn new() -> Self {
        Self
    }

    fn classify_module_error(error: &ModuleError) -> ErrorKind {
        match error {
            ModuleError::InvalidInput(_) => ErrorKind::InvalidInput,
            ModuleError::ContextInvalid(_) => ErrorKind::ContextInvalid,
            ModuleError::Failed(_) => ErrorKind::ModuleFailed,
            ModuleError::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            ModuleError::RateLimited(_) => ErrorKind::RateLimited,
        }
    }

    fn classify_io_error(error: &std::io::Error, origin: ErrorOrigin) -> Option<ErrorKind> {
        use std::io::ErrorKind as Io;

        match error.kind() {
            Io::TimedOut => Some(origin.timeout_kind()),
            Io::ConnectionRefused
            | Io::ConnectionReset
            | Io::ConnectionAborted
            | Io::NotConnected
            | Io::BrokenPipe => Some(origin.network_kind()),
            Io::OutOfMemory => Some(ErrorKind::ResourceExhausted),
            Io::InvalidInput | Io::InvalidData => Some(ErrorKind::InvalidInput),
            _ => None,
        }
    }

    fn classify_message(reason: &str, origin: ErrorOrigin) -> Option<ErrorKind> {
        let reason = reason.to_lowercase();

        if reason.contains("timed out") || reason.contains("timeout") {
            Some(origin.timeout_kind())
        } else if reason.contains("rate limit")
            || reason.contains("too many requests")
            || reason.contains("throttl")
        {
            Some(ErrorKind::RateLimited)
        } else if reason.contains("exhausted")
            || reason.contains("out of memory")
            || reason.contains("quota")
            || reason.contains("insufficient resources")
        {
            Some(ErrorKind::ResourceExhausted)
        } else if reason.contains("connection")
            || reason.contains("network")
            || reason.contains("unreachable")
        {
            Some(origin.network_kind())
        } else if reason.contains("invalid context") || reason.contains("context invalid") {
            Some(ErrorKind::ContextInvalid)
        } else if reason.contains("invalid input") || reason.contains("validation") {
            Some(ErrorKind::InvalidInput)
        } else {
            None
        }
    }
}

impl ErrorClassifier for StandardErrorClassifier {
    fn classify(&self, error: &anyhow::Error, origin: ErrorOrigin) -> ClassifiedError {
        if let Some(classified) = error
            .chain()
            .find_map(|cause| cause.downcast_ref::<ClassifiedError>())
        {
            return classified.clone();
        }

        let message = error.to_string();
        let root = error.root_cause().to_string();

        let kind = error
            .chain()
            .find_map(|cause| {
                if let Some(module_error) = cause.downcast_ref::<ModuleError>() {
                    Some(Self::classify_module_error(module_error))
                } else if cause.is::<tokio::time::error::Elapsed>() {
                    Some(origin.timeout_kind())
                } else {
                    cause
                        .downcast_ref::<std::io::Error>()
                        .and_then(|io| Self::classify_io_error(io, origin))
                }
            })
            .or_else(|| Self::classify_message(&format!("{error:#}"), origin))
            .unwrap_or_else(|| origin.default_kind());

        let classified = ClassifiedError::new(kind, message.clone());
        if root != message {
            classified.with_cause(root)
        } else {
            classified
        }
    }

    fn classifier_name(&self) -> &'static str {
        "standard"
    }
}

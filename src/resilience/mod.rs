//! # Resilience Module
//!
//! Fault containment for module invocations and the environment fetch.
//!
//! ## Architecture
//!
//! ```text
//! failure ─▶ ErrorClassifier ─▶ ClassifiedError ─┬─▶ RetryHandler (retryable kinds)
//!                                                ├─▶ ErrorLog (always)
//!                                                ├─▶ RecoveryManager (contextual re-invoke)
//!                                                └─▶ FallbackHandler (degraded result)
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use augur_core::config::RetryConfig;
//! use augur_core::resilience::{ErrorOrigin, RetryHandler};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = RetryHandler::default();
//! let value = handler
//!     .with_retry("ephemeris.fetch", ErrorOrigin::ContextFetch, &RetryConfig::default(), |_attempt| async {
//!         Ok::<_, anyhow::Error>(42)
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod error_classifier;
pub mod error_log;
pub mod fallback;
pub mod recovery;
pub mod retry;

pub use error_classifier::{
    ClassifiedError, ErrorClassifier, ErrorKind, ErrorOrigin, StandardErrorClassifier,
};
pub use error_log::{ErrorLog, ErrorLogEntry};
pub use fallback::FallbackHandler;
pub use recovery::{RecoveryContext, RecoveryManager, RecoveryStrategy};
pub use retry::RetryHandler;

#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Augur Core
//!
//! In-process orchestration core for pluggable computation modules.
//!
//! ## Overview
//!
//! A caller submits a set of type tags and one shared input. Each tag selects an
//! externally supplied [`ComputationModule`](orchestration::ComputationModule);
//! all of them run against the same environment context, fetched once per
//! request. The orchestrator owns everything around the modules: bounded
//! concurrency, result caching, per-invocation timeouts, error classification,
//! retry, recovery, fallback and timing telemetry. A failing module never
//! blocks or corrupts its siblings; it simply yields a degraded result.
//!
//! ## Module Organization
//!
//! - [`orchestration`] - Orchestrator, per-tag pipeline, module registry, data types
//! - [`cache`] - Result cache with LRU/LFU/FIFO eviction and TTL expiry
//! - [`execution`] - Bounded concurrency executor
//! - [`resilience`] - Error classification, retry, recovery, fallback, error log
//! - [`monitoring`] - Per-label performance spans
//! - [`state_machine`] - Per-tag lifecycle
//! - [`config`] - Layered configuration
//! - [`error`] - Request-level error types
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use augur_core::orchestration::{
//!     ComputationInput, ComputationModule, ComputationRequest, EnvironmentContext,
//!     ModuleOutput, ModuleRegistry, Orchestrator, StaticEnvironmentProvider,
//! };
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct Tarot;
//!
//! #[async_trait]
//! impl ComputationModule for Tarot {
//!     fn type_tag(&self) -> &str {
//!         "tarot"
//!     }
//!
//!     async fn compute(
//!         &self,
//!         _input: &ComputationInput,
//!         _context: &EnvironmentContext,
//!     ) -> anyhow::Result<ModuleOutput> {
//!         Ok(ModuleOutput::Text("The Star".into()))
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! augur_core::logging::init_structured_logging();
//!
//! let registry = Arc::new(ModuleRegistry::new());
//! registry.register(Arc::new(Tarot))?;
//!
//! let orchestrator =
//!     Orchestrator::new(registry, Arc::new(StaticEnvironmentProvider::default()))?;
//! let response = orchestrator
//!     .execute(ComputationRequest::new(["tarot"], ComputationInput::new("Ada")))
//!     .await?;
//!
//! assert_eq!(response.results.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod execution;
pub mod logging;
pub mod monitoring;
pub mod orchestration;
pub mod resilience;
pub mod state_machine;

pub use cache::{CacheKey, EvictionStrategy, ResultCache};
pub use config::{AugurConfig, ConfigLoader};
pub use error::{ExecutorError, ModuleError, OrchestratorError, OrchestratorResult};
pub use execution::BoundedExecutor;
pub use monitoring::PerformanceMonitor;
pub use orchestration::{
    ComputationInput, ComputationModule, ComputationRequest, ComputationResponse,
    ComputationResult, EnvironmentContext, EnvironmentProvider, ModuleOutput, ModuleRegistry,
    Orchestrator,
};
pub use resilience::{ClassifiedError, ErrorKind};

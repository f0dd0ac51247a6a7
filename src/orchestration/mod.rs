//! # Orchestration Engine
//!
//! Coordinates pluggable computation modules against a shared input and a
//! shared environment context.
//!
//! ## Core Components
//!
//! - **Orchestrator**: request entry point; resolves order, fetches context, dispatches tags
//! - **TagPipeline**: cache lookup, timed invocation, recovery and fallback for one tag
//! - **ModuleRegistry**: type tag → [`ComputationModule`] in registration order
//! - **EnvironmentProvider**: source of the per-request environment snapshot
//! - **resolve_execution_order**: priority-then-registration ordering of requested tags

pub mod context;
pub mod execution_order;
pub mod orchestrator;
pub mod pipeline;
pub mod registry;
pub mod types;

pub use context::{EnvironmentProvider, StaticEnvironmentProvider};
pub use execution_order::resolve_execution_order;
pub use orchestrator::{Orchestrator, OrchestratorHealth};
pub use pipeline::{PipelineOutcome, TagJob, TagPipeline};
pub use registry::{invoke_with_timeout, ComputationModule, ModuleRegistry};
pub use types::{
    ComputationInput, ComputationRequest, ComputationResponse, ComputationResult, ContextSource,
    EnvironmentContext, ExecutionMetadata, ExecutionOptions, ModuleOutput, ResultError,
    ResultStatus, TagOutcome,
};

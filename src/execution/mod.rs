//! # Execution
//!
//! The bounded concurrency executor is the only place the orchestrator fans out.

pub mod bounded_executor;

pub use bounded_executor::BoundedExecutor;

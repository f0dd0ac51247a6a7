//! # Monitoring
//!
//! Lightweight, in-process performance telemetry. Each named label keeps a
//! bounded window of recent durations from which summary statistics are
//! computed on demand.

pub mod performance;

pub use performance::{PerformanceMonitor, PerformanceStats, PerformanceTimer};

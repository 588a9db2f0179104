//! Observability for cursor execution
//!
//! This module provides:
//! - Structured logging (JSON, deterministic field ordering)
//! - Monotonic execution counters
//!
//! # Principles
//!
//! 1. Observability is read-only: counters and logs never affect
//!    cursor behavior
//! 2. Counters are injected as an explicit sink at cursor construction,
//!    never global state
//! 3. Deterministic output

mod logger;
mod metrics;

pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

// # Metrics Sink Implementations
//
// This module provides implementations of the MetricsSink trait shipped with
// the core crate. Database-backed sinks live in their own crates.

pub mod memory;

pub use memory::MemoryMetricsSink;

//! Core traits for the netmon system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`Prober`]: Send reachability probes to a set of addresses
//! - [`MetricsSink`]: Batch and publish measurement events
//! - [`SpeedSampler`]: Measure latency and throughput against a remote service

pub mod metrics_sink;
pub mod prober;
pub mod speed_sampler;

pub use metrics_sink::{FieldValue, Measurement, MetricsSink};
pub use prober::{ProbeReport, Prober};
pub use speed_sampler::{SpeedSample, SpeedSampler};

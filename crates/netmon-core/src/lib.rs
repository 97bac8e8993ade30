// # netmon-core
//
// Core library for the netmon network status monitor.
//
// ## Architecture Overview
//
// This library provides the connectivity-assessment loop:
// - **Prober**: Trait for sending reachability probes to a set of addresses
// - **MetricsSink**: Trait for batching and publishing measurement events
// - **SpeedSampler**: Trait for measuring latency and throughput
// - **reachability**: Rules combining probe outcomes into LAN/internet verdicts
// - **MonitorEngine**: Scheduler driving both cycles on independent intervals
//
// ## Design Principles
//
// 1. **Separation of Concerns**: The engine orchestrates; probing, speed
//    measurement and storage are external collaborators behind narrow traits
// 2. **Availability over consistency**: probe, sampler and sink failures are
//    logged and the loop continues; only configuration errors are fatal
// 3. **Drift-free scheduling**: each wake re-synchronizes from the recorded
//    last-run timestamps instead of accumulating sleep error
// 4. **Library-First**: the engine embeds without the daemon binary

pub mod config;
pub mod engine;
pub mod error;
pub mod reachability;
pub mod sink;
pub mod traits;

// Re-export core types for convenience
pub use config::{DatabaseConfig, LocalCheck, MonitorConfig, RemoteCheck};
pub use engine::{EngineEvent, MonitorEngine};
pub use error::{Error, Result};
pub use reachability::{HopStatus, Reachability};
pub use sink::MemoryMetricsSink;
pub use traits::{FieldValue, Measurement, MetricsSink, ProbeReport, Prober, SpeedSample, SpeedSampler};

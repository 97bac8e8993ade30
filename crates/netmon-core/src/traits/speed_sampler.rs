// # Speed Sampler Trait
//
// Defines the interface for measuring network throughput against a remote
// service.
//
// ## Implementations
//
// - HTTP endpoint sampler: `netmon-speed-http` crate
//
// ## Contract
//
// One blocking call, no internal retry. The engine invokes the sampler only
// in a wake whose own connectivity check confirmed internet reachability;
// an error aborts the speed sub-cycle for that wake only.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of one speed sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedSample {
    /// Round-trip latency in milliseconds
    pub latency_ms: i64,

    /// Download throughput in megabits per second
    pub download_mbps: f64,

    /// Upload throughput in megabits per second
    pub upload_mbps: f64,
}

/// Trait for speed sampler implementations
#[async_trait]
pub trait SpeedSampler: Send + Sync {
    /// Discover a test target and measure latency, download and upload
    ///
    /// # Returns
    ///
    /// - `Ok(SpeedSample)`: one complete sample
    /// - `Err(Error)`: the measurement failed (skips this wake's speed cycle)
    async fn sample(&self) -> Result<SpeedSample, crate::Error>;
}

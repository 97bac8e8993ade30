// # Prober Trait
//
// Defines the interface for sending reachability probes to a set of addresses.
//
// ## Implementations
//
// - ICMP echo: `netmon-probe-icmp` crate
// - Future: TCP connect, UDP, platform-specific APIs
//
// ## Contract
//
// A probe run sends one probe to every address concurrently and collects
// responses until every address has answered or the run timeout elapses.
// Per-address non-response is a `false` outcome, never an error. Addresses
// that fail to resolve are skipped entirely: they are logged, listed in
// [`ProbeReport::skipped`], and excluded from the outcome map. Only a
// transport-setup failure (e.g. no permission to open an ICMP socket) makes
// the run itself fail.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Outcome of one probe run
///
/// Built fresh per run; results are never merged across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    /// Address → whether a response arrived within the run
    pub outcomes: HashMap<String, bool>,

    /// Addresses that failed to resolve and were excluded from the run
    pub skipped: Vec<String>,
}

impl ProbeReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a specific address responded; `false` for unknown addresses
    pub fn responded(&self, address: &str) -> bool {
        self.outcomes.get(address).copied().unwrap_or(false)
    }

    /// True if at least one probed address responded
    pub fn any_responded(&self) -> bool {
        self.outcomes.values().any(|ok| *ok)
    }

    /// True if every probed address responded
    ///
    /// An empty outcome map returns `false`: zero addresses answering is
    /// zero evidence, not full confirmation.
    pub fn all_responded(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.values().all(|ok| *ok)
    }
}

/// Trait for reachability prober implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Forward Progress
///
/// The run must terminate even if every address is unreachable: `timeout`
/// bounds the whole run, independent of response arrival.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe every address in `addresses` concurrently
    ///
    /// # Parameters
    ///
    /// - `addresses`: ordered list of IPs or hostnames (order is preserved
    ///   by callers that render per-hop reports)
    /// - `timeout`: budget for the whole run
    ///
    /// # Returns
    ///
    /// - `Ok(ProbeReport)`: per-address outcomes, resolution failures skipped
    /// - `Err(Error)`: the probe transport could not be initialized
    async fn probe(
        &self,
        addresses: &[String],
        timeout: Duration,
    ) -> Result<ProbeReport, crate::Error>;
}

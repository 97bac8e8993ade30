//! Test doubles and common utilities for architecture contract tests
//!
//! This module provides minimal doubles that let the contract tests drive
//! the engine with scripted probe outcomes and observe what it publishes.

#![allow(dead_code)]

use netmon_core::error::Result;
use netmon_core::traits::{Measurement, MetricsSink, ProbeReport, Prober, SpeedSample, SpeedSampler};
use netmon_core::{DatabaseConfig, Error, MemoryMetricsSink, MonitorConfig};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// The database name used by [`test_config`]
pub const TEST_DB: &str = "netmon";

/// One-shot configuration with zero grace sleep and a database configured
pub fn test_config() -> MonitorConfig {
    let mut config = MonitorConfig::new("aa:bb:cc:dd:ee:ff");
    config.one_shot = true;
    config.startup_grace = Duration::ZERO;
    config.database = Some(DatabaseConfig {
        host: "http://localhost:8086".to_string(),
        name: TEST_DB.to_string(),
        user: "netmon".to_string(),
        password: "netmon".to_string(),
    });
    config
}

/// Drain every event the engine emitted
pub fn drain_events(rx: &mut mpsc::Receiver<netmon_core::EngineEvent>) -> Vec<netmon_core::EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// A prober that answers from a scripted outcome table
///
/// Clones share call counters, so tests can hand one clone to the engine and
/// keep another for assertions.
#[derive(Clone)]
pub struct ScriptedProber {
    responses: Arc<std::sync::Mutex<HashMap<String, bool>>>,
    unresolvable: HashSet<String>,
    fail: bool,
    probe_runs: Arc<AtomicUsize>,
}

impl ScriptedProber {
    /// Script the given address → responded outcomes; unknown addresses
    /// default to not responding
    pub fn new(responses: &[(&str, bool)]) -> Self {
        Self {
            responses: Arc::new(std::sync::Mutex::new(
                responses
                    .iter()
                    .map(|(a, ok)| (a.to_string(), *ok))
                    .collect(),
            )),
            unresolvable: HashSet::new(),
            fail: false,
            probe_runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Change one address's outcome for subsequent runs
    pub fn set_response(&self, address: &str, responded: bool) {
        self.responses
            .lock()
            .unwrap()
            .insert(address.to_string(), responded);
    }

    /// A prober whose every run fails with a transport-setup error
    pub fn failing() -> Self {
        let mut prober = Self::new(&[]);
        prober.fail = true;
        prober
    }

    /// Mark addresses as unresolvable (skipped, excluded from outcomes)
    pub fn with_unresolvable(mut self, addresses: &[&str]) -> Self {
        self.unresolvable = addresses.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Number of probe runs performed
    pub fn probe_runs(&self) -> usize {
        self.probe_runs.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, addresses: &[String], _timeout: Duration) -> Result<ProbeReport> {
        self.probe_runs.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(Error::probe("scripted transport failure"));
        }

        let responses = self.responses.lock().unwrap();
        let mut report = ProbeReport::new();
        for address in addresses {
            if self.unresolvable.contains(address) {
                report.skipped.push(address.clone());
                continue;
            }
            let responded = responses.get(address).copied().unwrap_or(false);
            report.outcomes.insert(address.clone(), responded);
        }
        Ok(report)
    }
}

/// A sampler returning a fixed sample or a scripted failure
#[derive(Clone)]
pub struct StubSampler {
    sample: Option<SpeedSample>,
    calls: Arc<AtomicUsize>,
}

impl StubSampler {
    pub fn ok(latency_ms: i64, download_mbps: f64, upload_mbps: f64) -> Self {
        Self {
            sample: Some(SpeedSample {
                latency_ms,
                download_mbps,
                upload_mbps,
            }),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            sample: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times the engine invoked the sampler
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SpeedSampler for StubSampler {
    async fn sample(&self) -> Result<SpeedSample> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sample
            .ok_or_else(|| Error::speed("scripted sampler failure"))
    }
}

/// A sink whose write and/or flush can be scripted to fail
///
/// Successful operations are forwarded to an inner memory sink so tests can
/// still observe what got through.
#[derive(Clone)]
pub struct FlakySink {
    fail_write: bool,
    fail_flush: bool,
    pub inner: MemoryMetricsSink,
}

impl FlakySink {
    pub fn failing_write() -> Self {
        Self {
            fail_write: true,
            fail_flush: false,
            inner: MemoryMetricsSink::new(),
        }
    }

    pub fn failing_flush() -> Self {
        Self {
            fail_write: false,
            fail_flush: true,
            inner: MemoryMetricsSink::new(),
        }
    }
}

#[async_trait::async_trait]
impl MetricsSink for FlakySink {
    async fn write(&self, database: &str, point: Measurement) -> Result<()> {
        if self.fail_write {
            return Err(Error::sink("scripted write failure"));
        }
        self.inner.write(database, point).await
    }

    async fn flush(&self, database: &str) -> Result<()> {
        if self.fail_flush {
            return Err(Error::sink("scripted flush failure"));
        }
        self.inner.flush(database).await
    }
}

/// A scripted outcome set where every default local gateway and every default
/// public resolver responds
pub fn everything_up() -> ScriptedProber {
    ScriptedProber::new(&[
        ("10.0.1.1", true),
        ("192.168.0.1", true),
        ("192.168.1.1", true),
        ("192.168.2.1", true),
        ("192.168.3.1", true),
        ("192.168.50.1", true),
        ("208.67.222.222", true),
        ("8.8.8.8", true),
        ("1.1.1.1", true),
    ])
}

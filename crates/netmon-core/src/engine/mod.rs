//! Core monitoring engine
//!
//! The MonitorEngine is responsible for:
//! - Scheduling the connectivity and speed cycles on independent intervals
//! - Running reachability probes and evaluating the results
//! - Gating the speed cycle on same-wake internet confirmation
//! - Publishing measurements through the MetricsSink (best-effort)
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   probe runs    ┌───────────────┐
//! │  Prober   │◄────────────────│ MonitorEngine │
//! └───────────┘                 └───────────────┘
//!                                  │         │
//!                   sample (gated) │         │ write / flush
//!                                  ▼         ▼
//!                         ┌──────────────┐ ┌─────────────┐
//!                         │ SpeedSampler │ │ MetricsSink │
//!                         └──────────────┘ └─────────────┘
//! ```
//!
//! ## Wake Flow
//!
//! 1. If the connectivity cycle is due: probe, evaluate, publish "Connection",
//!    advance its timer whether or not the probe run succeeded
//! 2. If the speed cycle is due AND this wake confirmed internet: sample,
//!    publish "Speed", advance its timer
//! 3. Flush the sink batch
//! 4. One-shot: stop. Continuous: sleep until the next due cycle, repeat

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::{MonitorConfig, RemoteCheck};
use crate::error::{Error, Result};
use crate::reachability::{self, Reachability, status_str};
use crate::traits::{Measurement, MetricsSink, Prober, SpeedSampler};

/// Events emitted by the MonitorEngine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        one_shot: bool,
    },

    /// A connectivity cycle completed
    ConnectivityChecked {
        local: bool,
        remote: bool,
    },

    /// A probe run could not be started
    ProbeFailed {
        error: String,
    },

    /// A speed cycle completed
    SpeedSampled {
        latency_ms: i64,
        download_mbps: f64,
        upload_mbps: f64,
    },

    /// The speed sampler failed; the cycle is skipped until its next interval
    SpeedFailed {
        error: String,
    },

    /// The speed cycle was due but internet was not confirmed this wake
    SpeedSkipped {
        reason: String,
    },

    /// A measurement was queued for publishing
    Published {
        database: String,
        measurement: String,
    },

    /// A measurement could not be queued
    PublishFailed {
        database: String,
        error: String,
    },

    /// The batch flush failed; the batch is retained for the next wake
    FlushFailed {
        database: String,
        error: String,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Core monitoring engine
///
/// Owns the prober, the optional metrics sink, the speed sampler, and the
/// schedule state. A single logical worker drives everything: the
/// connectivity and speed cycles never run concurrently, so batches in the
/// sink see single-flight access.
///
/// ## Scheduling
///
/// Both last-run timestamps start at the Unix epoch, so the very first wake
/// always runs the connectivity cycle (and the speed cycle, subject to the
/// internet gate). After each wake the engine sleeps for the minimum of the
/// two remaining durations, re-synchronizing from the post-cycle timestamps
/// rather than accumulating drift.
pub struct MonitorEngine {
    /// Reachability prober
    prober: Box<dyn Prober>,

    /// Throughput sampler, invoked only when internet was confirmed
    sampler: Box<dyn SpeedSampler>,

    /// Measurement destination; `None` disables publishing
    sink: Option<Box<dyn MetricsSink>>,

    /// Monitor configuration
    config: MonitorConfig,

    /// Connectivity check interval
    connection_interval: TimeDelta,

    /// Speed test interval
    speed_interval: TimeDelta,

    /// Last connectivity cycle, epoch until the first wake
    last_conn_test: DateTime<Utc>,

    /// Last speed cycle, epoch until the first wake
    last_speed_test: DateTime<Utc>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl MonitorEngine {
    /// Create a new monitoring engine
    ///
    /// # Parameters
    ///
    /// - `prober`: reachability prober implementation
    /// - `sampler`: speed sampler implementation
    /// - `sink`: measurement destination, or `None` to disable publishing
    /// - `config`: monitor configuration (validated here)
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine
    /// events
    pub fn new(
        prober: Box<dyn Prober>,
        sampler: Box<dyn SpeedSampler>,
        sink: Option<Box<dyn MetricsSink>>,
        config: MonitorConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        if sink.is_some() && config.database.is_none() {
            return Err(Error::config(
                "a metrics sink requires a database configuration",
            ));
        }

        let connection_interval = TimeDelta::from_std(config.connection_interval)
            .map_err(|e| Error::config(format!("connection interval out of range: {e}")))?;
        let speed_interval = TimeDelta::from_std(config.speed_interval)
            .map_err(|e| Error::config(format!("speed test interval out of range: {e}")))?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            prober,
            sampler,
            sink,
            config,
            connection_interval,
            speed_interval,
            last_conn_test: DateTime::UNIX_EPOCH,
            last_speed_test: DateTime::UNIX_EPOCH,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run the engine
    ///
    /// In one-shot mode this performs exactly one wake and returns. In
    /// continuous mode it loops until ctrl-c.
    pub async fn run(&mut self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Test-only helper to run the engine with a controlled shutdown signal
    ///
    /// Production code should use `run()` instead, which shuts down on OS
    /// signals rather than a programmatic channel.
    pub async fn run_with_shutdown(
        &mut self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(
        &mut self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(EngineEvent::Started {
            one_shot: self.config.one_shot,
        });

        // Give a host that just resumed from sleep a chance to bring its
        // network link back up before the first verdict.
        if !self.config.one_shot && !self.config.startup_grace.is_zero() {
            debug!(grace = ?self.config.startup_grace, "startup grace sleep");
            tokio::time::sleep(self.config.startup_grace).await;
        }

        if let Some(mut rx) = shutdown_rx {
            // Test mode: wait for the provided shutdown signal
            loop {
                let now = Utc::now();
                self.wake(now).await;

                if self.config.one_shot {
                    self.emit_event(EngineEvent::Stopped {
                        reason: "one-shot".to_string(),
                    });
                    break;
                }

                tokio::select! {
                    _ = tokio::time::sleep(self.sleep_until_next_due(now)) => {}
                    _ = &mut rx => {
                        info!("shutdown signal received");
                        self.emit_event(EngineEvent::Stopped {
                            reason: "shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        } else {
            // Production mode: wait for ctrl-c
            loop {
                let now = Utc::now();
                self.wake(now).await;

                if self.config.one_shot {
                    self.emit_event(EngineEvent::Stopped {
                        reason: "one-shot".to_string(),
                    });
                    break;
                }

                tokio::select! {
                    _ = tokio::time::sleep(self.sleep_until_next_due(now)) => {}
                    _ = tokio::signal::ctrl_c() => {
                        info!("shutdown signal received");
                        self.emit_event(EngineEvent::Stopped {
                            reason: "shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Perform one wake: connectivity cycle, gated speed cycle, flush
    async fn wake(&mut self, now: DateTime<Utc>) {
        let mut internet_confirmed = false;

        if now.signed_duration_since(self.last_conn_test) >= self.connection_interval {
            info!("testing network connection");
            match self.check_connectivity().await {
                Ok(result) => {
                    info!("local area network: {}", status_str(result.local));
                    info!("internet: {}", status_str(result.remote));
                    internet_confirmed = result.remote;

                    self.emit_event(EngineEvent::ConnectivityChecked {
                        local: result.local,
                        remote: result.remote,
                    });

                    let point = Measurement::new("Connection", &self.config.client_id, now)
                        .with_field("LAN", result.local)
                        .with_field("Internet", result.remote);
                    self.publish(point).await;
                }
                Err(e) => {
                    // Logged, not retried; the next attempt is the normal
                    // next interval, and internet stays unconfirmed.
                    error!("connectivity check failed: {e}");
                    self.emit_event(EngineEvent::ProbeFailed {
                        error: e.to_string(),
                    });
                }
            }
            self.last_conn_test = now;
        }

        if now.signed_duration_since(self.last_speed_test) >= self.speed_interval {
            if internet_confirmed {
                info!("testing network speed");
                match self.sampler.sample().await {
                    Ok(sample) => {
                        info!(
                            "latency: {} ms, download: {:.0} mbps, upload: {:.0} mbps",
                            sample.latency_ms, sample.download_mbps, sample.upload_mbps
                        );

                        self.emit_event(EngineEvent::SpeedSampled {
                            latency_ms: sample.latency_ms,
                            download_mbps: sample.download_mbps,
                            upload_mbps: sample.upload_mbps,
                        });

                        let point = Measurement::new("Speed", &self.config.client_id, now)
                            .with_field("Latency", sample.latency_ms)
                            .with_field("Upload", sample.upload_mbps)
                            .with_field("Download", sample.download_mbps);
                        self.publish(point).await;
                    }
                    Err(e) => {
                        error!("speed test failed: {e}");
                        self.emit_event(EngineEvent::SpeedFailed {
                            error: e.to_string(),
                        });
                    }
                }
                self.last_speed_test = now;
            } else {
                // Not deferred: reconsidered on the next wake with that
                // wake's fresh reachability result.
                debug!("speed test due but internet not confirmed this wake");
                self.emit_event(EngineEvent::SpeedSkipped {
                    reason: "internet not confirmed this wake".to_string(),
                });
            }
        }

        self.flush().await;
    }

    /// Run the local and remote probe sets and evaluate both verdicts
    async fn check_connectivity(&self) -> Result<Reachability> {
        let local_report = self
            .prober
            .probe(&self.config.local_addresses(), self.config.probe_timeout)
            .await?;
        let local = reachability::evaluate_local(&local_report);

        let remote_report = self
            .prober
            .probe(&self.config.remote_addresses(), self.config.probe_timeout)
            .await?;
        let remote = reachability::evaluate_remote(&self.config.remote_check, &remote_report);

        if let RemoteCheck::Traceroute(hops) = &self.config.remote_check {
            info!("traceroute:");
            for status in reachability::hop_report(hops, &remote_report) {
                info!(
                    "{:<2} {:<15} {}",
                    status.hop,
                    status.address,
                    status.status_str()
                );
            }
        }

        Ok(Reachability { local, remote })
    }

    /// Queue a measurement, best-effort
    async fn publish(&self, point: Measurement) {
        let (Some(sink), Some(db)) = (&self.sink, &self.config.database) else {
            return;
        };

        let measurement = point.name.clone();
        match sink.write(&db.name, point).await {
            Ok(()) => {
                self.emit_event(EngineEvent::Published {
                    database: db.name.clone(),
                    measurement,
                });
            }
            Err(e) => {
                warn!("failed to queue {measurement} measurement: {e}");
                self.emit_event(EngineEvent::PublishFailed {
                    database: db.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    /// Flush the sink batch, best-effort
    async fn flush(&self) {
        let (Some(sink), Some(db)) = (&self.sink, &self.config.database) else {
            return;
        };

        if let Err(e) = sink.flush(&db.name).await {
            warn!("failed to flush measurements to {}: {e}", db.name);
            self.emit_event(EngineEvent::FlushFailed {
                database: db.name.clone(),
                error: e.to_string(),
            });
        }
    }

    /// Sleep duration until the next due cycle
    ///
    /// A cycle that is already due but gated off (speed without confirmed
    /// internet) does not force an immediate wake; nothing can change its
    /// gate before the next connectivity check, so only future due times
    /// participate.
    fn sleep_until_next_due(&self, now: DateTime<Utc>) -> Duration {
        let next_conn = self.last_conn_test + self.connection_interval;
        let next_speed = self.last_speed_test + self.speed_interval;

        [next_conn, next_speed]
            .into_iter()
            .filter_map(|next| next.signed_duration_since(now).to_std().ok())
            .filter(|remaining| !remaining.is_zero())
            .min()
            .unwrap_or(self.config.connection_interval)
    }

    /// Emit an engine event, dropping it with a warning when the channel is
    /// full
    fn emit_event(&self, event: EngineEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("event channel full, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_events_are_comparable() {
        let event = EngineEvent::ConnectivityChecked {
            local: true,
            remote: false,
        };
        assert_eq!(event.clone(), event);
    }
}

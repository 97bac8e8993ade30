// # Metrics Sink Trait
//
// Defines the interface for publishing measurement events to a time-series
// store.
//
// ## Implementations
//
// - InfluxDB v1 line protocol: `netmon-sink-influx` crate
// - In-memory (testing/embedded): [`crate::sink::MemoryMetricsSink`]
//
// ## Contract
//
// `write` enqueues a measurement into a per-database batch and fails only if
// the measurement cannot be encoded. `flush` sends the accumulated batch and
// clears it on success only. The engine treats both as best-effort: failures
// are logged and the monitoring loop continues.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single field value in a measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean field (e.g. LAN/Internet status)
    Bool(bool),
    /// Integer field (e.g. latency in milliseconds)
    Integer(i64),
    /// Floating-point field (e.g. throughput in mbps)
    Float(f64),
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

/// A write-once measurement event
///
/// A named metric group ("Connection" or "Speed"), the stable client
/// identifier, a timestamp, and the field mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Metric group name
    pub name: String,

    /// Stable client identifier (MAC-derived)
    pub client_id: String,

    /// When the measurement was taken
    pub timestamp: DateTime<Utc>,

    /// Field name → value
    pub fields: BTreeMap<String, FieldValue>,
}

impl Measurement {
    /// Create a measurement with no fields yet
    pub fn new(
        name: impl Into<String>,
        client_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            client_id: client_id.into(),
            timestamp,
            fields: BTreeMap::new(),
        }
    }

    /// Add a field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Trait for measurement publisher implementations
///
/// Implementations must be thread-safe. The engine runs one cycle at a time,
/// so batches see single-flight access, but the trait itself makes no such
/// assumption.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Enqueue a measurement into the batch for `database`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: queued
    /// - `Err(Error)`: the measurement could not be encoded
    async fn write(&self, database: &str, point: Measurement) -> Result<(), crate::Error>;

    /// Send the accumulated batch for `database`
    ///
    /// On success the batch is cleared; on failure it is retained for the
    /// next flush attempt.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: batch sent (or empty)
    /// - `Err(Error)`: transport write failed
    async fn flush(&self, database: &str) -> Result<(), crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_fields() {
        let point = Measurement::new("Connection", "aa:bb", Utc::now())
            .with_field("LAN", true)
            .with_field("Internet", false);

        assert_eq!(point.fields.len(), 2);
        assert_eq!(point.fields["LAN"], FieldValue::Bool(true));
        assert_eq!(point.fields["Internet"], FieldValue::Bool(false));
    }

    #[test]
    fn field_value_conversions() {
        assert_eq!(FieldValue::from(42i64), FieldValue::Integer(42));
        assert_eq!(FieldValue::from(1.5f64), FieldValue::Float(1.5));
        assert_eq!(FieldValue::from(true), FieldValue::Bool(true));
    }
}

// # InfluxDB v1 Metrics Sink
//
// This crate provides an InfluxDB 1.x sink for the netmon system.
//
// ## Implementation
//
// - Measurements are encoded to line protocol at write time, so an
//   un-encodable point (non-finite float, empty field set) fails the write
//   and never poisons a batch
// - Batches accumulate per database name and are sent with a single POST to
//   `/write?db=<name>&precision=ms` with basic auth
// - A failed flush retains the batch; the engine retries on its next wake
// - NO retry logic (intentionally omitted - the engine owns scheduling)
//
// Only the one-line text write format is spoken here; this is not a database
// client.
//
// ## API Reference
//
// - InfluxDB 1.x line protocol:
//   https://docs.influxdata.com/influxdb/v1/write_protocols/line_protocol_reference/

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use netmon_core::traits::{FieldValue, Measurement, MetricsSink};
use netmon_core::{Error, Result};
use tokio::sync::Mutex;
use tracing::debug;

/// Default HTTP timeout for write requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// InfluxDB v1 sink
///
/// Thread-safe; the batch map lives behind a mutex. The engine runs one
/// cycle at a time, so contention is not expected.
pub struct InfluxSink {
    client: reqwest::Client,
    host: String,
    user: String,
    password: String,
    batches: Mutex<HashMap<String, Vec<String>>>,
}

impl InfluxSink {
    /// Create a new sink for the given InfluxDB endpoint
    ///
    /// # Parameters
    ///
    /// - `host`: base URL, e.g. "http://influx.lan:8086"
    /// - `user` / `password`: credentials sent as basic auth
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let host = host.into();
        if host.is_empty() {
            return Err(Error::config("influxdb host cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::sink(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            user: user.into(),
            password: password.into(),
            batches: Mutex::new(HashMap::new()),
        })
    }
}

#[async_trait]
impl MetricsSink for InfluxSink {
    async fn write(&self, database: &str, point: Measurement) -> Result<()> {
        let line = encode_line(&point)?;
        let mut batches = self.batches.lock().await;
        batches.entry(database.to_string()).or_default().push(line);
        Ok(())
    }

    async fn flush(&self, database: &str) -> Result<()> {
        let mut batches = self.batches.lock().await;
        let Some(batch) = batches.get(database) else {
            return Ok(());
        };
        if batch.is_empty() {
            return Ok(());
        }

        let body = batch.join("\n");
        let url = format!("{}/write", self.host);

        let response = self
            .client
            .post(&url)
            .query(&[("db", database), ("precision", "ms")])
            .basic_auth(&self.user, Some(&self.password))
            .body(body)
            .send()
            .await
            .map_err(|e| Error::sink(format!("influxdb write request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::sink(format!(
                "influxdb write rejected: {}",
                response.status()
            )));
        }

        debug!(
            "flushed {} point(s) to {database}",
            batches[database].len()
        );
        batches.remove(database);
        Ok(())
    }
}

/// Encode one measurement as an InfluxDB line
///
/// `name,MAC=<client_id> field=value,... <timestamp_ms>` with the tag key
/// `MAC` carrying the stable client identifier.
fn encode_line(point: &Measurement) -> Result<String> {
    if point.fields.is_empty() {
        return Err(Error::encode("measurement has no fields"));
    }

    let mut line = String::new();
    line.push_str(&escape_measurement(&point.name));
    line.push_str(",MAC=");
    line.push_str(&escape_tag(&point.client_id));
    line.push(' ');

    let mut first = true;
    for (key, value) in &point.fields {
        if !first {
            line.push(',');
        }
        first = false;
        line.push_str(&escape_tag(key));
        line.push('=');
        line.push_str(&encode_field(value)?);
    }

    line.push(' ');
    line.push_str(&point.timestamp.timestamp_millis().to_string());
    Ok(line)
}

fn encode_field(value: &FieldValue) -> Result<String> {
    match value {
        FieldValue::Bool(b) => Ok(b.to_string()),
        FieldValue::Integer(i) => Ok(format!("{i}i")),
        FieldValue::Float(f) => {
            if !f.is_finite() {
                return Err(Error::encode(format!("non-finite float field: {f}")));
            }
            Ok(f.to_string())
        }
    }
}

fn escape_measurement(name: &str) -> String {
    name.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_tag(value: &str) -> String {
    value
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

// # HTTP Speed Sampler
//
// This crate provides an HTTP-based SpeedSampler for the netmon system.
//
// ## Measurement
//
// Against a speed-test endpoint (default: speed.cloudflare.com, which serves
// `/__down?bytes=N` and accepts posts on `/__up`):
//
// - Latency: best of N timed zero-byte downloads
// - Download: one timed download of a fixed payload size
// - Upload: one timed upload of a fixed payload size
//
// One blocking call per sample, no internal retry; the engine decides when
// (and whether) to sample. This measures goodput over HTTP rather than
// implementing any dedicated speed-test protocol.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use netmon_core::traits::{SpeedSample, SpeedSampler};
use netmon_core::{Error, Result};
use tracing::debug;

/// Default speed-test endpoint
const DEFAULT_ENDPOINT: &str = "https://speed.cloudflare.com";

/// Zero-byte round trips used for the latency estimate
const DEFAULT_LATENCY_PROBES: u32 = 5;

/// Download payload size (10 MB)
const DEFAULT_DOWNLOAD_BYTES: usize = 10_000_000;

/// Upload payload size (2 MB)
const DEFAULT_UPLOAD_BYTES: usize = 2_000_000;

/// Overall timeout for a single HTTP transfer
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP throughput sampler
pub struct HttpSpeedSampler {
    client: reqwest::Client,
    endpoint: String,
    latency_probes: u32,
    download_bytes: usize,
    upload_bytes: usize,
}

impl HttpSpeedSampler {
    /// Create a sampler against the default endpoint
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Create a sampler against a custom endpoint serving the same paths
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        if endpoint.is_empty() {
            return Err(Error::config("speed endpoint cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::speed(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            latency_probes: DEFAULT_LATENCY_PROBES,
            download_bytes: DEFAULT_DOWNLOAD_BYTES,
            upload_bytes: DEFAULT_UPLOAD_BYTES,
        })
    }

    /// Override the transfer sizes (mainly for tests and slow links)
    pub fn with_transfer_sizes(mut self, download_bytes: usize, upload_bytes: usize) -> Self {
        self.download_bytes = download_bytes;
        self.upload_bytes = upload_bytes;
        self
    }

    async fn timed_download(&self, bytes: usize) -> Result<Duration> {
        let url = format!("{}/__down?bytes={bytes}", self.endpoint);
        let started = Instant::now();

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::speed(format!("download request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::speed(format!(
                "download rejected: {}",
                response.status()
            )));
        }
        response
            .bytes()
            .await
            .map_err(|e| Error::speed(format!("download transfer failed: {e}")))?;

        Ok(started.elapsed())
    }

    async fn measure_latency(&self) -> Result<i64> {
        let mut best: Option<Duration> = None;
        for _ in 0..self.latency_probes {
            let elapsed = self.timed_download(0).await?;
            best = Some(match best {
                Some(current) => current.min(elapsed),
                None => elapsed,
            });
        }
        // latency_probes is nonzero, so best is set
        Ok(best.unwrap_or_default().as_millis() as i64)
    }

    async fn measure_upload(&self) -> Result<Duration> {
        let url = format!("{}/__up", self.endpoint);
        let payload = vec![0u8; self.upload_bytes];
        let started = Instant::now();

        let response = self
            .client
            .post(&url)
            .body(payload)
            .send()
            .await
            .map_err(|e| Error::speed(format!("upload request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::speed(format!(
                "upload rejected: {}",
                response.status()
            )));
        }

        Ok(started.elapsed())
    }
}

#[async_trait]
impl SpeedSampler for HttpSpeedSampler {
    async fn sample(&self) -> Result<SpeedSample> {
        let latency_ms = self.measure_latency().await?;
        debug!("latency estimate: {latency_ms} ms");

        let download_elapsed = self.timed_download(self.download_bytes).await?;
        let download_mbps = mbps(self.download_bytes, download_elapsed);

        let upload_elapsed = self.measure_upload().await?;
        let upload_mbps = mbps(self.upload_bytes, upload_elapsed);

        Ok(SpeedSample {
            latency_ms,
            download_mbps,
            upload_mbps,
        })
    }
}

/// Megabits per second for a transfer
///
/// Sub-millisecond timings are clamped so a cached or loopback transfer
/// cannot produce an infinite (and un-publishable) rate.
fn mbps(bytes: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64().max(0.001);
    (bytes as f64 * 8.0) / secs / 1_000_000.0
}

//! Error types for the netmon system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for netmon operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the netmon system
#[derive(Error, Debug)]
pub enum Error {
    /// Probe transport errors (failed to start a probe run)
    #[error("probe error: {0}")]
    Probe(String),

    /// Address resolution failures (skips a single address, never a run)
    #[error("resolve error: {0}")]
    Resolve(String),

    /// Speed sampler errors
    #[error("speed test error: {0}")]
    Speed(String),

    /// Metrics sink errors (write or flush failed)
    #[error("metrics sink error: {0}")]
    Sink(String),

    /// Measurement could not be encoded for the sink
    #[error("encode error: {0}")]
    Encode(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network-related errors
    #[error("network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a probe error
    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    /// Create a resolution error
    pub fn resolve(msg: impl Into<String>) -> Self {
        Self::Resolve(msg.into())
    }

    /// Create a speed sampler error
    pub fn speed(msg: impl Into<String>) -> Self {
        Self::Speed(msg.into())
    }

    /// Create a metrics sink error
    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }

    /// Create an encode error
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

// # Memory Metrics Sink
//
// In-memory implementation of MetricsSink.
//
// ## Purpose
//
// Keeps batches and flushed measurements in process memory. Useful for
// testing, dry runs, and embedding the engine without a database.
//
// ## Behavior
//
// - `write` appends to the per-database batch
// - `flush` moves the batch into the flushed log and clears it
// - Everything is lost when the process exits

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::{Measurement, MetricsSink};

/// In-memory metrics sink
///
/// Batches are stored in a HashMap protected by a RwLock. Clones share the
/// same underlying storage, which lets tests observe what an engine wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetricsSink {
    batches: Arc<RwLock<HashMap<String, Vec<Measurement>>>>,
    flushed: Arc<RwLock<HashMap<String, Vec<Measurement>>>>,
}

impl MemoryMetricsSink {
    /// Create a new empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of measurements pending in the batch for `database`
    pub async fn pending(&self, database: &str) -> usize {
        self.batches
            .read()
            .await
            .get(database)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// All measurements flushed so far for `database`, in flush order
    pub async fn flushed(&self, database: &str) -> Vec<Measurement> {
        self.flushed
            .read()
            .await
            .get(database)
            .cloned()
            .unwrap_or_default()
    }

    /// Drop all pending and flushed measurements
    pub async fn clear(&self) {
        self.batches.write().await.clear();
        self.flushed.write().await.clear();
    }
}

#[async_trait]
impl MetricsSink for MemoryMetricsSink {
    async fn write(&self, database: &str, point: Measurement) -> Result<(), Error> {
        let mut batches = self.batches.write().await;
        batches.entry(database.to_string()).or_default().push(point);
        Ok(())
    }

    async fn flush(&self, database: &str) -> Result<(), Error> {
        let mut batches = self.batches.write().await;
        let Some(batch) = batches.remove(database) else {
            return Ok(());
        };
        drop(batches);

        let mut flushed = self.flushed.write().await;
        flushed.entry(database.to_string()).or_default().extend(batch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn write_then_flush_moves_batch() {
        let sink = MemoryMetricsSink::new();

        let point = Measurement::new("Connection", "aa:bb", Utc::now())
            .with_field("LAN", true)
            .with_field("Internet", true);

        sink.write("netmon", point.clone()).await.unwrap();
        assert_eq!(sink.pending("netmon").await, 1);
        assert!(sink.flushed("netmon").await.is_empty());

        sink.flush("netmon").await.unwrap();
        assert_eq!(sink.pending("netmon").await, 0);
        assert_eq!(sink.flushed("netmon").await, vec![point]);
    }

    #[tokio::test]
    async fn flush_of_empty_batch_is_noop() {
        let sink = MemoryMetricsSink::new();
        sink.flush("netmon").await.unwrap();
        assert!(sink.flushed("netmon").await.is_empty());
    }

    #[tokio::test]
    async fn batches_are_keyed_by_database() {
        let sink = MemoryMetricsSink::new();
        let point = Measurement::new("Speed", "aa:bb", Utc::now()).with_field("Latency", 12i64);

        sink.write("a", point.clone()).await.unwrap();
        sink.write("b", point).await.unwrap();
        sink.flush("a").await.unwrap();

        assert_eq!(sink.flushed("a").await.len(), 1);
        assert_eq!(sink.pending("b").await, 1);
        assert!(sink.flushed("b").await.is_empty());
    }
}

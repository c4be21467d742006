//! In-memory mock implementation of GraphStore for testing.
//!
//! Serves a fixed set of rows for every mode, with switches for failure
//! injection and artificial latency. Conditionally compiled with `#[cfg(test)]`.

use crate::graph::GraphMode;
use crate::neo4j::models::RawEdgeRow;
use crate::neo4j::traits::GraphStore;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// In-memory mock implementation of GraphStore for testing.
pub struct MockGraphStore {
    pub rows: RwLock<Vec<RawEdgeRow>>,
    /// When set, every query fails
    pub fail: AtomicBool,
    /// Sleep before answering a fetch
    pub delay: RwLock<Option<Duration>>,
    /// Number of `fetch_edge_rows` calls served
    pub fetch_calls: AtomicUsize,
    /// Last (mode, top_n) requested
    pub last_request: RwLock<Option<(GraphMode, usize)>>,
}

impl MockGraphStore {
    /// Create a new empty MockGraphStore.
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            fail: AtomicBool::new(false),
            delay: RwLock::new(None),
            fetch_calls: AtomicUsize::new(0),
            last_request: RwLock::new(None),
        }
    }

    /// Create a mock pre-seeded with rows.
    pub fn with_rows(rows: Vec<RawEdgeRow>) -> Self {
        let store = Self::new();
        *store.rows.try_write().expect("fresh lock") = rows;
        store
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("mock graph store unavailable");
        }
        Ok(())
    }
}

impl Default for MockGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for MockGraphStore {
    async fn fetch_edge_rows(&self, mode: GraphMode, top_n: usize) -> Result<Vec<RawEdgeRow>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.write().await = Some((mode, top_n));

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.check_failure()?;
        Ok(self.rows.read().await.clone())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.fail.load(Ordering::SeqCst))
    }

    async fn ping(&self) -> Result<String> {
        self.check_failure()?;
        Ok("Connection Successful".to_string())
    }

    async fn count_nodes(&self) -> Result<i64> {
        self.check_failure()?;
        let rows = self.rows.read().await;
        let mut ids: Vec<&str> = rows
            .iter()
            .flat_map(|r| [r.brand_id.as_deref(), r.target_id.as_deref()])
            .flatten()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids.len() as i64)
    }
}

//! `GraphStore` implementation for `Neo4jClient`.
//!
//! Every method simply delegates to the corresponding inherent method on `Neo4jClient`.

use async_trait::async_trait;

use super::client::Neo4jClient;
use super::models::RawEdgeRow;
use super::traits::GraphStore;
use crate::graph::GraphMode;

#[async_trait]
impl GraphStore for Neo4jClient {
    async fn fetch_edge_rows(
        &self,
        mode: GraphMode,
        top_n: usize,
    ) -> anyhow::Result<Vec<RawEdgeRow>> {
        self.fetch_edge_rows(mode, top_n).await
    }

    async fn health_check(&self) -> anyhow::Result<bool> {
        self.health_check().await
    }

    async fn ping(&self) -> anyhow::Result<String> {
        self.ping().await
    }

    async fn count_nodes(&self) -> anyhow::Result<i64> {
        self.count_nodes().await
    }
}

//! GraphStore trait definition
//!
//! Abstract interface over the graph database, implemented by `Neo4jClient`
//! and, in tests, by `MockGraphStore`.

use crate::graph::GraphMode;
use crate::neo4j::models::RawEdgeRow;
use anyhow::Result;
use async_trait::async_trait;

/// Read-only access to the brand/ad/topic graph.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Run the pattern query for `mode` and decode its rows.
    ///
    /// `top_n` bounds the number of topics returned by the ranked query;
    /// other modes ignore it.
    async fn fetch_edge_rows(&self, mode: GraphMode, top_n: usize) -> Result<Vec<RawEdgeRow>>;

    /// Check that the database answers a trivial query
    async fn health_check(&self) -> Result<bool>;

    /// Round-trip a literal message through the database
    async fn ping(&self) -> Result<String>;

    /// Total number of nodes in the database
    async fn count_nodes(&self) -> Result<i64>;
}

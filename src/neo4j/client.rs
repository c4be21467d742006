//! Neo4j client for reading the brand/ad/topic graph

use super::convert::row_id;
use super::models::{RawEdgeRow, TargetKind};
use crate::graph::GraphMode;
use anyhow::{Context, Result};
use neo4rs::{query, Graph, Query};
use std::sync::Arc;

/// Columns shared by every edge query. Each query binds `b`, `t`, `ad`,
/// `pub` and the relationship label, so decoding is mode-independent.
const EDGE_COLUMNS: &str = r#"
    elementId(b) AS brandId,
    b.name AS brandName,
    b.industry AS brandIndustry,
    elementId(t) AS targetId,
    t.name AS targetName,
    t.sentiment AS sentiment,
    elementId(ad) AS adId,
    CASE WHEN ad.date IS NOT NULL THEN toString(ad.date) ELSE null END AS adDate,
    pub.platform AS platform
"#;

/// Brand → ad → topic traversal. Brands without ads still produce one row
/// so they show up as isolated nodes.
const ENRICHED_QUERY: &str = r#"
    MATCH (b:Brand)
    OPTIONAL MATCH (b)-[pub:PUBLISHED]->(ad:Ad)-[ct:COVERS_TOPIC]->(t:Topic)
    RETURN {columns},
        'Topic' AS targetKind,
        CASE WHEN t IS NULL THEN null ELSE 'COVERS_TOPIC' END AS relType,
        ad.text AS adText,
        ad.url AS adUrl,
        ct.context AS context
"#;

/// Topics ranked by global ad volume, then expanded back to their brands.
const RANKED_QUERY: &str = r#"
    MATCH (t:Topic)<-[:COVERS_TOPIC]-(a:Ad)
    WITH t, count(DISTINCT a) AS volume
    ORDER BY volume DESC
    LIMIT $top_n
    MATCH (b:Brand)-[pub:PUBLISHED]->(ad:Ad)-[:COVERS_TOPIC]->(t)
    RETURN {columns},
        'Topic' AS targetKind,
        'COVERS_TOPIC' AS relType,
        null AS adText,
        null AS adUrl,
        null AS context
"#;

/// Every relationship from a brand's ads to a topic or platform.
const GENERIC_QUERY: &str = r#"
    MATCH (b:Brand)-[pub:PUBLISHED]->(ad:Ad)-[r]->(t)
    WHERE t:Topic OR t:Platform
    RETURN {columns},
        CASE WHEN t:Topic THEN 'Topic' ELSE 'Platform' END AS targetKind,
        type(r) AS relType,
        ad.text AS adText,
        ad.url AS adUrl,
        null AS context
"#;

/// Client for Neo4j operations
pub struct Neo4jClient {
    graph: Arc<Graph>,
}

impl Neo4jClient {
    /// Create a new Neo4j client
    pub async fn new(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password)
            .await
            .context("Failed to connect to Neo4j")?;

        let client = Self {
            graph: Arc::new(graph),
        };

        client.init_schema().await?;

        Ok(client)
    }

    /// Create lookup indexes used by the edge queries
    async fn init_schema(&self) -> Result<()> {
        let indexes = vec![
            "CREATE INDEX brand_name IF NOT EXISTS FOR (b:Brand) ON (b.name)",
            "CREATE INDEX topic_name IF NOT EXISTS FOR (t:Topic) ON (t.name)",
            "CREATE INDEX platform_name IF NOT EXISTS FOR (p:Platform) ON (p.name)",
        ];

        for index in indexes {
            // A read-only user can't create indexes; the queries still work without them.
            if let Err(e) = self.graph.run(query(index)).await {
                tracing::warn!("Index may already exist or is not permitted: {}", e);
            }
        }

        Ok(())
    }

    /// Execute a raw Cypher query (internal use only)
    pub(crate) async fn execute(&self, cypher: &str) -> Result<Vec<neo4rs::Row>> {
        self.execute_with_params(query(cypher)).await
    }

    /// Execute a parameterized Cypher query (internal use only)
    pub(crate) async fn execute_with_params(&self, q: Query) -> Result<Vec<neo4rs::Row>> {
        let mut result = self.graph.execute(q).await?;
        let mut rows = Vec::new();
        while let Some(row) = result.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Build the edge query for a mode
    fn edge_query(mode: GraphMode, top_n: usize) -> Query {
        let template = match mode {
            GraphMode::Enriched => ENRICHED_QUERY,
            GraphMode::Ranked => RANKED_QUERY,
            GraphMode::Generic => GENERIC_QUERY,
        };
        let cypher = template.replace("{columns}", EDGE_COLUMNS.trim());
        let q = query(&cypher);
        match mode {
            GraphMode::Ranked => q.param("top_n", top_n as i64),
            _ => q,
        }
    }

    /// Fetch and decode the edge rows for a mode
    pub async fn fetch_edge_rows(&self, mode: GraphMode, top_n: usize) -> Result<Vec<RawEdgeRow>> {
        let rows = self
            .execute_with_params(Self::edge_query(mode, top_n))
            .await
            .with_context(|| format!("Edge query failed (mode: {})", mode))?;

        let decoded = rows
            .iter()
            .map(decode_edge_row)
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Fetched {} edge rows (mode: {})", decoded.len(), mode);
        Ok(decoded)
    }

    /// Check connectivity
    pub async fn health_check(&self) -> Result<bool> {
        match self.execute("RETURN 1 AS ping").await {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    /// Round-trip a literal through the database
    pub async fn ping(&self) -> Result<String> {
        let rows = self
            .execute("RETURN 'Connection Successful' AS message")
            .await?;
        let row = rows.first().context("Ping returned no rows")?;
        Ok(row.get::<String>("message")?)
    }

    /// Count every node in the database
    pub async fn count_nodes(&self) -> Result<i64> {
        let rows = self.execute("MATCH (n) RETURN count(n) AS total").await?;
        let row = rows.first().context("Count query returned no rows")?;
        let total = super::convert::row_number(row, "total")?;
        Ok(total.unwrap_or(0))
    }
}

/// Decode one result row into a `RawEdgeRow`.
fn decode_edge_row(row: &neo4rs::Row) -> Result<RawEdgeRow> {
    let text = |key: &str| row.get::<Option<String>>(key).ok().flatten();

    let mut target_id = row_id(row, "targetId")?;
    let target_kind = match text("targetKind") {
        Some(label) => match TargetKind::from_label(&label) {
            Some(kind) => kind,
            None => {
                tracing::debug!("Ignoring target with unsupported label {}", label);
                target_id = None;
                TargetKind::default()
            }
        },
        None => TargetKind::default(),
    };

    Ok(RawEdgeRow {
        brand_id: row_id(row, "brandId")?,
        brand_name: text("brandName"),
        brand_industry: text("brandIndustry"),
        target_id,
        target_name: text("targetName"),
        target_kind,
        rel_type: text("relType"),
        ad_id: row_id(row, "adId")?,
        ad_text: text("adText"),
        ad_url: text("adUrl"),
        ad_date: text("adDate"),
        platform: text("platform"),
        context: text("context"),
        sentiment: text("sentiment"),
    })
}

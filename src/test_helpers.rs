//! Test helper factories and mock state builders
//!
//! Provides convenience functions for creating query rows and graph payloads
//! with sensible defaults, and helpers for building mock services / AppState.
#![allow(dead_code)]

use crate::graph::{GraphData, GraphMode, Link, Node, NodeGroup, Sizing};
use crate::neo4j::mock::MockGraphStore;
use crate::neo4j::models::*;
use crate::service::{GraphService, GraphServiceConfig};
use crate::{AppState, Config};
use std::sync::Arc;

// ============================================================================
// Mock state builders
// ============================================================================

/// Config pointing at a database that is never contacted
pub fn test_config() -> Config {
    Config {
        neo4j_uri: "bolt://mock:7687".to_string(),
        neo4j_user: "neo4j".to_string(),
        neo4j_password: "mock".to_string(),
        server_port: 0,
        graph_mode: GraphMode::Enriched,
        graph_top_n: 20,
        sizing: Sizing::default(),
        query_timeout_ms: 1_000,
        cache_ttl_secs: 60,
        cache_max_entries: 100,
    }
}

/// Graph service over a mock store
pub fn service_with(store: Arc<MockGraphStore>, config: GraphServiceConfig) -> GraphService {
    GraphService::new(store, config)
}

/// AppState backed by the given mock store
pub fn mock_app_state_with(store: Arc<MockGraphStore>) -> AppState {
    AppState::with_store(store, test_config())
}

/// AppState with an empty mock store
pub fn mock_app_state() -> AppState {
    mock_app_state_with(Arc::new(MockGraphStore::new()))
}

// ============================================================================
// Query rows
// ============================================================================

/// A brand → topic row, optionally carrying an ad
pub fn edge_row(brand: &str, target: &str, ad: Option<&str>, text: Option<&str>) -> RawEdgeRow {
    RawEdgeRow {
        brand_id: Some(brand.to_string()),
        brand_name: Some(brand.to_string()),
        target_id: Some(target.to_string()),
        target_name: Some(target.to_string()),
        target_kind: TargetKind::Topic,
        ad_id: ad.map(str::to_string),
        ad_text: text.map(str::to_string),
        ..Default::default()
    }
}

/// A brand with no ads
pub fn brand_only_row(id: &str, name: &str) -> RawEdgeRow {
    RawEdgeRow {
        brand_id: Some(id.to_string()),
        brand_name: Some(name.to_string()),
        ..Default::default()
    }
}

/// A brand → platform row
pub fn platform_row(brand: &str, platform_id: &str, platform_name: &str) -> RawEdgeRow {
    RawEdgeRow {
        brand_id: Some(brand.to_string()),
        brand_name: Some(brand.to_string()),
        target_id: Some(platform_id.to_string()),
        target_name: Some(platform_name.to_string()),
        target_kind: TargetKind::Platform,
        ..Default::default()
    }
}

// ============================================================================
// Graph payloads
// ============================================================================

pub fn test_node(id: &str, group: NodeGroup, sentiment: Option<&str>) -> Node {
    let mut node = Node::new(id, group, id);
    node.sentiment = sentiment.map(str::to_string);
    node
}

pub fn test_link(source: &str, target: &str, value: u64) -> Link {
    Link {
        source: source.to_string(),
        target: target.to_string(),
        link_type: "COVERS_TOPIC".to_string(),
        platform: None,
        value,
    }
}

/// Two connected brands, one isolated brand and three topics:
///
/// ```text
/// b_fast   ─5─► t_rates (Positive) ◄─1─ b_ameria
/// b_fast   ─2─► t_app (Negative)
/// b_ameria ─3─► t_support (Negative)
/// b_quiet
/// ```
pub fn sample_graph() -> GraphData {
    GraphData {
        nodes: vec![
            test_node("b_fast", NodeGroup::Brand, None),
            test_node("b_ameria", NodeGroup::Brand, None),
            test_node("b_quiet", NodeGroup::Brand, None),
            test_node("t_rates", NodeGroup::Topic, Some("Positive")),
            test_node("t_app", NodeGroup::Topic, Some("Negative")),
            test_node("t_support", NodeGroup::Topic, Some("Negative")),
        ],
        links: vec![
            test_link("b_fast", "t_rates", 5),
            test_link("b_fast", "t_app", 2),
            test_link("b_ameria", "t_rates", 1),
            test_link("b_ameria", "t_support", 3),
        ],
    }
}

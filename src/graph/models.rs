//! Graph payload models served to the force-directed renderer.
//!
//! These are the output types of the aggregator and the input types of the
//! filter engine. Field names serialize in camelCase to match what the
//! rendering surface reads (`adId`, `hitRate`, ...).

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// Node groups and query modes
// ============================================================================

/// Visual group of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeGroup {
    Brand,
    Topic,
    Platform,
}

impl std::fmt::Display for NodeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Brand => write!(f, "Brand"),
            Self::Topic => write!(f, "Topic"),
            Self::Platform => write!(f, "Platform"),
        }
    }
}

/// Which pattern query feeds the aggregator and which profile it runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GraphMode {
    /// Brand → ad → topic traversal with evidence and context enrichment
    #[default]
    Enriched,
    /// Top-N topics by global ad volume with log-scaled node radii
    Ranked,
    /// Raw brand → ad → (topic | platform) pattern dump
    Generic,
}

impl std::fmt::Display for GraphMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enriched => write!(f, "enriched"),
            Self::Ranked => write!(f, "ranked"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

impl FromStr for GraphMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "enriched" => Ok(Self::Enriched),
            "ranked" => Ok(Self::Ranked),
            "generic" => Ok(Self::Generic),
            other => Err(format!(
                "unknown graph mode '{}' (expected enriched, ranked or generic)",
                other
            )),
        }
    }
}

// ============================================================================
// Payload types
// ============================================================================

/// A concrete ad backing a brand–topic association.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub ad_id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

/// A node of the rendered graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub group: NodeGroup,
    pub caption: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
    /// Derived draw radius (ranked profile only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<u32>,
    /// Aggregated ad volume behind the radius (ranked profile only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contexts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Vec<Evidence>>,
}

impl Node {
    /// Bare node with only identity fields set.
    pub fn new(id: impl Into<String>, group: NodeGroup, caption: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            group,
            caption: caption.into(),
            industry: None,
            sentiment: None,
            radius: None,
            size: None,
            contexts: None,
            evidence: None,
        }
    }
}

/// A weighted brand → target relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub link_type: String,
    /// Ad platform of the supporting rows; aggregated links always carry
    /// one, `"unknown"` when the rows had none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Number of rows supporting this relationship (always >= 1)
    pub value: u64,
}

/// The `{nodes, links}` payload consumed by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl GraphData {
    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Largest link weight, or 1 when there are no links.
    pub fn max_link_weight(&self) -> u64 {
        self.links.iter().map(|l| l.value).max().unwrap_or(1)
    }
}

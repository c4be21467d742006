//! Row models returned by the graph pattern queries

use crate::graph::NodeGroup;
use serde::{Deserialize, Serialize};

/// Label of the node on the far side of a brand relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TargetKind {
    #[default]
    Topic,
    Platform,
}

impl TargetKind {
    /// Map a Neo4j label to a target kind. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Topic" => Some(Self::Topic),
            "Platform" => Some(Self::Platform),
            _ => None,
        }
    }

    /// Relationship label used when the query does not return one
    pub fn default_rel_type(self) -> &'static str {
        match self {
            Self::Topic => "COVERS_TOPIC",
            Self::Platform => "RUNS_ON",
        }
    }

    pub fn group(self) -> NodeGroup {
        match self {
            Self::Topic => NodeGroup::Topic,
            Self::Platform => NodeGroup::Platform,
        }
    }
}

/// One (brand, ad, topic | platform) tuple as returned by a pattern query.
///
/// Every field is optional: OPTIONAL MATCH clauses produce brands without
/// ads, and ads without text or platform are common in scraped data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEdgeRow {
    pub brand_id: Option<String>,
    pub brand_name: Option<String>,
    pub brand_industry: Option<String>,
    pub target_id: Option<String>,
    pub target_name: Option<String>,
    #[serde(default)]
    pub target_kind: TargetKind,
    pub rel_type: Option<String>,
    pub ad_id: Option<String>,
    pub ad_text: Option<String>,
    pub ad_url: Option<String>,
    pub ad_date: Option<String>,
    pub platform: Option<String>,
    pub context: Option<String>,
    pub sentiment: Option<String>,
}

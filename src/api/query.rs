//! Query parameter structs for the graph endpoints

use crate::graph::GraphMode;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Helper to deserialize optional values from query string (which are always strings)
fn deserialize_option_from_str<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    use serde::de::Error;
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if !s.trim().is_empty() => s.trim().parse().map(Some).map_err(D::Error::custom),
        _ => Ok(None),
    }
}

/// `?mode=&top_n=` on `/api/graph` and `/api/graph/filter`
#[derive(Debug, Deserialize, Clone, Default)]
pub struct GraphParams {
    /// enriched | ranked | generic (default: configured mode)
    #[serde(default, deserialize_with = "deserialize_option_from_str")]
    pub mode: Option<GraphMode>,
    /// Topic limit for the ranked mode
    #[serde(default, deserialize_with = "deserialize_option_from_str")]
    pub top_n: Option<usize>,
}

impl GraphParams {
    /// Reject values the service cannot honor
    pub fn validate(&self) -> Result<(), String> {
        if self.top_n == Some(0) {
            return Err("top_n must be at least 1".to_string());
        }
        Ok(())
    }
}

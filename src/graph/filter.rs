//! Predicate filtering over an aggregated graph.
//!
//! Filters run in a fixed order: connection strength, brands, topics,
//! sentiments, then isolated-node removal. The whole subgraph and its
//! neighbor index are recomputed on every call.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use super::models::{GraphData, Link, Node, NodeGroup};

/// Filter selection coming from the dashboard controls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterState {
    /// Selected brand node ids
    pub brands: Vec<String>,
    /// Selected topic node ids
    pub topics: Vec<String>,
    /// Selected sentiments, matched case-insensitively
    pub sentiments: Vec<String>,
    /// Minimum link strength as a percentage (0–100) of the strongest link
    pub connection_threshold: f64,
}

impl FilterState {
    /// True when any selection or a non-zero threshold is set.
    pub fn is_active(&self) -> bool {
        !self.brands.is_empty()
            || !self.topics.is_empty()
            || !self.sentiments.is_empty()
            || self.connection_threshold > 0.0
    }
}

/// A filtered subgraph with adjacency for hover/selection highlighting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredGraph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    /// Node id → ids of adjacent surviving nodes
    pub neighbors: BTreeMap<String, BTreeSet<String>>,
    /// Node id → indices into `links` of incident links
    pub incident_links: BTreeMap<String, Vec<usize>>,
}

impl FilteredGraph {
    fn indexed(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        let mut neighbors: BTreeMap<String, BTreeSet<String>> = nodes
            .iter()
            .map(|n| (n.id.clone(), BTreeSet::new()))
            .collect();
        let mut incident_links: BTreeMap<String, Vec<usize>> =
            nodes.iter().map(|n| (n.id.clone(), Vec::new())).collect();

        for (i, link) in links.iter().enumerate() {
            if let Some(set) = neighbors.get_mut(&link.source) {
                set.insert(link.target.clone());
            }
            if let Some(set) = neighbors.get_mut(&link.target) {
                set.insert(link.source.clone());
            }
            if let Some(list) = incident_links.get_mut(&link.source) {
                list.push(i);
            }
            if link.target != link.source {
                if let Some(list) = incident_links.get_mut(&link.target) {
                    list.push(i);
                }
            }
        }

        Self {
            nodes,
            links,
            neighbors,
            incident_links,
        }
    }
}

/// Apply `state` to `graph`. With no active filter the full graph, isolated
/// nodes included, is returned.
pub fn apply(graph: &GraphData, state: &FilterState) -> FilteredGraph {
    if !state.is_active() {
        return FilteredGraph::indexed(graph.nodes.clone(), graph.links.clone());
    }

    let max_weight = graph.max_link_weight() as f64;
    let threshold = (state.connection_threshold / 100.0) * max_weight;
    let mut links: Vec<&Link> = graph
        .links
        .iter()
        .filter(|l| l.value as f64 >= threshold)
        .collect();
    let mut nodes: Vec<&Node> = graph.nodes.iter().collect();

    if !state.brands.is_empty() {
        let selected: HashSet<&str> = state.brands.iter().map(String::as_str).collect();
        links.retain(|l| {
            selected.contains(l.source.as_str()) || selected.contains(l.target.as_str())
        });
        nodes.retain(|n| n.group != NodeGroup::Brand || selected.contains(n.id.as_str()));
    }

    if !state.topics.is_empty() {
        let selected: HashSet<&str> = state.topics.iter().map(String::as_str).collect();
        links.retain(|l| {
            selected.contains(l.source.as_str()) || selected.contains(l.target.as_str())
        });
        let touched = endpoints(&links);
        nodes.retain(|n| touched.contains(n.id.as_str()));
    }

    if !state.sentiments.is_empty() {
        let selected: Vec<String> = state.sentiments.iter().map(|s| s.to_lowercase()).collect();
        nodes.retain(|n| {
            n.group == NodeGroup::Brand
                || n
                    .sentiment
                    .as_ref()
                    .is_some_and(|s| selected.contains(&s.to_lowercase()))
        });
    }

    // Keep the subgraph closed: every link needs both endpoints.
    let surviving: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    links.retain(|l| {
        surviving.contains(l.source.as_str()) && surviving.contains(l.target.as_str())
    });

    let touched = endpoints(&links);
    nodes.retain(|n| touched.contains(n.id.as_str()));

    tracing::debug!(
        "Filter kept {}/{} nodes and {}/{} links",
        nodes.len(),
        graph.nodes.len(),
        links.len(),
        graph.links.len()
    );

    FilteredGraph::indexed(
        nodes.into_iter().cloned().collect(),
        links.into_iter().cloned().collect(),
    )
}

fn endpoints<'a>(links: &[&'a Link]) -> HashSet<&'a str> {
    links
        .iter()
        .flat_map(|l| [l.source.as_str(), l.target.as_str()])
        .collect()
}

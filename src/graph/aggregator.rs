//! Row → graph aggregation.
//!
//! Turns the flat rows of a pattern query into a deduplicated node set and a
//! weighted link set. One core handles all three query modes; the mode only
//! selects an [`AggregateOptions`] profile:
//!
//! | mode       | enrich | top_n        | sizing |
//! |------------|--------|--------------|--------|
//! | `enriched` | yes    | -            | -      |
//! | `ranked`   | no     | configurable | yes    |
//! | `generic`  | no     | -            | -      |
//!
//! Link weight counts rows (every row contributing to a
//! `(brand, target, platform)` triple adds one), while evidence is
//! deduplicated by ad id.

use std::collections::{HashMap, HashSet};

use super::models::{Evidence, GraphData, GraphMode, Link, Node, NodeGroup};
use crate::neo4j::models::{RawEdgeRow, TargetKind};

/// Platform key used for links whose row carries no platform
const UNKNOWN_PLATFORM: &str = "unknown";

// ============================================================================
// Options
// ============================================================================

/// Log-scaled radius parameters for the ranked profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sizing {
    /// Radius of a target with a volume of 1
    pub base_radius: u32,
    /// Multiplier applied to `ln(volume)`
    pub scale_factor: f64,
    /// Fixed radius for every brand node
    pub brand_radius: u32,
}

impl Default for Sizing {
    fn default() -> Self {
        Self {
            base_radius: 4,
            scale_factor: 3.0,
            brand_radius: 12,
        }
    }
}

impl Sizing {
    /// `base_radius + round(ln(volume) * scale_factor)`, never below `base_radius`.
    pub fn radius_for(&self, volume: u64) -> u32 {
        let volume = volume.max(1) as f64;
        let extra = (volume.ln() * self.scale_factor).round().max(0.0);
        self.base_radius.saturating_add(extra as u32)
    }
}

/// Aggregation profile.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOptions {
    /// Accumulate evidence and contexts on topic nodes
    pub enrich: bool,
    /// Keep only the N targets with the highest volume
    pub top_n: Option<usize>,
    /// Derive node radii from volume
    pub sizing: Option<Sizing>,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self::for_mode(GraphMode::Enriched, None, Sizing::default())
    }
}

impl AggregateOptions {
    /// Default number of targets kept by the ranked profile
    pub const DEFAULT_TOP_N: usize = 20;

    /// Build the profile for a query mode. `top_n` is only honored by the
    /// ranked profile, where it defaults to [`Self::DEFAULT_TOP_N`].
    pub fn for_mode(mode: GraphMode, top_n: Option<usize>, sizing: Sizing) -> Self {
        match mode {
            GraphMode::Enriched => Self {
                enrich: true,
                top_n: None,
                sizing: None,
            },
            GraphMode::Ranked => Self {
                enrich: false,
                top_n: Some(top_n.unwrap_or(Self::DEFAULT_TOP_N)),
                sizing: Some(sizing),
            },
            GraphMode::Generic => Self {
                enrich: false,
                top_n: None,
                sizing: None,
            },
        }
    }
}

// ============================================================================
// Aggregator
// ============================================================================

/// Where an id lives in the node tables
#[derive(Debug, Clone, Copy)]
enum Slot {
    Brand,
    Target(usize),
}

struct TargetEntry {
    node: Node,
    seen_ads: HashSet<String>,
    seen_contexts: HashSet<String>,
}

/// Stateless row aggregator. Every call to [`GraphAggregator::aggregate`]
/// rebuilds the graph from scratch.
#[derive(Debug, Clone, Default)]
pub struct GraphAggregator {
    options: AggregateOptions,
}

impl GraphAggregator {
    pub fn new(options: AggregateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AggregateOptions {
        &self.options
    }

    /// Aggregate rows into a `{nodes, links}` payload.
    ///
    /// Rows without a brand id are skipped. Node metadata is first-seen-wins.
    pub fn aggregate(&self, rows: &[RawEdgeRow]) -> GraphData {
        let mut slots: HashMap<String, Slot> = HashMap::new();
        let mut brands: Vec<Node> = Vec::new();
        let mut targets: Vec<TargetEntry> = Vec::new();
        let mut links: Vec<Link> = Vec::new();
        let mut link_index: HashMap<(String, String, String), usize> = HashMap::new();
        let mut skipped = 0usize;

        for row in rows {
            let Some(brand_id) = row.brand_id.as_deref() else {
                skipped += 1;
                continue;
            };

            if !slots.contains_key(brand_id) {
                let caption = row.brand_name.as_deref().unwrap_or(brand_id);
                let mut node = Node::new(brand_id, NodeGroup::Brand, caption);
                node.industry = row.brand_industry.clone();
                slots.insert(brand_id.to_string(), Slot::Brand);
                brands.push(node);
            }

            let Some(target_id) = row.target_id.as_deref() else {
                continue;
            };

            let slot = match slots.get(target_id) {
                Some(slot) => *slot,
                None => {
                    let slot = Slot::Target(targets.len());
                    targets.push(self.new_target(target_id, row));
                    slots.insert(target_id.to_string(), slot);
                    slot
                }
            };

            if let Slot::Target(idx) = slot {
                Self::enrich_target(&mut targets[idx], row);
            }

            let platform_key = row
                .platform
                .as_deref()
                .unwrap_or(UNKNOWN_PLATFORM)
                .to_string();
            let key = (brand_id.to_string(), target_id.to_string(), platform_key);
            match link_index.get(&key) {
                Some(&i) => links[i].value += 1,
                None => {
                    let platform = Some(key.2.clone());
                    link_index.insert(key, links.len());
                    links.push(Link {
                        source: brand_id.to_string(),
                        target: target_id.to_string(),
                        link_type: row
                            .rel_type
                            .clone()
                            .unwrap_or_else(|| row.target_kind.default_rel_type().to_string()),
                        platform,
                        value: 1,
                    });
                }
            }
        }

        if skipped > 0 {
            tracing::debug!("Skipped {} rows without a brand id", skipped);
        }

        let mut target_nodes: Vec<Node> = targets.into_iter().map(|t| t.node).collect();

        if let Some(n) = self.options.top_n {
            Self::keep_top_targets(n, &mut brands, &mut target_nodes, &mut links);
        }

        if let Some(sizing) = self.options.sizing {
            Self::apply_sizing(&sizing, &mut brands, &mut target_nodes, &links);
        }

        let mut nodes = brands;
        nodes.extend(target_nodes);
        GraphData { nodes, links }
    }

    fn new_target(&self, target_id: &str, row: &RawEdgeRow) -> TargetEntry {
        let caption = row.target_name.as_deref().unwrap_or(target_id);
        let mut node = Node::new(target_id, row.target_kind.group(), caption);
        node.sentiment = row.sentiment.clone();
        if self.options.enrich && row.target_kind == TargetKind::Topic {
            node.contexts = Some(Vec::new());
            node.evidence = Some(Vec::new());
        }
        TargetEntry {
            node,
            seen_ads: HashSet::new(),
            seen_contexts: HashSet::new(),
        }
    }

    /// Append the row's context and ad evidence to a target, deduplicated.
    /// Targets created without containers (non-enriched, platforms) are left alone.
    fn enrich_target(entry: &mut TargetEntry, row: &RawEdgeRow) {
        if let (Some(context), Some(contexts)) =
            (row.context.as_ref(), entry.node.contexts.as_mut())
        {
            if entry.seen_contexts.insert(context.clone()) {
                contexts.push(context.clone());
            }
        }

        let Some(evidence) = entry.node.evidence.as_mut() else {
            return;
        };
        let Some(ad_id) = row.ad_id.as_ref() else {
            return;
        };
        // The ad is marked seen even without text so a later row can't add it.
        if !entry.seen_ads.insert(ad_id.clone()) {
            return;
        }
        if let Some(text) = row.ad_text.as_ref() {
            evidence.push(Evidence {
                ad_id: ad_id.clone(),
                text: text.clone(),
                url: row.ad_url.clone(),
                date: row.ad_date.clone(),
                platform: row.platform.clone(),
            });
        }
    }

    /// Per-id sum of link values, keyed on the given endpoint.
    fn volumes<'a>(links: &'a [Link], by_target: bool) -> HashMap<&'a str, u64> {
        let mut volumes: HashMap<&str, u64> = HashMap::new();
        for link in links {
            let id = if by_target { &link.target } else { &link.source };
            *volumes.entry(id.as_str()).or_default() += link.value;
        }
        volumes
    }

    fn keep_top_targets(
        n: usize,
        brands: &mut Vec<Node>,
        targets: &mut Vec<Node>,
        links: &mut Vec<Link>,
    ) {
        if targets.len() <= n {
            return;
        }

        let kept: HashSet<String> = {
            let volumes = Self::volumes(links, true);
            let mut ranked: Vec<(&str, u64)> = targets
                .iter()
                .map(|t| (t.id.as_str(), volumes.get(t.id.as_str()).copied().unwrap_or(0)))
                .collect();
            // Stable sort keeps first-seen order among equal volumes.
            ranked.sort_by(|a, b| b.1.cmp(&a.1));
            ranked.into_iter().take(n).map(|(id, _)| id.to_string()).collect()
        };
        let dropped: HashSet<String> = targets
            .iter()
            .filter(|t| !kept.contains(&t.id))
            .map(|t| t.id.clone())
            .collect();

        let linked_before: HashSet<String> = links.iter().map(|l| l.source.clone()).collect();
        targets.retain(|t| kept.contains(&t.id));
        links.retain(|l| !dropped.contains(&l.target));
        let linked_after: HashSet<&str> = links.iter().map(|l| l.source.as_str()).collect();

        // Brands that only pointed at dropped targets go too; brands that
        // never had a link are kept like in every other profile.
        brands.retain(|b| !linked_before.contains(&b.id) || linked_after.contains(b.id.as_str()));

        tracing::debug!(
            "Ranked aggregation kept {} targets, dropped {}",
            targets.len(),
            dropped.len()
        );
    }

    fn apply_sizing(sizing: &Sizing, brands: &mut [Node], targets: &mut [Node], links: &[Link]) {
        let by_target = Self::volumes(links, true);
        let by_brand = Self::volumes(links, false);

        for brand in brands.iter_mut() {
            brand.radius = Some(sizing.brand_radius);
            brand.size = Some(by_brand.get(brand.id.as_str()).copied().unwrap_or(0));
        }
        for target in targets.iter_mut() {
            let volume = by_target.get(target.id.as_str()).copied().unwrap_or(0);
            target.radius = Some(sizing.radius_for(volume));
            target.size = Some(volume);
        }
    }
}

/// Aggregate with the given profile.
pub fn aggregate(rows: &[RawEdgeRow], options: &AggregateOptions) -> GraphData {
    GraphAggregator::new(options.clone()).aggregate(rows)
}

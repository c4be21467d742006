//! Graph shaping: aggregation of query rows and filtering of the result.
//!
//! ```text
//! GraphStore rows ──► aggregator ──► GraphData {nodes, links}
//!                                         │
//!                                      filter ──► FilteredGraph (+ neighbor index)
//! ```
//!
//! ## Modules
//!
//! - [`models`]: Payload types (Node, Link, Evidence, GraphData, GraphMode)
//! - [`aggregator`]: Row deduplication, link weighting, ranking and sizing
//! - [`filter`]: Brand / topic / sentiment / strength filters with adjacency

pub mod aggregator;
pub mod filter;
pub mod models;

pub use aggregator::{aggregate, AggregateOptions, GraphAggregator, Sizing};
pub use filter::{FilterState, FilteredGraph};
pub use models::{Evidence, GraphData, GraphMode, Link, Node, NodeGroup};

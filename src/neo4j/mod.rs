//! Neo4j client and row models for the brand graph

pub mod client;
pub mod convert;
mod impl_graph_store;
pub mod models;
pub mod traits;

pub use client::Neo4jClient;
pub use convert::{to_plain_number, ConversionError, GraphNumber};
pub use models::*;
pub use traits::GraphStore;

#[cfg(test)]
pub(crate) mod mock;

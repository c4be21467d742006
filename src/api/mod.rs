//! HTTP API for the brand graph

pub mod handlers;
pub mod query;
pub mod routes;

pub use query::*;
pub use routes::create_router;

//! API route definitions

use super::handlers;
use crate::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // ====================================================================
        // Graph
        // ====================================================================
        .route("/api/graph", get(handlers::get_graph))
        .route("/api/graph/filter", post(handlers::filter_graph))
        // ====================================================================
        // Response cache
        // ====================================================================
        .route("/api/cache/stats", get(handlers::cache_stats))
        .route("/api/cache", delete(handlers::clear_cache))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

//! API request handlers

use crate::api::GraphParams;
use crate::graph::{FilterState, FilteredGraph, GraphData};
use crate::service::{CacheStats, ServiceError};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;

// ============================================================================
// Health check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Total node count, absent when the database is unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<i64>,
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store = state.graph.store();
    let neo4j_ok = store.health_check().await.unwrap_or(false);

    let nodes = if neo4j_ok {
        match store.count_nodes().await {
            Ok(n) => Some(n),
            Err(e) => {
                tracing::warn!("Node count failed during health check: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    let (http_status, status) = if neo4j_ok {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        http_status,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            nodes,
        }),
    )
}

// ============================================================================
// Graph
// ============================================================================

fn graph_params(
    params: Result<Query<GraphParams>, QueryRejection>,
) -> Result<GraphParams, AppError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    params.validate().map_err(AppError::BadRequest)?;
    Ok(params)
}

/// Aggregated graph for the requested (or configured) mode
pub async fn get_graph(
    State(state): State<AppState>,
    params: Result<Query<GraphParams>, QueryRejection>,
) -> Result<Json<GraphData>, AppError> {
    let params = graph_params(params)?;
    let graph = state.graph.graph(params.mode, params.top_n).await?;
    Ok(Json(GraphData::clone(&graph)))
}

/// Graph with dashboard filters applied
pub async fn filter_graph(
    State(state): State<AppState>,
    params: Result<Query<GraphParams>, QueryRejection>,
    body: Result<Json<FilterState>, JsonRejection>,
) -> Result<Json<FilteredGraph>, AppError> {
    let params = graph_params(params)?;
    let Json(filters) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    if filters.connection_threshold < 0.0 || !filters.connection_threshold.is_finite() {
        return Err(AppError::BadRequest(
            "connectionThreshold must be a finite, non-negative number".to_string(),
        ));
    }

    let filtered = state
        .graph
        .filtered(params.mode, params.top_n, &filters)
        .await?;
    Ok(Json(filtered))
}

// ============================================================================
// Cache
// ============================================================================

pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.graph.stats().await)
}

pub async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    state.graph.invalidate_all().await;
    StatusCode::NO_CONTENT
}

// ============================================================================
// Error handling
// ============================================================================

/// Application error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Graph(ServiceError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, error, details) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Invalid request", msg),
            AppError::Graph(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch graph data",
                e.to_string(),
            ),
        };

        let body = Json(serde_json::json!({
            "error": error,
            "details": details
        }));

        (status, body).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        AppError::Graph(err)
    }
}

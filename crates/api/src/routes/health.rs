use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the warehouse is reachable.
    pub warehouse_healthy: bool,
    /// Whether the document store is reachable.
    pub documents_healthy: bool,
}

/// GET /health -- returns service and store health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (warehouse, documents) = tokio::join!(state.warehouse.ping(), state.documents.ping());
    let warehouse_healthy = warehouse.is_ok();
    let documents_healthy = documents.is_ok();

    let status = if warehouse_healthy && documents_healthy {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        warehouse_healthy,
        documents_healthy,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

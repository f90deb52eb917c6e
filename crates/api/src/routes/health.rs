//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub stock_policy: &'static str,
    pub dual_write_policy: &'static str,
}

/// GET /health: returns system health and the active consistency policies.
pub async fn check<S: Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        stock_policy: state.stock_policy.as_str(),
        dual_write_policy: state.dual_write_policy.as_str(),
    })
}

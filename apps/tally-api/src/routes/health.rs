//! Health endpoint.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

/// `GET /api/health`
///
/// Always 200; a failing database shows up as `degraded`.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let healthy = state.db.health_check().await;

    Json(HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        database: if healthy { "connected" } else { "unavailable" }.to_string(),
    })
}

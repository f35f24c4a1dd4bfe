//! Health check endpoint for monitoring and load balancers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::collections::HashMap;

use super::AppState;

/// Per-component status report
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub database: HashMap<String, String>,
    pub redis: HashMap<String, String>,
}

/// Report the status of the backing stores.
///
/// Always answers 200; consumers inspect the per-component `status` fields.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (database, redis) = tokio::join!(state.db.health(), state.cache.health());
    Json(HealthResponse { database, redis })
}

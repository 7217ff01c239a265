//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connections: usize,
    pub revision: u64,
    pub saved_revision: u64,
    pub content_length: usize,
    pub persist_failures: u64,
    pub uptime_secs: i64,
    pub timestamp: String,
}

/// GET /health - Engine liveness and persistence status
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let engine = &state.engine;
    let revision = engine.snapshot().revision;
    let now = chrono::Utc::now();

    Json(HealthResponse {
        status: "ok",
        connections: engine.connection_count(),
        revision,
        saved_revision: engine.saved_revision(),
        content_length: engine.content_len(),
        persist_failures: engine.persist_failures(),
        uptime_secs: (now - state.started_at).num_seconds().max(0),
        timestamp: now.to_rfc3339(),
    })
}

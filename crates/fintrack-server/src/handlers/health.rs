//! Health check handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use fintrack_core::ai::AIBackend;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Whether a configured AI backend answered its health check
    pub ai_backend: bool,
}

/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let ai_backend = match &state.ai {
        Some(client) => client.health_check().await,
        None => false,
    };
    Json(HealthResponse {
        status: "ok",
        ai_backend,
    })
}

// crates/server/src/routes/health.rs
//! Health check endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    /// Name of the configured extraction engine.
    pub engine: String,
    /// Whether the engine answered a health probe just now.
    pub engine_available: bool,
}

/// GET /api/health — liveness plus engine availability.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let engine_available = state.controller.engine_health().await.is_ok();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.uptime_secs(),
        engine: state.controller.engine_name().to_string(),
        engine_available,
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

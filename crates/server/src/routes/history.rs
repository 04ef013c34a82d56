// crates/server/src/routes/history.rs
//! Terminal-outcome history endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use clipdeck_types::HistoryEntry;

use crate::state::AppState;

/// Entries returned by one history query.
const HISTORY_PAGE: usize = 50;

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct ClearHistoryResponse {
    pub success: bool,
    pub message: String,
}

/// GET /api/history — the most recent terminal outcomes, oldest first.
async fn get_history(State(state): State<Arc<AppState>>) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        success: true,
        history: state.controller.history(HISTORY_PAGE),
    })
}

/// POST /api/clear-history — drop every archived outcome.
async fn clear_history(State(state): State<Arc<AppState>>) -> Json<ClearHistoryResponse> {
    state.controller.clear_history();
    Json(ClearHistoryResponse {
        success: true,
        message: "History cleared".to_string(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/history", get(get_history))
        .route("/clear-history", post(clear_history))
}

// crates/server/src/routes/info.rs
//! Metadata probing for URLs, without downloading.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use clipdeck_core::sanitize::validate_url;
use clipdeck_types::ProbeOutcome;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InfoRequest {
    pub urls: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub success: bool,
    pub videos: Vec<ProbeOutcome>,
}

/// POST /api/info — probe each URL through the engine.
///
/// Per-URL probe failures land in the response as `{error}` entries; the
/// request only fails when no URL survives validation.
async fn fetch_info(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InfoRequest>,
) -> ApiResult<Json<InfoResponse>> {
    let urls = request
        .urls
        .ok_or_else(|| ApiError::BadRequest("No URLs provided".to_string()))?;

    let valid: Vec<String> = urls
        .iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty() && validate_url(url))
        .collect();
    if valid.is_empty() {
        return Err(ApiError::BadRequest("No valid URLs provided".to_string()));
    }

    let mut videos = Vec::with_capacity(valid.len());
    for url in valid {
        match state.controller.probe(&url).await {
            Ok(outcome) => videos.push(outcome),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "probe failed");
                videos.push(ProbeOutcome::Failed {
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(Json(InfoResponse {
        success: true,
        videos,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/info", post(fetch_info))
}

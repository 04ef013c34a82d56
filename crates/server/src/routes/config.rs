// crates/server/src/routes/config.rs
//! Server capability/config endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use clipdeck_types::{SUPPORTED_AUDIO_BITRATES, SUPPORTED_CONTAINERS};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub default_download_dir: String,
    pub supported_formats: Vec<&'static str>,
    pub supported_bitrates: Vec<&'static str>,
    pub max_concurrent: usize,
}

/// GET /api/config — what the server offers and where downloads land.
async fn get_config(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        default_download_dir: state.controller.download_dir().display().to_string(),
        supported_formats: SUPPORTED_CONTAINERS.to_vec(),
        supported_bitrates: SUPPORTED_AUDIO_BITRATES.to_vec(),
        max_concurrent: state.controller.max_concurrent(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/config", get(get_config))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{get_json, test_app};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_config_reports_capabilities() {
        let app = test_app();
        let (status, json) = get_json(app, "/api/config").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["supported_formats"], serde_json::json!(["mp4", "mkv", "webm"]));
        assert_eq!(json["supported_bitrates"], serde_json::json!(["128", "192", "320"]));
        assert_eq!(json["max_concurrent"], 5);
        assert!(json["default_download_dir"].is_string());
    }
}

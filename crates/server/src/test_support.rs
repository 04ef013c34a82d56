// crates/server/src/test_support.rs
//! Shared helpers for route tests: a scripted-engine app and tiny HTTP
//! drivers built on `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use clipdeck_core::engine::ScriptedExtractor;
use clipdeck_core::{ControllerConfig, DownloadController};

use crate::state::AppState;

pub fn test_controller_config() -> ControllerConfig {
    ControllerConfig {
        download_dir: std::env::temp_dir().join("clipdeck-test"),
        ..Default::default()
    }
}

pub fn test_state_with_config(config: ControllerConfig) -> Arc<AppState> {
    let controller = Arc::new(DownloadController::new(
        Arc::new(ScriptedExtractor::new()),
        config,
    ));
    AppState::new(controller)
}

pub fn test_state() -> Arc<AppState> {
    test_state_with_config(test_controller_config())
}

pub fn test_app_with_config(config: ControllerConfig) -> (Router, Arc<AppState>) {
    let state = test_state_with_config(config);
    (crate::create_app(state.clone()), state)
}

pub fn test_app() -> Router {
    test_app_with_config(test_controller_config()).0
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

pub async fn post_json(
    app: Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Poll `/api/status/{id}` until the record reports `expected`.
pub async fn wait_for_status(app: Router, id: &str, expected: &str) {
    for _ in 0..200 {
        let (status, json) = get_json(app.clone(), &format!("/api/status/{id}")).await;
        if status == StatusCode::OK && json["status"] == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("download {id} never reported status {expected}");
}

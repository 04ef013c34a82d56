// crates/server/src/routes/downloads.rs
//! Download submission, status queries and cancellation.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use clipdeck_types::{DownloadItem, JobRecord, JobStatus};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    pub downloads: Option<Vec<DownloadItem>>,
    /// Batch-level fallback directory for items naming none.
    pub download_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub success: bool,
    pub message: String,
    pub download_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusAllResponse {
    pub active_downloads: Vec<JobRecord>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/download — accept a batch. Every accepted item is queued and
/// acknowledged immediately; outcomes are observed via status or the event
/// stream, never through this response.
async fn start_downloads(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DownloadRequest>,
) -> ApiResult<Json<DownloadResponse>> {
    let downloads = request
        .downloads
        .filter(|downloads| !downloads.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No downloads specified".to_string()))?;

    let ids = state
        .controller
        .submit_batch(downloads, request.download_dir)
        .await;

    Ok(Json(DownloadResponse {
        success: true,
        message: format!("Started {} download(s)", ids.len()),
        download_ids: ids,
    }))
}

/// GET /api/status/{id} — one download record.
async fn download_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobRecord>> {
    state
        .controller
        .status(&id)
        .map(Json)
        .ok_or(ApiError::DownloadNotFound(id))
}

/// GET /api/status — snapshot of every tracked download.
async fn all_statuses(State(state): State<Arc<AppState>>) -> Json<StatusAllResponse> {
    let active_downloads = state.controller.status_all();
    let total = active_downloads.len();
    Json(StatusAllResponse {
        active_downloads,
        total,
    })
}

/// POST /api/cancel/{id} — advisory cancellation. Cancelling a job already
/// in a terminal state is a no-op that reports that state.
async fn cancel_download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<CancelResponse>> {
    match state.controller.cancel(&id) {
        None => Err(ApiError::DownloadNotFound(id)),
        Some(status) if status.is_terminal() && status != JobStatus::Cancelled => {
            Ok(Json(CancelResponse {
                success: true,
                message: format!("Download already {status}"),
            }))
        }
        Some(_) => Ok(Json(CancelResponse {
            success: true,
            message: "Download cancelled".to_string(),
        })),
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/download", post(start_downloads))
        .route("/status", get(all_statuses))
        .route("/status/{id}", get(download_status))
        .route("/cancel/{id}", post(cancel_download))
}

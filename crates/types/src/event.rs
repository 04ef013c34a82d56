// crates/types/src/event.rs
//! Progress events published to the SSE stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::JobProgress;
use crate::status::JobStatus;

/// One progress event, fanned out to every live subscriber.
///
/// The payload mirrors the registry's view of the job at publish time: the
/// worker performs the registry update and publishes the merged result as a
/// single unit, so a client never sees the stream and a status query
/// disagree by more than the event in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub download_id: String,
    pub status: JobStatus,

    #[serde(flatten)]
    pub progress: JobProgress,

    /// Human-readable phase note (e.g. "Initializing download...").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filepath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// A bare status-change event with an optional message.
    pub fn status_change(
        download_id: impl Into<String>,
        status: JobStatus,
        message: Option<String>,
    ) -> Self {
        Self {
            download_id: download_id.into(),
            status,
            progress: JobProgress::default(),
            message,
            title: None,
            filepath: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// A `downloading`/`converting` event carrying progress fields.
    pub fn progress(download_id: impl Into<String>, status: JobStatus, progress: JobProgress) -> Self {
        Self {
            download_id: download_id.into(),
            status,
            progress,
            message: None,
            title: None,
            filepath: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_filepath(mut self, filepath: impl Into<String>) -> Self {
        self.filepath = Some(filepath.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_change_event_shape() {
        let event = ProgressEvent::status_change(
            "a1b2c3d4",
            JobStatus::Starting,
            Some("Initializing download...".to_string()),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["download_id"], "a1b2c3d4");
        assert_eq!(json["status"], "starting");
        assert_eq!(json["message"], "Initializing download...");
        assert!(json.get("percent").is_none());
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_progress_event_carries_flattened_fields() {
        let progress = JobProgress {
            percent: Some(42.0),
            downloaded: Some("4.2 MB".to_string()),
            total: Some("10.0 MB".to_string()),
            speed: Some("1.0 MB/s".to_string()),
            eta: Some("6s".to_string()),
            filename: Some("clip.mp4".to_string()),
        };
        let event = ProgressEvent::progress("a1b2c3d4", JobStatus::Downloading, progress);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["percent"], 42.0);
        assert_eq!(json["eta"], "6s");
        assert_eq!(json["filename"], "clip.mp4");
    }

    #[test]
    fn test_failure_event_carries_error() {
        let event = ProgressEvent::status_change("a1b2c3d4", JobStatus::Failed, None)
            .with_error("HTTP 403: Forbidden");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "HTTP 403: Forbidden");
    }
}

// crates/types/src/record.rs
//! The job record: one download's full observable state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::options::DownloadOptions;
use crate::status::JobStatus;

/// Mutable progress fields of a running download.
///
/// Byte counts, speed and ETA are carried as pre-formatted human-readable
/// strings: display values, produced once at the progress callback so the
/// registry and the event stream always agree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobProgress {
    /// Percent complete, 0.0–100.0. Absent while the total size is unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloaded: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,

    /// Name of the file currently being written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// One download job as tracked by the registry and returned by status
/// queries.
///
/// Exactly one worker writes a record at a time; everyone else sees cloned
/// snapshots. `result`-ish fields (`title`, `filepath`, `error`) are only
/// populated at the terminal transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub download_id: String,
    pub url: String,
    pub options: DownloadOptions,
    pub status: JobStatus,

    #[serde(flatten)]
    pub progress: JobProgress,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,

    /// Media title, resolved at completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Final output path on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filepath: Option<String>,
    /// Engine error text on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobRecord {
    /// Create a fresh record in `queued` status.
    pub fn new(download_id: impl Into<String>, url: impl Into<String>, options: DownloadOptions) -> Self {
        Self {
            download_id: download_id.into(),
            url: url.into(),
            options,
            status: JobStatus::Queued,
            progress: JobProgress::default(),
            started_at: None,
            completed_at: None,
            failed_at: None,
            title: None,
            filepath: None,
            error: None,
        }
    }
}

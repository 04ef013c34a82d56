// crates/types/src/history.rs
//! Immutable snapshots of terminal job outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::JobRecord;
use crate::status::JobStatus;

/// One terminal outcome, appended to the history ring exactly once.
///
/// Decoupled from the live registry so completed jobs stay queryable after
/// the process has moved on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub download_id: String,
    pub url: String,
    pub status: JobStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filepath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub finished_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Snapshot a record that has just reached a terminal state.
    pub fn from_record(record: &JobRecord) -> Self {
        let filename = record
            .filepath
            .as_deref()
            .and_then(|p| std::path::Path::new(p).file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .or_else(|| record.progress.filename.clone());
        Self {
            download_id: record.download_id.clone(),
            url: record.url.clone(),
            status: record.status,
            title: record.title.clone(),
            filename,
            filepath: record.filepath.clone(),
            error: record.error.clone(),
            finished_at: record
                .completed_at
                .or(record.failed_at)
                .unwrap_or_else(Utc::now),
        }
    }
}

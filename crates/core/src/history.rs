// crates/core/src/history.rs
//! Bounded append-only record of terminal job outcomes.

use std::collections::VecDeque;
use std::sync::Mutex;

use clipdeck_types::HistoryEntry;

/// Terminal entries retained before the oldest is evicted.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Ring of the most recent terminal outcomes, decoupled from the live
/// registry so finished jobs stay visible however long the process runs.
pub struct HistoryLog {
    entries: Mutex<VecDeque<HistoryEntry>>,
    capacity: usize,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
            capacity: capacity.max(1),
        }
    }

    /// Append a terminal snapshot, evicting the oldest entry at capacity.
    pub fn append(&self, entry: HistoryEntry) {
        match self.entries.lock() {
            Ok(mut entries) => {
                if entries.len() == self.capacity {
                    entries.pop_front();
                }
                entries.push_back(entry);
            }
            Err(e) => tracing::error!("history lock poisoned on append: {e}"),
        }
    }

    /// The most recent `limit` entries, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<HistoryEntry> {
        match self.entries.lock() {
            Ok(entries) => {
                let skip = entries.len().saturating_sub(limit);
                entries.iter().skip(skip).cloned().collect()
            }
            Err(e) => {
                tracing::error!("history lock poisoned on read: {e}");
                Vec::new()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipdeck_types::{DownloadOptions, JobRecord, JobStatus};

    fn entry(id: &str) -> HistoryEntry {
        let mut record = JobRecord::new(id, "https://example.com/v", DownloadOptions::default());
        record.status = JobStatus::Completed;
        HistoryEntry::from_record(&record)
    }

    #[test]
    fn test_append_and_read_back_in_order() {
        let log = HistoryLog::new();
        log.append(entry("one"));
        log.append(entry("two"));
        let recent = log.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].download_id, "one");
        assert_eq!(recent[1].download_id, "two");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let log = HistoryLog::with_capacity(50);
        for i in 0..51 {
            log.append(entry(&format!("job-{i}")));
        }
        assert_eq!(log.len(), 50);
        let recent = log.recent(50);
        // "job-0" was evicted by the 51st append.
        assert_eq!(recent[0].download_id, "job-1");
        assert_eq!(recent[49].download_id, "job-50");
    }

    #[test]
    fn test_recent_limits_to_newest() {
        let log = HistoryLog::new();
        for i in 0..5 {
            log.append(entry(&format!("job-{i}")));
        }
        let recent = log.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].download_id, "job-3");
        assert_eq!(recent[1].download_id, "job-4");
    }

    #[test]
    fn test_clear() {
        let log = HistoryLog::new();
        log.append(entry("one"));
        log.clear();
        assert!(log.is_empty());
        assert!(log.recent(10).is_empty());
    }
}

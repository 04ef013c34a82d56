// crates/core/src/registry.rs
//! Thread-safe job registry: the single source of truth for job state.

use std::collections::HashMap;
use std::sync::RwLock;

use clipdeck_types::{JobProgress, JobRecord, JobStatus};

use crate::error::RegistryError;

/// Registry of all download jobs for the process lifetime.
///
/// One `RwLock` scoped to the map; mutations hold it only for the duration
/// of the merge, and it is never held across an await point. Readers get
/// cloned snapshots, never references into the map.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, JobRecord>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record. The record arrives in `queued` status from
    /// `JobRecord::new`; ids must be unique.
    pub fn create(&self, record: JobRecord) -> Result<(), RegistryError> {
        match self.jobs.write() {
            Ok(mut jobs) => {
                if jobs.contains_key(&record.download_id) {
                    return Err(RegistryError::DuplicateId {
                        id: record.download_id,
                    });
                }
                jobs.insert(record.download_id.clone(), record);
                Ok(())
            }
            Err(e) => {
                tracing::error!("registry lock poisoned on create: {e}");
                Ok(())
            }
        }
    }

    /// Clone the record for `id`, if tracked.
    pub fn get(&self, id: &str) -> Option<JobRecord> {
        match self.jobs.read() {
            Ok(jobs) => jobs.get(id).cloned(),
            Err(e) => {
                tracing::error!("registry lock poisoned on get: {e}");
                None
            }
        }
    }

    /// Copy of every record, not a live view, so callers can iterate
    /// without racing mutations.
    pub fn snapshot(&self) -> Vec<JobRecord> {
        match self.jobs.read() {
            Ok(jobs) => jobs.values().cloned().collect(),
            Err(e) => {
                tracing::error!("registry lock poisoned on snapshot: {e}");
                Vec::new()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.read().map(|jobs| jobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merge progress fields into a live record and return the merged
    /// snapshot, or `None` when the id is unknown or the record is terminal
    /// (a stale callback against a cancelled/finished job is a no-op).
    ///
    /// Progress implies the transfer phase: a record still in `starting` (or
    /// back from `converting`) is moved to `downloading` here. Percent is
    /// clamped non-decreasing so observers never see progress move backwards
    /// within a job.
    pub fn update_progress(&self, id: &str, patch: JobProgress) -> Option<JobRecord> {
        let mut jobs = match self.jobs.write() {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!("registry lock poisoned on update: {e}");
                return None;
            }
        };
        let record = jobs.get_mut(id)?;
        if record.status.is_terminal() {
            return None;
        }
        if record.status != JobStatus::Downloading
            && record.status.can_transition_to(JobStatus::Downloading)
        {
            record.status = JobStatus::Downloading;
        }

        if let Some(percent) = patch.percent {
            let current = record.progress.percent.unwrap_or(0.0);
            record.progress.percent = Some(percent.max(current));
        }
        if patch.downloaded.is_some() {
            record.progress.downloaded = patch.downloaded;
        }
        if patch.total.is_some() {
            record.progress.total = patch.total;
        }
        if patch.speed.is_some() {
            record.progress.speed = patch.speed;
        }
        if patch.eta.is_some() {
            record.progress.eta = patch.eta;
        }
        if patch.filename.is_some() {
            record.progress.filename = patch.filename;
        }
        Some(record.clone())
    }

    /// Apply a state-machine transition. `mutate` runs against the record
    /// under the lock only when the transition is accepted; the merged
    /// snapshot is returned so callers can publish and archive exactly what
    /// was stored. Rejected transitions (unknown id, terminal record,
    /// illegal edge) return `None` and are ignored, not errors.
    pub fn transition(
        &self,
        id: &str,
        next: JobStatus,
        mutate: impl FnOnce(&mut JobRecord),
    ) -> Option<JobRecord> {
        let mut jobs = match self.jobs.write() {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!("registry lock poisoned on transition: {e}");
                return None;
            }
        };
        let record = jobs.get_mut(id)?;
        if !record.status.can_transition_to(next) {
            tracing::debug!(
                download_id = %id,
                from = %record.status,
                to = %next,
                "transition rejected"
            );
            return None;
        }
        record.status = next;
        mutate(record);
        Some(record.clone())
    }
}

// crates/core/src/controller.rs
//! Orchestration façade: accepts batches, allocates ids, submits work, and
//! answers status/cancel/history queries.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use clipdeck_types::{
    DownloadItem, DownloadOptions, HistoryEntry, JobRecord, JobStatus, ProbeOutcome, ProgressEvent,
};

use crate::bus::{EventBus, Subscription, DEFAULT_SUBSCRIBER_CAPACITY};
use crate::engine::{EngineError, MediaExtractor};
use crate::error::RegistryError;
use crate::history::{HistoryLog, DEFAULT_HISTORY_CAPACITY};
use crate::pool::{JobContext, WorkerPool, DEFAULT_QUEUE_CAPACITY};
use crate::registry::JobRegistry;
use crate::sanitize::{sanitize_url, validate_url};

/// Workers running download bodies concurrently.
pub const DEFAULT_WORKERS: usize = 5;

/// Tunables for a controller instance.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    pub subscriber_capacity: usize,
    pub history_capacity: usize,
    /// Directory downloads land in when a request names none.
    pub download_dir: PathBuf,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            subscriber_capacity: DEFAULT_SUBSCRIBER_CAPACITY,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            download_dir: default_download_dir(),
        }
    }
}

/// `~/Downloads/clipdeck`, with sensible fallbacks for headless systems.
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(std::env::temp_dir)
        .join("clipdeck")
}

/// The job orchestration façade.
///
/// Owns the registry, the event bus, the history ring and the worker pool;
/// every HTTP handler goes through here. Submission is fire-and-forget:
/// callers get ids back immediately and observe outcomes via status queries
/// or the event stream.
pub struct DownloadController {
    registry: Arc<JobRegistry>,
    bus: EventBus,
    history: Arc<HistoryLog>,
    pool: WorkerPool,
    extractor: Arc<dyn MediaExtractor>,
    download_dir: PathBuf,
}

impl DownloadController {
    pub fn new(extractor: Arc<dyn MediaExtractor>, config: ControllerConfig) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let bus = EventBus::with_capacity(config.subscriber_capacity);
        let history = Arc::new(HistoryLog::with_capacity(config.history_capacity));
        let ctx = Arc::new(JobContext {
            registry: Arc::clone(&registry),
            bus: bus.clone(),
            history: Arc::clone(&history),
            extractor: Arc::clone(&extractor),
            default_dir: config.download_dir.clone(),
        });
        let pool = WorkerPool::spawn(config.workers, config.queue_capacity, ctx);
        Self {
            registry,
            bus,
            history,
            pool,
            extractor,
            download_dir: config.download_dir,
        }
    }

    /// Accept a batch of download requests. Invalid URLs are skipped; every
    /// accepted item gets a registry record in `queued` and a slot in the
    /// work queue. Acceptance means queued, not started.
    pub async fn submit_batch(
        &self,
        items: Vec<DownloadItem>,
        fallback_dir: Option<PathBuf>,
    ) -> Vec<String> {
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            let url = sanitize_url(item.url.trim());
            if url.is_empty() || !validate_url(&url) {
                tracing::warn!(url = %item.url, "skipping invalid download URL");
                continue;
            }
            let mut options = item.options;
            if options.download_dir.is_none() {
                options.download_dir = fallback_dir.clone();
            }

            let id = self.register(&url, options.clone());
            if let Err(e) = self.pool.submit(id.clone(), url.clone(), options).await {
                tracing::error!(download_id = %id, error = %e, "failed to enqueue download");
                self.cancel(&id);
            } else {
                tracing::info!(download_id = %id, url = %url, "download accepted");
            }
            ids.push(id);
        }
        ids
    }

    /// Insert a fresh `queued` record, regenerating the short id on the
    /// (astronomically rare) collision.
    fn register(&self, url: &str, options: DownloadOptions) -> String {
        loop {
            let id = short_id();
            match self
                .registry
                .create(JobRecord::new(&id, url, options.clone()))
            {
                Ok(()) => return id,
                Err(RegistryError::DuplicateId { id }) => {
                    tracing::debug!(download_id = %id, "id collision, regenerating");
                }
            }
        }
    }

    /// Probe a URL's metadata through the engine.
    pub async fn probe(&self, url: &str) -> Result<ProbeOutcome, EngineError> {
        self.extractor.probe(&sanitize_url(url)).await
    }

    pub fn status(&self, id: &str) -> Option<JobRecord> {
        self.registry.get(id)
    }

    pub fn status_all(&self) -> Vec<JobRecord> {
        self.registry.snapshot()
    }

    /// Mark a job cancelled. Advisory only: an in-flight engine transfer is
    /// not interrupted, but the record goes terminal, one `cancelled` event
    /// is published, the outcome is archived, and every later update from
    /// the worker is absorbed by the terminal guard.
    ///
    /// Cancelling an already-terminal job is a no-op that reports the
    /// existing terminal status; `None` means the id is unknown.
    pub fn cancel(&self, id: &str) -> Option<JobStatus> {
        if let Some(record) = self.registry.transition(id, JobStatus::Cancelled, |_| {}) {
            tracing::info!(download_id = %id, "download cancelled");
            self.bus
                .publish(&ProgressEvent::status_change(id, JobStatus::Cancelled, None));
            self.history.append(HistoryEntry::from_record(&record));
            return Some(JobStatus::Cancelled);
        }
        self.registry.get(id).map(|record| record.status)
    }

    /// The most recent `limit` terminal outcomes, oldest first.
    pub fn history(&self, limit: usize) -> Vec<HistoryEntry> {
        self.history.recent(limit)
    }

    pub fn clear_history(&self) {
        self.history.clear();
    }

    /// Attach a new event-stream subscriber.
    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    /// Pool size K: the maximum number of concurrently executing jobs.
    pub fn max_concurrent(&self) -> usize {
        self.pool.size()
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Engine availability, surfaced by the health endpoint.
    pub async fn engine_health(&self) -> Result<(), EngineError> {
        self.extractor.health_check().await
    }

    pub fn engine_name(&self) -> &str {
        self.extractor.name()
    }
}

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

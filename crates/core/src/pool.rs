// crates/core/src/pool.rs
//! Bounded worker pool and the job body it executes.
//!
//! A fixed set of K workers drains one bounded work queue. Submission awaits
//! queue space instead of spawning a task per job, so a burst of submissions
//! can never exceed K concurrent engine processes.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};

use clipdeck_types::{DownloadOptions, HistoryEntry, JobProgress, JobStatus, ProgressEvent};

use crate::bus::EventBus;
use crate::engine::{EnginePhase, EngineProgress, EngineRequest, MediaExtractor};
use crate::error::SubmitError;
use crate::format::{format_eta, format_size, format_speed};
use crate::history::HistoryLog;
use crate::registry::JobRegistry;

/// Jobs that can sit in the work queue before `submit` waits.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Shared collaborators every job body needs.
pub(crate) struct JobContext {
    pub registry: Arc<JobRegistry>,
    pub bus: EventBus,
    pub history: Arc<HistoryLog>,
    pub extractor: Arc<dyn MediaExtractor>,
    pub default_dir: PathBuf,
}

/// One queued unit of work.
pub(crate) struct QueuedJob {
    pub id: String,
    pub url: String,
    pub options: DownloadOptions,
}

/// Fixed-size executor for download jobs.
pub(crate) struct WorkerPool {
    tx: mpsc::Sender<QueuedJob>,
    size: usize,
}

impl WorkerPool {
    /// Spawn `size` workers sharing one bounded queue.
    pub fn spawn(size: usize, queue_capacity: usize, ctx: Arc<JobContext>) -> Self {
        let size = size.max(1);
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        for worker in 0..size {
            let rx = Arc::clone(&rx);
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move {
                loop {
                    // The receiver lock is only contended while workers are
                    // idle; a worker holding it through `recv` just means it
                    // gets the next job.
                    let job = { rx.lock().await.recv().await };
                    let Some(job) = job else { break };
                    run_job(&ctx, job).await;
                }
                tracing::debug!(worker, "download worker exited");
            });
        }

        Self { tx, size }
    }

    /// Enqueue a job, waiting if the queue is full. Fails only once the pool
    /// has shut down.
    pub async fn submit(
        &self,
        id: String,
        url: String,
        options: DownloadOptions,
    ) -> Result<(), SubmitError> {
        self.tx
            .send(QueuedJob { id, url, options })
            .await
            .map_err(|_| SubmitError::PoolClosed)
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

/// Execute one download job end to end.
pub(crate) async fn run_job(ctx: &JobContext, job: QueuedJob) {
    // A job cancelled while it sat in the queue is skipped here.
    if ctx
        .registry
        .transition(&job.id, JobStatus::Starting, |r| {
            r.started_at = Some(Utc::now());
        })
        .is_none()
    {
        tracing::debug!(download_id = %job.id, "job no longer runnable, skipping");
        return;
    }
    ctx.bus.publish(&ProgressEvent::status_change(
        &job.id,
        JobStatus::Starting,
        Some("Initializing download...".to_string()),
    ));
    tracing::info!(download_id = %job.id, url = %job.url, "download starting");

    let request = EngineRequest::from_options(&job.url, &job.options, &ctx.default_dir);
    let sink = |progress: EngineProgress| handle_engine_progress(ctx, &job.id, progress);

    match ctx.extractor.download(&request, &sink).await {
        Ok(outcome) => {
            let filepath = outcome.filepath.display().to_string();
            if let Some(record) = ctx.registry.transition(&job.id, JobStatus::Completed, |r| {
                r.completed_at = Some(Utc::now());
                r.filepath = Some(filepath.clone());
                r.title = outcome.title.clone();
                r.progress.percent = Some(100.0);
            }) {
                let mut event = ProgressEvent::status_change(&job.id, JobStatus::Completed, None)
                    .with_filepath(filepath.clone());
                if let Some(title) = &record.title {
                    event = event.with_title(title.clone());
                }
                event.progress.percent = Some(100.0);
                ctx.bus.publish(&event);
                ctx.history.append(HistoryEntry::from_record(&record));
                tracing::info!(download_id = %job.id, filepath = %filepath, "download completed");
            }
        }
        Err(e) => fail_job(ctx, &job.id, e.to_string()),
    }
}

/// Translate one engine callback into the registry update and the bus
/// publication, as a single unit on the worker's own task. A record that
/// has gone terminal (e.g. cancelled mid-transfer) absorbs the callback
/// silently.
fn handle_engine_progress(ctx: &JobContext, id: &str, progress: EngineProgress) {
    match progress.phase {
        EnginePhase::Downloading => {
            let percent = match (progress.downloaded_bytes, progress.total_bytes) {
                (Some(downloaded), Some(total)) if total > 0 => {
                    Some(((downloaded as f64 / total as f64) * 1000.0).round() / 10.0)
                }
                // Unknown total: indeterminate, no percent.
                _ => None,
            };
            let patch = JobProgress {
                percent,
                downloaded: progress.downloaded_bytes.map(|b| format_size(Some(b))),
                total: progress.total_bytes.map(|b| format_size(Some(b))),
                speed: progress.speed_bps.map(|s| format_speed(Some(s))),
                eta: progress.eta_secs.map(|e| format_eta(Some(e))),
                filename: progress.filename,
            };
            if let Some(record) = ctx.registry.update_progress(id, patch) {
                ctx.bus.publish(&ProgressEvent::progress(
                    id,
                    record.status,
                    record.progress.clone(),
                ));
            }
        }
        EnginePhase::Finished => {
            if let Some(record) = ctx.registry.transition(id, JobStatus::Converting, |r| {
                r.progress.percent = Some(100.0);
            }) {
                let mut event = ProgressEvent::status_change(
                    id,
                    record.status,
                    Some("Post-processing (merging/converting)...".to_string()),
                );
                event.progress.percent = Some(100.0);
                ctx.bus.publish(&event);
            }
        }
        EnginePhase::Error => {
            let message = progress
                .error
                .unwrap_or_else(|| "Unknown engine error".to_string());
            fail_job(ctx, id, message);
        }
    }
}

/// Move a job to `failed`, publish the failure, and archive it, exactly
/// once. The transition guard makes a second failure report (late callback
/// plus the engine's own error return) a no-op.
fn fail_job(ctx: &JobContext, id: &str, error: String) {
    if let Some(record) = ctx.registry.transition(id, JobStatus::Failed, |r| {
        r.failed_at = Some(Utc::now());
        r.error = Some(error.clone());
    }) {
        tracing::warn!(download_id = %id, error = %error, "download failed");
        ctx.bus.publish(
            &ProgressEvent::status_change(id, JobStatus::Failed, None).with_error(error),
        );
        ctx.history.append(HistoryEntry::from_record(&record));
    } else {
        tracing::debug!(download_id = %id, "failure after terminal state ignored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ScriptedExtractor;
    use clipdeck_types::JobRecord;
    use std::time::Duration;

    fn context(extractor: Arc<ScriptedExtractor>) -> Arc<JobContext> {
        Arc::new(JobContext {
            registry: Arc::new(JobRegistry::new()),
            bus: EventBus::new(),
            history: Arc::new(HistoryLog::new()),
            extractor,
            default_dir: std::env::temp_dir().join("clipdeck-test"),
        })
    }

    fn queued(ctx: &JobContext, id: &str) -> QueuedJob {
        ctx.registry
            .create(JobRecord::new(id, "https://example.com/v", DownloadOptions::default()))
            .unwrap();
        QueuedJob {
            id: id.to_string(),
            url: "https://example.com/v".to_string(),
            options: DownloadOptions::default(),
        }
    }

    async fn wait_for_terminal(ctx: &JobContext, id: &str) -> JobStatus {
        for _ in 0..200 {
            if let Some(record) = ctx.registry.get(id) {
                if record.status.is_terminal() {
                    return record.status;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job {id} never reached a terminal state");
    }

    #[tokio::test]
    async fn test_pool_runs_submitted_job_to_completion() {
        let extractor = Arc::new(ScriptedExtractor::new());
        let ctx = context(Arc::clone(&extractor));
        let pool = WorkerPool::spawn(2, 8, Arc::clone(&ctx));

        let job = queued(&ctx, "job-1");
        pool.submit(job.id.clone(), job.url, job.options).await.unwrap();

        assert_eq!(wait_for_terminal(&ctx, "job-1").await, JobStatus::Completed);
        let record = ctx.registry.get("job-1").unwrap();
        assert_eq!(record.progress.percent, Some(100.0));
        assert!(record.filepath.is_some());
        assert_eq!(ctx.history.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_job_is_archived_once() {
        let extractor = Arc::new(ScriptedExtractor::failing_with("HTTP 403"));
        let ctx = context(Arc::clone(&extractor));
        let pool = WorkerPool::spawn(1, 8, Arc::clone(&ctx));

        let job = queued(&ctx, "job-1");
        pool.submit(job.id.clone(), job.url, job.options).await.unwrap();

        assert_eq!(wait_for_terminal(&ctx, "job-1").await, JobStatus::Failed);
        let record = ctx.registry.get("job-1").unwrap();
        assert!(record.error.as_deref().unwrap().contains("403"));
        assert!(record.failed_at.is_some());
        assert_eq!(ctx.history.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_job_is_skipped_by_worker() {
        let extractor = Arc::new(ScriptedExtractor::new());
        let ctx = context(Arc::clone(&extractor));

        let job = queued(&ctx, "job-1");
        ctx.registry.transition("job-1", JobStatus::Cancelled, |_| {});

        run_job(&ctx, job).await;
        assert_eq!(extractor.downloads_started(), 0);
        assert_eq!(ctx.registry.get("job-1").unwrap().status, JobStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_mid_stream_engine_error_phase_fails_job() {
        let extractor = Arc::new(ScriptedExtractor::with_script(vec![
            EngineProgress::downloading(1024, Some(4096)),
            EngineProgress::error("connection reset"),
        ]));
        let ctx = context(Arc::clone(&extractor));

        let job = queued(&ctx, "job-1");
        run_job(&ctx, job).await;

        let record = ctx.registry.get("job-1").unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("connection reset"));
        // The engine also returned Ok afterwards; only one history entry.
        assert_eq!(ctx.history.len(), 1);
    }
}

// crates/core/src/engine/scripted.rs
//! In-process extractor that replays a canned progress script.
//!
//! Backs the orchestration tests (pool concurrency bounds, monotonic
//! progress, terminal handling) and a no-network demo mode. The concurrency
//! counters exist so tests can assert that at most K downloads ever ran at
//! once.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use clipdeck_types::{ProbeOutcome, ProbeResult, SUPPORTED_AUDIO_BITRATES, SUPPORTED_CONTAINERS};

use super::extractor::MediaExtractor;
use super::types::{DownloadOutcome, EngineError, EngineProgress, EngineRequest};

/// Extractor that emits a fixed sequence of progress callbacks and then
/// succeeds (or fails with a configured error).
pub struct ScriptedExtractor {
    script: Vec<EngineProgress>,
    failure: Option<String>,
    step_delay: Duration,
    title: String,
    active: AtomicUsize,
    peak_active: AtomicUsize,
    started: AtomicUsize,
}

impl ScriptedExtractor {
    /// A short successful download: 25% → 50% → 100% → finished.
    pub fn new() -> Self {
        let total = 10 * 1024 * 1024;
        Self::with_script(vec![
            EngineProgress::downloading(total / 4, Some(total)).with_speed(1024.0 * 1024.0),
            EngineProgress::downloading(total / 2, Some(total))
                .with_speed(1024.0 * 1024.0)
                .with_eta(5),
            EngineProgress::downloading(total, Some(total)),
            EngineProgress::finished(),
        ])
    }

    pub fn with_script(script: Vec<EngineProgress>) -> Self {
        Self {
            script,
            failure: None,
            step_delay: Duration::ZERO,
            title: "Scripted Clip".to_string(),
            active: AtomicUsize::new(0),
            peak_active: AtomicUsize::new(0),
            started: AtomicUsize::new(0),
        }
    }

    /// Fail every download with `error` after the script has played.
    pub fn failing_with(error: impl Into<String>) -> Self {
        let mut extractor = Self::with_script(Vec::new());
        extractor.failure = Some(error.into());
        extractor
    }

    /// Sleep between script steps, to hold downloads open long enough for
    /// concurrency assertions.
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Highest number of downloads that were ever in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak_active.load(Ordering::SeqCst)
    }

    /// Total downloads that have entered the engine.
    pub fn downloads_started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    fn output_path(&self, request: &EngineRequest) -> PathBuf {
        let ext = if request.audio_only {
            "mp3"
        } else {
            request.container.as_str()
        };
        let template = request.output_template.display().to_string();
        PathBuf::from(
            template
                .replace("%(title)s", &self.title)
                .replace("%(ext)s", ext),
        )
    }
}

impl Default for ScriptedExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaExtractor for ScriptedExtractor {
    async fn probe(&self, url: &str) -> Result<ProbeOutcome, EngineError> {
        Ok(ProbeOutcome::Video(Box::new(ProbeResult {
            success: true,
            url: url.to_string(),
            id: None,
            title: self.title.clone(),
            description: None,
            duration: Some(125),
            duration_string: "2:05".to_string(),
            thumbnail: None,
            uploader: None,
            view_count: None,
            platform: "Scripted".to_string(),
            webpage_url: Some(url.to_string()),
            resolutions: vec!["1080p".to_string(), "720p".to_string()],
            video_formats: Vec::new(),
            audio_formats: Vec::new(),
            available_containers: SUPPORTED_CONTAINERS.into_iter().map(str::to_string).collect(),
            available_audio_bitrates: SUPPORTED_AUDIO_BITRATES
                .into_iter()
                .map(str::to_string)
                .collect(),
            playlist_index: None,
            playlist_title: None,
        })))
    }

    async fn download(
        &self,
        request: &EngineRequest,
        on_progress: &(dyn Fn(EngineProgress) + Send + Sync),
    ) -> Result<DownloadOutcome, EngineError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(now_active, Ordering::SeqCst);

        for step in &self.script {
            if !self.step_delay.is_zero() {
                tokio::time::sleep(self.step_delay).await;
            }
            on_progress(step.clone());
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        match &self.failure {
            Some(error) => Err(EngineError::Failed(error.clone())),
            None => Ok(DownloadOutcome {
                filepath: self.output_path(request),
                title: Some(self.title.clone()),
            }),
        }
    }

    async fn health_check(&self) -> Result<(), EngineError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

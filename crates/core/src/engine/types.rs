// crates/core/src/engine/types.rs
//! Request/progress/error types for the extraction engine boundary.

use std::path::{Path, PathBuf};

use thiserror::Error;

use clipdeck_types::DownloadOptions;

use crate::sanitize::sanitize_filename;

/// Phase reported by an engine progress callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnginePhase {
    /// Bytes are moving.
    #[default]
    Downloading,
    /// Transfer done, post-processing (merge/convert) has begun.
    Finished,
    /// The engine hit an error mid-transfer.
    Error,
}

/// One progress callback payload from the engine.
#[derive(Debug, Clone, Default)]
pub struct EngineProgress {
    pub phase: EnginePhase,
    pub downloaded_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
    pub speed_bps: Option<f64>,
    pub eta_secs: Option<u64>,
    pub filename: Option<String>,
    pub error: Option<String>,
}

impl EngineProgress {
    pub fn downloading(downloaded: u64, total: Option<u64>) -> Self {
        Self {
            phase: EnginePhase::Downloading,
            downloaded_bytes: Some(downloaded),
            total_bytes: total,
            ..Default::default()
        }
    }

    pub fn finished() -> Self {
        Self {
            phase: EnginePhase::Finished,
            ..Default::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            phase: EnginePhase::Error,
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_speed(mut self, bytes_per_sec: f64) -> Self {
        self.speed_bps = Some(bytes_per_sec);
        self
    }

    pub fn with_eta(mut self, secs: u64) -> Self {
        self.eta_secs = Some(secs);
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// Structured download request handed to the engine: the job options after
/// directory resolution, filename sanitization and resolution parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineRequest {
    pub url: String,
    /// Height ceiling in pixels; `None` means best available.
    pub resolution: Option<u32>,
    /// Output container for video downloads.
    pub container: String,
    pub audio_only: bool,
    /// MP3 bitrate in kbit/s, used when `audio_only` is set.
    pub audio_bitrate: String,
    /// Directory the output lands in (created by the engine if missing).
    pub output_dir: PathBuf,
    /// yt-dlp output template, e.g. `/dir/%(title)s.%(ext)s`.
    pub output_template: PathBuf,
}

impl EngineRequest {
    /// Resolve a job's options into a concrete engine request.
    ///
    /// `fallback_dir` is the server default; per-job directories win.
    /// `create_subfolder` routes output into `Audio/` or `Video/`.
    pub fn from_options(url: &str, options: &DownloadOptions, fallback_dir: &Path) -> Self {
        let mut output_dir = options
            .download_dir
            .clone()
            .unwrap_or_else(|| fallback_dir.to_path_buf());
        if options.create_subfolder {
            output_dir = output_dir.join(if options.audio_only { "Audio" } else { "Video" });
        }

        let stem = match options.output_filename.as_deref().filter(|f| !f.is_empty()) {
            Some(custom) => sanitize_filename(custom),
            None => "%(title)s".to_string(),
        };
        let output_template = output_dir.join(format!("{stem}.%(ext)s"));

        Self {
            url: url.to_string(),
            resolution: parse_resolution(&options.resolution),
            container: options.format.clone(),
            audio_only: options.audio_only,
            audio_bitrate: options.audio_bitrate.clone(),
            output_dir,
            output_template,
        }
    }
}

/// Parse a `"720p"`-style resolution into a height ceiling. `"best"` and
/// anything non-numeric mean no ceiling.
pub fn parse_resolution(resolution: &str) -> Option<u32> {
    let trimmed = resolution.trim().trim_end_matches(['p', 'P']);
    if trimmed.eq_ignore_ascii_case("best") || trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

/// Final result of a successful download.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOutcome {
    /// Resolved output file path after all post-processing.
    pub filepath: PathBuf,
    /// Media title, when the engine could determine one.
    pub title: Option<String>,
}

/// Errors from the extraction engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to spawn extractor process: {0}")]
    SpawnFailed(String),

    #[error("Extractor not available: {0}")]
    NotAvailable(String),

    #[error("Download failed: {0}")]
    Failed(String),

    #[error("Failed to parse extractor output: {0}")]
    ParseFailed(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),
}

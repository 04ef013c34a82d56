// crates/core/src/engine/extractor.rs
//! MediaExtractor trait defining the interface to the download engine.

use async_trait::async_trait;

use clipdeck_types::ProbeOutcome;

use super::types::{DownloadOutcome, EngineError, EngineProgress, EngineRequest};

/// Trait for engines that can probe and download media URLs.
///
/// Implementations include:
/// - `YtDlpExtractor` — spawns the `yt-dlp` binary
/// - `ScriptedExtractor` — in-process stub for tests and demo mode
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Fetch metadata for a URL without downloading. Playlists are expanded
    /// from flat extraction; individual entries are probed fully only at
    /// download time.
    async fn probe(&self, url: &str) -> Result<ProbeOutcome, EngineError>;

    /// Download one URL. `on_progress` is invoked synchronously on the
    /// calling task, zero or more times, as the transfer advances; the
    /// engine does not retry a failed download beyond its own internal
    /// fragment retries.
    async fn download(
        &self,
        request: &EngineRequest,
        on_progress: &(dyn Fn(EngineProgress) + Send + Sync),
    ) -> Result<DownloadOutcome, EngineError>;

    /// Check the engine is usable (binary installed, etc.).
    async fn health_check(&self) -> Result<(), EngineError>;

    /// Engine name for logging/display (e.g. "yt-dlp").
    fn name(&self) -> &str;
}

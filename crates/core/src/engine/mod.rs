// crates/core/src/engine/mod.rs
//! Extraction-engine boundary.
//!
//! Provides the `MediaExtractor` trait plus implementations: the production
//! `YtDlpExtractor` (spawns the `yt-dlp` binary) and a scripted in-process
//! extractor used by the orchestration tests and demo mode.

pub mod extractor;
pub mod scripted;
pub mod types;
pub mod ytdlp;

pub use extractor::MediaExtractor;
pub use scripted::ScriptedExtractor;
pub use types::{DownloadOutcome, EngineError, EnginePhase, EngineProgress, EngineRequest};
pub use ytdlp::YtDlpExtractor;

// crates/types/src/probe.rs
//! Media metadata returned by `POST /api/info` without downloading anything.

use serde::{Deserialize, Serialize};

/// One selectable video stream of a probed URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFormat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
    /// e.g. `"720p"`.
    pub resolution: String,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcodec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
}

/// One selectable audio-only stream of a probed URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFormat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acodec: Option<String>,
    /// Average bitrate in kbit/s.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
}

/// Metadata for a single probed video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub success: bool,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Duration in seconds when the extractor reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    pub duration_string: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
    /// Extractor-derived platform name, e.g. `"Youtube"`.
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webpage_url: Option<String>,

    /// Distinct resolutions available, highest first.
    pub resolutions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub video_formats: Vec<VideoFormat>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audio_formats: Vec<AudioFormat>,
    pub available_containers: Vec<String>,
    pub available_audio_bitrates: Vec<String>,

    /// 1-based position when this entry came from a playlist probe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_title: Option<String>,
}

/// Metadata for a probed playlist: flat entries, expanded fully only at
/// download time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistProbe {
    pub success: bool,
    pub is_playlist: bool,
    pub playlist_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_uploader: Option<String>,
    pub playlist_url: String,
    pub video_count: usize,
    pub videos: Vec<ProbeResult>,
}

/// Result of probing one URL: a single video, a playlist, or a per-URL
/// error (probe failures don't fail the whole batch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProbeOutcome {
    Playlist(PlaylistProbe),
    Video(Box<ProbeResult>),
    Failed { error: String },
}

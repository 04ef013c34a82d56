// crates/types/src/options.rs
//! Per-download request options.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_resolution() -> String {
    "best".to_string()
}

fn default_container() -> String {
    "mp4".to_string()
}

fn default_audio_bitrate() -> String {
    "192".to_string()
}

fn default_true() -> bool {
    true
}

/// Immutable option snapshot captured when a download is submitted.
///
/// Every field has a request-level default so clients only send what they
/// override. `download_dir` falls back to the batch-level directory and then
/// to the server default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadOptions {
    /// Target resolution ceiling, e.g. `"720p"`, or `"best"` for no ceiling.
    #[serde(default = "default_resolution")]
    pub resolution: String,

    /// Output container for video downloads (`mp4`, `mkv`, `webm`).
    #[serde(default = "default_container")]
    pub format: String,

    /// Extract audio only (MP3) instead of downloading the video stream.
    #[serde(default)]
    pub audio_only: bool,

    /// MP3 bitrate in kbit/s when `audio_only` is set.
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Custom output filename (extension is appended by the engine).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_filename: Option<String>,

    /// Target directory for this download.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,

    /// Place output under a `Video/` or `Audio/` subfolder.
    #[serde(default = "default_true")]
    pub create_subfolder: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            format: default_container(),
            audio_only: false,
            audio_bitrate: default_audio_bitrate(),
            output_filename: None,
            download_dir: None,
            create_subfolder: true,
        }
    }
}

/// One entry of a `POST /api/download` batch: a URL plus its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadItem {
    pub url: String,
    #[serde(flatten)]
    pub options: DownloadOptions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_options_defaults_from_empty_object() {
        let opts: DownloadOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, DownloadOptions::default());
        assert_eq!(opts.resolution, "best");
        assert_eq!(opts.format, "mp4");
        assert!(!opts.audio_only);
        assert_eq!(opts.audio_bitrate, "192");
        assert!(opts.create_subfolder);
    }

    #[test]
    fn test_item_flattens_options() {
        let json = r#"{
            "url": "https://example.com/watch?v=abc",
            "resolution": "720p",
            "audio_only": true,
            "audio_bitrate": "320"
        }"#;
        let item: DownloadItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.url, "https://example.com/watch?v=abc");
        assert_eq!(item.options.resolution, "720p");
        assert!(item.options.audio_only);
        assert_eq!(item.options.audio_bitrate, "320");
        // Unspecified fields keep their defaults.
        assert_eq!(item.options.format, "mp4");
    }

    #[test]
    fn test_absent_optionals_are_not_serialized() {
        let json = serde_json::to_string(&DownloadOptions::default()).unwrap();
        assert!(!json.contains("output_filename"));
        assert!(!json.contains("download_dir"));
    }
}

// crates/core/src/engine/ytdlp.rs
//! yt-dlp extractor — spawns the `yt-dlp` binary and parses its output.
//!
//! Probing uses `-J` (JSON dump); downloads use `--newline` line output,
//! parsed with small regexes. Fragment-level retries are delegated to
//! yt-dlp itself and invisible to the orchestration core.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex_lite::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;

use clipdeck_types::{
    AudioFormat, PlaylistProbe, ProbeOutcome, ProbeResult, VideoFormat, SUPPORTED_AUDIO_BITRATES,
    SUPPORTED_CONTAINERS,
};

use super::extractor::MediaExtractor;
use super::types::{DownloadOutcome, EngineError, EngineProgress, EngineRequest};
use crate::format::format_duration;

/// Stderr lines kept for the failure message.
const STDERR_TAIL_LINES: usize = 15;

/// Extractor that drives the `yt-dlp` binary.
pub struct YtDlpExtractor {
    bin: PathBuf,
    probe_timeout_secs: u64,
}

impl YtDlpExtractor {
    /// Create an extractor using `yt-dlp` from `PATH`.
    pub fn new() -> Self {
        Self::with_binary("yt-dlp")
    }

    /// Use a specific binary path.
    pub fn with_binary(bin: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            probe_timeout_secs: 60,
        }
    }

    /// Set the timeout for metadata probes (downloads are not bounded).
    pub fn with_probe_timeout(mut self, secs: u64) -> Self {
        self.probe_timeout_secs = secs;
        self
    }

    /// Run `yt-dlp` with `args` and parse stdout as one JSON document.
    async fn run_json(&self, args: &[&str]) -> Result<serde_json::Value, EngineError> {
        let t0 = std::time::Instant::now();
        tracing::info!(bin = %self.bin.display(), ?args, "yt-dlp: probing");

        let mut cmd = Command::new(&self.bin);
        cmd.args(args).stdin(Stdio::null());
        let output = timeout(Duration::from_secs(self.probe_timeout_secs), cmd.output())
            .await
            .map_err(|_| {
                tracing::error!(elapsed_ms = t0.elapsed().as_millis() as u64, "yt-dlp: probe timed out");
                EngineError::Timeout(self.probe_timeout_secs)
            })?
            .map_err(|e| {
                tracing::error!(error = %e, "yt-dlp: failed to spawn");
                EngineError::SpawnFailed(e.to_string())
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(exit_code = ?output.status.code(), stderr = %&stderr[..stderr.len().min(500)], "yt-dlp: probe failed");
            return Err(EngineError::Failed(stderr.trim().to_string()));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| EngineError::ParseFailed(format!("invalid JSON from yt-dlp: {e}")))
    }
}

impl Default for YtDlpExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn probe(&self, url: &str) -> Result<ProbeOutcome, EngineError> {
        // Flat pass first: cheap playlist detection without per-entry fetches.
        let flat = self
            .run_json(&["-J", "--flat-playlist", "--no-warnings", url])
            .await?;

        let entries = flat.get("entries").and_then(|e| e.as_array());
        let is_playlist =
            flat.get("_type").and_then(|t| t.as_str()) == Some("playlist") || entries.is_some();

        if is_playlist {
            let playlist = playlist_from_flat(&flat, url);
            if playlist.videos.is_empty() {
                return Err(EngineError::ParseFailed("playlist is empty".to_string()));
            }
            tracing::info!(
                playlist = %playlist.playlist_title,
                videos = playlist.video_count,
                "yt-dlp: playlist probed"
            );
            return Ok(ProbeOutcome::Playlist(playlist));
        }

        // Single video: full extraction for formats and resolutions.
        let mut full = self.run_json(&["-J", "--no-warnings", url]).await?;
        // Some extractors still wrap a single video in an entries array.
        let first = full
            .get("entries")
            .and_then(|e| e.as_array())
            .and_then(|e| e.first())
            .cloned();
        if let Some(first) = first {
            full = first;
        }
        Ok(ProbeOutcome::Video(Box::new(video_from_full(&full, url))))
    }

    async fn download(
        &self,
        request: &EngineRequest,
        on_progress: &(dyn Fn(EngineProgress) + Send + Sync),
    ) -> Result<DownloadOutcome, EngineError> {
        tokio::fs::create_dir_all(&request.output_dir)
            .await
            .map_err(|e| {
                EngineError::Failed(format!(
                    "cannot create {}: {e}",
                    request.output_dir.display()
                ))
            })?;

        let args = build_download_args(request);
        tracing::info!(url = %request.url, bin = %self.bin.display(), "yt-dlp: starting download");

        let mut cmd = Command::new(&self.bin);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = cmd
            .spawn()
            .map_err(|e| EngineError::SpawnFailed(e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::SpawnFailed("failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::SpawnFailed("failed to capture stderr".to_string()))?;

        // Collect a tail of stderr for the failure message.
        let stderr_task = tokio::spawn(async move {
            let mut tail: Vec<String> = Vec::new();
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tail.len() == STDERR_TAIL_LINES {
                    tail.remove(0);
                }
                tail.push(line);
            }
            tail.join("\n")
        });

        let mut destination: Option<PathBuf> = None;
        let mut postprocessed: Option<PathBuf> = None;
        let mut current_filename: Option<String> = None;
        let mut finished_reported = false;

        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(mut progress) = parse_progress_line(&line) {
                progress.filename = current_filename.clone();
                on_progress(progress);
            } else if let Some(path) = parse_destination_line(&line) {
                current_filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned());
                destination = Some(path);
            } else if let Some(action) = parse_postprocess_line(&line) {
                if let Some(path) = action {
                    postprocessed = Some(path);
                }
                if !finished_reported {
                    finished_reported = true;
                    on_progress(EngineProgress::finished());
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| EngineError::SpawnFailed(format!("failed to wait for yt-dlp: {e}")))?;
        let stderr_tail = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let message = if stderr_tail.is_empty() {
                format!("yt-dlp exited with {status}")
            } else {
                stderr_tail
            };
            tracing::warn!(url = %request.url, exit_code = ?status.code(), "yt-dlp: download failed");
            return Err(EngineError::Failed(message));
        }

        let filepath = resolve_output_path(request, postprocessed, destination)?;
        let title = filepath
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
        tracing::info!(url = %request.url, filepath = %filepath.display(), "yt-dlp: download complete");
        Ok(DownloadOutcome { filepath, title })
    }

    async fn health_check(&self) -> Result<(), EngineError> {
        let output = Command::new(&self.bin)
            .arg("--version")
            .output()
            .await
            .map_err(|e| EngineError::NotAvailable(format!("yt-dlp not found: {e}")))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(EngineError::NotAvailable(
                "yt-dlp --version failed".to_string(),
            ))
        }
    }

    fn name(&self) -> &str {
        "yt-dlp"
    }
}

/// Build the `-f` format selector for a request.
pub fn build_format_selector(request: &EngineRequest) -> String {
    if request.audio_only {
        return "bestaudio/best".to_string();
    }
    match request.resolution {
        Some(height) => {
            format!("bestvideo[height<={height}]+bestaudio/best[height<={height}]/best")
        }
        None => "bestvideo+bestaudio/best".to_string(),
    }
}

/// Full argument list for a download invocation.
pub fn build_download_args(request: &EngineRequest) -> Vec<String> {
    let mut args = vec![
        "--newline".to_string(),
        "--no-warnings".to_string(),
        "-f".to_string(),
        build_format_selector(request),
        "-o".to_string(),
        request.output_template.display().to_string(),
        "--embed-metadata".to_string(),
        "--embed-thumbnail".to_string(),
        "--concurrent-fragments".to_string(),
        "5".to_string(),
        "--retries".to_string(),
        "3".to_string(),
        "--fragment-retries".to_string(),
        "3".to_string(),
    ];
    if request.audio_only {
        args.extend([
            "-x".to_string(),
            "--audio-format".to_string(),
            "mp3".to_string(),
            "--audio-quality".to_string(),
            format!("{}K", request.audio_bitrate),
        ]);
    } else {
        args.extend([
            "--merge-output-format".to_string(),
            request.container.clone(),
            "--write-subs".to_string(),
            "--sub-langs".to_string(),
            "en".to_string(),
            "--embed-subs".to_string(),
        ]);
    }
    args.push(request.url.clone());
    args
}

fn progress_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\[download\]\s+([\d.]+)% of ~?\s*([\d.]+)(B|KiB|MiB|GiB|TiB)(?:\s+at\s+([\d.]+)(B|KiB|MiB|GiB|TiB)/s)?(?:\s+ETA\s+(?:(\d+):)?(\d+):(\d+))?",
        )
        .expect("progress pattern is valid")
    })
}

fn destination_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\[download\] Destination: (.+)$"#).expect("destination pattern is valid")
    })
}

fn merger_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\[Merger\] Merging formats into "(.+)"$"#).expect("merger pattern is valid")
    })
}

fn extract_audio_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[ExtractAudio\] Destination: (.+)$").expect("extract pattern is valid")
    })
}

fn postprocessor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[(Metadata|EmbedThumbnail|VideoConvertor|Fixup[A-Za-z0-9]*)\]")
            .expect("postprocessor pattern is valid")
    })
}

fn unit_to_bytes(value: f64, unit: &str) -> u64 {
    let multiplier: f64 = match unit {
        "B" => 1.0,
        "KiB" => 1024.0,
        "MiB" => 1024.0 * 1024.0,
        "GiB" => 1024.0 * 1024.0 * 1024.0,
        "TiB" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        _ => 1.0,
    };
    (value * multiplier) as u64
}

/// Parse one `--newline` progress line, e.g.
/// `[download]  42.0% of 10.00MiB at 1.00MiB/s ETA 00:05`.
pub fn parse_progress_line(line: &str) -> Option<EngineProgress> {
    let caps = progress_re().captures(line)?;
    let percent: f64 = caps.get(1)?.as_str().parse().ok()?;
    let total_value: f64 = caps.get(2)?.as_str().parse().ok()?;
    let total = unit_to_bytes(total_value, caps.get(3)?.as_str());
    let downloaded = ((percent / 100.0) * total as f64) as u64;

    let mut progress = EngineProgress::downloading(downloaded, Some(total));
    if let (Some(speed), Some(unit)) = (caps.get(4), caps.get(5)) {
        if let Ok(value) = speed.as_str().parse::<f64>() {
            progress = progress.with_speed(unit_to_bytes(value, unit.as_str()) as f64);
        }
    }
    let hours: u64 = caps.get(6).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
    if let (Some(minutes), Some(seconds)) = (caps.get(7), caps.get(8)) {
        let minutes: u64 = minutes.as_str().parse().ok()?;
        let seconds: u64 = seconds.as_str().parse().ok()?;
        progress = progress.with_eta(hours * 3600 + minutes * 60 + seconds);
    }
    Some(progress)
}

/// Parse a `[download] Destination: ...` line.
pub fn parse_destination_line(line: &str) -> Option<PathBuf> {
    destination_re()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| PathBuf::from(m.as_str()))
}

/// Detect a post-processing line. `Some(Some(path))` when the line names the
/// final output (merge or audio extraction), `Some(None)` for other
/// post-processors, `None` for non-postprocessor lines.
pub fn parse_postprocess_line(line: &str) -> Option<Option<PathBuf>> {
    if let Some(caps) = merger_re().captures(line) {
        return Some(caps.get(1).map(|m| PathBuf::from(m.as_str())));
    }
    if let Some(caps) = extract_audio_re().captures(line) {
        return Some(caps.get(1).map(|m| PathBuf::from(m.as_str())));
    }
    if postprocessor_re().is_match(line) {
        return Some(None);
    }
    None
}

/// Resolve the final output path: a post-processor destination wins;
/// otherwise the last download destination with its extension swapped to
/// what post-processing would have produced.
fn resolve_output_path(
    request: &EngineRequest,
    postprocessed: Option<PathBuf>,
    destination: Option<PathBuf>,
) -> Result<PathBuf, EngineError> {
    if let Some(path) = postprocessed {
        return Ok(path);
    }
    let mut path = destination
        .ok_or_else(|| EngineError::ParseFailed("no destination reported".to_string()))?;
    let ext = if request.audio_only {
        "mp3"
    } else {
        request.container.as_str()
    };
    path.set_extension(ext);
    Ok(path)
}

fn default_resolutions() -> Vec<String> {
    ["2160p", "1440p", "1080p", "720p", "480p", "360p"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn supported_containers() -> Vec<String> {
    SUPPORTED_CONTAINERS.into_iter().map(str::to_string).collect()
}

fn supported_bitrates() -> Vec<String> {
    SUPPORTED_AUDIO_BITRATES
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// `"youtube:tab"` → `"Youtube"`.
fn platform_name(extractor: &str) -> String {
    let base = extractor.split(':').next().unwrap_or("unknown");
    let mut chars = base.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => "Unknown".to_string(),
    }
}

/// Build a playlist probe from flat-extraction JSON. Entries keep default
/// resolution options; real formats are resolved at download time.
fn playlist_from_flat(value: &serde_json::Value, url: &str) -> PlaylistProbe {
    let playlist_title = value
        .get("title")
        .and_then(|t| t.as_str())
        .unwrap_or("Unknown Playlist")
        .to_string();
    let playlist_uploader = value
        .get("uploader")
        .and_then(|u| u.as_str())
        .map(str::to_string);

    let is_music = url.contains("music.youtube.com");
    let base_url = if is_music {
        "https://music.youtube.com/watch?v="
    } else {
        "https://www.youtube.com/watch?v="
    };
    let platform = if is_music { "Youtube Music" } else { "Youtube" };

    let mut videos = Vec::new();
    let entries = value
        .get("entries")
        .and_then(|e| e.as_array())
        .cloned()
        .unwrap_or_default();
    for (i, entry) in entries.iter().enumerate() {
        if entry.is_null() {
            continue;
        }
        let entry_url = entry
            .get("url")
            .and_then(|u| u.as_str())
            .or_else(|| entry.get("webpage_url").and_then(|u| u.as_str()))
            .map(str::to_string)
            .or_else(|| {
                entry
                    .get("id")
                    .and_then(|id| id.as_str())
                    .map(|id| format!("{base_url}{id}"))
            });
        let Some(entry_url) = entry_url else {
            continue;
        };

        let duration = entry.get("duration").and_then(|d| d.as_f64()).map(|d| d as u64);
        videos.push(ProbeResult {
            success: true,
            url: entry_url,
            id: entry.get("id").and_then(|v| v.as_str()).map(str::to_string),
            title: entry
                .get("title")
                .and_then(|t| t.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Video {}", i + 1)),
            description: None,
            duration,
            duration_string: format_duration(duration),
            thumbnail: entry
                .get("thumbnail")
                .and_then(|t| t.as_str())
                .or_else(|| {
                    entry
                        .get("thumbnails")
                        .and_then(|t| t.as_array())
                        .and_then(|t| t.first())
                        .and_then(|t| t.get("url"))
                        .and_then(|u| u.as_str())
                })
                .map(str::to_string),
            uploader: entry
                .get("uploader")
                .and_then(|u| u.as_str())
                .or_else(|| entry.get("channel").and_then(|c| c.as_str()))
                .map(str::to_string)
                .or_else(|| playlist_uploader.clone()),
            view_count: entry.get("view_count").and_then(|v| v.as_u64()),
            platform: platform.to_string(),
            webpage_url: None,
            resolutions: default_resolutions(),
            video_formats: Vec::new(),
            audio_formats: Vec::new(),
            available_containers: supported_containers(),
            available_audio_bitrates: supported_bitrates(),
            playlist_index: Some(i + 1),
            playlist_title: Some(playlist_title.clone()),
        });
    }

    PlaylistProbe {
        success: true,
        is_playlist: true,
        playlist_title,
        playlist_uploader,
        playlist_url: url.to_string(),
        video_count: videos.len(),
        videos,
    }
}

/// Build a single-video probe from full-extraction JSON.
fn video_from_full(value: &serde_json::Value, url: &str) -> ProbeResult {
    let empty = Vec::new();
    let formats = value
        .get("formats")
        .and_then(|f| f.as_array())
        .unwrap_or(&empty);

    let mut heights: Vec<u32> = Vec::new();
    let mut video_formats = Vec::new();
    let mut audio_formats = Vec::new();
    for fmt in formats {
        let height = fmt.get("height").and_then(|h| h.as_u64()).map(|h| h as u32);
        let vcodec = fmt.get("vcodec").and_then(|v| v.as_str()).unwrap_or("none");
        let acodec = fmt.get("acodec").and_then(|a| a.as_str()).unwrap_or("none");
        let filesize = fmt
            .get("filesize")
            .and_then(|s| s.as_u64())
            .or_else(|| fmt.get("filesize_approx").and_then(|s| s.as_u64()));
        let format_id = fmt.get("format_id").and_then(|v| v.as_str()).map(str::to_string);
        let ext = fmt.get("ext").and_then(|v| v.as_str()).map(str::to_string);

        if vcodec != "none" {
            if let Some(height) = height {
                if !heights.contains(&height) {
                    heights.push(height);
                }
                video_formats.push(VideoFormat {
                    format_id,
                    ext,
                    resolution: format!("{height}p"),
                    height,
                    vcodec: Some(vcodec.to_string()),
                    filesize,
                    fps: fmt.get("fps").and_then(|f| f.as_f64()),
                });
                continue;
            }
        }
        if acodec != "none" && vcodec == "none" {
            audio_formats.push(AudioFormat {
                format_id,
                ext,
                acodec: Some(acodec.to_string()),
                abr: fmt.get("abr").and_then(|a| a.as_f64()),
                filesize,
            });
        }
    }
    heights.sort_unstable_by(|a, b| b.cmp(a));
    video_formats.truncate(20);
    audio_formats.truncate(10);

    let resolutions = if heights.is_empty() {
        vec![
            "1080p".to_string(),
            "720p".to_string(),
            "480p".to_string(),
            "360p".to_string(),
        ]
    } else {
        heights.iter().map(|h| format!("{h}p")).collect()
    };

    let extractor = value
        .get("extractor")
        .and_then(|e| e.as_str())
        .unwrap_or("unknown");
    let video_url = value
        .get("webpage_url")
        .and_then(|u| u.as_str())
        .or_else(|| value.get("url").and_then(|u| u.as_str()))
        .unwrap_or(url)
        .to_string();
    let duration = value.get("duration").and_then(|d| d.as_f64()).map(|d| d as u64);
    let description = value
        .get("description")
        .and_then(|d| d.as_str())
        .map(|d| d.chars().take(500).collect::<String>());

    ProbeResult {
        success: true,
        url: video_url.clone(),
        id: value.get("id").and_then(|v| v.as_str()).map(str::to_string),
        title: value
            .get("title")
            .and_then(|t| t.as_str())
            .unwrap_or("Unknown Title")
            .to_string(),
        description,
        duration,
        duration_string: format_duration(duration),
        thumbnail: value
            .get("thumbnail")
            .and_then(|t| t.as_str())
            .map(str::to_string),
        uploader: value
            .get("uploader")
            .and_then(|u| u.as_str())
            .map(str::to_string),
        view_count: value.get("view_count").and_then(|v| v.as_u64()),
        platform: platform_name(extractor),
        webpage_url: Some(video_url),
        resolutions,
        video_formats,
        audio_formats,
        available_containers: supported_containers(),
        available_audio_bitrates: supported_bitrates(),
        playlist_index: None,
        playlist_title: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipdeck_types::DownloadOptions;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn video_request() -> EngineRequest {
        EngineRequest::from_options(
            "https://example.com/v",
            &DownloadOptions {
                resolution: "720p".to_string(),
                ..Default::default()
            },
            Path::new("/dl"),
        )
    }

    #[test]
    fn test_format_selector_with_ceiling() {
        assert_eq!(
            build_format_selector(&video_request()),
            "bestvideo[height<=720]+bestaudio/best[height<=720]/best"
        );
    }

    #[test]
    fn test_format_selector_best_and_audio() {
        let mut request = video_request();
        request.resolution = None;
        assert_eq!(build_format_selector(&request), "bestvideo+bestaudio/best");
        request.audio_only = true;
        assert_eq!(build_format_selector(&request), "bestaudio/best");
    }

    #[test]
    fn test_download_args_video() {
        let args = build_download_args(&video_request());
        assert!(args.contains(&"--merge-output-format".to_string()));
        assert!(args.contains(&"mp4".to_string()));
        assert!(args.contains(&"--embed-subs".to_string()));
        assert!(!args.contains(&"-x".to_string()));
        assert_eq!(args.last().unwrap(), "https://example.com/v");
    }

    #[test]
    fn test_download_args_audio() {
        let options = DownloadOptions {
            audio_only: true,
            audio_bitrate: "320".to_string(),
            ..Default::default()
        };
        let request = EngineRequest::from_options("https://example.com/v", &options, Path::new("/dl"));
        let args = build_download_args(&request);
        assert!(args.contains(&"-x".to_string()));
        assert!(args.contains(&"320K".to_string()));
        assert!(!args.contains(&"--merge-output-format".to_string()));
    }

    #[test]
    fn test_parse_progress_line_full() {
        let progress =
            parse_progress_line("[download]  42.0% of 10.00MiB at 1.00MiB/s ETA 00:05").unwrap();
        assert_eq!(progress.total_bytes, Some(10 * 1024 * 1024));
        assert_eq!(progress.downloaded_bytes, Some(4404019));
        assert_eq!(progress.speed_bps, Some(1024.0 * 1024.0));
        assert_eq!(progress.eta_secs, Some(5));
    }

    #[test]
    fn test_parse_progress_line_estimate_and_long_eta() {
        let progress =
            parse_progress_line("[download]   5.0% of ~ 2.00GiB at  512.00KiB/s ETA 1:01:40")
                .unwrap();
        assert_eq!(progress.total_bytes, Some(2 * 1024 * 1024 * 1024));
        assert_eq!(progress.eta_secs, Some(3700));
    }

    #[test]
    fn test_parse_progress_line_without_speed_or_eta() {
        let progress = parse_progress_line("[download] 100% of 10.00MiB in 00:05").unwrap();
        assert_eq!(progress.downloaded_bytes, Some(10 * 1024 * 1024));
        assert_eq!(progress.speed_bps, None);
        assert_eq!(progress.eta_secs, None);
    }

    #[test]
    fn test_parse_progress_line_ignores_other_output() {
        assert!(parse_progress_line("[youtube] abc: Downloading webpage").is_none());
        assert!(parse_progress_line("[download] Destination: /dl/clip.f137.mp4").is_none());
    }

    #[test]
    fn test_parse_destination_line() {
        assert_eq!(
            parse_destination_line("[download] Destination: /dl/Video/clip.f137.mp4"),
            Some(PathBuf::from("/dl/Video/clip.f137.mp4"))
        );
        assert!(parse_destination_line("[download]  42.0% of 10.00MiB").is_none());
    }

    #[test]
    fn test_parse_postprocess_lines() {
        assert_eq!(
            parse_postprocess_line("[Merger] Merging formats into \"/dl/Video/clip.mp4\""),
            Some(Some(PathBuf::from("/dl/Video/clip.mp4")))
        );
        assert_eq!(
            parse_postprocess_line("[ExtractAudio] Destination: /dl/Audio/song.mp3"),
            Some(Some(PathBuf::from("/dl/Audio/song.mp3")))
        );
        assert_eq!(parse_postprocess_line("[Metadata] Adding metadata"), Some(None));
        assert_eq!(
            parse_postprocess_line("[FixupM4a] Correcting container"),
            Some(None)
        );
        assert!(parse_postprocess_line("[download] 10% of 1.00MiB").is_none());
    }

    #[test]
    fn test_resolve_output_path_prefers_postprocessed() {
        let path = resolve_output_path(
            &video_request(),
            Some(PathBuf::from("/dl/Video/clip.mp4")),
            Some(PathBuf::from("/dl/Video/clip.f137.mp4")),
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/dl/Video/clip.mp4"));
    }

    #[test]
    fn test_resolve_output_path_swaps_extension() {
        let path = resolve_output_path(
            &video_request(),
            None,
            Some(PathBuf::from("/dl/Video/clip.webm")),
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/dl/Video/clip.mp4"));

        let options = DownloadOptions {
            audio_only: true,
            ..Default::default()
        };
        let audio = EngineRequest::from_options("https://example.com/v", &options, Path::new("/dl"));
        let path =
            resolve_output_path(&audio, None, Some(PathBuf::from("/dl/Audio/song.webm"))).unwrap();
        assert_eq!(path, PathBuf::from("/dl/Audio/song.mp3"));
    }

    #[test]
    fn test_resolve_output_path_requires_destination() {
        assert!(resolve_output_path(&video_request(), None, None).is_err());
    }

    #[test]
    fn test_platform_name() {
        assert_eq!(platform_name("youtube:tab"), "Youtube");
        assert_eq!(platform_name("vimeo"), "Vimeo");
    }

    #[test]
    fn test_playlist_from_flat() {
        let flat = serde_json::json!({
            "_type": "playlist",
            "title": "My Mix",
            "uploader": "someone",
            "entries": [
                {"id": "abc", "title": "First", "duration": 61.0},
                null,
                {"url": "https://example.com/second", "title": "Second"},
                {"no_url_or_id": true}
            ]
        });
        let playlist = playlist_from_flat(&flat, "https://www.youtube.com/playlist?list=x");
        assert_eq!(playlist.playlist_title, "My Mix");
        assert_eq!(playlist.video_count, 2);
        assert_eq!(playlist.videos[0].url, "https://www.youtube.com/watch?v=abc");
        assert_eq!(playlist.videos[0].duration_string, "1:01");
        assert_eq!(playlist.videos[0].playlist_index, Some(1));
        assert_eq!(playlist.videos[1].url, "https://example.com/second");
        // Entry uploader falls back to the playlist uploader.
        assert_eq!(playlist.videos[0].uploader.as_deref(), Some("someone"));
    }

    #[test]
    fn test_playlist_from_flat_music_urls() {
        let flat = serde_json::json!({
            "_type": "playlist",
            "title": "Mix",
            "entries": [{"id": "abc", "title": "Song"}]
        });
        let playlist = playlist_from_flat(&flat, "https://music.youtube.com/playlist?list=x");
        assert_eq!(playlist.videos[0].url, "https://music.youtube.com/watch?v=abc");
        assert_eq!(playlist.videos[0].platform, "Youtube Music");
    }

    #[test]
    fn test_video_from_full_formats_and_resolutions() {
        let full = serde_json::json!({
            "id": "abc",
            "title": "A Video",
            "extractor": "youtube",
            "webpage_url": "https://www.youtube.com/watch?v=abc",
            "duration": 125.0,
            "description": "words",
            "formats": [
                {"format_id": "137", "ext": "mp4", "height": 1080, "vcodec": "avc1", "acodec": "none", "filesize": 1000},
                {"format_id": "136", "ext": "mp4", "height": 720, "vcodec": "avc1", "acodec": "none"},
                {"format_id": "251", "ext": "webm", "vcodec": "none", "acodec": "opus", "abr": 160.0},
                {"format_id": "sb0", "ext": "mhtml", "vcodec": "none", "acodec": "none"}
            ]
        });
        let probe = video_from_full(&full, "https://fallback.example");
        assert_eq!(probe.title, "A Video");
        assert_eq!(probe.platform, "Youtube");
        assert_eq!(probe.duration_string, "2:05");
        assert_eq!(probe.resolutions, vec!["1080p", "720p"]);
        assert_eq!(probe.video_formats.len(), 2);
        assert_eq!(probe.audio_formats.len(), 1);
        assert_eq!(probe.audio_formats[0].abr, Some(160.0));
    }

    #[test]
    fn test_video_from_full_defaults_when_no_formats() {
        let probe = video_from_full(&serde_json::json!({}), "https://example.com/v");
        assert_eq!(probe.title, "Unknown Title");
        assert_eq!(probe.url, "https://example.com/v");
        assert_eq!(probe.resolutions, vec!["1080p", "720p", "480p", "360p"]);
        assert_eq!(probe.duration_string, "Unknown");
    }
}

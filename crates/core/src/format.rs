// crates/core/src/format.rs
//! Human-readable formatting for sizes, speeds, durations and ETAs.
//!
//! Progress payloads carry display strings rather than raw numbers so the
//! registry and the event stream always show identical values.

/// Format a byte count as `"4.2 MB"`. Zero or unknown sizes render as
/// `"Unknown"`.
pub fn format_size(bytes: Option<u64>) -> String {
    let Some(bytes) = bytes.filter(|b| *b > 0) else {
        return "Unknown".to_string();
    };
    let mut value = bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if value < 1024.0 {
            return format!("{value:.1} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.1} PB")
}

/// Format a transfer speed as `"1.0 MB/s"`, or `"N/A"` when unknown.
pub fn format_speed(bytes_per_sec: Option<f64>) -> String {
    match bytes_per_sec {
        Some(speed) if speed > 0.0 => format!("{}/s", format_size(Some(speed as u64))),
        _ => "N/A".to_string(),
    }
}

/// Format an ETA in seconds as `"45s"`, or `"Calculating..."` when unknown.
pub fn format_eta(seconds: Option<u64>) -> String {
    match seconds {
        Some(secs) if secs > 0 => format!("{secs}s"),
        _ => "Calculating...".to_string(),
    }
}

/// Format a media duration as `H:MM:SS` (or `M:SS` under an hour).
pub fn format_duration(seconds: Option<u64>) -> String {
    let Some(seconds) = seconds else {
        return "Unknown".to_string();
    };
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

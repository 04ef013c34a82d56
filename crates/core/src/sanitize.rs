// crates/core/src/sanitize.rs
//! URL validation and filename sanitization.
//!
//! Runs before any job state is created: invalid URLs are rejected at the
//! API boundary, and user-supplied filenames are stripped of anything that
//! could escape the download directory or break the target filesystem.

use regex_lite::Regex;
use std::sync::OnceLock;

/// Longest filename (without extension) we will write.
const MAX_FILENAME_LEN: usize = 200;

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)^https?://(?:(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,6}\.?|localhost|\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})(?::\d+)?(?:/?|[/?]\S+)$",
        )
        .expect("URL pattern is valid")
    })
}

/// Whether the string is a plausible http(s) URL: scheme, then a domain,
/// `localhost`, or a dotted-quad IP, optional port, optional path/query.
pub fn validate_url(url: &str) -> bool {
    url_pattern().is_match(url)
}

/// Strip shell metacharacters from a URL before it reaches the engine
/// subprocess.
pub fn sanitize_url(url: &str) -> String {
    url.chars()
        .filter(|c| !matches!(c, ';' | '&' | '|' | '`' | '$' | '(' | ')' | '{' | '}' | '[' | ']' | '!' | '#'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sanitize a user-supplied filename: path separators and characters invalid
/// on Windows/Linux become underscores, the result is length-capped and
/// stripped of leading/trailing dots and spaces, with `"download"` as the
/// fallback for names that sanitize away entirely.
pub fn sanitize_filename(filename: &str) -> String {
    let mut cleaned: String = filename
        .chars()
        .filter(|c| *c != '\0')
        .map(|c| match c {
            '/' | '\\' | '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect();
    if cleaned.chars().count() > MAX_FILENAME_LEN {
        cleaned = cleaned.chars().take(MAX_FILENAME_LEN).collect();
    }
    let trimmed = cleaned.trim().trim_matches('.').trim();
    if trimmed.is_empty() {
        "download".to_string()
    } else {
        trimmed.to_string()
    }
}

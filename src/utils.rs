//! Utility functions for slugs, credential files, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Slugification for permalinks and deterministic image file names
//! - API key file loading and validation
//! - Subjects file reading for bulk generation
//! - User-agent rotation for scraping requests
//! - File system validation for output directories

use once_cell::sync::Lazy;
use rand::prelude::IndexedRandom;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Minimum plausible length for a generation API key.
pub const API_KEY_MIN_LENGTH: usize = 25;

static KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Browser user agents rotated across scraping requests.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:90.0) Gecko/20100101 Firefox/90.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.159 Safari/537.36 Edg/92.0.902.84",
];

/// Pick a user agent at random for a scraping request.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Convert text to a lowercase, hyphenated, URL-safe slug.
///
/// Runs of non-alphanumeric characters collapse into a single hyphen and
/// leading/trailing hyphens are trimmed.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("Hello  World!"), "hello-world");
/// assert_eq!(slugify("Rust: Tips & Tricks"), "rust-tips-tricks");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c);
            pending_hyphen = false;
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Truncate a string to at most `max` characters, respecting char boundaries.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes, backing up to the nearest
/// char boundary so multi-byte text never panics the slice, with an
/// ellipsis and byte count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Check whether a string is a plausible generation API key.
///
/// Real validation only happens when the key is used against the API; this
/// just rejects obvious garbage before it enters the pool.
pub fn validate_api_key(key: &str) -> bool {
    key.len() >= API_KEY_MIN_LENGTH && KEY_RE.is_match(key)
}

/// Load API keys from a file, one per line, skipping blank lines.
///
/// A missing or unreadable file yields an empty pool; the caller decides
/// whether that is fatal.
pub fn load_api_keys(path: impl AsRef<Path>) -> Vec<String> {
    match stdfs::read_to_string(path.as_ref()) {
        Ok(raw) => raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
        Err(e) => {
            warn!(path = %path.as_ref().display(), error = %e, "could not read API key file");
            Vec::new()
        }
    }
}

/// Read generation subjects from a file, one per line, skipping blanks.
pub fn read_subjects_file(path: impl AsRef<Path>) -> Vec<String> {
    match stdfs::read_to_string(path.as_ref()) {
        Ok(raw) => raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then performs a write test by creating
/// and immediately deleting a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Small sync write probe; simpler error surface than async here.
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

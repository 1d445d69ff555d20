//! Utility functions for seed input, log formatting and output paths.
//!
//! - Seed-file reading (one URL per line, blanks ignored)
//! - Character-safe truncation of long strings for log lines
//! - Output directory preparation
//! - Rough run-time estimation for the confirmation prompt

use crate::error::FatalError;
use itertools::Itertools;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Seconds a single seed category is expected to take end to end.
const SECS_PER_CATEGORY: f64 = 2.5;

/// Read seed URLs from `path`: trimmed, blank lines skipped, duplicates
/// removed keeping first occurrence.
///
/// # Arguments
///
/// * `path` - Text file with one category URL per line
///
/// # Returns
///
/// The seeds in file order, or [`FatalError::SeedFile`] if the file cannot
/// be read.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_seed_urls(path: &Path) -> Result<Vec<String>, FatalError> {
    let raw = fs::read_to_string(path)
        .await
        .map_err(|source| FatalError::SeedFile {
            path: path.to_path_buf(),
            source,
        })?;
    let seeds = parse_seed_lines(&raw);
    info!(count = seeds.len(), "Read seed URLs");
    Ok(seeds)
}

fn parse_seed_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .unique()
        .map(String::from)
        .collect()
}

/// Estimated minutes for a full run over `categories` seeds.
///
/// Shown in the confirmation prompt; assumes 2.5 seconds per category.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(estimate_minutes(24), 1.0);
/// ```
pub fn estimate_minutes(categories: usize) -> f64 {
    categories as f64 * SECS_PER_CATEGORY / 60.0
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and the number
/// of dropped characters appended. Cuts always land on a character
/// boundary, which matters for Vietnamese text.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"ạ".repeat(12), 10), "ạạạạạạạạạạ…(+2 chars)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} chars)", &s[..cut], s[cut..].chars().count()),
    }
}

/// Ensure the directory that will hold `file` exists.
///
/// Called before any network activity so an unwritable output location
/// fails the run early.
#[instrument(level = "info", skip_all, fields(file = %file.display()))]
pub async fn ensure_parent_dir(file: &Path) -> Result<(), FatalError> {
    let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    fs::create_dir_all(parent)
        .await
        .map_err(|source| FatalError::Output {
            path: parent.to_path_buf(),
            source,
        })?;
    info!(dir = %parent.display(), "Output directory ready");
    Ok(())
}

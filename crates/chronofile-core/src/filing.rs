//! Chronological filing from capture timestamps.
//!
//! Two independent operations share one strict timestamp contract
//! (`YYYY:MM:DD HH:MM:SS`, the EXIF `DateTimeOriginal` layout):
//! - [`compute_rename`] prefixes a file name with `pYYYY-MM-DD_HH-MM-SS_`
//! - [`compute_destination`] maps a file to `base/YYYY/MM-DD/filename`

use crate::config::FilingConfig;
use crate::error::{ChronofileError, Result};
use crate::platform::FileSystem;
use crate::unique::ensure_unique;
use chrono::NaiveDateTime;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Regex for a file name that already carries a capture-date prefix.
static DATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^p\d{4}-\d{2}-\d{2}_\d{2}-\d{2}-\d{2}_").unwrap());

/// Parse an EXIF capture timestamp. Nothing is corrected or guessed.
///
/// # Examples
///
/// ```
/// use chronofile_core::filing::parse_capture_timestamp;
///
/// assert!(parse_capture_timestamp("2023:07:04 10:15:00").is_ok());
/// assert!(parse_capture_timestamp("2023-07-04 10:15:00").is_err());
/// ```
pub fn parse_capture_timestamp(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, FilingConfig::EXIF_TIMESTAMP_FORMAT).map_err(|e| {
        ChronofileError::TimestampParse {
            value: value.to_string(),
            message: e.to_string(),
        }
    })
}

/// Rename prefix for a capture timestamp, e.g. `p2023-07-04_10-15-00_`.
pub fn date_prefix(timestamp: &NaiveDateTime) -> String {
    timestamp.format("p%Y-%m-%d_%H-%M-%S_").to_string()
}

/// True if `filename` already starts with a capture-date prefix.
pub fn has_date_prefix(filename: &str) -> bool {
    DATE_PREFIX.is_match(filename)
}

/// Outcome of [`compute_rename`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenamePlan {
    /// Name already carries a date prefix; leave it alone.
    AlreadyPrefixed,
    /// New file name (not yet checked for collisions).
    Rename(String),
}

/// Compute the date-prefixed name for `filename`.
pub fn compute_rename(filename: &str, timestamp: &NaiveDateTime) -> RenamePlan {
    if has_date_prefix(filename) {
        RenamePlan::AlreadyPrefixed
    } else {
        RenamePlan::Rename(format!("{}{}", date_prefix(timestamp), filename))
    }
}

/// Directory a photo taken at `timestamp` belongs in: `base/YYYY/MM-DD`.
pub fn destination_dir(base_dir: &Path, timestamp: &NaiveDateTime) -> PathBuf {
    base_dir
        .join(timestamp.format("%Y").to_string())
        .join(timestamp.format("%m-%d").to_string())
}

/// Compute a free destination path for `filename`, creating its directory.
///
/// The move itself is left to the caller.
pub fn compute_destination(
    fs: &dyn FileSystem,
    base_dir: &Path,
    timestamp: &NaiveDateTime,
    filename: &str,
) -> Result<PathBuf> {
    let target_dir = destination_dir(base_dir, timestamp);
    fs.make_directories(&target_dir)?;
    ensure_unique(fs, &target_dir.join(filename), false)
}

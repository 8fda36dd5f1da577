//! Tree-walking operations that drive the core algorithms.
//!
//! Every operation follows the same shape:
//! 1. Validate the root (the only fatal failure, reported before any work)
//! 2. Collect the entries up front, in a stable order
//! 3. Process entries one at a time, turning each into a [`FileOutcome`]
//! 4. Fold outcomes into a report of counters
//!
//! Per-file failures are logged and counted; they never abort a run.
//!
//! ```text
//! walk ──► NameNormalizer ──► UniquePathResolver ──► rename
//!   │
//!   └──► MetadataExtractor ──► ChronologicalFiler ──► UniquePathResolver ──► rename/move
//!   │
//!   └──► MetadataExtractor ──► Classifier ×N ──► JudgmentAggregator ──► summary
//! ```

mod correlation;
mod photos;
mod rename;

pub use correlation::{analyze_path_metadata_correlation, CorrelationReport};
pub use photos::{
    organize_photos_by_date, prefix_photos_with_date, resolve_target_base, DatePrefixReport,
    OrganizeReport,
};
pub use rename::{
    remove_marker_files, sanitize_directory_names, sanitize_file_names, RemovalReport,
    RenameReport,
};

#[cfg(test)]
pub(crate) use photos::dated::DatedExtractor;

use crate::error::{ChronofileError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Why a file was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No `DateTimeOriginal` in the metadata.
    NoDate,
    /// `DateTimeOriginal` present but not `YYYY:MM:DD HH:MM:SS`.
    BadDate,
    /// Name already starts with a capture-date prefix.
    AlreadyPrefixed,
    /// File already sits in its chronological directory.
    AlreadyFiled,
}

/// Result of processing a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Entry renamed or moved.
    Moved { from: PathBuf, to: PathBuf },
    /// Entry already had its target name.
    Unchanged,
    Skipped(SkipReason),
    /// Entry could not be processed; the message is for the log.
    Failed(String),
}

impl FileOutcome {
    /// Map a per-file error to an outcome: skip conditions become skips.
    pub(crate) fn from_error(err: ChronofileError) -> Self {
        match err {
            ChronofileError::MetadataMissing(_) => FileOutcome::Skipped(SkipReason::NoDate),
            ChronofileError::TimestampParse { .. } => FileOutcome::Skipped(SkipReason::BadDate),
            other => FileOutcome::Failed(other.to_string()),
        }
    }
}

/// Fail before any processing if `root` is missing or not a directory.
pub fn validate_root(root: &Path) -> Result<()> {
    if !root.exists() {
        return Err(ChronofileError::FileNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ChronofileError::NotADirectory(root.to_path_buf()));
    }
    Ok(())
}

/// Entries gathered by a walk.
#[derive(Debug, Default)]
pub(crate) struct Walk {
    pub paths: Vec<PathBuf>,
    /// Entries the walk could not read; each one is logged.
    pub errors: usize,
}

fn gather(walker: walkdir::IntoIter, keep: fn(&DirEntry) -> bool) -> Walk {
    let mut walk = Walk::default();
    for entry in walker {
        match entry {
            Ok(entry) if keep(&entry) => walk.paths.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => {
                warn!("Cannot read directory entry: {}", e);
                walk.errors += 1;
            }
        }
    }
    walk
}

/// All regular files under `root`, sorted by path.
pub(crate) fn collect_files(root: &Path) -> Walk {
    gather(WalkDir::new(root).sort_by_file_name().into_iter(), |e| {
        e.file_type().is_file()
    })
}

/// All directories strictly below `root`, children before their parents.
pub(crate) fn collect_dirs_bottom_up(root: &Path) -> Walk {
    gather(
        WalkDir::new(root)
            .min_depth(1)
            .contents_first(true)
            .sort_by_file_name()
            .into_iter(),
        |e| e.file_type().is_dir(),
    )
}

/// `path` made absolute against the working directory.
pub(crate) fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| ChronofileError::io_with_path(e, path))?;
    Ok(cwd.join(path))
}

/// File name of `path` as UTF-8, if it has one.
pub(crate) fn file_name_str(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

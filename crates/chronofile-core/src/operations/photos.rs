//! Capture-date driven photo operations: date prefixing and chronological filing.

use super::{absolute, collect_files, file_name_str, validate_root, FileOutcome, SkipReason};
use crate::error::{ChronofileError, Result};
use crate::filing::{
    compute_destination, compute_rename, destination_dir, has_date_prefix, RenamePlan,
};
use crate::metadata::{capture_timestamp, is_photo, MetadataExtractor};
use crate::platform::FileSystem;
use crate::unique::resolve_rename_target;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Counters for a date-prefix pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatePrefixReport {
    /// JPEG files looked at.
    pub scanned: usize,
    pub renamed: usize,
    pub already_prefixed: usize,
    pub no_date: usize,
    pub bad_date: usize,
    pub errors: usize,
    pub renames: Vec<(PathBuf, PathBuf)>,
}

impl DatePrefixReport {
    fn record(&mut self, outcome: FileOutcome) {
        self.scanned += 1;
        match outcome {
            FileOutcome::Moved { from, to } => {
                self.renamed += 1;
                self.renames.push((from, to));
            }
            FileOutcome::Skipped(SkipReason::AlreadyPrefixed) | FileOutcome::Unchanged => {
                self.already_prefixed += 1
            }
            FileOutcome::Skipped(SkipReason::NoDate) => self.no_date += 1,
            FileOutcome::Skipped(SkipReason::BadDate) => self.bad_date += 1,
            FileOutcome::Skipped(SkipReason::AlreadyFiled) => {}
            FileOutcome::Failed(_) => self.errors += 1,
        }
    }
}

/// Counters for a filing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrganizeReport {
    /// JPEG files looked at.
    pub scanned: usize,
    pub moved: usize,
    pub no_date: usize,
    pub bad_date: usize,
    pub already_filed: usize,
    pub errors: usize,
    pub moves: Vec<(PathBuf, PathBuf)>,
}

impl OrganizeReport {
    fn record(&mut self, outcome: FileOutcome) {
        self.scanned += 1;
        match outcome {
            FileOutcome::Moved { from, to } => {
                self.moved += 1;
                self.moves.push((from, to));
            }
            FileOutcome::Skipped(SkipReason::AlreadyFiled) | FileOutcome::Unchanged => {
                self.already_filed += 1
            }
            FileOutcome::Skipped(SkipReason::NoDate) => self.no_date += 1,
            FileOutcome::Skipped(SkipReason::BadDate) => self.bad_date += 1,
            FileOutcome::Skipped(SkipReason::AlreadyPrefixed) => {}
            FileOutcome::Failed(_) => self.errors += 1,
        }
    }
}

fn non_utf8_name(path: &Path) -> ChronofileError {
    ChronofileError::Other(format!("File name is not valid UTF-8: {}", path.display()))
}

fn prefix_one(
    fs: &dyn FileSystem,
    extractor: &dyn MetadataExtractor,
    path: &Path,
) -> Result<FileOutcome> {
    let filename = file_name_str(path).ok_or_else(|| non_utf8_name(path))?;
    // Cheap check first: prefixed names never need their metadata read
    if has_date_prefix(filename) {
        return Ok(FileOutcome::Skipped(SkipReason::AlreadyPrefixed));
    }

    let metadata = extractor.extract(path)?;
    let timestamp = capture_timestamp(path, &metadata)?;
    let new_name = match compute_rename(filename, &timestamp) {
        RenamePlan::AlreadyPrefixed => {
            return Ok(FileOutcome::Skipped(SkipReason::AlreadyPrefixed))
        }
        RenamePlan::Rename(name) => name,
    };

    let desired = path.with_file_name(new_name);
    let target = resolve_rename_target(fs, path, &desired, false)?;
    fs.rename(path, &target)?;
    Ok(FileOutcome::Moved {
        from: path.to_path_buf(),
        to: target,
    })
}

/// Prefix every JPEG under `root` with its capture date.
///
/// `IMG_0001.jpg` taken 2023-07-04 10:15:00 becomes
/// `p2023-07-04_10-15-00_IMG_0001.jpg`. Names that already carry a prefix
/// are skipped, which makes re-runs a no-op.
pub fn prefix_photos_with_date(
    fs: &dyn FileSystem,
    extractor: &dyn MetadataExtractor,
    root: &Path,
) -> Result<DatePrefixReport> {
    validate_root(root)?;
    let mut report = DatePrefixReport::default();
    let walk = collect_files(root);
    report.errors += walk.errors;

    for path in walk.paths.into_iter().filter(|p| is_photo(p)) {
        let outcome = match prefix_one(fs, extractor, &path) {
            Ok(outcome) => outcome,
            Err(e) => {
                if e.is_skip() {
                    debug!("Skipping {}: {}", path.display(), e);
                } else {
                    warn!("Date prefix failed for {}: {}", path.display(), e);
                }
                FileOutcome::from_error(e)
            }
        };
        if let FileOutcome::Moved { from, to } = &outcome {
            info!("Renamed: {} -> {}", from.display(), to.display());
        }
        report.record(outcome);
    }

    info!(
        "Date prefix: {} renamed, {} already prefixed, {} without date, {} bad date, {} errors",
        report.renamed, report.already_prefixed, report.no_date, report.bad_date, report.errors
    );
    Ok(report)
}

/// Resolve the filing base directory; relative paths hang off the working directory.
pub fn resolve_target_base(base_dir: &Path) -> Result<PathBuf> {
    absolute(base_dir)
}

fn file_one(
    fs: &dyn FileSystem,
    extractor: &dyn MetadataExtractor,
    base_dir: &Path,
    path: &Path,
) -> Result<FileOutcome> {
    let filename = file_name_str(path).ok_or_else(|| non_utf8_name(path))?;
    let metadata = extractor.extract(path)?;
    let timestamp = capture_timestamp(path, &metadata)?;

    let target_dir = destination_dir(base_dir, &timestamp);
    if let Some(parent) = path.parent() {
        if parent == target_dir || fs.same_entry(parent, &target_dir) {
            return Ok(FileOutcome::Skipped(SkipReason::AlreadyFiled));
        }
    }

    let target = compute_destination(fs, base_dir, &timestamp, filename)?;
    fs.rename(path, &target)?;
    Ok(FileOutcome::Moved {
        from: path.to_path_buf(),
        to: target,
    })
}

/// Move every JPEG under `root` into `base_dir/YYYY/MM-DD/`.
///
/// The file name is kept; a colliding name in the target directory gets a
/// counter suffix. Photos without a usable capture date stay where they are.
/// Both `root` and `base_dir` are made absolute first so photos already in
/// their dated directory are recognized whichever way the paths were given.
pub fn organize_photos_by_date(
    fs: &dyn FileSystem,
    extractor: &dyn MetadataExtractor,
    root: &Path,
    base_dir: &Path,
) -> Result<OrganizeReport> {
    validate_root(root)?;
    let root = absolute(root)?;
    let base_dir = resolve_target_base(base_dir)?;
    info!("Filing photos from {} into {}", root.display(), base_dir.display());
    let mut report = OrganizeReport::default();
    let walk = collect_files(&root);
    report.errors += walk.errors;

    for path in walk.paths.into_iter().filter(|p| is_photo(p)) {
        let outcome = match file_one(fs, extractor, &base_dir, &path) {
            Ok(outcome) => outcome,
            Err(e) => {
                if e.is_skip() {
                    debug!("Skipping {}: {}", path.display(), e);
                } else {
                    warn!("Filing failed for {}: {}", path.display(), e);
                }
                FileOutcome::from_error(e)
            }
        };
        if let FileOutcome::Moved { from, to } = &outcome {
            info!("Moved: {} -> {}", from.display(), to.display());
        }
        report.record(outcome);
    }

    info!(
        "Filing: {} moved, {} already filed, {} without date, {} bad date, {} errors",
        report.moved, report.already_filed, report.no_date, report.bad_date, report.errors
    );
    Ok(report)
}

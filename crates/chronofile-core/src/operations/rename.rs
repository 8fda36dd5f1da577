//! File and directory name sanitizing, plus marker-file cleanup.

use super::{collect_dirs_bottom_up, collect_files, validate_root, FileOutcome};
use crate::error::Result;
use crate::naming::{normalize_dir_name, normalize_file_name};
use crate::platform::FileSystem;
use crate::unique::resolve_rename_target;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Counters for a sanitizing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameReport {
    pub scanned: usize,
    pub renamed: usize,
    pub unchanged: usize,
    pub errors: usize,
    /// `(from, to)` for every rename performed.
    pub renames: Vec<(PathBuf, PathBuf)>,
}

impl RenameReport {
    fn record(&mut self, outcome: FileOutcome) {
        self.scanned += 1;
        match outcome {
            FileOutcome::Moved { from, to } => {
                self.renamed += 1;
                self.renames.push((from, to));
            }
            FileOutcome::Unchanged | FileOutcome::Skipped(_) => self.unchanged += 1,
            FileOutcome::Failed(_) => self.errors += 1,
        }
    }
}

/// Rename `path` to `canonical` within its directory, avoiding collisions.
fn rename_to_canonical(
    fs: &dyn FileSystem,
    path: &Path,
    canonical: &str,
    is_directory: bool,
) -> FileOutcome {
    let Some(parent) = path.parent() else {
        return FileOutcome::Unchanged;
    };
    let desired = parent.join(canonical);
    if desired == path {
        return FileOutcome::Unchanged;
    }

    let result = resolve_rename_target(fs, path, &desired, is_directory)
        .and_then(|target| fs.rename(path, &target).map(|_| target));
    match result {
        Ok(target) => {
            info!("Renamed: {} -> {}", path.display(), target.display());
            FileOutcome::Moved {
                from: path.to_path_buf(),
                to: target,
            }
        }
        Err(e) => {
            warn!("Rename failed for {}: {}", path.display(), e);
            FileOutcome::Failed(e.to_string())
        }
    }
}

/// Normalize the name of every file under `root`.
///
/// The base name goes through the name normalizer (falling back to `file`),
/// the extension is lower-cased. Files already in canonical form are left
/// alone, so a second pass renames nothing.
pub fn sanitize_file_names(fs: &dyn FileSystem, root: &Path) -> Result<RenameReport> {
    validate_root(root)?;
    let mut report = RenameReport::default();
    let walk = collect_files(root);
    report.errors += walk.errors;

    for path in walk.paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let canonical = normalize_file_name(&name);
        report.record(rename_to_canonical(fs, &path, &canonical, false));
    }

    info!(
        "File names: {} renamed, {} unchanged, {} errors",
        report.renamed, report.unchanged, report.errors
    );
    Ok(report)
}

/// Normalize the name of every directory below `root` (not `root` itself).
///
/// Directories are visited deepest first so renaming a parent never
/// invalidates a path still waiting to be processed.
pub fn sanitize_directory_names(fs: &dyn FileSystem, root: &Path) -> Result<RenameReport> {
    validate_root(root)?;
    let mut report = RenameReport::default();
    let walk = collect_dirs_bottom_up(root);
    report.errors += walk.errors;

    for path in walk.paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let canonical = normalize_dir_name(&name);
        report.record(rename_to_canonical(fs, &path, &canonical, true));
    }

    info!(
        "Directory names: {} renamed, {} unchanged, {} errors",
        report.renamed, report.unchanged, report.errors
    );
    Ok(report)
}

/// Counters for a marker cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemovalReport {
    pub removed: usize,
    pub errors: usize,
    pub removed_paths: Vec<PathBuf>,
}

/// Delete every file named exactly `marker` under `root`.
pub fn remove_marker_files(fs: &dyn FileSystem, root: &Path, marker: &str) -> Result<RemovalReport> {
    validate_root(root)?;
    info!("Searching for {} under {}", marker, root.display());
    let mut report = RemovalReport::default();
    let walk = collect_files(root);
    report.errors += walk.errors;

    for path in walk.paths {
        if path.file_name().map_or(true, |n| n != marker) {
            continue;
        }
        match fs.remove_file(&path) {
            Ok(()) => {
                info!("Removed: {}", path.display());
                report.removed += 1;
                report.removed_paths.push(path);
            }
            Err(e) => {
                warn!("Failed to remove {}: {}", path.display(), e);
                report.errors += 1;
            }
        }
    }

    info!("Removed {} marker files", report.removed);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilingConfig;
    use crate::platform::OsFileSystem;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, path.to_string_lossy().as_bytes()).unwrap();
    }

    fn names_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_sanitize_file_names() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("My Holiday.JPG"));
        touch(&temp.path().join("ＦＯＴＯ★.JPG"));
        touch(&temp.path().join("写真.png"));
        touch(&temp.path().join("already_fine.txt"));

        let report = sanitize_file_names(&OsFileSystem::new(), temp.path()).unwrap();
        assert_eq!(report.scanned, 4);
        assert_eq!(report.renamed, 3);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.errors, 0);
        assert_eq!(
            names_in(temp.path()),
            vec!["already_fine.txt", "file.png", "foto.jpg", "my_holiday.jpg"]
        );
    }

    #[test]
    fn test_sanitize_file_names_is_idempotent() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("Trip Photo.JPG"));
        touch(&temp.path().join("sub").join("Notes (1).TXT"));

        let fs = OsFileSystem::new();
        sanitize_file_names(&fs, temp.path()).unwrap();
        let second = sanitize_file_names(&fs, temp.path()).unwrap();
        assert_eq!(second.renamed, 0);
        assert_eq!(second.unchanged, 2);
        assert!(temp.path().join("sub").join("notes_1.txt").exists());
    }

    #[test]
    fn test_sanitize_file_names_collisions() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("Beach!.jpg"));
        touch(&temp.path().join("Beach?.jpg"));

        let report = sanitize_file_names(&OsFileSystem::new(), temp.path()).unwrap();
        assert_eq!(report.renamed, 2);
        assert_eq!(names_in(temp.path()), vec!["beach.jpg", "beach_1.jpg"]);
    }

    #[test]
    fn test_sanitize_directory_names_bottom_up() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("Old Photos").join("Summer 2019").join("a.jpg"));
        std::fs::create_dir_all(temp.path().join("写真")).unwrap();

        let report = sanitize_directory_names(&OsFileSystem::new(), temp.path()).unwrap();
        assert_eq!(report.renamed, 3);
        assert_eq!(report.errors, 0);
        assert!(temp
            .path()
            .join("old_photos")
            .join("summer_2019")
            .join("a.jpg")
            .exists());
        assert!(temp.path().join("folder").is_dir());
    }

    #[test]
    fn test_directory_case_collision() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("v1")).unwrap();
        std::fs::create_dir_all(temp.path().join("V1")).unwrap();

        let report = sanitize_directory_names(&OsFileSystem::new(), temp.path()).unwrap();
        assert_eq!(report.renamed, 1);
        assert_eq!(names_in(temp.path()), vec!["v1", "v1_1"]);
    }

    #[test]
    fn test_remove_marker_files() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join(FilingConfig::MARKER_FILE_NAME));
        touch(&temp.path().join("a").join(FilingConfig::MARKER_FILE_NAME));
        touch(&temp.path().join("a").join("keep.txt"));

        let report =
            remove_marker_files(&OsFileSystem::new(), temp.path(), FilingConfig::MARKER_FILE_NAME)
                .unwrap();
        assert_eq!(report.removed, 2);
        assert!(temp.path().join("a").join("keep.txt").exists());
        assert!(!temp.path().join(FilingConfig::MARKER_FILE_NAME).exists());
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        assert!(sanitize_file_names(&OsFileSystem::new(), &missing).is_err());
        assert!(sanitize_directory_names(&OsFileSystem::new(), &missing).is_err());
    }
}

//! Collision-safe target path resolution.
//!
//! [`ensure_unique`] holds no state between calls: asking twice for the
//! same path without touching the filesystem gives the same answer.

use crate::config::FilingConfig;
use crate::error::{ChronofileError, Result};
use crate::naming::split_name;
use crate::platform::FileSystem;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Return a path that does not collide with an existing entry.
///
/// `desired` comes back unchanged when nothing exists there. Otherwise
/// `base_1.ext`, `base_2.ext`, ... are proposed in the same directory until
/// one is free, or exists but is the same entry as `desired` under native
/// case folding. Directories never get their name split at a dot.
///
/// Fails with [`ChronofileError::PathCollisionUnresolvable`] after
/// [`FilingConfig::MAX_UNIQUE_ATTEMPTS`] candidates.
pub fn ensure_unique(fs: &dyn FileSystem, desired: &Path, is_directory: bool) -> Result<PathBuf> {
    if !fs.exists(desired) {
        return Ok(desired.to_path_buf());
    }

    let name = desired
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (base, ext) = split_name(&name, is_directory);
    let dir = desired.parent().unwrap_or_else(|| Path::new(""));

    for counter in 1..=FilingConfig::MAX_UNIQUE_ATTEMPTS {
        let candidate = dir.join(format!("{}_{}{}", base, counter, ext));
        if !fs.exists(&candidate) || fs.same_entry(&candidate, desired) {
            debug!(
                "Resolved collision {} -> {}",
                desired.display(),
                candidate.display()
            );
            return Ok(candidate);
        }
    }

    Err(ChronofileError::PathCollisionUnresolvable {
        desired: desired.to_path_buf(),
        attempts: FilingConfig::MAX_UNIQUE_ATTEMPTS,
    })
}

/// Resolve where `source` should be renamed to when its canonical path is `desired`.
///
/// A target that is `source` itself, or the same entry spelled with
/// different case, is returned as-is so case-only renames go through.
/// Everything else goes through [`ensure_unique`].
pub fn resolve_rename_target(
    fs: &dyn FileSystem,
    source: &Path,
    desired: &Path,
    is_directory: bool,
) -> Result<PathBuf> {
    if source == desired || fs.same_entry(source, desired) {
        return Ok(desired.to_path_buf());
    }
    ensure_unique(fs, desired, is_directory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::filesystem::fake::MemoryFileSystem;
    use crate::platform::OsFileSystem;
    use tempfile::TempDir;

    #[test]
    fn test_missing_path_returned_unchanged() {
        let fs = MemoryFileSystem::case_sensitive();
        let desired = Path::new("photos/beach.jpg");
        assert_eq!(ensure_unique(&fs, desired, false).unwrap(), desired);
    }

    #[test]
    fn test_existing_path_gets_counter() {
        let fs = MemoryFileSystem::case_sensitive()
            .with_entries(["photos/beach.jpg", "photos/beach_1.jpg"]);
        let resolved = ensure_unique(&fs, Path::new("photos/beach.jpg"), false).unwrap();
        assert_eq!(resolved, Path::new("photos/beach_2.jpg"));
    }

    #[test]
    fn test_directory_has_no_extension() {
        let fs = MemoryFileSystem::case_sensitive().with_entries(["root/v1.2"]);
        let resolved = ensure_unique(&fs, Path::new("root/v1.2"), true).unwrap();
        assert_eq!(resolved, Path::new("root/v1.2_1"));

        let resolved = ensure_unique(&fs, Path::new("root/v1.2"), false).unwrap();
        assert_eq!(resolved, Path::new("root/v1_1.2"));
    }

    #[test]
    fn test_deterministic_without_mutation() {
        let fs = MemoryFileSystem::case_sensitive().with_entries(["a/x.txt", "a/x_1.txt"]);
        let first = ensure_unique(&fs, Path::new("a/x.txt"), false).unwrap();
        let second = ensure_unique(&fs, Path::new("a/x.txt"), false).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_case_insensitive_collision() {
        let fs = MemoryFileSystem::case_insensitive().with_entries(["a/Report.TXT"]);
        let resolved = ensure_unique(&fs, Path::new("a/report.txt"), false).unwrap();
        assert_eq!(resolved, Path::new("a/report_1.txt"));
    }

    #[test]
    fn test_case_only_rename_keeps_target() {
        let fs = MemoryFileSystem::case_insensitive().with_entries(["a/Photo.JPG"]);
        let resolved =
            resolve_rename_target(&fs, Path::new("a/Photo.JPG"), Path::new("a/photo.jpg"), false)
                .unwrap();
        assert_eq!(resolved, Path::new("a/photo.jpg"));
    }

    #[test]
    fn test_rename_target_avoids_other_entry() {
        let fs = MemoryFileSystem::case_sensitive().with_entries(["a/Photo.JPG", "a/photo.jpg"]);
        let resolved =
            resolve_rename_target(&fs, Path::new("a/Photo.JPG"), Path::new("a/photo.jpg"), false)
                .unwrap();
        assert_eq!(resolved, Path::new("a/photo_1.jpg"));
    }

    #[test]
    fn test_pathological_filesystem_fails_loudly() {
        let fs = MemoryFileSystem::always_exists();
        let err = ensure_unique(&fs, Path::new("a/x.txt"), false).unwrap_err();
        assert!(matches!(
            err,
            ChronofileError::PathCollisionUnresolvable { attempts, .. }
                if attempts == FilingConfig::MAX_UNIQUE_ATTEMPTS
        ));
    }

    #[test]
    fn test_on_disk_collision() {
        let temp = TempDir::new().unwrap();
        let desired = temp.path().join("notes.txt");
        std::fs::write(&desired, "x").unwrap();

        let fs = OsFileSystem::new();
        let resolved = ensure_unique(&fs, &desired, false).unwrap();
        assert_eq!(resolved, temp.path().join("notes_1.txt"));
        assert!(!resolved.exists());
    }
}

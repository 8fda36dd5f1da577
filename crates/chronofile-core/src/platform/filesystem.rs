//! Filesystem collaborator for rename, move and mkdir operations.
//!
//! The renaming algorithms only ever talk to the filesystem through
//! [`FileSystem`], so they can be exercised against an in-memory fake that
//! behaves like a case-insensitive volume.

use crate::error::{ChronofileError, Result};
use std::path::Path;
use tracing::debug;

/// Fold a path with the platform's native case rule.
///
/// # Platform Behavior
/// - **Windows**: lower-cased, `/` replaced by `\`
/// - **Other platforms**: unchanged
pub fn normcase(path: &Path) -> String {
    let raw = path.to_string_lossy();
    #[cfg(windows)]
    {
        raw.to_lowercase().replace('/', "\\")
    }
    #[cfg(not(windows))]
    {
        raw.into_owned()
    }
}

/// Minimal filesystem surface needed by the core algorithms.
pub trait FileSystem: Send + Sync {
    /// True if an entry (file or directory) exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// True if `a` and `b` name the same entry under native case folding.
    fn same_entry(&self, a: &Path, b: &Path) -> bool;

    /// Rename or move `src` to `dst`.
    ///
    /// Fails with [`ChronofileError::DestinationExists`] when `dst` exists,
    /// unless it is the same entry as `src` (a case-only rename).
    fn rename(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Create `path` and all missing parents. Succeeds if it already exists.
    fn make_directories(&self, path: &Path) -> Result<()>;

    /// Delete a single file.
    fn remove_file(&self, path: &Path) -> Result<()>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl OsFileSystem {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
fn same_inode(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    if a.parent() != b.parent() {
        return false;
    }
    match (std::fs::symlink_metadata(a), std::fs::symlink_metadata(b)) {
        (Ok(ma), Ok(mb)) => ma.dev() == mb.dev() && ma.ino() == mb.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_inode(_a: &Path, _b: &Path) -> bool {
    false
}

impl FileSystem for OsFileSystem {
    fn exists(&self, path: &Path) -> bool {
        std::fs::symlink_metadata(path).is_ok()
    }

    fn same_entry(&self, a: &Path, b: &Path) -> bool {
        // Case-insensitive volumes on case-preserving platforms (macOS) still
        // resolve both spellings to one inode.
        normcase(a) == normcase(b) || same_inode(a, b)
    }

    fn rename(&self, src: &Path, dst: &Path) -> Result<()> {
        if src == dst {
            return Ok(());
        }
        if self.exists(dst) && !self.same_entry(src, dst) {
            return Err(ChronofileError::DestinationExists(dst.to_path_buf()));
        }
        std::fs::rename(src, dst).map_err(|e| ChronofileError::io_with_path(e, src))?;
        debug!("Renamed {} -> {}", src.display(), dst.display());
        Ok(())
    }

    fn make_directories(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path).map_err(|e| ChronofileError::io_with_path(e, path))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        std::fs::remove_file(path).map_err(|e| ChronofileError::io_with_path(e, path))
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory filesystem for exercising collision handling without disk I/O.

    use super::*;
    use std::collections::BTreeSet;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    pub struct MemoryFileSystem {
        entries: Mutex<BTreeSet<PathBuf>>,
        case_insensitive: bool,
        /// Report every path as existing.
        always_exists: bool,
    }

    impl MemoryFileSystem {
        pub fn case_sensitive() -> Self {
            Self::default()
        }

        pub fn case_insensitive() -> Self {
            Self {
                case_insensitive: true,
                ..Self::default()
            }
        }

        pub fn always_exists() -> Self {
            Self {
                always_exists: true,
                ..Self::default()
            }
        }

        pub fn with_entries<I, P>(self, paths: I) -> Self
        where
            I: IntoIterator<Item = P>,
            P: Into<PathBuf>,
        {
            self.entries
                .lock()
                .unwrap()
                .extend(paths.into_iter().map(Into::into));
            self
        }

        pub fn contains_exact(&self, path: &Path) -> bool {
            self.entries.lock().unwrap().contains(path)
        }

        fn fold(&self, path: &Path) -> String {
            let raw = path.to_string_lossy();
            if self.case_insensitive {
                raw.to_lowercase()
            } else {
                raw.into_owned()
            }
        }

        fn find(&self, path: &Path) -> Option<PathBuf> {
            let key = self.fold(path);
            self.entries
                .lock()
                .unwrap()
                .iter()
                .find(|p| self.fold(p) == key)
                .cloned()
        }
    }

    impl FileSystem for MemoryFileSystem {
        fn exists(&self, path: &Path) -> bool {
            self.always_exists || self.find(path).is_some()
        }

        fn same_entry(&self, a: &Path, b: &Path) -> bool {
            self.fold(a) == self.fold(b)
        }

        fn rename(&self, src: &Path, dst: &Path) -> Result<()> {
            let stored = self
                .find(src)
                .ok_or_else(|| ChronofileError::FileNotFound(src.to_path_buf()))?;
            if self.exists(dst) && !self.same_entry(src, dst) {
                return Err(ChronofileError::DestinationExists(dst.to_path_buf()));
            }
            let mut entries = self.entries.lock().unwrap();
            entries.remove(&stored);
            entries.insert(dst.to_path_buf());
            Ok(())
        }

        fn make_directories(&self, path: &Path) -> Result<()> {
            let mut entries = self.entries.lock().unwrap();
            for ancestor in path.ancestors() {
                if ancestor.as_os_str().is_empty() {
                    break;
                }
                entries.insert(ancestor.to_path_buf());
            }
            Ok(())
        }

        fn remove_file(&self, path: &Path) -> Result<()> {
            let stored = self
                .find(path)
                .ok_or_else(|| ChronofileError::FileNotFound(path.to_path_buf()))?;
            self.entries.lock().unwrap().remove(&stored);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normcase_is_stable() {
        let path = Path::new("Photos/IMG_0001.JPG");
        assert_eq!(normcase(path), normcase(path));
        #[cfg(windows)]
        assert_eq!(normcase(path), "photos\\img_0001.jpg");
        #[cfg(not(windows))]
        assert_eq!(normcase(path), "Photos/IMG_0001.JPG");
    }

    #[test]
    fn test_rename_refuses_to_clobber() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.txt");
        let b = temp.path().join("b.txt");
        std::fs::write(&a, "a").unwrap();
        std::fs::write(&b, "b").unwrap();

        let fs = OsFileSystem::new();
        let err = fs.rename(&a, &b).unwrap_err();
        assert!(matches!(err, ChronofileError::DestinationExists(_)));
        assert_eq!(std::fs::read_to_string(&b).unwrap(), "b");
    }

    #[test]
    fn test_rename_onto_itself_is_noop() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.txt");
        std::fs::write(&a, "a").unwrap();

        let fs = OsFileSystem::new();
        fs.rename(&a, &a).unwrap();
        assert!(a.exists());
    }

    #[test]
    fn test_make_directories_idempotent() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("images").join("2023").join("07-04");

        let fs = OsFileSystem::new();
        fs.make_directories(&nested).unwrap();
        fs.make_directories(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_same_entry_for_identical_paths() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.txt");
        std::fs::write(&a, "a").unwrap();

        let fs = OsFileSystem::new();
        assert!(fs.same_entry(&a, &a));
        assert!(!fs.same_entry(&a, &temp.path().join("b.txt")));
    }

    #[test]
    fn test_fake_case_insensitive_lookup() {
        let fs = fake::MemoryFileSystem::case_insensitive().with_entries(["dir/Photo.JPG"]);
        assert!(fs.exists(Path::new("dir/photo.jpg")));
        assert!(fs.same_entry(Path::new("dir/Photo.JPG"), Path::new("dir/photo.jpg")));

        fs.rename(Path::new("dir/Photo.JPG"), Path::new("dir/photo.jpg"))
            .unwrap();
        assert!(fs.contains_exact(Path::new("dir/photo.jpg")));
        assert!(!fs.contains_exact(Path::new("dir/Photo.JPG")));
    }
}

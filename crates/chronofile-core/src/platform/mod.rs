//! Platform abstraction layer.
//!
//! All `#[cfg]` blocks for OS-specific behavior live here: native path case
//! folding and the filesystem collaborator used by the renaming operations.

pub mod filesystem;

pub use filesystem::{normcase, FileSystem, OsFileSystem};

/// Returns the current platform name.
pub fn current_platform() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        "linux"
    }
    #[cfg(target_os = "windows")]
    {
        "windows"
    }
    #[cfg(target_os = "macos")]
    {
        "macos"
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        "unknown"
    }
}

//! Chronofile Core - Headless library for normalizing and filing photo collections.
//!
//! This crate provides the algorithms behind the `chronofile` command line
//! tool. It can be used programmatically; nothing here prints to stdout,
//! progress is reported through `tracing` and typed reports.
//!
//! - [`naming`]: canonical ASCII names for files and directories
//! - [`unique`]: collision-free target paths
//! - [`filing`]: capture-date prefixes and `YYYY/MM-DD` destinations
//! - [`judgment`]: majority vote over classification labels
//! - [`operations`]: tree walks that tie the above to the filesystem
//!
//! # Example
//!
//! ```rust,no_run
//! use chronofile_core::{organize_photos_by_date, ExifExtractor, OsFileSystem};
//! use std::path::Path;
//!
//! fn main() -> chronofile_core::Result<()> {
//!     let report = organize_photos_by_date(
//!         &OsFileSystem::new(),
//!         &ExifExtractor::new(),
//!         Path::new("/photos/inbox"),
//!         Path::new("images"),
//!     )?;
//!     println!("Moved {} photos", report.moved);
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod classify;
pub mod config;
pub mod error;
pub mod filing;
pub mod judgment;
pub mod metadata;
pub mod naming;
pub mod operations;
pub mod platform;
pub mod report;
pub mod unique;

// Re-export commonly used types
pub use cancel::{CancellationToken, CancelledError};
pub use classify::{ClassificationRequest, Classifier, OpenAiClassifier};
pub use config::{ClassifierConfig, FilingConfig};
pub use error::{ChronofileError, Result};
pub use judgment::{aggregate, AggregateResult, ClassificationLabel, CorrelationSummary};
pub use metadata::{ExifExtractor, MetadataExtractor, MetadataMap};
pub use naming::{normalize_dir_name, normalize_file_name, normalize_name};
pub use operations::{
    analyze_path_metadata_correlation, organize_photos_by_date, prefix_photos_with_date,
    remove_marker_files, sanitize_directory_names, sanitize_file_names, CorrelationReport,
    DatePrefixReport, OrganizeReport, RemovalReport, RenameReport,
};
pub use platform::{FileSystem, OsFileSystem};
pub use report::{
    extension_report, write_capture_date_report, write_missing_date_report, ExtensionReport,
    MissingDateReport,
};
pub use unique::ensure_unique;

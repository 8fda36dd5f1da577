//! Error types for Chronofile.
//!
//! Per-file conditions (missing capture date, unparsable timestamp) are
//! represented here too so operations can count them as skips instead of
//! aborting a run. Use [`ChronofileError::is_skip`] to tell them apart.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the Chronofile library.
#[derive(Debug, Error)]
pub enum ChronofileError {
    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("No free name for {desired} after {attempts} attempts")]
    PathCollisionUnresolvable { desired: PathBuf, attempts: u32 },

    // Metadata errors
    #[error("Capture date missing: {0}")]
    MetadataMissing(PathBuf),

    #[error("Invalid capture timestamp {value:?}: {message}")]
    TimestampParse { value: String, message: String },

    // Classification service errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Chronofile operations.
pub type Result<T> = std::result::Result<T, ChronofileError>;

impl From<std::io::Error> for ChronofileError {
    fn from(err: std::io::Error) -> Self {
        ChronofileError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for ChronofileError {
    fn from(err: serde_json::Error) -> Self {
        ChronofileError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for ChronofileError {
    fn from(err: reqwest::Error) -> Self {
        ChronofileError::Network {
            message: err.to_string(),
            cause: err.url().map(|u| u.to_string()),
        }
    }
}

impl ChronofileError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        ChronofileError::Io {
            message: format!("{} ({})", err, path.display()),
            path: Some(path),
            source: Some(err),
        }
    }

    /// True for conditions that skip a single file and are counted, not failed.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            ChronofileError::MetadataMissing(_) | ChronofileError::TimestampParse { .. }
        )
    }

    /// True for classification-service failures, which become a `JUDGE_ERROR` vote.
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            ChronofileError::Network { .. } | ChronofileError::Timeout(_) | ChronofileError::Json { .. }
        )
    }
}

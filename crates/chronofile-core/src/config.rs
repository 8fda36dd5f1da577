//! Centralized configuration for Chronofile.
//!
//! Constants live on unit structs grouped by concern. The classification
//! service settings are a runtime value ([`ClassifierConfig`]) handed to the
//! analysis loop at construction time.

use crate::error::{ChronofileError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "Chronofile";
    pub const USER_AGENT: &'static str = "chronofile";
}

/// Constants for renaming and filing.
pub struct FilingConfig;

impl FilingConfig {
    /// Base name used when a file name normalizes to nothing.
    pub const FILE_FALLBACK: &'static str = "file";
    /// Directory name used when a directory name normalizes to nothing.
    pub const FOLDER_FALLBACK: &'static str = "folder";
    /// Upper bound on `_N` candidates tried by the unique-path resolver.
    pub const MAX_UNIQUE_ATTEMPTS: u32 = 10_000;
    /// Default destination root for chronological filing.
    pub const DEFAULT_TARGET_DIR: &'static str = "images";
    /// Search index file left behind by the FileMany desktop search tool.
    pub const MARKER_FILE_NAME: &'static str = "_filemany.simDB";
    /// Extensions treated as photos.
    pub const PHOTO_EXTENSIONS: &'static [&'static str] = &["jpg", "jpeg"];
    /// EXIF capture timestamp layout.
    pub const EXIF_TIMESTAMP_FORMAT: &'static str = "%Y:%m:%d %H:%M:%S";
    /// Extensions with at most this many files get their paths listed.
    pub const EXTENSION_LISTING_THRESHOLD: usize = 50;
    pub const CAPTURE_DATE_REPORT: &'static str = "exif_report.txt";
    pub const MISSING_DATE_REPORT: &'static str = "exif_errors.txt";
}

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const DEFAULT_ENDPOINT: &'static str = "http://localhost:1234/v1";
    pub const DEFAULT_MODEL: &'static str = "gemma-3-4b-it";
    pub const DEFAULT_SAMPLES: usize = 5;
    pub const DEFAULT_MAX_PHOTOS: usize = 100;
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Settings for the path/metadata correlation analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Base URL of an OpenAI-compatible API, without the trailing route.
    pub endpoint: String,
    pub model: String,
    /// Sent as a bearer token when non-empty.
    pub api_key: String,
    /// Judgments collected per photo before voting.
    pub samples: usize,
    /// Stop after this many analyzed photos.
    pub max_photos: usize,
    pub request_timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: NetworkConfig::DEFAULT_ENDPOINT.to_string(),
            model: NetworkConfig::DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            samples: NetworkConfig::DEFAULT_SAMPLES,
            max_photos: NetworkConfig::DEFAULT_MAX_PHOTOS,
            request_timeout_secs: NetworkConfig::REQUEST_TIMEOUT.as_secs(),
        }
    }
}

impl ClassifierConfig {
    /// Load settings from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ChronofileError::io_with_path(e, path))?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| ChronofileError::Json {
            message: format!("Failed to parse {}: {}", path.display(), e),
            source: Some(e),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(ChronofileError::Config {
                message: "classifier endpoint must not be empty".to_string(),
            });
        }
        if self.samples == 0 {
            return Err(ChronofileError::Config {
                message: "samples must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

//! Embedded photo metadata.
//!
//! [`MetadataExtractor`] is the seam between the filing operations and
//! whatever reads capture dates. [`ExifExtractor`] reads the EXIF container
//! of JPEG/TIFF files without decoding any pixels.

use crate::config::FilingConfig;
use crate::error::{ChronofileError, Result};
use crate::filing::parse_capture_timestamp;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Tag name -> value, as read from a file.
pub type MetadataMap = BTreeMap<String, String>;

pub const DATE_TIME_ORIGINAL: &str = "DateTimeOriginal";
pub const MAKE: &str = "Make";
pub const MODEL: &str = "Model";
pub const GPS_INFO: &str = "GPSInfo";

/// Reads embedded metadata from a file.
pub trait MetadataExtractor: Send + Sync {
    /// Extract all readable fields.
    ///
    /// Files that are not images, or carry no metadata, yield an empty map.
    /// An error means the file itself could not be read.
    fn extract(&self, path: &Path) -> Result<MetadataMap>;
}

/// EXIF extractor backed by `kamadak-exif`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifExtractor;

impl ExifExtractor {
    pub fn new() -> Self {
        Self
    }
}

fn field_value(field: &exif::Field) -> String {
    match &field.value {
        // Keep the raw text; display_value() would reformat timestamps
        exif::Value::Ascii(parts) => parts
            .first()
            .map(|bytes| {
                String::from_utf8_lossy(bytes)
                    .trim_end_matches('\0')
                    .to_string()
            })
            .unwrap_or_default(),
        _ => field.display_value().to_string(),
    }
}

impl MetadataExtractor for ExifExtractor {
    fn extract(&self, path: &Path) -> Result<MetadataMap> {
        let file = File::open(path).map_err(|e| ChronofileError::io_with_path(e, path))?;
        let mut reader = BufReader::new(file);

        let exif = match exif::Reader::new().read_from_container(&mut reader) {
            Ok(exif) => exif,
            Err(e) => {
                debug!("No EXIF data in {}: {}", path.display(), e);
                return Ok(MetadataMap::new());
            }
        };

        let mut map = MetadataMap::new();
        for field in exif.fields() {
            if field.ifd_num != exif::In::PRIMARY {
                continue;
            }
            if field.tag.context() == exif::Context::Gps {
                map.entry(GPS_INFO.to_string())
                    .or_insert_with(|| "present".to_string());
            }
            map.entry(field.tag.to_string())
                .or_insert_with(|| field_value(field));
        }
        Ok(map)
    }
}

/// True for files handled as photos (`.jpg` / `.jpeg`, any case).
pub fn is_photo(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| FilingConfig::PHOTO_EXTENSIONS.contains(&ext.as_str()))
}

/// Capture timestamp of a file from its metadata.
///
/// Fails with [`ChronofileError::MetadataMissing`] when there is no
/// `DateTimeOriginal`, and [`ChronofileError::TimestampParse`] when it does
/// not match `YYYY:MM:DD HH:MM:SS` exactly.
pub fn capture_timestamp(path: &Path, metadata: &MetadataMap) -> Result<NaiveDateTime> {
    let raw = metadata
        .get(DATE_TIME_ORIGINAL)
        .ok_or_else(|| ChronofileError::MetadataMissing(path.to_path_buf()))?;
    parse_capture_timestamp(raw)
}

/// The handful of fields shown to the classification service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataSummary {
    pub date_time_original: String,
    pub make: String,
    pub model: String,
    pub has_gps: bool,
}

impl MetadataSummary {
    pub fn from_map(map: &MetadataMap) -> Self {
        let get = |key: &str| map.get(key).cloned().unwrap_or_default();
        Self {
            date_time_original: get(DATE_TIME_ORIGINAL),
            make: get(MAKE),
            model: get(MODEL),
            has_gps: map.contains_key(GPS_INFO),
        }
    }
}

//! Read-only reports over a directory tree.

use crate::error::{ChronofileError, Result};
use crate::metadata::{is_photo, MetadataExtractor, DATE_TIME_ORIGINAL};
use crate::naming::split_name;
use crate::operations::{collect_files, validate_root};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Files sharing one extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionCount {
    /// Lower-cased with its leading dot; empty for files without one.
    pub extension: String,
    pub count: usize,
    pub files: Vec<PathBuf>,
}

/// Extension histogram of a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionReport {
    pub total_files: usize,
    /// Most common first; equal counts ordered by extension.
    pub extensions: Vec<ExtensionCount>,
    /// Entries the walk could not read.
    pub unreadable: usize,
}

impl ExtensionReport {
    /// Share of all files with `extension`, in percent.
    pub fn percentage(&self, extension: &str) -> f64 {
        if self.total_files == 0 {
            return 0.0;
        }
        let count = self
            .extensions
            .iter()
            .find(|e| e.extension == extension)
            .map_or(0, |e| e.count);
        count as f64 / self.total_files as f64 * 100.0
    }
}

/// Count files under `root` by lower-cased extension.
pub fn extension_report(root: &Path) -> Result<ExtensionReport> {
    validate_root(root)?;
    let mut groups: HashMap<String, Vec<PathBuf>> = HashMap::new();
    let mut total_files = 0;
    let walk = collect_files(root);

    for path in walk.paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = split_name(&name, false).1.to_lowercase();
        groups.entry(extension).or_default().push(path);
        total_files += 1;
    }

    let mut extensions: Vec<ExtensionCount> = groups
        .into_iter()
        .map(|(extension, files)| ExtensionCount {
            extension,
            count: files.len(),
            files,
        })
        .collect();
    extensions.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.extension.cmp(&b.extension)));

    info!(
        "Counted {} files with {} distinct extensions under {}",
        total_files,
        extensions.len(),
        root.display()
    );
    Ok(ExtensionReport {
        total_files,
        extensions,
        unreadable: walk.errors,
    })
}

fn create_report(out: &Path) -> Result<BufWriter<File>> {
    let file = File::create(out).map_err(|e| ChronofileError::io_with_path(e, out))?;
    Ok(BufWriter::new(file))
}

fn capture_date(extractor: &dyn MetadataExtractor, path: &Path) -> Option<String> {
    match extractor.extract(path) {
        Ok(mut metadata) => metadata.remove(DATE_TIME_ORIGINAL),
        Err(e) => {
            debug!("Unreadable photo {}: {}", path.display(), e);
            None
        }
    }
}

/// Write `path -> DateTimeOriginal` for every dated JPEG under `root`.
///
/// Returns the number of lines written.
pub fn write_capture_date_report(
    extractor: &dyn MetadataExtractor,
    root: &Path,
    out: &Path,
) -> Result<usize> {
    validate_root(root)?;
    let mut writer = create_report(out)?;
    let mut written = 0;

    for path in collect_files(root).paths.into_iter().filter(|p| is_photo(p)) {
        if let Some(date) = capture_date(extractor, &path) {
            writeln!(writer, "{} -> {}", path.display(), date)
                .map_err(|e| ChronofileError::io_with_path(e, out))?;
            written += 1;
        }
    }
    writer
        .flush()
        .map_err(|e| ChronofileError::io_with_path(e, out))?;

    info!("Capture dates for {} photos written to {}", written, out.display());
    Ok(written)
}

/// JPEGs that carry no capture date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MissingDateReport {
    pub total_photos: usize,
    pub missing: Vec<PathBuf>,
    /// Entries the walk could not read.
    pub unreadable: usize,
}

impl MissingDateReport {
    /// Share of photos without a capture date, in percent.
    pub fn missing_rate(&self) -> f64 {
        if self.total_photos == 0 {
            0.0
        } else {
            self.missing.len() as f64 / self.total_photos as f64 * 100.0
        }
    }
}

/// List every JPEG under `root` without a capture date.
///
/// The file starts with a `#` header naming the generation time and the
/// searched root, followed by one path per line.
pub fn write_missing_date_report(
    extractor: &dyn MetadataExtractor,
    root: &Path,
    out: &Path,
) -> Result<MissingDateReport> {
    validate_root(root)?;
    let mut writer = create_report(out)?;
    let io_err = |e| ChronofileError::io_with_path(e, out);

    writeln!(writer, "# JPEG files without an EXIF capture date").map_err(io_err)?;
    writeln!(
        writer,
        "# Generated: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )
    .map_err(io_err)?;
    writeln!(writer, "# Root: {}", root.display()).map_err(io_err)?;
    writeln!(writer).map_err(io_err)?;

    let walk = collect_files(root);
    let mut report = MissingDateReport {
        unreadable: walk.errors,
        ..Default::default()
    };
    for path in walk.paths.into_iter().filter(|p| is_photo(p)) {
        report.total_photos += 1;
        if capture_date(extractor, &path).is_none() {
            writeln!(writer, "{}", path.display()).map_err(io_err)?;
            report.missing.push(path);
        }
    }
    writer.flush().map_err(io_err)?;

    info!(
        "{} of {} photos have no capture date ({:.2}%), list written to {}",
        report.missing.len(),
        report.total_photos,
        report.missing_rate(),
        out.display()
    );
    Ok(report)
}

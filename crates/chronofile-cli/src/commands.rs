//! Command dispatch and human-readable output.

use crate::Command;
use anyhow::{Context, Result};
use chronofile_core::config::FilingConfig;
use chronofile_core::{
    analyze_path_metadata_correlation, extension_report, organize_photos_by_date,
    prefix_photos_with_date, remove_marker_files, sanitize_directory_names, sanitize_file_names,
    write_capture_date_report, write_missing_date_report, CancellationToken, ClassifierConfig,
    CorrelationReport, ExifExtractor, ExtensionReport, OpenAiClassifier, OsFileSystem,
    RenameReport,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Classification service settings for `analyze`.
#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzeArgs {
    /// JSON file with classifier settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Model name sent with each request
    #[arg(long)]
    pub model: Option<String>,

    /// Judgments per photo
    #[arg(long)]
    pub samples: Option<usize>,

    /// Stop after this many photos
    #[arg(long)]
    pub max_photos: Option<usize>,
}

impl AnalyzeArgs {
    /// Settings file (or defaults) with command line overrides applied.
    pub fn classifier_config(&self) -> Result<ClassifierConfig> {
        let mut config = match &self.config {
            Some(path) => ClassifierConfig::from_json_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => ClassifierConfig::default(),
        };
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(samples) = self.samples {
            config.samples = samples;
        }
        if let Some(max_photos) = self.max_photos {
            config.max_photos = max_photos;
        }
        config.validate()?;
        Ok(config)
    }
}

pub async fn run(command: Command, root: &Path) -> Result<()> {
    let fs = OsFileSystem::new();
    let extractor = ExifExtractor::new();

    match command {
        Command::RemoveMarkers => {
            let report = remove_marker_files(&fs, root, FilingConfig::MARKER_FILE_NAME)?;
            println!(
                "Removed {} {} files ({} errors)",
                report.removed,
                FilingConfig::MARKER_FILE_NAME,
                report.errors
            );
        }
        Command::ReportExtensions => {
            let report = extension_report(root)?;
            print!("{}", format_extension_report(&report));
        }
        Command::NormalizeFiles => {
            let report = sanitize_file_names(&fs, root)?;
            println!("{}", format_rename_report("files", &report));
        }
        Command::NormalizeDirs => {
            let report = sanitize_directory_names(&fs, root)?;
            println!("{}", format_rename_report("directories", &report));
        }
        Command::ReportExif {
            output,
            missing_output,
        } => {
            let dated = write_capture_date_report(&extractor, root, &output)?;
            println!("Photos with a capture date: {}", dated);
            println!("Report saved to {}", output.display());

            let missing = write_missing_date_report(&extractor, root, &missing_output)?;
            println!("Total photos: {}", missing.total_photos);
            println!(
                "Photos without a capture date: {} ({:.2}%)",
                missing.missing.len(),
                missing.missing_rate()
            );
            if missing.unreadable > 0 {
                println!("Unreadable entries: {}", missing.unreadable);
            }
            println!("List saved to {}", missing_output.display());
        }
        Command::DatePrefix => {
            let report = prefix_photos_with_date(&fs, &extractor, root)?;
            println!(
                "Renamed {} photos ({} already prefixed, {} without date, {} bad date, {} errors)",
                report.renamed,
                report.already_prefixed,
                report.no_date,
                report.bad_date,
                report.errors
            );
        }
        Command::Organize { target } => {
            let report = organize_photos_by_date(&fs, &extractor, root, &target)?;
            println!(
                "Moved {} photos ({} already filed, {} without date, {} bad date, {} errors)",
                report.moved, report.already_filed, report.no_date, report.bad_date, report.errors
            );
        }
        Command::Analyze(args) => {
            let config = args.classifier_config()?;
            let classifier = OpenAiClassifier::new(&config)?;
            let cancel = CancellationToken::new();

            let handle = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, finishing the current request");
                    handle.cancel();
                }
            });

            info!("Using {} at {}", config.model, config.endpoint);
            let report =
                analyze_path_metadata_correlation(&extractor, &classifier, root, &config, &cancel)
                    .await?;
            print!("{}", format_correlation_report(&report));
        }
    }
    Ok(())
}

fn format_rename_report(kind: &str, report: &RenameReport) -> String {
    format!(
        "Normalized {}: {} renamed, {} unchanged, {} errors",
        kind, report.renamed, report.unchanged, report.errors
    )
}

fn display_extension(extension: &str) -> &str {
    if extension.is_empty() {
        "(no extension)"
    } else {
        extension
    }
}

/// Per-extension counts; file lists only for extensions with few files.
fn format_extension_report(report: &ExtensionReport) -> String {
    if report.total_files == 0 {
        return "No files found.\n".to_string();
    }

    let mut out = format!("Total files: {}\n", report.total_files);
    for entry in &report.extensions {
        let name = display_extension(&entry.extension);
        out.push_str(&format!(
            "{}: {} files, {:.2}%\n",
            name,
            entry.count,
            report.percentage(&entry.extension)
        ));
        if entry.count <= FilingConfig::EXTENSION_LISTING_THRESHOLD {
            out.push_str(&format!("  -- {} files --\n", name));
            for path in &entry.files {
                out.push_str(&format!("    {}\n", path.display()));
            }
            out.push('\n');
        }
    }
    if report.unreadable > 0 {
        out.push_str(&format!("Unreadable entries: {}\n", report.unreadable));
    }
    out
}

fn format_correlation_report(report: &CorrelationReport) -> String {
    let summary = &report.summary;
    let mut out = String::new();
    if report.cancelled {
        out.push_str("Analysis cancelled; partial results follow.\n");
    }
    out.push_str(&format!("Photos analyzed: {}\n", summary.total_analyzed));
    out.push_str(&format!(
        "Correlated: {} ({:.1}%)\n",
        summary.has_correlation,
        summary.correlation_rate()
    ));
    out.push_str(&format!("  path likely wrong: {}\n", summary.path_incorrect));
    out.push_str(&format!(
        "  metadata likely wrong: {}\n",
        summary.metadata_incorrect
    ));
    out.push_str(&format!("Not correlated: {}\n", summary.no_correlation));
    out.push_str(&format!("  judge errors: {}\n", summary.judge_errors));
    out.push_str(&format!(
        "Skipped without capture date: {}, unreadable: {}\n",
        report.skipped_no_date, report.errors
    ));

    for record in &summary.details {
        let votes = record
            .result
            .tally
            .iter()
            .map(|(label, count)| format!("{}={}", label, count))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(
            "{} [{}] -> {} ({})\n",
            record.file_path.display(),
            record.capture_date,
            record.result.winner,
            votes
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronofile_core::judgment::JudgmentRecord;
    use chronofile_core::report::ExtensionCount;
    use chronofile_core::{aggregate, ClassificationLabel, CorrelationSummary};
    use tempfile::TempDir;

    #[test]
    fn test_classifier_config_overrides() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("classifier.json");
        std::fs::write(&path, r#"{"model": "llava", "samples": 7}"#).unwrap();

        let args = AnalyzeArgs {
            config: Some(path),
            samples: Some(3),
            ..Default::default()
        };
        let config = args.classifier_config().unwrap();
        assert_eq!(config.model, "llava");
        assert_eq!(config.samples, 3);
        assert_eq!(config.max_photos, 100);
    }

    #[test]
    fn test_classifier_config_rejects_zero_samples() {
        let args = AnalyzeArgs {
            samples: Some(0),
            ..Default::default()
        };
        assert!(args.classifier_config().is_err());
    }

    #[test]
    fn test_format_extension_report() {
        let report = ExtensionReport {
            total_files: 4,
            extensions: vec![
                ExtensionCount {
                    extension: ".jpg".to_string(),
                    count: 3,
                    files: vec![
                        PathBuf::from("a.jpg"),
                        PathBuf::from("b.jpg"),
                        PathBuf::from("c.jpg"),
                    ],
                },
                ExtensionCount {
                    extension: String::new(),
                    count: 1,
                    files: vec![PathBuf::from("README")],
                },
            ],
            unreadable: 2,
        };
        let text = format_extension_report(&report);
        assert!(text.starts_with("Total files: 4\n"));
        assert!(text.contains(".jpg: 3 files, 75.00%\n"));
        assert!(text.contains("(no extension): 1 files, 25.00%\n"));
        assert!(text.contains("    README\n"));
        assert!(text.ends_with("Unreadable entries: 2\n"));
    }

    #[test]
    fn test_format_correlation_report() {
        let mut summary = CorrelationSummary::default();
        let result = aggregate(&[
            ClassificationLabel::Match,
            ClassificationLabel::Match,
            ClassificationLabel::NoRelation,
        ])
        .unwrap();
        summary.record(JudgmentRecord {
            file_path: PathBuf::from("kyoto/temple.jpg"),
            capture_date: "2019:04:01 09:30:00".to_string(),
            result,
        });
        let report = CorrelationReport {
            summary,
            ..Default::default()
        };

        let text = format_correlation_report(&report);
        assert!(text.contains("Correlated: 1 (100.0%)"));
        assert!(text.contains(
            "kyoto/temple.jpg [2019:04:01 09:30:00] -> MATCH (MATCH=2, NO_RELATION=1)"
        ));
        assert!(!text.contains("cancelled"));
    }
}

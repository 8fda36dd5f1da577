//! Path/metadata correlation analysis driven by a classification service.

use super::{collect_files, file_name_str, validate_root};
use crate::cancel::CancellationToken;
use crate::classify::{collect_judgments, ClassificationRequest, Classifier};
use crate::config::ClassifierConfig;
use crate::error::{ChronofileError, Result};
use crate::judgment::{aggregate, CorrelationSummary, JudgmentRecord};
use crate::metadata::{capture_timestamp, is_photo, MetadataExtractor, MetadataSummary};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Outcome of a correlation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorrelationReport {
    pub summary: CorrelationSummary,
    /// Photos passed over because they carry no usable capture date.
    pub skipped_no_date: usize,
    /// Photos that could not be read.
    pub errors: usize,
    /// True when the run stopped early on cancellation.
    pub cancelled: bool,
}

fn build_request(
    root: &Path,
    path: &Path,
    summary: MetadataSummary,
) -> Result<ClassificationRequest> {
    let filename = file_name_str(path)
        .ok_or_else(|| {
            ChronofileError::Other(format!("File name is not valid UTF-8: {}", path.display()))
        })?
        .to_string();
    let relative = path.strip_prefix(root).unwrap_or(path);
    let path_components = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let image_bytes = std::fs::read(path).map_err(|e| ChronofileError::io_with_path(e, path))?;

    Ok(ClassificationRequest {
        path_components,
        filename,
        metadata: summary,
        image_bytes,
    })
}

/// Ask the classifier whether each dated photo's path agrees with its metadata.
///
/// At most `config.max_photos` photos are analyzed. Each gets
/// `config.samples` sequential judgments, reduced to one label by majority
/// vote. Cancellation stops the run before the next call; photos finished
/// by then stay in the summary.
pub async fn analyze_path_metadata_correlation(
    extractor: &dyn MetadataExtractor,
    classifier: &dyn Classifier,
    root: &Path,
    config: &ClassifierConfig,
    cancel: &CancellationToken,
) -> Result<CorrelationReport> {
    validate_root(root)?;
    config.validate()?;
    let timeout = config.request_timeout();
    let mut report = CorrelationReport::default();

    info!(
        "Analyzing up to {} photos under {} ({} samples each)",
        config.max_photos,
        root.display(),
        config.samples
    );

    let walk = collect_files(root);
    report.errors += walk.errors;

    for path in walk.paths.into_iter().filter(|p| is_photo(p)) {
        if report.summary.total_analyzed >= config.max_photos {
            break;
        }
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let metadata = match extractor.extract(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Failed to read metadata of {}: {}", path.display(), e);
                report.errors += 1;
                continue;
            }
        };
        if let Err(e) = capture_timestamp(&path, &metadata) {
            debug!("Skipping {}: {}", path.display(), e);
            report.skipped_no_date += 1;
            continue;
        }

        let summary = MetadataSummary::from_map(&metadata);
        let capture_date = summary.date_time_original.clone();
        let request = match build_request(root, &path, summary) {
            Ok(request) => request,
            Err(e) => {
                warn!("Failed to prepare {}: {}", path.display(), e);
                report.errors += 1;
                continue;
            }
        };

        let batch =
            match collect_judgments(classifier, &request, config.samples, timeout, cancel).await {
                Ok(batch) => batch,
                Err(ChronofileError::Cancelled) => {
                    info!("Analysis cancelled at {}", path.display());
                    report.cancelled = true;
                    break;
                }
                Err(e) => return Err(e),
            };

        let Some(result) = aggregate(&batch) else {
            continue;
        };
        info!(
            "[{}] {} -> {}",
            report.summary.total_analyzed + 1,
            path.display(),
            result.winner
        );
        report.summary.record(JudgmentRecord {
            file_path: path,
            capture_date,
            result,
        });
    }

    let summary = &report.summary;
    info!(
        "Analyzed {} photos: {} correlated ({:.1}%), {} not correlated, {} judge errors",
        summary.total_analyzed,
        summary.has_correlation,
        summary.correlation_rate(),
        summary.no_correlation,
        summary.judge_errors
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::scripted::{Reply, ScriptedClassifier};
    use crate::judgment::ClassificationLabel;
    use crate::operations::photos::dated::DatedExtractor;
    use tempfile::TempDir;

    fn config(samples: usize, max_photos: usize) -> ClassifierConfig {
        ClassifierConfig {
            samples,
            max_photos,
            ..Default::default()
        }
    }

    fn photo(dir: &Path, relative: &str) {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, [0xFF, 0xD8, 0xFF, 0xD9]).unwrap();
    }

    #[tokio::test]
    async fn test_majority_vote_per_photo() {
        let temp = TempDir::new().unwrap();
        photo(temp.path(), "2019_kyoto/a.jpg");
        photo(temp.path(), "2019_kyoto/b.jpg");
        photo(temp.path(), "2019_kyoto/nodate.jpg");
        let extractor = DatedExtractor::default()
            .with("a.jpg", "2019:04:01 09:30:00")
            .with("b.jpg", "2022:08:15 12:00:00");
        let classifier = ScriptedClassifier::new(vec![
            Reply::Text("MATCH"),
            Reply::Text("MATCH"),
            Reply::Fail,
            Reply::Text("MISMATCH_METADATA_WRONG"),
            Reply::Text("MISMATCH_METADATA_WRONG"),
            Reply::Text("MISMATCH_PATH_WRONG"),
        ]);

        let report = analyze_path_metadata_correlation(
            &extractor,
            &classifier,
            temp.path(),
            &config(3, 100),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(classifier.calls(), 6);
        assert_eq!(report.skipped_no_date, 1);
        assert!(!report.cancelled);
        let summary = &report.summary;
        assert_eq!(summary.total_analyzed, 2);
        assert_eq!(summary.has_correlation, 2);
        assert_eq!(summary.metadata_incorrect, 1);
        assert_eq!(summary.details[0].result.winner, ClassificationLabel::Match);
        assert_eq!(summary.details[0].capture_date, "2019:04:01 09:30:00");
        assert_eq!(
            summary.details[1].result.winner,
            ClassificationLabel::MismatchMetadataWrong
        );
    }

    #[tokio::test]
    async fn test_all_failures_roll_up_as_judge_error() {
        let temp = TempDir::new().unwrap();
        photo(temp.path(), "a.jpg");
        let extractor = DatedExtractor::default().with("a.jpg", "2019:04:01 09:30:00");
        let classifier = ScriptedClassifier::new(vec![Reply::Fail, Reply::Fail]);

        let report = analyze_path_metadata_correlation(
            &extractor,
            &classifier,
            temp.path(),
            &config(2, 100),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.summary.judge_errors, 1);
        assert_eq!(report.summary.no_correlation, 1);
        assert_eq!(report.summary.has_correlation, 0);
    }

    #[tokio::test]
    async fn test_max_photos_caps_the_run() {
        let temp = TempDir::new().unwrap();
        let mut extractor = DatedExtractor::default();
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            photo(temp.path(), name);
            extractor = extractor.with(name, "2019:04:01 09:30:00");
        }
        let classifier = ScriptedClassifier::new(vec![
            Reply::Text("NO_RELATION"),
            Reply::Text("NO_RELATION"),
            Reply::Text("NO_RELATION"),
        ]);

        let report = analyze_path_metadata_correlation(
            &extractor,
            &classifier,
            temp.path(),
            &config(1, 2),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.summary.total_analyzed, 2);
        assert_eq!(classifier.calls(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_run_keeps_nothing_new() {
        let temp = TempDir::new().unwrap();
        photo(temp.path(), "a.jpg");
        let extractor = DatedExtractor::default().with("a.jpg", "2019:04:01 09:30:00");
        let classifier = ScriptedClassifier::new(vec![Reply::Text("MATCH")]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = analyze_path_metadata_correlation(
            &extractor,
            &classifier,
            temp.path(),
            &config(5, 100),
            &cancel,
        )
        .await
        .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.summary.total_analyzed, 0);
        assert_eq!(classifier.calls(), 0);
    }

    #[test]
    fn test_build_request_uses_relative_components() {
        let temp = TempDir::new().unwrap();
        photo(temp.path(), "2019_kyoto/temple.jpg");
        let path = temp.path().join("2019_kyoto").join("temple.jpg");

        let request = build_request(temp.path(), &path, MetadataSummary::default()).unwrap();
        assert_eq!(request.path_components, vec!["2019_kyoto", "temple.jpg"]);
        assert_eq!(request.filename, "temple.jpg");
        assert_eq!(request.image_bytes, vec![0xFF, 0xD8, 0xFF, 0xD9]);
    }
}

//! Majority voting over repeated classification judgments.
//!
//! The classification service is noisy, so each photo is judged several
//! times and the votes are aggregated here. Everything in this module is
//! pure and independent of the network client that produces the labels.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

/// Judgment on whether a photo's path agrees with its capture metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationLabel {
    /// Path and metadata are related and agree.
    Match,
    /// Related, but the path is the side that is wrong.
    MismatchPathWrong,
    /// Related, but the metadata is the side that is wrong.
    MismatchMetadataWrong,
    /// Path and metadata are unrelated.
    NoRelation,
    /// The service could not be queried.
    JudgeError,
}

impl ClassificationLabel {
    /// Labels the service is asked to answer with, in parse priority order.
    pub const ANSWERS: [ClassificationLabel; 4] = [
        ClassificationLabel::Match,
        ClassificationLabel::MismatchPathWrong,
        ClassificationLabel::MismatchMetadataWrong,
        ClassificationLabel::NoRelation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationLabel::Match => "MATCH",
            ClassificationLabel::MismatchPathWrong => "MISMATCH_PATH_WRONG",
            ClassificationLabel::MismatchMetadataWrong => "MISMATCH_METADATA_WRONG",
            ClassificationLabel::NoRelation => "NO_RELATION",
            ClassificationLabel::JudgeError => "JUDGE_ERROR",
        }
    }
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ClassificationLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "MATCH" => Ok(ClassificationLabel::Match),
            "MISMATCH_PATH_WRONG" => Ok(ClassificationLabel::MismatchPathWrong),
            "MISMATCH_METADATA_WRONG" => Ok(ClassificationLabel::MismatchMetadataWrong),
            "NO_RELATION" => Ok(ClassificationLabel::NoRelation),
            "JUDGE_ERROR" => Ok(ClassificationLabel::JudgeError),
            other => Err(format!("unknown classification label: {other}")),
        }
    }
}

/// Whole-word patterns for the answer labels, in [`ClassificationLabel::ANSWERS`] order.
///
/// `MATCH` must not hit inside `MISMATCH_PATH_WRONG`, hence the word boundaries.
static ANSWER_PATTERNS: LazyLock<Vec<(ClassificationLabel, Regex)>> = LazyLock::new(|| {
    ClassificationLabel::ANSWERS
        .iter()
        .map(|label| {
            let pattern = format!(r"\b{}\b", label.as_str());
            (*label, Regex::new(&pattern).unwrap())
        })
        .collect()
});

/// Extract a label from a free-text service response.
///
/// The first label found in priority order wins; a response naming none of
/// them counts as [`ClassificationLabel::NoRelation`].
pub fn parse_label(response: &str) -> ClassificationLabel {
    ANSWER_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(response))
        .map(|(label, _)| *label)
        .unwrap_or(ClassificationLabel::NoRelation)
}

/// Result of voting over one batch of judgments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub winner: ClassificationLabel,
    /// Vote counts in first-encounter order.
    pub tally: Vec<(ClassificationLabel, usize)>,
}

impl AggregateResult {
    /// Votes cast for `label`.
    pub fn count(&self, label: ClassificationLabel) -> usize {
        self.tally
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    /// Total votes in the batch.
    pub fn total(&self) -> usize {
        self.tally.iter().map(|(_, n)| n).sum()
    }
}

/// Majority vote over a batch of labels. `None` for an empty batch.
///
/// Counts are built in one ordered scan. Among labels sharing the highest
/// count, the one first seen in the batch wins. `JUDGE_ERROR` is a vote like
/// any other, so a batch dominated by service failures reports that.
///
/// # Examples
///
/// ```
/// use chronofile_core::judgment::{aggregate, ClassificationLabel::*};
///
/// let result = aggregate(&[Match, NoRelation, Match]).unwrap();
/// assert_eq!(result.winner, Match);
/// assert_eq!(result.count(Match), 2);
/// ```
pub fn aggregate(batch: &[ClassificationLabel]) -> Option<AggregateResult> {
    let mut tally: Vec<(ClassificationLabel, usize)> = Vec::new();
    for label in batch {
        match tally.iter_mut().find(|(l, _)| l == label) {
            Some((_, count)) => *count += 1,
            None => tally.push((*label, 1)),
        }
    }

    // Strict comparison keeps the earliest entry on ties
    let mut best: Option<(ClassificationLabel, usize)> = None;
    for &(label, count) in &tally {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((label, count));
        }
    }

    best.map(|(winner, _)| AggregateResult { winner, tally })
}

/// Which side a mismatch verdict blames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blame {
    None,
    Path,
    Metadata,
}

/// Roll-up bucket of a winning label for summary statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CorrelationBucket {
    Correlated { blame: Blame },
    NotCorrelated,
}

impl CorrelationBucket {
    pub fn from_label(label: ClassificationLabel) -> Self {
        match label {
            ClassificationLabel::Match => CorrelationBucket::Correlated { blame: Blame::None },
            ClassificationLabel::MismatchPathWrong => {
                CorrelationBucket::Correlated { blame: Blame::Path }
            }
            ClassificationLabel::MismatchMetadataWrong => CorrelationBucket::Correlated {
                blame: Blame::Metadata,
            },
            ClassificationLabel::NoRelation | ClassificationLabel::JudgeError => {
                CorrelationBucket::NotCorrelated
            }
        }
    }
}

/// Outcome of analyzing one photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentRecord {
    pub file_path: PathBuf,
    pub capture_date: String,
    pub result: AggregateResult,
}

/// Running totals for a correlation analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationSummary {
    pub total_analyzed: usize,
    pub has_correlation: usize,
    /// Includes files whose winning vote was `JUDGE_ERROR`.
    pub no_correlation: usize,
    pub path_incorrect: usize,
    pub metadata_incorrect: usize,
    /// Files whose winning vote was `JUDGE_ERROR`.
    pub judge_errors: usize,
    pub details: Vec<JudgmentRecord>,
}

impl CorrelationSummary {
    /// Fold one analyzed photo into the totals.
    pub fn record(&mut self, record: JudgmentRecord) {
        self.total_analyzed += 1;
        match CorrelationBucket::from_label(record.result.winner) {
            CorrelationBucket::Correlated { blame } => {
                self.has_correlation += 1;
                match blame {
                    Blame::Path => self.path_incorrect += 1,
                    Blame::Metadata => self.metadata_incorrect += 1,
                    Blame::None => {}
                }
            }
            CorrelationBucket::NotCorrelated => self.no_correlation += 1,
        }
        if record.result.winner == ClassificationLabel::JudgeError {
            self.judge_errors += 1;
        }
        self.details.push(record);
    }

    /// Share of analyzed photos with a correlation, in percent.
    pub fn correlation_rate(&self) -> f64 {
        if self.total_analyzed == 0 {
            0.0
        } else {
            self.has_correlation as f64 / self.total_analyzed as f64 * 100.0
        }
    }
}

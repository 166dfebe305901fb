//! Versioned scoring model.
//!
//! Bounds and point allocations are fixed per version and deliberately not
//! loadable from disk: a calibration change is a new `ScoringConfig`
//! constructor with a new version string, reviewed like any other code.

use crate::error::KernelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const SCORING_CONFIG_VERSION: &str = "donescore.scoring.v1";

/// Points each category contributes to the 100-point overall score.
pub const CATEGORY_POINTS: f64 = 25.0;

/// One of the four orthogonal scoring axes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Volume,
    Diversity,
    Depth,
    Connectivity,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Volume,
        Category::Diversity,
        Category::Depth,
        Category::Connectivity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Volume => "volume",
            Category::Diversity => "diversity",
            Category::Depth => "depth",
            Category::Connectivity => "connectivity",
        }
    }
}

/// A raw statistic that is normalized into a 0–100 sub-metric.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Output words divided by the dynamic word target.
    WordCoverage,
    /// Content-bearing table rows divided by the dynamic row target.
    RowCoverage,
    NormalizedEntropy,
    UniqueRatio,
    /// Distinct content tokens divided by the vocabulary target.
    VocabularyCoverage,
    TwoSentenceRatio,
    FragmentAverageWords,
    SentencesPerFragment,
    /// Share of the right-hand (usually upstream) pool referenced at least once.
    InputLinkage,
    EdgeDensity,
    MultiTargetRatio,
    /// Resolved edges divided by the dynamic edge target.
    EdgeCoverage,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::WordCoverage => "word_coverage",
            Metric::RowCoverage => "row_coverage",
            Metric::NormalizedEntropy => "ent_norm",
            Metric::UniqueRatio => "uniq_ratio",
            Metric::VocabularyCoverage => "vocabulary_coverage",
            Metric::TwoSentenceRatio => "two_sent_ratio",
            Metric::FragmentAverageWords => "frag_avg_words",
            Metric::SentencesPerFragment => "sentences_per_fragment",
            Metric::InputLinkage => "input_linkage",
            Metric::EdgeDensity => "density",
            Metric::MultiTargetRatio => "multi_target_ratio",
            Metric::EdgeCoverage => "edge_coverage",
        }
    }
}

/// Calibrated linear window and point allocation for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricBounds {
    pub metric: Metric,
    pub category: Category,
    pub lower: f64,
    pub upper: f64,
    pub points: f64,
}

/// `clamp(round(coefficient × magnitude), floor, ceiling)` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TargetSpec {
    pub coefficient: f64,
    pub floor: usize,
    pub ceiling: usize,
}

impl TargetSpec {
    pub const fn new(coefficient: f64, floor: usize, ceiling: usize) -> Self {
        Self {
            coefficient,
            floor,
            ceiling,
        }
    }

    pub fn validate(&self) -> Result<(), KernelError> {
        if !self.coefficient.is_finite() || self.coefficient < 0.0 {
            return Err(KernelError::InvalidTarget(format!(
                "coefficient must be finite and non-negative, got {}",
                self.coefficient
            )));
        }
        if self.floor == 0 {
            return Err(KernelError::InvalidTarget("floor must be >= 1".to_string()));
        }
        if self.floor > self.ceiling {
            return Err(KernelError::InvalidTarget(format!(
                "floor {} exceeds ceiling {}",
                self.floor, self.ceiling
            )));
        }
        Ok(())
    }
}

/// Metric bounds, category allocations and tokenizer vocabulary filters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    pub version: &'static str,
    pub metrics: Vec<MetricBounds>,
    /// Vocabulary target as a fraction of the word target.
    pub vocabulary_target_fraction: f64,
    pub min_token_len: usize,
    pub stopwords: BTreeSet<String>,
}

const STOPWORDS_V1: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "etc",
    "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "him", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "may",
    "me", "might", "more", "most", "must", "my", "no", "nor", "not", "now", "of", "off", "on",
    "once", "only", "or", "other", "our", "ours", "out", "over", "own", "same", "shall", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "upon", "us", "very", "was", "we", "were", "what", "when", "where", "which", "while", "who",
    "whom", "why", "will", "with", "within", "without", "would", "you", "your", "yours",
];

const fn bounds(
    metric: Metric,
    category: Category,
    lower: f64,
    upper: f64,
    points: f64,
) -> MetricBounds {
    MetricBounds {
        metric,
        category,
        lower,
        upper,
        points,
    }
}

impl ScoringConfig {
    /// The v1 calibration.
    pub fn v1() -> Self {
        use Category::*;
        use Metric::*;
        Self {
            version: SCORING_CONFIG_VERSION,
            metrics: vec![
                bounds(WordCoverage, Volume, 0.0, 1.0, 15.0),
                bounds(RowCoverage, Volume, 0.0, 1.0, 10.0),
                bounds(NormalizedEntropy, Diversity, 0.70, 0.92, 10.0),
                bounds(UniqueRatio, Diversity, 0.20, 0.50, 8.0),
                bounds(VocabularyCoverage, Diversity, 0.0, 1.0, 7.0),
                bounds(TwoSentenceRatio, Depth, 0.10, 0.60, 12.0),
                bounds(FragmentAverageWords, Depth, 6.0, 24.0, 8.0),
                bounds(SentencesPerFragment, Depth, 1.0, 2.2, 5.0),
                bounds(InputLinkage, Connectivity, 0.0, 0.8, 9.0),
                bounds(EdgeDensity, Connectivity, 0.0, 0.35, 6.0),
                bounds(MultiTargetRatio, Connectivity, 0.0, 0.5, 5.0),
                bounds(EdgeCoverage, Connectivity, 0.0, 1.0, 5.0),
            ],
            vocabulary_target_fraction: 0.5,
            min_token_len: 3,
            stopwords: STOPWORDS_V1.iter().map(|word| word.to_string()).collect(),
        }
    }

    pub fn bounds_for(&self, metric: Metric) -> Option<&MetricBounds> {
        self.metrics.iter().find(|row| row.metric == metric)
    }

    pub fn metrics_in(&self, category: Category) -> impl Iterator<Item = &MetricBounds> {
        self.metrics.iter().filter(move |row| row.category == category)
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    /// Reject configurations whose windows are empty or whose categories
    /// do not spend exactly their point budget.
    pub fn validate(&self) -> Result<(), KernelError> {
        for row in &self.metrics {
            if !(row.lower.is_finite() && row.upper.is_finite()) || row.lower >= row.upper {
                return Err(KernelError::InvalidBounds {
                    metric: row.metric,
                    lower: row.lower,
                    upper: row.upper,
                });
            }
        }
        for category in Category::ALL {
            let allocated: f64 = self.metrics_in(category).map(|row| row.points).sum();
            if (allocated - CATEGORY_POINTS).abs() > 1e-9 {
                return Err(KernelError::PointBudget {
                    category,
                    allocated,
                    budget: CATEGORY_POINTS,
                });
            }
        }
        Ok(())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::v1()
    }
}

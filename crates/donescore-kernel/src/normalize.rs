//! Score normalization: raw statistics → sub-metrics → categories → overall.
//!
//! Every step is monotonic non-decreasing in its inputs and free of hidden
//! state. The overall score is a function of the four category scores and
//! the published category weights only.

use crate::config::{CATEGORY_POINTS, Category, Metric, ScoringConfig, TargetSpec};
use crate::connectivity::ConnectivityStats;
use crate::depth::DepthStats;
use crate::diversity::DiversityStats;
use serde::{Deserialize, Serialize};

/// `100 × clamp((x − x0) / (x1 − x0), 0, 1)`.
///
/// A degenerate window (`x1 <= x0`) acts as a step at `x0`. NaN scores zero.
pub fn score_linear(x: f64, x0: f64, x1: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    if x1 <= x0 {
        return if x >= x0 { 100.0 } else { 0.0 };
    }
    100.0 * ((x - x0) / (x1 - x0)).clamp(0.0, 1.0)
}

/// `clamp(round(coefficient × magnitude), floor, ceiling)`.
pub fn compute_target(magnitude: usize, spec: &TargetSpec) -> usize {
    let scaled = (spec.coefficient * magnitude as f64).round();
    let scaled = if scaled.is_finite() && scaled > 0.0 {
        scaled as usize
    } else {
        0
    };
    scaled.clamp(spec.floor, spec.ceiling.max(spec.floor))
}

/// Volume counts together with the dynamic targets they are measured against.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeStats {
    pub input_words: usize,
    pub output_words: usize,
    pub word_target: usize,
    pub content_rows: usize,
    pub row_target: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStatistics {
    pub volume: VolumeStats,
    pub diversity: DiversityStats,
    pub depth: DepthStats,
    pub connectivity: ConnectivityStats,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl RawStatistics {
    pub fn vocabulary_target(&self, config: &ScoringConfig) -> usize {
        let target = (self.volume.word_target as f64 * config.vocabulary_target_fraction).round();
        if target >= 1.0 { target as usize } else { 1 }
    }

    /// The raw value a metric is normalized from.
    pub fn value(&self, metric: Metric, config: &ScoringConfig) -> f64 {
        match metric {
            Metric::WordCoverage => ratio(self.volume.output_words, self.volume.word_target),
            Metric::RowCoverage => ratio(self.volume.content_rows, self.volume.row_target),
            Metric::NormalizedEntropy => self.diversity.ent_norm,
            Metric::UniqueRatio => self.diversity.uniq_ratio,
            Metric::VocabularyCoverage => {
                ratio(self.diversity.distinct, self.vocabulary_target(config))
            }
            Metric::TwoSentenceRatio => self.depth.two_sent_ratio,
            Metric::FragmentAverageWords => self.depth.frag_avg_words,
            Metric::SentencesPerFragment => self.depth.avg_sentences,
            Metric::InputLinkage => self.connectivity.linkage_ratio,
            Metric::EdgeDensity => self.connectivity.density,
            Metric::MultiTargetRatio => self.connectivity.multi_target_ratio,
            Metric::EdgeCoverage => self.connectivity.edge_coverage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricScore {
    pub metric: Metric,
    pub raw: f64,
    pub lower: f64,
    pub upper: f64,
    /// Sub-metric in [0, 100].
    pub score: f64,
    /// Points earned out of `points`.
    pub earned: f64,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub category: Category,
    /// Category score in [0, 100].
    pub score: f64,
    pub metrics: Vec<MetricScore>,
}

impl CategoryScore {
    /// The sub-metric with the most unearned points.
    pub fn weakest(&self) -> Option<&MetricScore> {
        self.metrics.iter().max_by(|a, b| {
            (a.points - a.earned)
                .total_cmp(&(b.points - b.earned))
                .then_with(|| b.metric.cmp(&a.metric))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub overall: f64,
    pub categories: Vec<CategoryScore>,
}

impl Score {
    pub fn category(&self, category: Category) -> f64 {
        self.categories
            .iter()
            .find(|row| row.category == category)
            .map(|row| row.score)
            .unwrap_or(0.0)
    }
}

/// Weighted sum of category scores; each category carries a fixed 25/100.
pub fn overall_from_categories(categories: &[(Category, f64)]) -> f64 {
    let weight = CATEGORY_POINTS / 100.0;
    Category::ALL
        .iter()
        .map(|category| {
            categories
                .iter()
                .find(|(candidate, _)| candidate == category)
                .map(|(_, score)| score.clamp(0.0, 100.0) * weight)
                .unwrap_or(0.0)
        })
        .sum()
}

pub fn score_statistics(stats: &RawStatistics, config: &ScoringConfig) -> Score {
    let categories: Vec<CategoryScore> = Category::ALL
        .iter()
        .map(|category| {
            let metrics: Vec<MetricScore> = config
                .metrics_in(*category)
                .map(|bounds| {
                    let raw = stats.value(bounds.metric, config);
                    let score = score_linear(raw, bounds.lower, bounds.upper);
                    MetricScore {
                        metric: bounds.metric,
                        raw,
                        lower: bounds.lower,
                        upper: bounds.upper,
                        score,
                        earned: bounds.points * score / 100.0,
                        points: bounds.points,
                    }
                })
                .collect();
            let earned: f64 = metrics.iter().map(|row| row.earned).sum();
            CategoryScore {
                category: *category,
                score: (earned * 100.0 / CATEGORY_POINTS).clamp(0.0, 100.0),
                metrics,
            }
        })
        .collect();

    let pairs: Vec<(Category, f64)> = categories
        .iter()
        .map(|row| (row.category, row.score))
        .collect();
    Score {
        overall: overall_from_categories(&pairs),
        categories,
    }
}

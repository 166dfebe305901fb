//! Gate decision over a normalized score.
//!
//! `PASS` requires both halves: every structural (pane-readiness) gate
//! holds, and the overall score meets the threshold. The structural half is
//! not scored, so surplus prose elsewhere cannot compensate for a missing
//! mandatory heading.

use crate::config::{Category, Metric};
use crate::error::KernelError;
use crate::normalize::{CategoryScore, Score};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Categories scoring below this receive an advisory sentence.
pub const ADVICE_THRESHOLD: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            Verdict::Pass => 0,
            Verdict::Fail => 1,
        }
    }
}

/// One binary structural check over one subject (usually an artifact).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralGate {
    pub name: String,
    pub subject: String,
    pub missing: Vec<String>,
}

impl StructuralGate {
    pub fn passed(&self) -> bool {
        self.missing.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateResult {
    pub verdict: Verdict,
    pub overall: f64,
    pub threshold: f64,
    pub categories: BTreeMap<Category, f64>,
    pub structural: Vec<StructuralGate>,
    pub advice: Vec<String>,
}

impl GateResult {
    pub fn pass(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    pub fn structural_ok(&self) -> bool {
        self.structural.iter().all(StructuralGate::passed)
    }
}

fn metric_hint(metric: Metric) -> &'static str {
    match metric {
        Metric::WordCoverage => "write more substantive prose in the content columns and sections",
        Metric::RowCoverage => "add more content-bearing table rows",
        Metric::NormalizedEntropy => "spread the argument over a broader vocabulary",
        Metric::UniqueRatio => "reduce repeated phrasing",
        Metric::VocabularyCoverage => "introduce more distinct domain terms",
        Metric::TwoSentenceRatio => {
            "give each cell at least two sentences (claim, then rationale or tradeoff)"
        }
        Metric::FragmentAverageWords => "expand terse cells into complete statements",
        Metric::SentencesPerFragment => "argue each point over several sentences",
        Metric::InputLinkage => "reference more of the upstream artifacts",
        Metric::EdgeDensity => "cross-reference counterparts more richly",
        Metric::MultiTargetRatio => "let entities serve two or more counterparts",
        Metric::EdgeCoverage => "add more resolvable cross-references",
    }
}

fn category_advice(row: &CategoryScore) -> Option<String> {
    if row.score >= ADVICE_THRESHOLD {
        return None;
    }
    let weakest = row.weakest()?;
    Some(format!(
        "{} {:.1}/100: {} (weakest {}={:.3}).",
        row.category.as_str(),
        row.score,
        metric_hint(weakest.metric),
        weakest.metric.as_str(),
        weakest.raw,
    ))
}

fn structural_advice(gate: &StructuralGate) -> Option<String> {
    if gate.passed() {
        return None;
    }
    Some(format!(
        "{}: {} is missing {}.",
        gate.name,
        gate.subject,
        gate.missing.join(", ")
    ))
}

pub fn decide(
    score: &Score,
    structural: &[StructuralGate],
    threshold: f64,
) -> Result<GateResult, KernelError> {
    if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
        return Err(KernelError::InvalidThreshold(format!(
            "expected a number in [0, 100], got {threshold}"
        )));
    }

    let structural_ok = structural.iter().all(StructuralGate::passed);
    let verdict = if structural_ok && score.overall >= threshold {
        Verdict::Pass
    } else {
        Verdict::Fail
    };

    let mut advice: Vec<String> = score.categories.iter().filter_map(category_advice).collect();
    advice.extend(structural.iter().filter_map(structural_advice));

    Ok(GateResult {
        verdict,
        overall: score.overall,
        threshold,
        categories: score
            .categories
            .iter()
            .map(|row| (row.category, row.score))
            .collect(),
        structural: structural.to_vec(),
        advice,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::normalize::{RawStatistics, VolumeStats, score_statistics};

    fn half_volume_score() -> Score {
        let stats = RawStatistics {
            volume: VolumeStats {
                output_words: 100,
                word_target: 100,
                content_rows: 10,
                row_target: 10,
                ..VolumeStats::default()
            },
            ..RawStatistics::default()
        };
        score_statistics(&stats, &ScoringConfig::v1())
    }

    fn gate(subject: &str, missing: &[&str]) -> StructuralGate {
        StructuralGate {
            name: "pane-readiness".to_string(),
            subject: subject.to_string(),
            missing: missing.iter().map(|row| row.to_string()).collect(),
        }
    }

    #[test]
    fn threshold_flip_changes_verdict_not_scores() {
        let score = half_volume_score();
        let low = decide(&score, &[], 10.0).expect("valid threshold");
        let high = decide(&score, &[], 95.0).expect("valid threshold");
        assert!(low.pass());
        assert!(!high.pass());
        assert_eq!(low.categories, high.categories);
        assert_eq!(low.overall, high.overall);
    }

    #[test]
    fn structural_failure_blocks_pass_regardless_of_score() {
        let score = half_volume_score();
        let result = decide(&score, &[gate("PROP-0001", &["## Boosters"])], 0.0)
            .expect("valid threshold");
        assert_eq!(result.verdict, Verdict::Fail);
        assert!(
            result
                .advice
                .iter()
                .any(|line| line.contains("PROP-0001") && line.contains("## Boosters"))
        );
    }

    #[test]
    fn zero_score_fails_any_positive_threshold() {
        let score = score_statistics(&RawStatistics::default(), &ScoringConfig::v1());
        let result = decide(&score, &[], 0.1).expect("valid threshold");
        assert_eq!(result.verdict, Verdict::Fail);
        assert_eq!(result.verdict.exit_code(), 1);
    }

    #[test]
    fn advice_is_emitted_only_below_ninety() {
        let score = half_volume_score();
        let result = decide(&score, &[], 10.0).expect("valid threshold");
        assert!(!result.advice.iter().any(|line| line.starts_with("volume")));
        assert_eq!(result.advice.len(), 3);
    }

    #[test]
    fn gate_result_serializes_with_stable_keys() {
        let score = half_volume_score();
        let result = decide(&score, &[gate("PROP-0001", &["Persona:"])], 10.0)
            .expect("valid threshold");
        let value = serde_json::to_value(&result).expect("serializes");
        assert_eq!(value["verdict"], "FAIL");
        assert_eq!(value["structural"][0]["subject"], "PROP-0001");
        let keys: Vec<&str> = value["categories"]
            .as_object()
            .expect("categories map")
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, ["connectivity", "depth", "diversity", "volume"]);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let score = half_volume_score();
        assert!(decide(&score, &[], 101.0).is_err());
        assert!(decide(&score, &[], f64::NAN).is_err());
    }
}

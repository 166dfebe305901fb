//! Lexical diversity: stopword-filtered token distribution and its entropy.

use crate::config::ScoringConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiversityStats {
    /// Surviving tokens (N).
    pub tokens: usize,
    /// Distinct surviving tokens (U).
    pub distinct: usize,
    /// Shannon entropy in bits per token.
    pub entropy: f64,
    pub ent_norm: f64,
    pub uniq_ratio: f64,
}

fn normalize_token(raw: &str) -> String {
    raw.trim_matches(|ch: char| !ch.is_alphanumeric())
        .to_lowercase()
}

/// Tokens that count toward diversity: lowercased, edge-trimmed, and not
/// filtered as stopwords or as too short.
pub fn content_tokens<'a>(
    text: &'a str,
    config: &'a ScoringConfig,
) -> impl Iterator<Item = String> + 'a {
    text.split_whitespace()
        .map(normalize_token)
        .filter(move |token| {
            token.chars().count() >= config.min_token_len && !config.is_stopword(token)
        })
}

pub fn analyze_diversity(text: &str, config: &ScoringConfig) -> DiversityStats {
    // BTreeMap keeps the entropy accumulation order independent of hashing.
    let mut frequencies: BTreeMap<String, usize> = BTreeMap::new();
    for token in content_tokens(text, config) {
        *frequencies.entry(token).or_default() += 1;
    }

    let tokens: usize = frequencies.values().sum();
    let distinct = frequencies.len();
    if tokens == 0 {
        return DiversityStats::default();
    }

    let total = tokens as f64;
    let entropy = frequencies
        .values()
        .map(|count| {
            let p = *count as f64 / total;
            -p * p.log2()
        })
        .sum::<f64>();
    let ent_norm = if distinct <= 1 {
        0.0
    } else {
        (entropy / (distinct as f64).log2()).clamp(0.0, 1.0)
    };

    DiversityStats {
        tokens,
        distinct,
        entropy,
        ent_norm,
        uniq_ratio: distinct as f64 / total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ScoringConfig {
        ScoringConfig::v1()
    }

    #[test]
    fn empty_text_has_zero_statistics() {
        assert_eq!(analyze_diversity("", &config()), DiversityStats::default());
    }

    #[test]
    fn stopwords_and_short_tokens_are_dropped() {
        let tokens: Vec<String> =
            content_tokens("The cat and an ox ran to Lisbon.", &config()).collect();
        assert_eq!(tokens, vec!["cat", "ran", "lisbon"]);
    }

    #[test]
    fn edge_punctuation_is_stripped_but_inner_kept() {
        let tokens: Vec<String> = content_tokens("(\"re-use\"), e-mail!", &config()).collect();
        assert_eq!(tokens, vec!["re-use", "e-mail"]);
    }

    #[test]
    fn single_distinct_token_has_zero_normalized_entropy() {
        let stats = analyze_diversity("budget budget budget", &config());
        assert_eq!(stats.tokens, 3);
        assert_eq!(stats.distinct, 1);
        assert_eq!(stats.ent_norm, 0.0);
        assert!((stats.uniq_ratio - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn uniform_distribution_has_full_normalized_entropy() {
        let stats = analyze_diversity("alpha bravo charlie delta", &config());
        assert_eq!(stats.distinct, 4);
        assert!((stats.entropy - 2.0).abs() < 1e-12);
        assert!((stats.ent_norm - 1.0).abs() < 1e-12);
        assert!((stats.uniq_ratio - 1.0).abs() < 1e-12);
    }

    #[test]
    fn skewed_distribution_lowers_entropy() {
        let uniform = analyze_diversity("alpha bravo", &config());
        let skewed = analyze_diversity("alpha alpha alpha bravo", &config());
        assert!(skewed.ent_norm < uniform.ent_norm);
    }

    #[test]
    fn case_folding_merges_tokens() {
        let stats = analyze_diversity("Supplier SUPPLIER supplier", &config());
        assert_eq!(stats.distinct, 1);
    }
}

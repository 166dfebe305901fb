//! Argumentative depth: sentences per fragment, one fragment per line.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthStats {
    pub frag_count: usize,
    pub frag_avg_words: f64,
    pub two_sent_ratio: f64,
    pub avg_sentences: f64,
}

/// Count sentence terminators (`.`, `!`, `?`), treating a run such as `?!`
/// or `...` as a single terminator.
pub fn count_sentences(line: &str) -> usize {
    let mut count = 0;
    let mut in_run = false;
    for ch in line.chars() {
        let terminator = matches!(ch, '.' | '!' | '?');
        if terminator && !in_run {
            count += 1;
        }
        in_run = terminator;
    }
    count
}

fn word_count(line: &str) -> usize {
    line.split_whitespace()
        .filter(|word| word.chars().any(char::is_alphanumeric))
        .count()
}

pub fn analyze_depth(text: &str) -> DepthStats {
    let mut frag_count = 0usize;
    let mut words = 0usize;
    let mut sentences = 0usize;
    let mut multi_sentence = 0usize;

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        frag_count += 1;
        words += word_count(line);
        let line_sentences = count_sentences(line);
        sentences += line_sentences;
        if line_sentences >= 2 {
            multi_sentence += 1;
        }
    }

    if frag_count == 0 {
        return DepthStats::default();
    }
    let frags = frag_count as f64;
    DepthStats {
        frag_count,
        frag_avg_words: words as f64 / frags,
        two_sent_ratio: multi_sentence as f64 / frags,
        avg_sentences: sentences as f64 / frags,
    }
}

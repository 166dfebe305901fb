//! Compiled ID and placeholder patterns.

use crate::error::CorpusError;
use crate::profile::CorpusConfig;
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

fn artifact_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Z]{1,6}-\d{4})").expect("artifact id regex must compile"))
}

/// Truncate a row/sub ID to the artifact ID it belongs to
/// (`PER-0001-G02` → `PER-0001`).
pub fn artifact_of(id: &str) -> Option<&str> {
    artifact_id_re()
        .captures(id)
        .and_then(|caps| caps.get(1))
        .map(|found| found.as_str())
}

fn compile(pattern: &str) -> Result<Regex, CorpusError> {
    Regex::new(pattern).map_err(|error| CorpusError::Pattern {
        pattern: pattern.to_string(),
        message: error.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct Patterns {
    ids: Vec<Regex>,
    placeholders: Vec<Regex>,
}

impl Patterns {
    pub fn compile(config: &CorpusConfig) -> Result<Self, CorpusError> {
        Ok(Self {
            ids: config
                .id_patterns
                .iter()
                .map(|pattern| compile(pattern))
                .collect::<Result<_, _>>()?,
            placeholders: config
                .placeholder_patterns
                .iter()
                .map(|pattern| compile(pattern))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Byte ranges of every ID occurrence, merged and in order.
    pub fn id_spans(&self, text: &str) -> Vec<Range<usize>> {
        let mut spans: Vec<Range<usize>> = self
            .ids
            .iter()
            .flat_map(|re| re.find_iter(text).map(|found| found.range()))
            .collect();
        spans.sort_by_key(|span| (span.start, span.end));

        let mut merged: Vec<Range<usize>> = Vec::with_capacity(spans.len());
        for span in spans {
            match merged.last_mut() {
                Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
                _ => merged.push(span),
            }
        }
        merged
    }

    /// Every ID occurrence, deduplicated in first-seen order.
    pub fn find_ids(&self, text: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for span in self.id_spans(text) {
            let id = text[span].to_string();
            if !found.contains(&id) {
                found.push(id);
            }
        }
        found
    }

    /// True when the text is nothing but IDs, separators and list markers.
    pub fn is_id_only(&self, text: &str) -> bool {
        let mut rest = String::with_capacity(text.len());
        let mut cursor = 0;
        let spans = self.id_spans(text);
        if spans.is_empty() {
            return false;
        }
        for span in spans {
            rest.push_str(&text[cursor..span.start]);
            cursor = span.end;
        }
        rest.push_str(&text[cursor..]);
        rest.chars()
            .all(|ch| ch.is_whitespace() || matches!(ch, ',' | ';' | '-' | '*' | '+' | '|' | '/'))
    }

    pub fn is_placeholder(&self, text: &str) -> bool {
        let trimmed = text.trim();
        trimmed.is_empty() || self.placeholders.iter().any(|re| re.is_match(trimmed))
    }
}

//! Corpus cleaning: strip IDs, drop token dumps, normalize spacing.
//!
//! Cleaning is idempotent: `clean(clean(x)) == clean(x)`.

use crate::patterns::Patterns;
use crate::profile::TokenDumpConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenClass {
    /// Only separators/punctuation; rides along inside a run.
    Neutral,
    /// Short and free of lowercase letters.
    Dumpy,
    /// Prose; always ends a run.
    Prose,
}

fn classify(token: &str, config: &TokenDumpConfig) -> TokenClass {
    // Class depends only on the core between edge punctuation.
    let core = token.trim_matches(|ch: char| !ch.is_alphanumeric());
    if core.is_empty() {
        return TokenClass::Neutral;
    }
    if core.chars().count() > config.max_token_len || core.chars().any(char::is_lowercase) {
        TokenClass::Prose
    } else {
        TokenClass::Dumpy
    }
}

fn ends_sentence(token: &str) -> bool {
    token
        .trim_end_matches(|ch: char| matches!(ch, ')' | '"' | '\'' | ']'))
        .ends_with(['.', '!', '?'])
}

/// Flags the tokens of every dropped dump run.
///
/// A run is a stretch of dumpy and neutral tokens; prose tokens and
/// sentence-terminated tokens close it, so prose is never inside a run.
fn dump_mask(tokens: &[&str], config: &TokenDumpConfig) -> Vec<bool> {
    let classes: Vec<TokenClass> = tokens.iter().map(|token| classify(token, config)).collect();
    let mut drop = vec![false; tokens.len()];

    let mut start = 0;
    while start < tokens.len() {
        if classes[start] == TokenClass::Prose {
            start += 1;
            continue;
        }
        let mut end = start;
        while end < tokens.len() && classes[end] != TokenClass::Prose {
            end += 1;
            if ends_sentence(tokens[end - 1]) {
                break;
            }
        }
        mark_run(&classes[start..end], &mut drop[start..end], config);
        start = end;
    }
    drop
}

fn mark_run(classes: &[TokenClass], drop: &mut [bool], config: &TokenDumpConfig) {
    let Some(first) = classes.iter().position(|class| *class == TokenClass::Dumpy) else {
        return;
    };
    let Some(last) = classes.iter().rposition(|class| *class == TokenClass::Dumpy) else {
        return;
    };
    let span = &classes[first..=last];
    let dumpy = span.iter().filter(|class| **class == TokenClass::Dumpy).count();
    if dumpy < config.min_run || (dumpy as f64) < config.min_density * span.len() as f64 {
        return;
    }
    for flag in &mut drop[first..=last] {
        *flag = true;
    }
}

/// Collapse whitespace and remove spaces before closing punctuation.
fn normalize_spacing(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for token in text.split_whitespace() {
        let attaches = token
            .chars()
            .next()
            .is_some_and(|ch| matches!(ch, ',' | '.' | ';' | ':' | '!' | '?' | ')'));
        if !out.is_empty() && !attaches {
            out.push(' ');
        }
        out.push_str(token);
    }
    out
}

#[derive(Debug, Clone)]
pub struct Cleaner<'a> {
    patterns: &'a Patterns,
    token_dump: TokenDumpConfig,
}

impl<'a> Cleaner<'a> {
    pub fn new(patterns: &'a Patterns, token_dump: TokenDumpConfig) -> Self {
        Self {
            patterns,
            token_dump,
        }
    }

    /// Replace every ID occurrence with whitespace.
    pub fn strip_ids(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for span in self.patterns.id_spans(text) {
            out.push_str(&text[cursor..span.start]);
            out.push(' ');
            cursor = span.end;
        }
        out.push_str(&text[cursor..]);
        out
    }

    pub fn drop_token_dumps(&self, text: &str) -> String {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let mask = dump_mask(&tokens, &self.token_dump);
        tokens
            .iter()
            .zip(mask)
            .filter(|(_, dropped)| !dropped)
            .map(|(token, _)| *token)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Clean one fragment to a single line (possibly empty).
    ///
    /// Spacing is normalized before dump detection so token boundaries are
    /// the ones a second pass would see.
    pub fn clean(&self, text: &str) -> String {
        let stripped = self.strip_ids(text);
        let spaced = normalize_spacing(&stripped);
        normalize_spacing(&self.drop_token_dumps(&spaced))
    }

    /// Clean fragments into the one-fragment-per-line corpus view; fragments
    /// that clean to nothing are omitted.
    pub fn clean_lines<'t>(&self, fragments: impl IntoIterator<Item = &'t str>) -> Vec<String> {
        fragments
            .into_iter()
            .map(|text| self.clean(text))
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Words that count toward volume: whitespace tokens carrying an alphanumeric.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|word| word.chars().any(char::is_alphanumeric))
        .count()
}

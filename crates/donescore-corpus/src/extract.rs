//! Fragment extraction as a line-at-a-time state machine.
//!
//! `step` is a pure function `(state, line) → (state, emissions)`, so every
//! transition can be exercised one line at a time. `extract_artifact` folds
//! it over a document.
//!
//! States:
//! - `Header`: before the first level-2 heading; collects header fields.
//! - `Outside`: inside a section the profile does not track.
//! - `InSection`: a free-form prose section; buffers the current paragraph
//!   or bullet until it ends.
//! - `InTable`: a tracked table section; parses the header row, then rows.
//! - `InFence` / `InComment`: excluded blocks that resume the prior state.

use crate::patterns::{Patterns, artifact_of};
use crate::profile::{DomainProfile, TableSpec};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    pub artifact_id: String,
    /// `Section` for prose, `Section.Column` for table cells.
    pub slot: String,
    pub text: String,
}

/// Raw text of a reference-bearing cell or header field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub artifact_id: String,
    /// Qualified row ID for table references; `None` for header fields.
    pub row_id: Option<String>,
    pub field: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRecord {
    pub section: String,
    pub row_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    Heading(String),
    HeaderField { name: String, value: String },
    Fragment(Fragment),
    Row(RowRecord),
    Reference(Reference),
    /// Cell count differs from the header's.
    MalformedRow { section: String, cells: usize, expected: usize },
    /// Empty or placeholder row.
    SkippedRow { section: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeader {
    width: usize,
    id_index: Option<usize>,
    content: Vec<(usize, String)>,
    references: Vec<(usize, String)>,
}

impl TableHeader {
    fn resolve(cells: &[String], spec: &TableSpec) -> Self {
        let index_of =
            |name: &str| cells.iter().position(|cell| cell.eq_ignore_ascii_case(name.trim()));
        Self {
            width: cells.len(),
            id_index: index_of(&spec.id_column),
            content: spec
                .content_columns
                .iter()
                .filter_map(|name| index_of(name).map(|index| (index, name.clone())))
                .collect(),
            references: spec
                .reference_columns
                .iter()
                .filter_map(|name| index_of(name).map(|index| (index, name.clone())))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractState {
    Header,
    Outside,
    InSection {
        section: String,
        block: Vec<String>,
    },
    InTable {
        table: usize,
        header: Option<TableHeader>,
    },
    InFence {
        fence: String,
        resume: Box<ExtractState>,
    },
    InComment {
        resume: Box<ExtractState>,
    },
}

/// Per-artifact inputs the state machine reads but never changes.
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    pub artifact_id: &'a str,
    pub profile: &'a DomainProfile,
    pub patterns: &'a Patterns,
}

fn header_field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[-*]\s+)?\*{0,2}([A-Za-z][A-Za-z0-9 _-]{0,40}?)\*{0,2}\s*:\*{0,2}\s*(.*)$")
            .expect("header field regex must compile")
    })
}

fn bullet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[-*+]|\d{1,3}[.)])\s+(.*)$").expect("bullet regex must compile")
    })
}

fn level2_heading(line: &str) -> Option<String> {
    let rest = line.strip_prefix("## ")?;
    let name = rest.trim().trim_end_matches('#').trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn fence_marker(line: &str) -> Option<String> {
    ["```", "~~~"]
        .into_iter()
        .find(|marker| line.starts_with(marker))
        .map(str::to_string)
}

fn is_script_hint(line: &str) -> bool {
    let Some(rest) = line.strip_prefix('>') else {
        return false;
    };
    let rest = rest.trim_start().to_ascii_lowercase();
    rest.starts_with("hint:") || rest.starts_with("script:")
}

fn is_rule(line: &str) -> bool {
    line.len() >= 3 && line.chars().all(|ch| matches!(ch, '-' | '*' | '_' | '='))
}

/// Split a pipe-table line into trimmed cells, honoring `\|` escapes.
pub fn split_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for ch in inner.chars() {
        match ch {
            '\\' if !escaped => escaped = true,
            '|' if !escaped => {
                cells.push(current.trim().to_string());
                current.clear();
            }
            _ => {
                if escaped && ch != '|' {
                    current.push('\\');
                }
                current.push(ch);
                escaped = false;
            }
        }
    }
    cells.push(current.trim().to_string());
    cells
}

fn is_delimiter_row(cells: &[String]) -> bool {
    cells.iter().all(|cell| {
        !cell.is_empty()
            && cell.contains('-')
            && cell.chars().all(|ch| matches!(ch, '-' | ':' | ' '))
    })
}

/// `J01` in `PER-0001` becomes `PER-0001-J01`; full IDs pass through.
pub fn qualify_row_id(artifact_id: &str, raw: &str) -> String {
    if artifact_of(raw).is_some() {
        raw.to_string()
    } else {
        format!("{artifact_id}-{raw}")
    }
}

fn block_fragment(section: &str, block: &[String], ctx: &ExtractContext<'_>) -> Option<Emission> {
    if block.is_empty() {
        return None;
    }
    let text = block.join(" ");
    if ctx.patterns.is_placeholder(&text) || ctx.patterns.is_id_only(&text) {
        return None;
    }
    Some(Emission::Fragment(Fragment {
        artifact_id: ctx.artifact_id.to_string(),
        slot: section.to_string(),
        text,
    }))
}

/// End any buffered block, returning the state with an empty buffer.
fn flushed(state: ExtractState, ctx: &ExtractContext<'_>) -> (ExtractState, Vec<Emission>) {
    match state {
        ExtractState::InSection { section, block } => {
            let out = block_fragment(&section, &block, ctx).into_iter().collect();
            (
                ExtractState::InSection {
                    section,
                    block: Vec::new(),
                },
                out,
            )
        }
        other => (other, Vec::new()),
    }
}

fn enter_section(heading: &str, ctx: &ExtractContext<'_>) -> ExtractState {
    if let Some(table) = ctx.profile.table_for(heading) {
        ExtractState::InTable {
            table,
            header: None,
        }
    } else if ctx.profile.is_prose_section(heading) {
        ExtractState::InSection {
            section: heading.to_string(),
            block: Vec::new(),
        }
    } else {
        ExtractState::Outside
    }
}

fn header_line(line: &str, ctx: &ExtractContext<'_>) -> Vec<Emission> {
    if line.is_empty() || line.starts_with('#') {
        return Vec::new();
    }
    let Some(caps) = header_field_re().captures(line) else {
        return Vec::new();
    };
    let name = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
    let value = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();
    let mut out = Vec::new();
    if ctx.profile.is_reference_field(&name) && !value.is_empty() {
        out.push(Emission::Reference(Reference {
            artifact_id: ctx.artifact_id.to_string(),
            row_id: None,
            field: name.clone(),
            text: value.clone(),
        }));
    }
    out.insert(0, Emission::HeaderField { name, value });
    out
}

fn section_line(
    section: String,
    mut block: Vec<String>,
    line: &str,
    ctx: &ExtractContext<'_>,
) -> (ExtractState, Vec<Emission>) {
    let ends_block =
        line.is_empty() || line.starts_with('#') || line.starts_with('|') || is_rule(line);
    if ends_block {
        let out = block_fragment(&section, &block, ctx).into_iter().collect();
        return (
            ExtractState::InSection {
                section,
                block: Vec::new(),
            },
            out,
        );
    }

    if let Some(caps) = bullet_re().captures(line) {
        let item = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
        let out = block_fragment(&section, &block, ctx).into_iter().collect();
        let block = if item.is_empty() || ctx.patterns.is_id_only(&item) {
            Vec::new()
        } else {
            vec![item]
        };
        return (ExtractState::InSection { section, block }, out);
    }

    if ctx.patterns.is_id_only(line) {
        let out = block_fragment(&section, &block, ctx).into_iter().collect();
        return (
            ExtractState::InSection {
                section,
                block: Vec::new(),
            },
            out,
        );
    }

    block.push(line.to_string());
    (ExtractState::InSection { section, block }, Vec::new())
}

fn table_row(
    spec: &TableSpec,
    header: &TableHeader,
    cells: &[String],
    ctx: &ExtractContext<'_>,
) -> Vec<Emission> {
    if cells.len() != header.width {
        return vec![Emission::MalformedRow {
            section: spec.section.clone(),
            cells: cells.len(),
            expected: header.width,
        }];
    }
    let skipped = || {
        vec![Emission::SkippedRow {
            section: spec.section.clone(),
        }]
    };
    let Some(raw_id) = header.id_index.map(|index| cells[index].as_str()) else {
        return skipped();
    };
    if ctx.patterns.is_placeholder(raw_id) {
        return skipped();
    }

    let fragments: Vec<Emission> = header
        .content
        .iter()
        .filter(|(index, _)| !ctx.patterns.is_placeholder(&cells[*index]))
        .map(|(index, column)| {
            Emission::Fragment(Fragment {
                artifact_id: ctx.artifact_id.to_string(),
                slot: format!("{}.{column}", spec.section),
                text: cells[*index].clone(),
            })
        })
        .collect();
    if fragments.is_empty() {
        return skipped();
    }

    let row_id = qualify_row_id(ctx.artifact_id, raw_id);
    let mut out = vec![Emission::Row(RowRecord {
        section: spec.section.clone(),
        row_id: row_id.clone(),
    })];
    out.extend(fragments);
    out.extend(
        header
            .references
            .iter()
            .filter(|(index, _)| !cells[*index].is_empty())
            .map(|(index, column)| {
                Emission::Reference(Reference {
                    artifact_id: ctx.artifact_id.to_string(),
                    row_id: Some(row_id.clone()),
                    field: column.clone(),
                    text: cells[*index].clone(),
                })
            }),
    );
    out
}

fn table_line(
    table: usize,
    header: Option<TableHeader>,
    line: &str,
    ctx: &ExtractContext<'_>,
) -> (ExtractState, Vec<Emission>) {
    if line.is_empty() {
        // A blank line ends the table; a later pipe block starts a new one.
        return (
            ExtractState::InTable {
                table,
                header: None,
            },
            Vec::new(),
        );
    }
    let Some(spec) = ctx.profile.tables.get(table) else {
        return (ExtractState::Outside, Vec::new());
    };
    if !line.starts_with('|') {
        return (ExtractState::InTable { table, header }, Vec::new());
    }

    let cells = split_cells(line);
    match header {
        None => {
            if is_delimiter_row(&cells) {
                return (ExtractState::InTable { table, header }, Vec::new());
            }
            let resolved = TableHeader::resolve(&cells, spec);
            (
                ExtractState::InTable {
                    table,
                    header: Some(resolved),
                },
                Vec::new(),
            )
        }
        Some(header) => {
            let out = if is_delimiter_row(&cells) {
                Vec::new()
            } else {
                table_row(spec, &header, &cells, ctx)
            };
            (
                ExtractState::InTable {
                    table,
                    header: Some(header),
                },
                out,
            )
        }
    }
}

fn step_open(
    state: ExtractState,
    line: &str,
    ctx: &ExtractContext<'_>,
) -> (ExtractState, Vec<Emission>) {
    if let Some(heading) = level2_heading(line) {
        let (_, mut out) = flushed(state, ctx);
        out.push(Emission::Heading(heading.clone()));
        return (enter_section(&heading, ctx), out);
    }
    if let Some(fence) = fence_marker(line) {
        let (resume, out) = flushed(state, ctx);
        return (
            ExtractState::InFence {
                fence,
                resume: Box::new(resume),
            },
            out,
        );
    }
    if let Some(rest) = line.strip_prefix("<!--") {
        let (resume, out) = flushed(state, ctx);
        if rest.contains("-->") {
            return (resume, out);
        }
        return (
            ExtractState::InComment {
                resume: Box::new(resume),
            },
            out,
        );
    }
    if is_script_hint(line) {
        return flushed(state, ctx);
    }

    match state {
        ExtractState::Header => (ExtractState::Header, header_line(line, ctx)),
        ExtractState::InSection { section, block } => section_line(section, block, line, ctx),
        ExtractState::InTable { table, header } => table_line(table, header, line, ctx),
        other => (other, Vec::new()),
    }
}

/// Advance the machine by one line.
pub fn step(
    state: ExtractState,
    line: &str,
    ctx: &ExtractContext<'_>,
) -> (ExtractState, Vec<Emission>) {
    let line = line.trim();
    match state {
        ExtractState::InFence { fence, resume } => {
            if line.starts_with(fence.as_str()) {
                (*resume, Vec::new())
            } else {
                (ExtractState::InFence { fence, resume }, Vec::new())
            }
        }
        ExtractState::InComment { resume } => {
            if line.contains("-->") {
                (*resume, Vec::new())
            } else {
                (ExtractState::InComment { resume }, Vec::new())
            }
        }
        open => step_open(open, line, ctx),
    }
}

/// Emissions owed at end of input.
pub fn finish(state: ExtractState, ctx: &ExtractContext<'_>) -> Vec<Emission> {
    match state {
        ExtractState::InFence { resume, .. } | ExtractState::InComment { resume } => {
            finish(*resume, ctx)
        }
        other => flushed(other, ctx).1,
    }
}

/// Everything one artifact contributes, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactExtract {
    pub artifact_id: String,
    pub headings: Vec<String>,
    pub header_fields: Vec<(String, String)>,
    pub fragments: Vec<Fragment>,
    pub rows: Vec<RowRecord>,
    pub references: Vec<Reference>,
    pub malformed_rows: usize,
    pub skipped_rows: usize,
}

impl ArtifactExtract {
    fn absorb(&mut self, emission: Emission) {
        match emission {
            Emission::Heading(name) => self.headings.push(name),
            Emission::HeaderField { name, value } => self.header_fields.push((name, value)),
            Emission::Fragment(fragment) => self.fragments.push(fragment),
            Emission::Row(row) => self.rows.push(row),
            Emission::Reference(reference) => self.references.push(reference),
            Emission::MalformedRow {
                section,
                cells,
                expected,
            } => {
                tracing::warn!(
                    artifact = %self.artifact_id,
                    section = %section,
                    cells,
                    expected,
                    "skipping malformed table row"
                );
                self.malformed_rows += 1;
            }
            Emission::SkippedRow { .. } => self.skipped_rows += 1,
        }
    }

    pub fn has_heading(&self, name: &str) -> bool {
        self.headings
            .iter()
            .any(|heading| heading.eq_ignore_ascii_case(name))
    }

    pub fn header_field(&self, name: &str) -> Option<&str> {
        self.header_fields
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

pub fn extract_artifact(text: &str, ctx: &ExtractContext<'_>) -> ArtifactExtract {
    let mut extract = ArtifactExtract {
        artifact_id: ctx.artifact_id.to_string(),
        ..ArtifactExtract::default()
    };
    let mut state = ExtractState::Header;
    for line in text.lines() {
        let (next, emissions) = step(state, line, ctx);
        for emission in emissions {
            extract.absorb(emission);
        }
        state = next;
    }
    for emission in finish(state, ctx) {
        extract.absorb(emission);
    }
    extract
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{CorpusConfig, proposition_profile};

    struct Fixture {
        profile: DomainProfile,
        patterns: Patterns,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                profile: proposition_profile(),
                patterns: Patterns::compile(&CorpusConfig::default()).expect("defaults compile"),
            }
        }

        fn ctx(&self) -> ExtractContext<'_> {
            ExtractContext {
                artifact_id: "PROP-0001",
                profile: &self.profile,
                patterns: &self.patterns,
            }
        }
    }

    fn texts(extract: &ArtifactExtract) -> Vec<&str> {
        extract
            .fragments
            .iter()
            .map(|fragment| fragment.text.as_str())
            .collect()
    }

    #[test]
    fn heading_enters_tracked_states() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let (state, out) = step(ExtractState::Header, "## Summary", &ctx);
        assert_eq!(out, vec![Emission::Heading("Summary".to_string())]);
        assert!(matches!(state, ExtractState::InSection { .. }));

        let (state, _) = step(state, "## Boosters", &ctx);
        assert!(matches!(state, ExtractState::InTable { table: 0, header: None }));

        let (state, _) = step(state, "## Appendix", &ctx);
        assert_eq!(state, ExtractState::Outside);
    }

    #[test]
    fn paragraph_is_emitted_when_blank_line_ends_it() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let (state, _) = step(ExtractState::Header, "## Summary", &ctx);
        let (state, out) = step(state, "First line of a paragraph", &ctx);
        assert!(out.is_empty());
        let (state, out) = step(state, "continues here.", &ctx);
        assert!(out.is_empty());
        let (_, out) = step(state, "", &ctx);
        assert_eq!(
            out,
            vec![Emission::Fragment(Fragment {
                artifact_id: "PROP-0001".to_string(),
                slot: "Summary".to_string(),
                text: "First line of a paragraph continues here.".to_string(),
            })]
        );
    }

    #[test]
    fn fences_comments_hints_and_subheadings_are_excluded() {
        let fx = Fixture::new();
        let doc = "\
## Summary
<!-- template hint:
write the summary here -->
> Hint: keep it short
```text
code that should not count
```
### Detail
Real prose stays.
- PROP-0002
- A bullet with content.
";
        let extract = extract_artifact(doc, &fx.ctx());
        assert_eq!(texts(&extract), vec!["Real prose stays.", "A bullet with content."]);
    }

    #[test]
    fn table_rows_yield_content_cells_and_references() {
        let fx = Fixture::new();
        let doc = "\
**Persona:** PER-0001

## Boosters
| ID | Booster | Rationale | Mapped Gain |
|----|---------|-----------|-------------|
| B01 | Instant quotes. | Saves a day. | PER-0001-G01, PER-0002-G03 |
| [ID] | [booster] | [why] | |
| B03 | only three | cells |
";
        let extract = extract_artifact(doc, &fx.ctx());
        assert_eq!(texts(&extract), vec!["Instant quotes.", "Saves a day."]);
        assert_eq!(
            extract.rows,
            vec![RowRecord {
                section: "Boosters".to_string(),
                row_id: "PROP-0001-B01".to_string(),
            }]
        );
        assert_eq!(extract.skipped_rows, 1);
        assert_eq!(extract.malformed_rows, 1);
        assert_eq!(extract.references.len(), 2);
        assert_eq!(extract.references[0].field, "Persona");
        assert_eq!(extract.references[0].row_id, None);
        assert_eq!(extract.references[1].field, "Mapped Gain");
        assert_eq!(extract.header_field("persona"), Some("PER-0001"));
    }

    #[test]
    fn row_with_only_placeholder_content_is_skipped() {
        let fx = Fixture::new();
        let doc = "\
## Relievers
| ID | Reliever | Rationale | Mapped Pain |
|---|---|---|---|
| R01 | TBD | <why> | PER-0001-P01 |
";
        let extract = extract_artifact(doc, &fx.ctx());
        assert!(extract.fragments.is_empty());
        assert!(extract.rows.is_empty());
        assert!(extract.references.is_empty());
        assert_eq!(extract.skipped_rows, 1);
    }

    #[test]
    fn table_without_id_column_contributes_nothing() {
        let fx = Fixture::new();
        let doc = "\
## Boosters
| Booster | Rationale |
|---|---|
| Something real. | Because. |
";
        let extract = extract_artifact(doc, &fx.ctx());
        assert!(extract.fragments.is_empty());
        assert_eq!(extract.skipped_rows, 1);
    }

    #[test]
    fn missing_sections_are_not_errors() {
        let fx = Fixture::new();
        let extract = extract_artifact("# Title only\n", &fx.ctx());
        assert!(extract.fragments.is_empty());
        assert!(extract.headings.is_empty());
    }

    #[test]
    fn unterminated_paragraph_is_flushed_at_end() {
        let fx = Fixture::new();
        let extract = extract_artifact("## Rationale\nLast words.", &fx.ctx());
        assert_eq!(texts(&extract), vec!["Last words."]);
    }

    #[test]
    fn escaped_pipes_stay_inside_cells() {
        assert_eq!(
            split_cells(r"| a \| b | c |"),
            vec!["a | b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn qualified_ids_are_not_double_prefixed() {
        assert_eq!(qualify_row_id("PER-0001", "J01"), "PER-0001-J01");
        assert_eq!(qualify_row_id("PER-0001", "PER-0001-J01"), "PER-0001-J01");
    }
}

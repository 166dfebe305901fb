//! Corpus assembly and scoring: artifacts in, `CorpusReport` out.
//!
//! `load_corpus` is the only stage that touches the filesystem. It lists
//! and sorts inputs once, extracts and cleans fragments, and assembles the
//! typed edge list. `score_corpus` is a pure function of the assembled
//! corpus, so two runs over the same tree produce identical reports.

use crate::clean::{Cleaner, word_count};
use crate::discover::{ArtifactSource, load_artifacts};
use crate::error::CorpusError;
use crate::extract::{ArtifactExtract, ExtractContext, Reference, extract_artifact, qualify_row_id};
use crate::pane::check_pane;
use crate::patterns::{Patterns, artifact_of};
use crate::profile::{CorpusConfig, DomainProfile, LeftScope, RightPool, TargetBasis, TargetRule};
use crate::registry::{DirectoryRegistry, IdRegistry, resolves};
use donescore_kernel::{
    Edge, GateResult, RawStatistics, SCORING_CONFIG_VERSION, Score, ScoringConfig, StructuralGate,
    VolumeStats, analyze_connectivity, analyze_depth, analyze_diversity, compute_target, decide,
    score_statistics,
};
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

/// Upstream magnitudes the dynamic targets scale against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamPool {
    pub domain: Option<String>,
    #[serde(skip)]
    pub prefix: Option<String>,
    pub artifacts: BTreeSet<String>,
    pub words: usize,
}

/// Everything scoring needs, in stable order.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub profile: DomainProfile,
    pub artifacts: Vec<ArtifactExtract>,
    pub upstream: UpstreamPool,
    /// Cleaned fragments, one per line.
    pub lines: Vec<String>,
    pub left: BTreeSet<String>,
    pub right: BTreeSet<String>,
    pub edges: Vec<Edge>,
    pub content_rows: usize,
    pub malformed_rows: usize,
    pub structural: Vec<StructuralGate>,
}

impl Corpus {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// SHA-256 of the cleaned corpus, hex encoded.
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(self.text().as_bytes()))
    }

    pub fn output_words(&self) -> usize {
        self.lines.iter().map(|line| word_count(line)).sum()
    }

    pub fn is_resolved(&self, edge: &Edge) -> bool {
        self.left.contains(&edge.source) && self.right.contains(&edge.target)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusReport {
    pub domain: String,
    pub scoring_config: String,
    pub artifacts: usize,
    pub upstream: UpstreamPool,
    pub malformed_rows: usize,
    pub stats: RawStatistics,
    pub score: Score,
    pub gate: GateResult,
    pub corpus_digest: String,
}

fn short_row_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{1,3}\d{1,3}$").expect("row ref regex must compile"))
}

fn has_prefix(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('-'))
}

fn push_unique(targets: &mut Vec<String>, target: String) {
    if !targets.contains(&target) {
        targets.push(target);
    }
}

/// Targets named by one reference, already shaped for the right pool.
fn reference_targets(
    reference: &Reference,
    profile: &DomainProfile,
    upstream_prefix: Option<&str>,
    patterns: &Patterns,
) -> Vec<String> {
    let mut targets: Vec<String> = Vec::new();
    match &profile.link.right {
        RightPool::Upstream => {
            let Some(prefix) = upstream_prefix else {
                return targets;
            };
            for id in patterns.find_ids(&reference.text) {
                if let Some(artifact) =
                    artifact_of(&id).filter(|artifact| has_prefix(artifact, prefix))
                {
                    push_unique(&mut targets, artifact.to_string());
                }
            }
        }
        RightPool::Rows { .. } => {
            let ids = patterns.find_ids(&reference.text);
            for id in &ids {
                if has_prefix(id, &profile.prefix) {
                    push_unique(&mut targets, id.clone());
                }
            }
            let remainder = ids
                .iter()
                .fold(reference.text.clone(), |text, id| text.replace(id.as_str(), " "));
            for token in remainder.split(|ch: char| ch == ',' || ch == ';' || ch.is_whitespace()) {
                if short_row_ref_re().is_match(token) {
                    push_unique(&mut targets, qualify_row_id(&reference.artifact_id, token));
                }
            }
        }
    }
    targets
}

fn left_pool(profile: &DomainProfile, artifacts: &[ArtifactExtract]) -> BTreeSet<String> {
    match profile.link.left {
        LeftScope::Artifact => artifacts
            .iter()
            .map(|artifact| artifact.artifact_id.clone())
            .collect(),
        LeftScope::Row => {
            let linked: Vec<&str> = profile
                .tables
                .iter()
                .filter(|table| !table.reference_columns.is_empty())
                .map(|table| table.section.as_str())
                .collect();
            artifacts
                .iter()
                .flat_map(|artifact| &artifact.rows)
                .filter(|row| {
                    linked
                        .iter()
                        .any(|section| section.eq_ignore_ascii_case(&row.section))
                })
                .map(|row| row.row_id.clone())
                .collect()
        }
    }
}

fn right_pool(
    profile: &DomainProfile,
    artifacts: &[ArtifactExtract],
    upstream: &UpstreamPool,
) -> BTreeSet<String> {
    match &profile.link.right {
        RightPool::Upstream => upstream.artifacts.clone(),
        RightPool::Rows { sections } => artifacts
            .iter()
            .flat_map(|artifact| &artifact.rows)
            .filter(|row| {
                sections
                    .iter()
                    .any(|section| section.eq_ignore_ascii_case(&row.section))
            })
            .map(|row| row.row_id.clone())
            .collect(),
    }
}

/// Assemble a corpus from already-read sources. Sources must be in
/// discovery order; nothing here re-sorts them.
pub fn assemble_corpus(
    profile: &DomainProfile,
    sources: &[ArtifactSource],
    upstream: UpstreamPool,
    config: &CorpusConfig,
    patterns: &Patterns,
) -> Corpus {
    let artifacts: Vec<ArtifactExtract> = sources
        .iter()
        .map(|source| {
            let ctx = ExtractContext {
                artifact_id: &source.id,
                profile,
                patterns,
            };
            extract_artifact(&source.text, &ctx)
        })
        .collect();

    let cleaner = Cleaner::new(patterns, config.token_dump);
    let lines = cleaner.clean_lines(
        artifacts
            .iter()
            .flat_map(|artifact| &artifact.fragments)
            .map(|fragment| fragment.text.as_str()),
    );

    let mut edges = Vec::new();
    for artifact in &artifacts {
        for reference in &artifact.references {
            let source = match profile.link.left {
                LeftScope::Artifact => reference.artifact_id.clone(),
                LeftScope::Row => match &reference.row_id {
                    Some(row_id) => row_id.clone(),
                    None => continue,
                },
            };
            let targets =
                reference_targets(reference, profile, upstream.prefix.as_deref(), patterns);
            for target in targets {
                edges.push(Edge::new(source.clone(), target, profile.link.relation.clone()));
            }
        }
    }

    let structural = artifacts
        .iter()
        .map(|artifact| check_pane(artifact, &profile.pane, patterns))
        .collect();

    Corpus {
        profile: profile.clone(),
        left: left_pool(profile, &artifacts),
        right: right_pool(profile, &artifacts, &upstream),
        content_rows: artifacts.iter().map(|artifact| artifact.rows.len()).sum(),
        malformed_rows: artifacts.iter().map(|artifact| artifact.malformed_rows).sum(),
        artifacts,
        upstream,
        lines,
        edges,
        structural,
    }
}

/// Admit upstream targets the registry can locate even though they were not
/// among the discovered upstream artifacts.
pub fn resolve_with_registry(corpus: &mut Corpus, registry: &dyn IdRegistry, docs_root: &Path) {
    if corpus.profile.link.right != RightPool::Upstream {
        return;
    }
    let missing: BTreeSet<String> = corpus
        .edges
        .iter()
        .filter(|edge| !corpus.right.contains(&edge.target))
        .map(|edge| edge.target.clone())
        .collect();
    for target in missing {
        if resolves(registry, docs_root, &target) {
            tracing::debug!(target = %target, "registry resolved upstream reference");
            corpus.right.insert(target);
        } else {
            tracing::debug!(target = %target, "unresolved upstream reference");
        }
    }
}

fn upstream_pool(
    docs_root: &Path,
    upstream: Option<&DomainProfile>,
    config: &CorpusConfig,
    patterns: &Patterns,
) -> Result<UpstreamPool, CorpusError> {
    let Some(profile) = upstream else {
        return Ok(UpstreamPool::default());
    };
    let sources = load_artifacts(docs_root, profile)?;
    let cleaner = Cleaner::new(patterns, config.token_dump);
    let mut words = 0;
    for source in &sources {
        let ctx = ExtractContext {
            artifact_id: &source.id,
            profile,
            patterns,
        };
        let extract = extract_artifact(&source.text, &ctx);
        words += extract
            .fragments
            .iter()
            .map(|fragment| word_count(&cleaner.clean(&fragment.text)))
            .sum::<usize>();
    }
    Ok(UpstreamPool {
        domain: Some(profile.name.clone()),
        prefix: Some(profile.prefix.clone()),
        artifacts: sources.into_iter().map(|source| source.id).collect(),
        words,
    })
}

#[derive(Clone, Copy)]
pub struct LoadOptions<'a> {
    pub docs_root: &'a Path,
    pub domain: &'a str,
    pub config: &'a CorpusConfig,
    /// Defaults to a scan of the upstream domain's directory.
    pub registry: Option<&'a dyn IdRegistry>,
}

/// Read, extract, clean and link one domain's corpus.
pub fn load_corpus(options: LoadOptions<'_>) -> Result<Corpus, CorpusError> {
    let LoadOptions {
        docs_root,
        domain,
        config,
        registry,
    } = options;
    if !docs_root.is_dir() {
        return Err(CorpusError::MissingRoot(docs_root.display().to_string()));
    }
    let profile = config.domain(domain)?;
    let upstream_profile = config.upstream_of(profile)?;
    let patterns = Patterns::compile(config)?;

    let sources = load_artifacts(docs_root, profile)?;
    if sources.is_empty() {
        return Err(CorpusError::EmptyCorpus {
            domain: profile.name.clone(),
            dir: docs_root.join(&profile.dir).display().to_string(),
            pattern: profile.file_pattern(),
        });
    }
    let upstream = upstream_pool(docs_root, upstream_profile, config, &patterns)?;
    tracing::info!(
        domain = %profile.name,
        artifacts = sources.len(),
        upstream_artifacts = upstream.artifacts.len(),
        "assembling corpus"
    );

    let mut corpus = assemble_corpus(profile, &sources, upstream, config, &patterns);
    match (registry, upstream_profile) {
        (Some(registry), _) => resolve_with_registry(&mut corpus, registry, docs_root),
        (None, Some(upstream)) => {
            let scanned = DirectoryRegistry::scan(docs_root, &upstream.dir, &upstream.prefix)?;
            resolve_with_registry(&mut corpus, &scanned, docs_root);
        }
        (None, None) => {}
    }
    if corpus.malformed_rows > 0 {
        tracing::warn!(rows = corpus.malformed_rows, "malformed table rows were skipped");
    }
    Ok(corpus)
}

fn target_for(rule: &TargetRule, corpus: &Corpus) -> usize {
    let magnitude = match rule.basis {
        TargetBasis::CorpusArtifacts => corpus.artifacts.len(),
        TargetBasis::UpstreamArtifacts => corpus.upstream.artifacts.len(),
        TargetBasis::UpstreamWords => corpus.upstream.words,
    };
    compute_target(magnitude, &rule.spec)
}

/// Raw statistics for a corpus; no thresholds involved.
pub fn corpus_statistics(corpus: &Corpus, scoring: &ScoringConfig) -> RawStatistics {
    let text = corpus.text();
    let targets = &corpus.profile.targets;
    RawStatistics {
        volume: VolumeStats {
            input_words: corpus.upstream.words,
            output_words: corpus.output_words(),
            word_target: target_for(&targets.words, corpus),
            content_rows: corpus.content_rows,
            row_target: target_for(&targets.rows, corpus),
        },
        diversity: analyze_diversity(&text, scoring),
        depth: analyze_depth(&text),
        connectivity: analyze_connectivity(
            &corpus.left,
            &corpus.right,
            &corpus.edges,
            target_for(&targets.edges, corpus),
        ),
    }
}

/// Score an assembled corpus. An empty corpus is valid here and scores zero.
pub fn score_corpus(
    corpus: &Corpus,
    scoring: &ScoringConfig,
    threshold: f64,
) -> Result<CorpusReport, CorpusError> {
    scoring.validate()?;
    let stats = corpus_statistics(corpus, scoring);
    let score = score_statistics(&stats, scoring);
    let gate = decide(&score, &corpus.structural, threshold)?;
    Ok(CorpusReport {
        domain: corpus.profile.name.clone(),
        scoring_config: SCORING_CONFIG_VERSION.to_string(),
        artifacts: corpus.artifacts.len(),
        upstream: corpus.upstream.clone(),
        malformed_rows: corpus.malformed_rows,
        stats,
        score,
        gate,
        corpus_digest: corpus.digest(),
    })
}

use crate::support::{exit_error, load_config_or_exit, print_json_or_exit};
use donescore_corpus::{
    Corpus, CorpusError, CorpusReport, IdRegistry, JsonRegistry, LoadOptions, load_corpus,
    score_corpus, write_intermediates,
};
use donescore_kernel::{Category, ScoringConfig, StructuralGate};
use serde_json::json;
use std::path::{Path, PathBuf};

const TAG: &str = "score";
const CHECK_KIND: &str = "donescore.score.v1";

pub struct Args {
    pub docs_root: String,
    pub min_score: String,
    pub domain: String,
    pub config: Option<String>,
    pub registry: Option<String>,
    pub emit_intermediates: Option<String>,
    pub quiet: bool,
    pub json: bool,
}

fn parse_threshold_or_exit(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && (0.0..=100.0).contains(&value) => value,
        _ => exit_error(
            TAG,
            format!("--min-score must be a number in [0, 100], got `{raw}`"),
        ),
    }
}

fn category_line(report: &CorpusReport, category: Category) -> String {
    let stats = &report.stats;
    let score = report.score.category(category);
    let detail = match category {
        Category::Volume => format!(
            "words={}/{} rows={}/{}",
            stats.volume.output_words,
            stats.volume.word_target,
            stats.volume.content_rows,
            stats.volume.row_target,
        ),
        Category::Diversity => format!(
            "tokens={} distinct={} ent_norm={:.3} uniq_ratio={:.3}",
            stats.diversity.tokens,
            stats.diversity.distinct,
            stats.diversity.ent_norm,
            stats.diversity.uniq_ratio,
        ),
        Category::Depth => format!(
            "fragments={} avg_words={:.1} two_sent_ratio={:.3} avg_sentences={:.2}",
            stats.depth.frag_count,
            stats.depth.frag_avg_words,
            stats.depth.two_sent_ratio,
            stats.depth.avg_sentences,
        ),
        Category::Connectivity => format!(
            "edges={}/{} unresolved={} linkage={:.3} density={:.3} multi_target={:.3}",
            stats.connectivity.edge_count,
            stats.connectivity.edge_target,
            stats.connectivity.unresolved_edges,
            stats.connectivity.linkage_ratio,
            stats.connectivity.density,
            stats.connectivity.multi_target_ratio,
        ),
    };
    format!("{:<13}{score:>5.1}/100  {detail}", category.as_str())
}

fn gate_line(gate: &StructuralGate) -> String {
    format!("  - {} missing {}", gate.subject, gate.missing.join(", "))
}

/// Human-readable report. Deterministic for a given report.
pub fn render_text(report: &CorpusReport) -> String {
    let gate = &report.gate;
    let mut lines = vec![format!(
        "RESULT: {} score={:.1} threshold={:.1}",
        gate.verdict.as_str(),
        gate.overall,
        gate.threshold
    )];
    lines.push(format!(
        "domain={} artifacts={} upstream={} upstream_artifacts={}",
        report.domain,
        report.artifacts,
        report.upstream.domain.as_deref().unwrap_or("-"),
        report.upstream.artifacts.len(),
    ));
    lines.push(format!(
        "words: in={} out={} target={}",
        report.stats.volume.input_words,
        report.stats.volume.output_words,
        report.stats.volume.word_target,
    ));
    lines.extend(Category::ALL.into_iter().map(|category| category_line(report, category)));

    let ready = gate.structural.iter().filter(|row| row.passed()).count();
    lines.push(format!(
        "pane-readiness: {ready}/{} artifacts ready",
        gate.structural.len()
    ));
    lines.extend(
        gate.structural
            .iter()
            .filter(|row| !row.passed())
            .map(gate_line),
    );
    if report.malformed_rows > 0 {
        lines.push(format!("malformed rows skipped: {}", report.malformed_rows));
    }
    if !gate.advice.is_empty() {
        lines.push("advice:".to_string());
        lines.extend(gate.advice.iter().map(|row| format!("  - {row}")));
    }
    lines.join("\n")
}

fn json_payload(report: &CorpusReport) -> serde_json::Value {
    let gate = &report.gate;
    let result = if gate.pass() { "accepted" } else { "rejected" };
    json!({
        "schema": 1,
        "checkKind": CHECK_KIND,
        "result": result,
        "verdict": gate.verdict,
        "scoringConfig": report.scoring_config,
        "domain": report.domain,
        "artifacts": report.artifacts,
        "upstream": report.upstream,
        "threshold": gate.threshold,
        "overall": gate.overall,
        "categories": gate.categories,
        "metrics": report.score.categories,
        "stats": report.stats,
        "structural": gate.structural,
        "advice": gate.advice,
        "malformedRows": report.malformed_rows,
        "corpusDigest": report.corpus_digest,
        "errors": Vec::<String>::new(),
    })
}

/// Intermediates are written only for a corpus that scored.
fn score_and_emit(
    corpus: &Corpus,
    threshold: f64,
    emit_dir: Option<&Path>,
) -> Result<CorpusReport, CorpusError> {
    let report = score_corpus(corpus, &ScoringConfig::v1(), threshold)?;
    if let Some(dir) = emit_dir {
        write_intermediates(dir, corpus)?;
    }
    Ok(report)
}

pub fn run(args: Args) {
    let threshold = parse_threshold_or_exit(&args.min_score);
    let config = load_config_or_exit(TAG, args.config.as_deref());
    let registry = args.registry.as_deref().map(|path| {
        JsonRegistry::load(Path::new(path)).unwrap_or_else(|err| exit_error(TAG, err))
    });
    let docs_root = PathBuf::from(&args.docs_root);

    let corpus = load_corpus(LoadOptions {
        docs_root: &docs_root,
        domain: &args.domain,
        config: &config,
        registry: registry.as_ref().map(|registry| registry as &dyn IdRegistry),
    })
    .unwrap_or_else(|err| exit_error(TAG, err));

    let emit_dir = args.emit_intermediates.as_deref().map(Path::new);
    let report =
        score_and_emit(&corpus, threshold, emit_dir).unwrap_or_else(|err| exit_error(TAG, err));
    tracing::info!(
        domain = %report.domain,
        overall = report.gate.overall,
        verdict = report.gate.verdict.as_str(),
        "scored corpus"
    );

    if !args.quiet {
        if args.json {
            print_json_or_exit(TAG, &json_payload(&report));
        } else {
            println!("{}", render_text(&report));
        }
    }

    std::process::exit(report.gate.verdict.exit_code());
}

#[cfg(test)]
mod tests {
    use super::*;
    use donescore_corpus::{CorpusConfig, Patterns, UpstreamPool, assemble_corpus};

    fn empty_corpus() -> Corpus {
        let config = CorpusConfig::default();
        let patterns = Patterns::compile(&config).expect("defaults compile");
        let profile = config.domain("proposition").expect("builtin").clone();
        assemble_corpus(&profile, &[], UpstreamPool::default(), &config, &patterns)
    }

    fn empty_report(threshold: f64) -> CorpusReport {
        score_corpus(&empty_corpus(), &ScoringConfig::v1(), threshold).expect("scores")
    }

    #[test]
    fn failed_scoring_leaves_no_intermediates() {
        let temp = tempfile::tempdir().expect("tempdir");
        let out = temp.path().join("intermediates");
        let result = score_and_emit(&empty_corpus(), 150.0, Some(&out));
        assert!(result.is_err());
        assert!(!out.exists());
    }

    #[test]
    fn scored_corpus_writes_intermediates() {
        let temp = tempfile::tempdir().expect("tempdir");
        let out = temp.path().join("intermediates");
        let report = score_and_emit(&empty_corpus(), 70.0, Some(&out)).expect("scores");
        assert_eq!(report.artifacts, 0);
        assert!(out.join("corpus.txt").is_file());
        assert!(out.join("edges.tsv").is_file());
    }

    #[test]
    fn text_report_leads_with_result_line() {
        let text = render_text(&empty_report(70.0));
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("RESULT: FAIL score=0.0 threshold=70.0"));
        assert_eq!(
            lines.next(),
            Some("domain=proposition artifacts=0 upstream=- upstream_artifacts=0")
        );
        assert!(text.contains("pane-readiness: 0/0 artifacts ready"));
        assert!(text.contains("advice:"));
    }

    #[test]
    fn json_payload_carries_check_kind_and_digest() {
        let payload = json_payload(&empty_report(70.0));
        assert_eq!(payload["checkKind"], CHECK_KIND);
        assert_eq!(payload["result"], "rejected");
        assert_eq!(payload["verdict"], "FAIL");
        assert_eq!(payload["scoringConfig"], "donescore.scoring.v1");
        assert_eq!(payload["corpusDigest"].as_str().map(str::len), Some(64));
        assert_eq!(payload["categories"]["volume"], 0.0);
    }
}

use crate::support::{load_config_or_exit, print_json_or_exit};
use donescore_corpus::{DomainProfile, LeftScope, RightPool, TargetBasis, TargetRule};
use donescore_kernel::ScoringConfig;
use serde_json::json;

const TAG: &str = "profiles";
const CHECK_KIND: &str = "donescore.profiles.v1";

fn target_text(rule: &TargetRule) -> String {
    let basis = match rule.basis {
        TargetBasis::CorpusArtifacts => "corpus_artifacts",
        TargetBasis::UpstreamArtifacts => "upstream_artifacts",
        TargetBasis::UpstreamWords => "upstream_words",
    };
    format!(
        "{}x{basis} [{}, {}]",
        rule.spec.coefficient, rule.spec.floor, rule.spec.ceiling
    )
}

fn profile_lines(profile: &DomainProfile) -> Vec<String> {
    let left = match profile.link.left {
        LeftScope::Artifact => "artifact",
        LeftScope::Row => "row",
    };
    let right = match &profile.link.right {
        RightPool::Upstream => "upstream".to_string(),
        RightPool::Rows { sections } => format!("rows[{}]", sections.join(",")),
    };
    let tables: Vec<&str> = profile
        .tables
        .iter()
        .map(|table| table.section.as_str())
        .collect();
    vec![
        format!(
            "{} dir={} files={} upstream={}",
            profile.name,
            profile.dir,
            profile.file_pattern(),
            profile.upstream.as_deref().unwrap_or("-"),
        ),
        format!(
            "  sections={} tables={}",
            profile.sections.join(","),
            tables.join(",")
        ),
        format!("  link={}({left} -> {right})", profile.link.relation),
        format!(
            "  targets words={} rows={} edges={}",
            target_text(&profile.targets.words),
            target_text(&profile.targets.rows),
            target_text(&profile.targets.edges),
        ),
        format!(
            "  pane headings={} fields={}",
            profile.pane.required_headings.join(","),
            profile.pane.required_fields.join(","),
        ),
    ]
}

pub fn run(config_path: Option<String>, json_output: bool) {
    let config = load_config_or_exit(TAG, config_path.as_deref());
    let scoring = ScoringConfig::v1();

    if json_output {
        let payload = json!({
            "schema": 1,
            "checkKind": CHECK_KIND,
            "scoringConfig": scoring,
            "corpusConfig": config,
        });
        print_json_or_exit(TAG, &payload);
        return;
    }

    println!(
        "[profiles] {} (domains={})",
        scoring.version,
        config.domains.len()
    );
    for profile in &config.domains {
        for line in profile_lines(profile) {
            println!("{line}");
        }
    }
}

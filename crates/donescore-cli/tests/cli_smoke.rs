use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const PERSONA: &str = "\
# Finance lead
**Segment:** Mid-market

## Profile
Runs a four person finance team. Owns month end close and vendor payments.

## Jobs
| ID | Job | Context |
|---|---|---|
| J01 | Close the books every month. | Deadlines are fixed by the board. |

## Pains
| ID | Pain | Job |
|---|---|---|
| P01 | Matching invoices by hand is slow. | J01 |

## Gains
| ID | Gain | Job |
|---|---|---|
| G01 | Close two days earlier. | J01 |
";

const PROPOSITION: &str = "\
# Faster close
**Persona:** PER-0001

## Summary
Automated matching shortens the close. Controllers review exceptions instead of every line.

## Boosters
| ID | Booster | Rationale | Mapped Gain |
|---|---|---|---|
| B01 | Invoices match against purchase orders overnight. Exceptions arrive ranked by amount. | Reviewers start with the riskiest items. Routine matches never reach a human. | PER-0001-G01 |
| B02 | Vendor statements reconcile automatically. Differences are explained inline. | Fewer emails chase missing credits. Auditors see the trail directly. | PER-0001-G01 |

## Relievers
| ID | Reliever | Rationale | Mapped Pain |
|---|---|---|---|
| R01 | Manual keying disappears for standard invoices. Scanned copies are parsed on arrival. | Typing errors stop at the source. Staff move to analysis work. | PER-0001-P01 |
";

fn run_donescore<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_donescore");
    Command::new(bin)
        .args(args)
        .env_remove("DONESCORE_LOG")
        .output()
        .expect("donescore command should execute")
}

fn assert_exit(output: &Output, code: i32) {
    if output.status.code() != Some(code) {
        panic!(
            "expected exit {code}, got {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected valid JSON stdout, got error: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn write_docs_tree(root: &Path) {
    fs::create_dir_all(root.join("personas")).expect("personas dir should be created");
    fs::create_dir_all(root.join("propositions")).expect("propositions dir should be created");
    fs::write(root.join("personas/PER-0001-finance-lead.md"), PERSONA)
        .expect("persona should be written");
    fs::write(root.join("propositions/PROP-0001-faster-close.md"), PROPOSITION)
        .expect("proposition should be written");
}

fn docs_tree() -> TempDir {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    write_docs_tree(temp.path());
    temp
}

fn score_args<'a>(root: &'a Path, min_score: &'a str) -> Vec<&'a OsStr> {
    vec![
        OsStr::new("score"),
        OsStr::new("--docs-root"),
        root.as_os_str(),
        OsStr::new("--min-score"),
        OsStr::new(min_score),
    ]
}

#[test]
fn score_passes_with_low_threshold() {
    let tree = docs_tree();
    let output = run_donescore(score_args(tree.path(), "10"));
    assert_exit(&output, 0);
    let stdout = stdout_text(&output);
    assert!(stdout.starts_with("RESULT: PASS score="), "stdout:\n{stdout}");
    assert!(stdout.contains("threshold=10.0"));
    assert!(
        stdout.contains("domain=proposition artifacts=1 upstream=persona upstream_artifacts=1")
    );
    assert!(stdout.contains("pane-readiness: 1/1 artifacts ready"));
}

#[test]
fn raising_threshold_flips_verdict_without_moving_scores() {
    let tree = docs_tree();
    let low = run_donescore(score_args(tree.path(), "10"));
    let high = run_donescore(score_args(tree.path(), "95"));
    assert_exit(&low, 0);
    assert_exit(&high, 1);

    let low_text = stdout_text(&low);
    let high_text = stdout_text(&high);
    assert!(high_text.starts_with("RESULT: FAIL"));
    let categories = |text: &str| -> Vec<String> {
        text.lines()
            .filter(|line| {
                ["volume", "diversity", "depth", "connectivity"]
                    .iter()
                    .any(|name| line.starts_with(name))
            })
            .map(str::to_string)
            .collect()
    };
    assert_eq!(categories(&low_text).len(), 4);
    assert_eq!(categories(&low_text), categories(&high_text));
}

#[test]
fn repeated_runs_print_identical_reports() {
    let tree = docs_tree();
    let first = run_donescore(score_args(tree.path(), "70"));
    let second = run_donescore(score_args(tree.path(), "70"));
    assert_eq!(first.stdout, second.stdout);
    assert_eq!(first.status.code(), second.status.code());
}

#[test]
fn quiet_mode_prints_nothing() {
    let tree = docs_tree();
    let mut args = score_args(tree.path(), "10");
    args.push(OsStr::new("--quiet"));
    let output = run_donescore(args);
    assert_exit(&output, 0);
    assert!(output.stdout.is_empty());
}

#[test]
fn json_mode_emits_check_payload() {
    let tree = docs_tree();
    let mut args = score_args(tree.path(), "95");
    args.push(OsStr::new("--json"));
    let output = run_donescore(args);
    assert_exit(&output, 1);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["schema"], 1);
    assert_eq!(payload["checkKind"], "donescore.score.v1");
    assert_eq!(payload["result"], "rejected");
    assert_eq!(payload["verdict"], "FAIL");
    assert_eq!(payload["domain"], "proposition");
    assert_eq!(payload["threshold"], 95.0);
    assert_eq!(payload["stats"]["connectivity"]["edgeCount"], 1);
    assert_eq!(payload["corpusDigest"].as_str().map(str::len), Some(64));
    assert!(payload["categories"]["volume"].is_number());
}

#[test]
fn missing_docs_root_exits_two() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let missing = temp.path().join("nowhere");
    let output = run_donescore(score_args(&missing, "70"));
    assert_exit(&output, 2);
    assert!(stderr_text(&output).contains("[score] ERROR: docs root not found"));
}

#[test]
fn empty_corpus_exits_two() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    fs::create_dir_all(temp.path().join("propositions")).expect("dir should be created");
    let output = run_donescore(score_args(temp.path(), "70"));
    assert_exit(&output, 2);
    assert!(stderr_text(&output).contains("no proposition artifacts matching PROP-####*.md"));
}

#[test]
fn non_numeric_threshold_exits_two() {
    let tree = docs_tree();
    let output = run_donescore(score_args(tree.path(), "high"));
    assert_exit(&output, 2);
    assert!(stderr_text(&output).contains("--min-score"));
}

#[test]
fn unknown_domain_exits_two() {
    let tree = docs_tree();
    let mut args = score_args(tree.path(), "70");
    args.extend([OsStr::new("--domain"), OsStr::new("roadmap")]);
    let output = run_donescore(args);
    assert_exit(&output, 2);
    assert!(stderr_text(&output).contains("unknown domain `roadmap`"));
}

#[test]
fn invalid_utf8_artifact_exits_two() {
    let tree = docs_tree();
    fs::write(
        tree.path().join("propositions/PROP-0002.md"),
        [b'#', b' ', 0xff],
    )
    .expect("artifact should be written");
    let output = run_donescore(score_args(tree.path(), "10"));
    assert_exit(&output, 2);
    assert!(stderr_text(&output).contains("not valid UTF-8"));
}

#[test]
fn bad_config_override_exits_two() {
    let tree = docs_tree();
    let config = tree.path().join("donescore.toml");
    fs::write(&config, "unknown_key = true\n").expect("config should be written");
    let mut args = score_args(tree.path(), "10");
    args.extend([OsStr::new("--config"), config.as_os_str()]);
    let output = run_donescore(args);
    assert_exit(&output, 2);
    assert!(stderr_text(&output).contains("invalid configuration"));
}

#[test]
fn emit_intermediates_writes_corpus_and_edges() {
    let tree = docs_tree();
    let out = tree.path().join("intermediates");
    let mut args = score_args(tree.path(), "10");
    args.extend([OsStr::new("--emit-intermediates"), out.as_os_str()]);
    let output = run_donescore(args);
    assert_exit(&output, 0);

    let corpus = fs::read_to_string(out.join("corpus.txt")).expect("corpus.txt should exist");
    assert!(corpus.contains("Automated matching shortens the close."));
    assert!(!corpus.contains("PER-0001"));
    let edges = fs::read_to_string(out.join("edges.tsv")).expect("edges.tsv should exist");
    assert!(edges.contains("PROP-0001\tPER-0001\tserves\tresolved"));
}

#[test]
fn profiles_lists_builtin_domains() {
    let output = run_donescore(["profiles"]);
    assert_exit(&output, 0);
    let stdout = stdout_text(&output);
    assert!(stdout.starts_with("[profiles] donescore.scoring.v1 (domains=3)"));
    assert!(stdout.contains("persona dir=personas files=PER-####*.md upstream=-"));

    let output = run_donescore(["profiles", "--json"]);
    assert_exit(&output, 0);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["checkKind"], "donescore.profiles.v1");
    let domains = payload["corpusConfig"]["domains"]
        .as_array()
        .expect("domains array");
    assert_eq!(domains.len(), 3);
    assert_eq!(payload["scoringConfig"]["version"], "donescore.scoring.v1");
}

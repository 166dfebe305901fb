//! # donescore-corpus
//!
//! Corpus layer for the done-score gate.
//!
//! This crate provides:
//! - domain profiles and TOML configuration overrides
//! - stable artifact discovery (sorted once, UTF-8 only)
//! - the line state-machine extractor and the corpus cleaner
//! - edge assembly against an ID registry
//! - pane-readiness gates and intermediate-artifact emission
//!
//! Scoring itself lives in `donescore-kernel`; this crate only feeds it.
//!
//! ## Data flow
//!
//! ```text
//! <docs-root>/<dir>/<PREFIX>-####*.md
//!     │  discover (sorted) + read_utf8
//!     ▼
//! extract::step ── fragments / rows / references
//!     │  clean (strip IDs, drop token dumps)
//!     ▼
//! Corpus (lines + left/right pools + edges) ──► score_corpus ──► CorpusReport
//! ```

pub mod clean;
pub mod discover;
pub mod emit;
pub mod error;
pub mod extract;
pub mod pane;
pub mod patterns;
pub mod pipeline;
pub mod profile;
pub mod registry;

pub use clean::{Cleaner, word_count};
pub use discover::{ArtifactSource, artifact_id_from_file_name, discover, load_artifacts, read_utf8};
pub use emit::{CORPUS_FILE, EDGES_FILE, edges_tsv, write_intermediates};
pub use error::CorpusError;
pub use extract::{
    ArtifactExtract, Emission, ExtractContext, ExtractState, Fragment, Reference, RowRecord,
    extract_artifact, finish, step,
};
pub use pane::{PANE_READINESS, check_pane};
pub use patterns::{Patterns, artifact_of};
pub use pipeline::{
    Corpus, CorpusReport, LoadOptions, UpstreamPool, assemble_corpus, corpus_statistics,
    load_corpus, resolve_with_registry, score_corpus,
};
pub use profile::{
    CorpusConfig, DEFAULT_DOMAIN, DEFAULT_ID_PATTERN, DomainProfile, LeftScope, LinkSpec,
    PaneSpec, RightPool, TableSpec, TargetBasis, TargetRule, TargetRules, TokenDumpConfig,
};
pub use registry::{DirectoryRegistry, IdRegistry, JsonRegistry};

//! # Donescore Kernel
//!
//! The scoring model behind the done-score gate: a corpus is admissible when
//! it is voluminous, lexically diverse, argued in depth, and connected to the
//! inputs it was produced from.
//!
//! This crate is **filesystem-agnostic**: it never reads artifacts. Callers
//! hand it cleaned text and typed edges; it hands back raw statistics, the
//! normalized score, and a gate decision.
//!
//! ## Architecture
//!
//! ```text
//! cleaned corpus text ──► diversity::analyze_diversity ─┐
//!                    └──► depth::analyze_depth ─────────┤
//! left/right IDs + edges ► analyze_connectivity ────────┤
//! volume counts + targets ──────────────────────────────┤
//!                                                       ▼
//!                                  normalize::score_statistics (ScoringConfig)
//!                                                       │
//!                                  gate::decide (threshold + structural gates)
//! ```

pub mod config;
pub mod connectivity;
pub mod depth;
pub mod diversity;
pub mod error;
pub mod gate;
pub mod normalize;

pub use config::{
    Category, Metric, MetricBounds, SCORING_CONFIG_VERSION, ScoringConfig, TargetSpec,
};
pub use connectivity::{ConnectivityStats, Edge, analyze_connectivity, edge_density};
pub use depth::{DepthStats, analyze_depth, count_sentences};
pub use diversity::{DiversityStats, analyze_diversity, content_tokens};
pub use error::KernelError;
pub use gate::{GateResult, StructuralGate, Verdict, decide};
pub use normalize::{
    CategoryScore, MetricScore, RawStatistics, Score, VolumeStats, compute_target,
    overall_from_categories, score_linear, score_statistics,
};

//! Cross-referential connectivity between two artifact pools.
//!
//! The left pool holds the entities authored in this corpus (artifacts or
//! table rows); the right pool holds what they are expected to reference,
//! usually the upstream stage's artifacts. Density is measured against the
//! complete bipartite graph `|left| × |right|`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A directed, typed reference between two IDs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub relation: String,
}

impl Edge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation: relation.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityStats {
    pub left_count: usize,
    pub right_count: usize,
    /// Distinct edges whose endpoints both resolve.
    pub edge_count: usize,
    /// Distinct edges with an endpoint outside the pools (zero credit).
    pub unresolved_edges: usize,
    pub density: f64,
    pub multi_target_count: usize,
    pub multi_target_ratio: f64,
    pub referenced_right: usize,
    pub linkage_ratio: f64,
    pub edge_target: usize,
    pub edge_coverage: f64,
}

/// `edges / (left × right)` clamped to `[0, 1]`; zero for an empty pool.
pub fn edge_density(edges: usize, left: usize, right: usize) -> f64 {
    let possible = left.saturating_mul(right);
    if possible == 0 {
        return 0.0;
    }
    (edges as f64 / possible as f64).clamp(0.0, 1.0)
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        (numerator as f64 / denominator as f64).clamp(0.0, 1.0)
    }
}

pub fn analyze_connectivity(
    left: &BTreeSet<String>,
    right: &BTreeSet<String>,
    edges: &[Edge],
    edge_target: usize,
) -> ConnectivityStats {
    let distinct: BTreeSet<&Edge> = edges.iter().collect();

    let mut out_targets: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut referenced: BTreeSet<&str> = BTreeSet::new();
    let mut resolved = 0usize;
    let mut unresolved = 0usize;
    for edge in distinct {
        if left.contains(&edge.source) && right.contains(&edge.target) {
            resolved += 1;
            out_targets
                .entry(edge.source.as_str())
                .or_default()
                .insert(edge.target.as_str());
            referenced.insert(edge.target.as_str());
        } else {
            unresolved += 1;
        }
    }

    let multi_target_count = out_targets
        .values()
        .filter(|targets| targets.len() >= 2)
        .count();

    ConnectivityStats {
        left_count: left.len(),
        right_count: right.len(),
        edge_count: resolved,
        unresolved_edges: unresolved,
        density: edge_density(resolved, left.len(), right.len()),
        multi_target_count,
        multi_target_ratio: ratio(multi_target_count, left.len()),
        referenced_right: referenced.len(),
        linkage_ratio: ratio(referenced.len(), right.len()),
        edge_target,
        edge_coverage: ratio(resolved, edge_target),
    }
}

//! Error types for donescore kernel operations.

use crate::config::{Category, Metric};

/// Errors arising from an inconsistent scoring model or invalid gate inputs.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// A metric's calibration bounds are not strictly increasing.
    #[error("invalid bounds for {metric:?}: lower={lower}, upper={upper}")]
    InvalidBounds {
        metric: Metric,
        lower: f64,
        upper: f64,
    },

    /// A category's point allocations do not add up to its budget.
    #[error("category {category:?} allocates {allocated} points, expected {budget}")]
    PointBudget {
        category: Category,
        allocated: f64,
        budget: f64,
    },

    /// A dynamic target specification cannot produce a usable bound.
    #[error("invalid target spec: {0}")]
    InvalidTarget(String),

    /// The pass threshold is not a finite number in [0, 100].
    #[error("invalid threshold: {0}")]
    InvalidThreshold(String),
}

//! Shared domain types.
//!
//! These types are intentionally small and serializable so callers can:
//!
//! - load selection options from their own config files
//! - export discovered dependencies to JSON for a downstream label model

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::SelectError;

/// One source's vote on one example.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Negative,
    Abstain,
    Positive,
}

impl Vote {
    /// Numeric encoding used in vote matrices: `-1`, `0`, `1`.
    pub fn value(self) -> i8 {
        match self {
            Vote::Negative => -1,
            Vote::Abstain => 0,
            Vote::Positive => 1,
        }
    }

    pub fn from_value(value: i8) -> Option<Self> {
        match value {
            -1 => Some(Vote::Negative),
            0 => Some(Vote::Abstain),
            1 => Some(Vote::Positive),
            _ => None,
        }
    }

    pub fn is_abstain(self) -> bool {
        self == Vote::Abstain
    }
}

/// Kind of statistical dependency between two sources.
///
/// Only reinforcing dependencies are discovered today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// One source's vote pulls the other's toward the same value beyond what
    /// the shared true label explains.
    Reinforcing,
}

/// A directed dependency edge between two sources (column indices).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dependency {
    pub source_a: usize,
    pub source_b: usize,
    pub kind: DependencyKind,
}

impl Dependency {
    pub fn reinforcing(source_a: usize, source_b: usize) -> Self {
        Self {
            source_a,
            source_b,
            kind: DependencyKind::Reinforcing,
        }
    }

    /// True if the edge connects `source` (in either direction).
    pub fn touches(&self, source: usize) -> bool {
        self.source_a == source || self.source_b == source
    }
}

/// Ordered set of discovered dependencies.
///
/// A `BTreeSet` keeps iteration order stable so exported edge lists diff
/// cleanly between runs.
pub type DependencySet = BTreeSet<Dependency>;

/// Options controlling dependency selection.
///
/// Every field has a default, so partial configs deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectOptions {
    /// Model each target's intrinsic non-abstention rate with an extra weight.
    pub propensity: bool,
    /// Minimum absolute interaction weight that declares an edge.
    pub threshold: f64,
    /// Truncation period: L1 shrinkage fires with probability `1/truncation`
    /// and is scaled up by `truncation` when it does.
    pub truncation: usize,
    /// L1 strength. `None` reuses `threshold`.
    pub regularization: Option<f64>,
    /// Passes over the examples per target source.
    pub epochs: usize,
    /// Minimum number of examples on which both sources vote (non-abstain)
    /// before an edge between them may be recorded. `0` disables the check.
    pub min_co_votes: usize,
    /// Fit target sources on the rayon pool.
    pub parallel: bool,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            propensity: false,
            threshold: 0.05,
            truncation: 10,
            regularization: None,
            epochs: 10,
            min_co_votes: 1,
            parallel: true,
        }
    }
}

impl SelectOptions {
    /// L1 strength actually applied during fitting.
    pub fn effective_regularization(&self) -> f64 {
        self.regularization.unwrap_or(self.threshold)
    }

    pub fn validate(&self) -> Result<(), SelectError> {
        if !(self.threshold.is_finite() && self.threshold >= 0.0) {
            return Err(SelectError::option(
                "threshold",
                format!("must be finite and >= 0 (got {})", self.threshold),
            ));
        }
        let reg = self.effective_regularization();
        if !(reg.is_finite() && reg >= 0.0) {
            return Err(SelectError::option(
                "regularization",
                format!("must be finite and >= 0 (got {reg})"),
            ));
        }
        if self.truncation == 0 {
            return Err(SelectError::option("truncation", "must be >= 1"));
        }
        if self.epochs == 0 {
            return Err(SelectError::option("epochs", "must be >= 1"));
        }
        Ok(())
    }
}

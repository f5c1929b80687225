//! Synthetic vote matrices from simulated labeling sources.
//!
//! Each example gets a latent label in `{-1, 1}`; each source then votes with
//! its own coverage and accuracy. `copies` wires sources together so one
//! repeats another's vote verbatim, which is the simplest reinforcing
//! dependency to recover.

use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::data::votes::VoteMatrix;
use crate::error::SelectError;

/// Behavior of one simulated source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceProfile {
    /// P(vote agrees with the latent label | source votes).
    pub accuracy: f64,
    /// P(source votes at all).
    pub coverage: f64,
}

impl SourceProfile {
    pub fn new(accuracy: f64, coverage: f64) -> Self {
        Self { accuracy, coverage }
    }

    /// A source whose votes carry no information about the label.
    pub fn noise(coverage: f64) -> Self {
        Self::new(0.5, coverage)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    pub examples: usize,
    pub sources: Vec<SourceProfile>,
    /// `(from, to)`: source `to` repeats source `from`'s vote. Applied in
    /// order, so chains work when listed front to back.
    pub copies: Vec<(usize, usize)>,
    /// P(latent label = +1).
    pub class_balance: f64,
    pub seed: u64,
}

#[derive(Debug, Clone)]
pub struct SyntheticVotes {
    pub votes: VoteMatrix,
    /// Latent label per example, `-1` or `1`.
    pub labels: Vec<i8>,
}

pub fn generate_votes(config: &SyntheticConfig) -> Result<SyntheticVotes, SelectError> {
    if config.examples == 0 || config.sources.is_empty() {
        return Err(SelectError::EmptyMatrix {
            rows: config.examples,
            cols: config.sources.len(),
        });
    }
    if !unit_interval(config.class_balance) {
        return Err(SelectError::option(
            "class_balance",
            format!("must be within [0, 1] (got {})", config.class_balance),
        ));
    }
    for (k, profile) in config.sources.iter().enumerate() {
        if !unit_interval(profile.accuracy) || !unit_interval(profile.coverage) {
            return Err(SelectError::option(
                "sources",
                format!("source {k}: accuracy and coverage must be within [0, 1]"),
            ));
        }
    }
    let n = config.sources.len();
    for &(from, to) in &config.copies {
        if from >= n || to >= n || from == to {
            return Err(SelectError::option(
                "copies",
                format!("invalid copy ({from}, {to}) for {n} sources"),
            ));
        }
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut labels = Vec::with_capacity(config.examples);
    let mut buf = Vec::with_capacity(config.examples * n);
    let mut row = vec![0i8; n];

    for _ in 0..config.examples {
        let label: i8 = if rng.gen_bool(config.class_balance) { 1 } else { -1 };
        labels.push(label);

        for (vote, profile) in row.iter_mut().zip(&config.sources) {
            *vote = if !rng.gen_bool(profile.coverage) {
                0
            } else if rng.gen_bool(profile.accuracy) {
                label
            } else {
                -label
            };
        }
        for &(from, to) in &config.copies {
            row[to] = row[from];
        }
        buf.extend_from_slice(&row);
    }

    let votes = VoteMatrix::from_row_slice(config.examples, n, &buf)?;
    Ok(SyntheticVotes { votes, labels })
}

fn unit_interval(p: f64) -> bool {
    p.is_finite() && (0.0..=1.0).contains(&p)
}

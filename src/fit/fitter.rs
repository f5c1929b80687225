//! Low-level fitting routine for a single target source.
//!
//! Given:
//! - a vote matrix `L` (m examples x n sources)
//! - a target source `j`
//! - pre-initialized [`Weights`]
//!
//! we run online gradient ascent on the likelihood of a small model coupling
//! the latent true label `y`, the target's vote `L[i, j]`, and one interaction
//! pair (`incoming[k]`, `outgoing[k]`) per other source `k`. Sparsity comes from
//! a truncated-gradient L1 step that fires with probability `1/truncation`.
//!
//! The inner loop touches only the weight vector and a 6-entry joint table;
//! nothing is allocated per example.

use rand::Rng;

use crate::data::VoteMatrix;
use crate::error::SelectError;
use crate::fit::weights::{JointTable, Weights};

const NN: usize = JointTable::NEG_NEG;
const NA: usize = JointTable::NEG_ABSTAIN;
const NP: usize = JointTable::NEG_POS;
const PN: usize = JointTable::POS_NEG;
const PA: usize = JointTable::POS_ABSTAIN;
const PP: usize = JointTable::POS_POS;

/// Options for fitting one target source.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    /// Model the target's non-abstention rate with an extra weight.
    pub propensity: bool,
    /// L1 coefficient.
    pub regularization: f64,
    /// Truncation period (>= 1).
    pub truncation: usize,
    /// Passes over all examples.
    pub epochs: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            propensity: false,
            regularization: 0.05,
            truncation: 10,
            epochs: 10,
        }
    }
}

/// Fit the pairwise model centered on `target`, updating `weights` in place.
///
/// Performs exactly `epochs * m` per-example updates. `rng` drives only the
/// truncation trigger, so the same generator state and initial weights give
/// bit-identical results.
pub fn fit_target<R: Rng + ?Sized>(
    votes: &VoteMatrix,
    target: usize,
    weights: &mut Weights,
    joint: &mut JointTable,
    opts: &FitOptions,
    rng: &mut R,
) -> Result<(), SelectError> {
    let m = votes.examples();
    let n = votes.sources();
    let j = target;

    if j >= n {
        return Err(SelectError::TargetOutOfRange {
            target: j,
            sources: n,
        });
    }
    let expected = 3 * n + usize::from(opts.propensity);
    if weights.sources() != n || weights.has_propensity() != opts.propensity {
        return Err(SelectError::WeightShape {
            expected,
            actual: weights.len(),
        });
    }
    if opts.truncation == 0 {
        return Err(SelectError::option("truncation", "must be >= 1"));
    }
    if !(opts.regularization.is_finite() && opts.regularization >= 0.0) {
        return Err(SelectError::option(
            "regularization",
            format!("must be finite and >= 0 (got {})", opts.regularization),
        ));
    }

    let step = 1.0 / m as f64;
    let p_truncate = 1.0 / opts.truncation as f64;
    let l1_delta = opts.regularization * step * opts.truncation as f64;

    for _ in 0..opts.epochs {
        for i in 0..m {
            let row = votes.example(i);
            build_joint(row, j, weights.as_slice(), opts.propensity, joint);
            joint.normalize();
            gradient_step(row, j, joint, weights.as_mut_slice(), opts.propensity, step);

            if rng.gen_bool(p_truncate) {
                weights.shrink_toward_zero(l1_delta);
            }
        }
    }

    if !weights.is_finite() {
        return Err(SelectError::NonFinite { target: j });
    }
    Ok(())
}

/// Fill `joint` with log-potentials for one example.
fn build_joint(row: &[i8], j: usize, w: &[f64], propensity: bool, joint: &mut JointTable) {
    let n = row.len();
    joint.clear();
    let t = joint.entries_mut();

    // Self coupling: agreement between y and the target's own vote.
    t[NN] += w[j];
    t[PP] += w[j];
    t[NP] -= w[j];
    t[PN] -= w[j];

    for (k, &vote) in row.iter().enumerate() {
        if k == j {
            continue;
        }
        let acc = w[k];
        let inc = w[n + k];
        let out = w[2 * n + k];
        match vote {
            1 => {
                t[NN] -= acc;
                t[NA] -= acc;
                t[NP] -= acc;
                t[PN] += acc;
                t[PA] += acc;
                t[PP] += acc;

                t[PP] += inc + out;
                t[NA] -= inc;
                t[PA] -= inc;
            }
            -1 => {
                t[NN] += acc;
                t[NA] += acc;
                t[NP] += acc;
                t[PN] -= acc;
                t[PA] -= acc;
                t[PP] -= acc;

                t[NN] += inc + out;
                t[NA] -= inc;
                t[PA] -= inc;
            }
            _ => {
                for idx in JointTable::VOTING {
                    t[idx] -= out;
                }
            }
        }
    }

    if propensity {
        let prop = w[3 * n];
        for idx in JointTable::VOTING {
            t[idx] += prop;
        }
    }
}

/// One online likelihood-gradient step from a normalized `joint`.
fn gradient_step(row: &[i8], j: usize, joint: &JointTable, w: &mut [f64], propensity: bool, step: f64) {
    let n = row.len();
    let p = joint.entries();
    let marginal_pos = joint.marginal_pos();
    let marginal_neg = joint.marginal_neg();
    let voting = joint.voting_mass();
    let lj = row[j];
    let (cond_pos, cond_neg) = joint.conditional(lj);

    // Self accuracy.
    w[j] -= step * (p[PP] + p[NN] - p[NP] - p[PN]);
    match lj {
        1 => w[j] += step * (cond_pos - cond_neg),
        -1 => w[j] += step * (cond_neg - cond_pos),
        _ => {}
    }

    for (k, &vote) in row.iter().enumerate() {
        if k == j {
            continue;
        }
        match vote {
            1 => {
                w[k] -= step * (marginal_pos - marginal_neg - cond_pos + cond_neg);

                w[n + k] -= step * (p[PP] - p[NA] - p[PA]);
                match lj {
                    1 => w[n + k] += step * cond_pos,
                    0 => w[n + k] -= step,
                    _ => {}
                }

                w[2 * n + k] -= step * p[PP];
                if lj == 1 {
                    w[2 * n + k] += step * cond_pos;
                }
            }
            -1 => {
                w[k] -= step * (marginal_neg - marginal_pos - cond_neg + cond_pos);

                w[n + k] -= step * (p[NN] - p[NA] - p[PA]);
                match lj {
                    -1 => w[n + k] += step * cond_neg,
                    0 => w[n + k] -= step,
                    _ => {}
                }

                w[2 * n + k] -= step * p[NN];
                if lj == -1 {
                    w[2 * n + k] += step * cond_neg;
                }
            }
            _ => {
                // k abstains: incoming[k] has no gradient.
                w[2 * n + k] += step * voting;
                if lj != 0 {
                    w[2 * n + k] -= step;
                }
            }
        }
    }

    if propensity {
        w[3 * n] -= step * voting;
        if lj != 0 {
            w[3 * n] += step;
        }
    }
}

//! Dependency selection across all target sources.
//!
//! For each target source `j` we:
//! 1. derive a per-target generator from the selector seed
//! 2. initialize weights and fit the model centered on `j`
//! 3. threshold `incoming[k]` into `(j, k)` edges and `outgoing[k]` into
//!    `(k, j)` edges
//!
//! Targets are independent, so they run on the rayon pool when
//! `SelectOptions::parallel` is set. Per-target seeds are drawn up front in
//! target order, which makes the edge set identical for parallel and
//! sequential runs.

use nalgebra::DMatrix;
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::data::VoteMatrix;
use crate::domain::{Dependency, DependencySet, SelectOptions};
use crate::error::SelectError;
use crate::fit::fitter::{FitOptions, fit_target};
use crate::fit::weights::{JointTable, Weights};

/// Seed used by [`DependencySelector::default`].
pub const DEFAULT_SEED: u64 = 271_828;

/// Discovers reinforcing dependencies between labeling sources.
///
/// The selector holds only its seed; every call starts from that seed, so
/// repeated calls on the same votes return the same edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencySelector {
    seed: u64,
}

impl Default for DependencySelector {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl DependencySelector {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fit every source and return the thresholded edge set.
    pub fn select(
        &self,
        votes: &VoteMatrix,
        opts: &SelectOptions,
    ) -> Result<DependencySet, SelectError> {
        opts.validate()?;
        let n = votes.sources();
        info!(
            examples = votes.examples(),
            sources = n,
            threshold = opts.threshold,
            propensity = opts.propensity,
            parallel = opts.parallel,
            "selecting dependencies"
        );

        let fit_opts = fit_options(opts);
        let seeds = self.target_seeds(n);
        let co_votes = votes.co_votes();

        let fitted: Vec<(usize, Weights)> = if opts.parallel {
            seeds
                .into_par_iter()
                .enumerate()
                .map(|(target, seed)| fit_seeded(votes, target, seed, &fit_opts))
                .collect::<Result<_, _>>()?
        } else {
            seeds
                .into_iter()
                .enumerate()
                .map(|(target, seed)| fit_seeded(votes, target, seed, &fit_opts))
                .collect::<Result<_, _>>()?
        };

        let mut deps = DependencySet::new();
        for (target, weights) in &fitted {
            let before = deps.len();
            collect_edges(*target, weights, opts, &co_votes, &mut deps);
            debug!(
                target = *target,
                coverage = votes.coverage(*target),
                new_edges = deps.len() - before,
                "thresholded target source"
            );
        }

        info!(edges = deps.len(), "dependency selection finished");
        Ok(deps)
    }

    /// Fitted weights for a single target, exactly as [`select`] computes them.
    ///
    /// [`select`]: DependencySelector::select
    pub fn fit_source(
        &self,
        votes: &VoteMatrix,
        target: usize,
        opts: &SelectOptions,
    ) -> Result<Weights, SelectError> {
        opts.validate()?;
        let n = votes.sources();
        if target >= n {
            return Err(SelectError::TargetOutOfRange { target, sources: n });
        }
        let seed = self.target_seeds(target + 1)[target];
        let (_, weights) = fit_seeded(votes, target, seed, &fit_options(opts))?;
        Ok(weights)
    }

    /// One generator seed per target, drawn in target order from the selector
    /// seed.
    fn target_seeds(&self, count: usize) -> Vec<u64> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..count).map(|_| rng.next_u64()).collect()
    }
}

fn fit_options(opts: &SelectOptions) -> FitOptions {
    FitOptions {
        propensity: opts.propensity,
        regularization: opts.effective_regularization(),
        truncation: opts.truncation,
        epochs: opts.epochs,
    }
}

/// Initialize and fit one target. The same generator seeds the accuracies and
/// then drives the truncation trigger.
fn fit_seeded(
    votes: &VoteMatrix,
    target: usize,
    seed: u64,
    opts: &FitOptions,
) -> Result<(usize, Weights), SelectError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut weights = Weights::initialize(votes.sources(), opts.propensity, &mut rng);
    let mut joint = JointTable::new();
    fit_target(votes, target, &mut weights, &mut joint, opts, &mut rng)?;
    Ok((target, weights))
}

fn collect_edges(
    target: usize,
    weights: &Weights,
    opts: &SelectOptions,
    co_votes: &DMatrix<usize>,
    deps: &mut DependencySet,
) {
    let incoming = weights.incoming();
    let outgoing = weights.outgoing();
    for k in 0..weights.sources() {
        if k == target || co_votes[(target, k)] < opts.min_co_votes {
            continue;
        }
        if incoming[k].abs() > opts.threshold {
            deps.insert(Dependency::reinforcing(target, k));
        }
        if outgoing[k].abs() > opts.threshold {
            deps.insert(Dependency::reinforcing(k, target));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn votes() -> VoteMatrix {
        VoteMatrix::from_rows(&[
            vec![1i8, 1, 0, -1],
            vec![-1, -1, 1, 0],
            vec![1, 1, -1, 1],
            vec![0, 0, 1, -1],
            vec![-1, -1, 0, 1],
            vec![1, 1, -1, 0],
            vec![-1, 0, 1, -1],
            vec![1, 1, 0, 1],
        ])
        .unwrap()
    }

    #[test]
    fn default_seed_is_fixed() {
        assert_eq!(DependencySelector::default().seed(), DEFAULT_SEED);
    }

    #[test]
    fn repeated_calls_return_same_edges() {
        let selector = DependencySelector::new(11);
        let opts = SelectOptions::default();
        let a = selector.select(&votes(), &opts).unwrap();
        let b = selector.select(&votes(), &opts).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let selector = DependencySelector::new(5);
        let par = selector
            .select(&votes(), &SelectOptions::default())
            .unwrap();
        let seq = selector
            .select(
                &votes(),
                &SelectOptions {
                    parallel: false,
                    ..SelectOptions::default()
                },
            )
            .unwrap();
        assert_eq!(par, seq);
    }

    #[test]
    fn fit_source_matches_weights_used_by_select() {
        let selector = DependencySelector::new(3);
        let opts = SelectOptions {
            threshold: 0.0,
            min_co_votes: 0,
            ..SelectOptions::default()
        };
        let votes = votes();
        let deps = selector.select(&votes, &opts).unwrap();

        let weights = selector.fit_source(&votes, 2, &opts).unwrap();
        assert_eq!(weights.len(), 12);
        for k in [0, 1, 3] {
            if weights.incoming()[k] != 0.0 {
                assert!(deps.contains(&Dependency::reinforcing(2, k)));
            }
            if weights.outgoing()[k] != 0.0 {
                assert!(deps.contains(&Dependency::reinforcing(k, 2)));
            }
        }

        let again = selector.fit_source(&votes, 2, &opts).unwrap();
        assert_eq!(weights, again);
    }

    #[test]
    fn universal_abstention_yields_no_edges() {
        let votes = VoteMatrix::from_row_slice(50, 3, &[0i8; 150]).unwrap();
        let deps = DependencySelector::default()
            .select(&votes, &SelectOptions::default())
            .unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn single_source_has_nothing_to_depend_on() {
        let votes = VoteMatrix::from_rows(&[vec![1i8], vec![-1], vec![0]]).unwrap();
        let deps = DependencySelector::default()
            .select(&votes, &SelectOptions::default())
            .unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn bad_options_fail_before_fitting() {
        let selector = DependencySelector::default();
        let opts = SelectOptions {
            truncation: 0,
            ..SelectOptions::default()
        };
        assert!(matches!(
            selector.select(&votes(), &opts),
            Err(SelectError::InvalidOption { name: "truncation", .. })
        ));
        assert!(matches!(
            selector.fit_source(&votes(), 4, &SelectOptions::default()),
            Err(SelectError::TargetOutOfRange { target: 4, sources: 4 })
        ));
    }

    #[test]
    fn co_vote_gate_drops_pairs_without_shared_votes() {
        // Source 2 only votes where sources 0 and 1 abstain.
        let votes = VoteMatrix::from_rows(&[
            vec![1i8, 1, 0],
            vec![-1, -1, 0],
            vec![0, 0, 1],
            vec![1, 1, 0],
            vec![0, 0, -1],
        ])
        .unwrap();
        let opts = SelectOptions {
            threshold: 0.0,
            ..SelectOptions::default()
        };
        let deps = DependencySelector::default().select(&votes, &opts).unwrap();
        assert!(deps.iter().all(|d| !d.touches(2)));
    }
}

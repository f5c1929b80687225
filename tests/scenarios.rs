//! End-to-end selection scenarios on synthetic votes.

use lf_structure::data::{SourceProfile, SyntheticConfig, generate_votes};
use lf_structure::{DependencySelector, DependencySet, SelectOptions, VoteMatrix};

fn copied_pair(examples: usize, seed: u64) -> VoteMatrix {
    let config = SyntheticConfig {
        examples,
        sources: vec![
            SourceProfile::new(0.8, 0.9),
            SourceProfile::new(0.8, 0.9),
            // votes -1 / 0 / 1 with equal odds, independent of the label
            SourceProfile::noise(2.0 / 3.0),
        ],
        copies: vec![(0, 1)],
        class_balance: 0.5,
        seed,
    };
    generate_votes(&config).unwrap().votes
}

#[test]
fn identical_sources_are_linked_and_noise_is_not() {
    // Noise weights shrink roughly as 1/sqrt(m). At 500 examples they sit
    // close enough to the default 0.05 threshold to cross it on a few seeds;
    // 1500 keeps them well below it.
    let votes = copied_pair(1500, 17);
    let deps = DependencySelector::default()
        .select(&votes, &SelectOptions::default())
        .unwrap();

    assert!(
        deps.iter().any(|d| d.touches(0) && d.touches(1)),
        "expected an edge between 0 and 1, got {deps:?}"
    );
    assert!(
        deps.iter().all(|d| !d.touches(2)),
        "unexpected edge touching source 2: {deps:?}"
    );
}

#[test]
fn identical_sources_are_linked_at_500_examples() {
    let selector = DependencySelector::default();
    let opts = SelectOptions::default();
    for seed in [1, 2, 3, 4, 5] {
        let deps = selector.select(&copied_pair(500, seed), &opts).unwrap();
        assert!(
            deps.iter().any(|d| d.touches(0) && d.touches(1)),
            "seed {seed}: expected an edge between 0 and 1, got {deps:?}"
        );
    }
}

#[test]
fn always_abstaining_source_gets_no_edges() {
    let config = SyntheticConfig {
        examples: 300,
        sources: vec![
            SourceProfile::new(0.8, 1.0),
            SourceProfile::new(0.7, 1.0),
            SourceProfile::noise(0.0),
        ],
        copies: Vec::new(),
        class_balance: 0.5,
        seed: 5,
    };
    let votes = generate_votes(&config).unwrap().votes;
    let deps = DependencySelector::default()
        .select(&votes, &SelectOptions::default())
        .unwrap();
    assert!(deps.iter().all(|d| !d.touches(2)), "{deps:?}");
}

#[test]
fn universal_abstention_is_empty_for_any_positive_threshold() {
    let votes = VoteMatrix::from_row_slice(100, 4, &[0i8; 400]).unwrap();
    for threshold in [1e-9, 0.05, 0.5, 5.0] {
        let opts = SelectOptions {
            threshold,
            ..SelectOptions::default()
        };
        let deps = DependencySelector::default().select(&votes, &opts).unwrap();
        assert!(deps.is_empty(), "threshold {threshold}: {deps:?}");
    }
}

#[test]
fn without_co_vote_gate_abstention_penalty_creates_edges() {
    // The abstention branch keeps pushing outgoing weights up when nobody
    // votes; only the co-vote gate keeps these out of the result.
    let votes = VoteMatrix::from_row_slice(100, 3, &[0i8; 300]).unwrap();
    let opts = SelectOptions {
        min_co_votes: 0,
        ..SelectOptions::default()
    };
    let deps = DependencySelector::default().select(&votes, &opts).unwrap();
    assert!(!deps.is_empty());
    assert!(deps.iter().all(|d| d.source_a != d.source_b));
}

#[test]
fn full_strength_regularization_removes_every_edge() {
    let votes = copied_pair(300, 3);
    let base = SelectOptions::default();
    let strong = SelectOptions {
        regularization: Some(1e6),
        truncation: 1,
        ..SelectOptions::default()
    };
    let selector = DependencySelector::default();

    let loose = selector.select(&votes, &base).unwrap();
    let sparse = selector.select(&votes, &strong).unwrap();
    assert!(!loose.is_empty());
    assert!(sparse.is_empty());
    assert!(sparse.is_subset(&loose));
}

#[test]
fn stronger_regularization_never_adds_edges() {
    let selector = DependencySelector::default();
    for seed in [3, 8, 13] {
        let votes = copied_pair(300, seed);
        let mut prev: Option<DependencySet> = None;
        for strength in [0.0, 0.01, 0.05, 0.1, 0.2, 0.5] {
            let opts = SelectOptions {
                regularization: Some(strength),
                parallel: false,
                ..SelectOptions::default()
            };
            let deps = selector.select(&votes, &opts).unwrap();
            if let Some(prev) = &prev {
                assert!(
                    deps.is_subset(prev),
                    "seed {seed}, regularization {strength}: {deps:?} not within {prev:?}"
                );
            }
            prev = Some(deps);
        }
    }
}

#[test]
fn propensity_runs_are_reproducible() {
    let votes = copied_pair(400, 9);
    let opts = SelectOptions {
        propensity: true,
        ..SelectOptions::default()
    };
    let selector = DependencySelector::new(42);
    let a = selector.select(&votes, &opts).unwrap();
    let b = selector.select(&votes, &opts).unwrap();
    assert_eq!(a, b);
    assert!(a.iter().all(|d| d.source_a != d.source_b));

    let weights = selector.fit_source(&votes, 0, &opts).unwrap();
    assert_eq!(weights.len(), 3 * 3 + 1);
    assert!(weights.propensity().is_some());
}

#[test]
fn sparse_input_matches_dense_input() {
    use nalgebra_sparse::{CooMatrix, CsrMatrix};

    let votes = copied_pair(200, 21);
    let mut coo = CooMatrix::<i8>::new(votes.examples(), votes.sources());
    for i in 0..votes.examples() {
        for k in 0..votes.sources() {
            let v = votes.vote(i, k).value();
            if v != 0 {
                coo.push(i, k, v);
            }
        }
    }
    let csr = CsrMatrix::from(&coo);
    let from_sparse = VoteMatrix::from_csr(&csr).unwrap();
    assert_eq!(from_sparse, votes);

    let selector = DependencySelector::default();
    let opts = SelectOptions::default();
    assert_eq!(
        selector.select(&from_sparse, &opts).unwrap(),
        selector.select(&votes, &opts).unwrap()
    );
}

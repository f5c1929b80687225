//! Parameter vector and joint scratch table for a single target-source fit.
//!
//! Layout of the flat weight vector for `n` sources:
//!
//! ```text
//! [0, n)      accuracy[k]
//! [n, 2n)     incoming[k]   (k's vote -> target's vote)
//! [2n, 3n)    outgoing[k]   (target's vote -> k's vote)
//! 3n          propensity    (only when enabled)
//! ```

use rand::Rng;

/// Weights of the pairwise model centered on one target source.
#[derive(Debug, Clone, PartialEq)]
pub struct Weights {
    sources: usize,
    values: Vec<f64>,
}

impl Weights {
    /// All-zero weights for `sources` sources.
    pub fn zeros(sources: usize, propensity: bool) -> Self {
        let len = 3 * sources + usize::from(propensity);
        Self {
            sources,
            values: vec![0.0; len],
        }
    }

    /// Fresh weights: accuracies near 1.0, everything else 0.
    pub fn initialize<R: Rng + ?Sized>(sources: usize, propensity: bool, rng: &mut R) -> Self {
        let mut w = Self::zeros(sources, propensity);
        w.reinitialize(rng);
        w
    }

    /// Reset in place: `accuracy[k] = 1.1 - 0.2 * u` with `u ~ U[0, 1)`, all
    /// other weights 0.
    pub fn reinitialize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let n = self.sources;
        for w in &mut self.values[..n] {
            *w = 1.1 - 0.2 * rng.gen_range(0.0..1.0);
        }
        self.values[n..].fill(0.0);
    }

    pub fn sources(&self) -> usize {
        self.sources
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn has_propensity(&self) -> bool {
        self.values.len() > 3 * self.sources
    }

    pub fn accuracy(&self) -> &[f64] {
        &self.values[..self.sources]
    }

    pub fn incoming(&self) -> &[f64] {
        &self.values[self.sources..2 * self.sources]
    }

    pub fn outgoing(&self) -> &[f64] {
        &self.values[2 * self.sources..3 * self.sources]
    }

    pub fn propensity(&self) -> Option<f64> {
        self.values.get(3 * self.sources).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|w| w.is_finite())
    }

    /// Move every weight toward zero by `delta`, never past it.
    pub(crate) fn shrink_toward_zero(&mut self, delta: f64) {
        for w in &mut self.values {
            *w = if *w > 0.0 {
                (*w - delta).max(0.0)
            } else {
                (*w + delta).min(0.0)
            };
        }
    }
}

/// Joint table over (true label, target vote).
///
/// Entries hold log-potentials while being built and probabilities after
/// [`JointTable::normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointTable([f64; 6]);

impl JointTable {
    /// (true = -1, vote = -1)
    pub const NEG_NEG: usize = 0;
    /// (true = -1, vote = 0)
    pub const NEG_ABSTAIN: usize = 1;
    /// (true = -1, vote = +1)
    pub const NEG_POS: usize = 2;
    /// (true = +1, vote = -1)
    pub const POS_NEG: usize = 3;
    /// (true = +1, vote = 0)
    pub const POS_ABSTAIN: usize = 4;
    /// (true = +1, vote = +1)
    pub const POS_POS: usize = 5;

    /// Entries where the target votes (non-abstain).
    pub const VOTING: [usize; 4] = [Self::NEG_NEG, Self::NEG_POS, Self::POS_NEG, Self::POS_POS];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.0 = [0.0; 6];
    }

    pub fn entries(&self) -> &[f64; 6] {
        &self.0
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [f64; 6] {
        &mut self.0
    }

    /// Exponentiate and normalize in place.
    ///
    /// The maximum log-potential is subtracted first so large weights cannot
    /// overflow `exp`.
    pub fn normalize(&mut self) {
        let max = self.0.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut sum = 0.0;
        for p in &mut self.0 {
            *p = (*p - max).exp();
            sum += *p;
        }
        for p in &mut self.0 {
            *p /= sum;
        }
    }

    /// P(true = +1), after normalization.
    pub fn marginal_pos(&self) -> f64 {
        self.0[Self::POS_NEG] + self.0[Self::POS_ABSTAIN] + self.0[Self::POS_POS]
    }

    /// P(true = -1), after normalization.
    pub fn marginal_neg(&self) -> f64 {
        self.0[Self::NEG_NEG] + self.0[Self::NEG_ABSTAIN] + self.0[Self::NEG_POS]
    }

    /// P(target votes), after normalization.
    pub fn voting_mass(&self) -> f64 {
        Self::VOTING.iter().map(|&idx| self.0[idx]).sum()
    }

    /// `(P(true = +1 | vote), P(true = -1 | vote))` for an observed target vote
    /// in `{-1, 0, 1}`.
    ///
    /// If the two consistent entries have no usable mass, the observed vote is
    /// treated as uninformative and the marginals are returned instead.
    pub fn conditional(&self, vote: i8) -> (f64, f64) {
        let (pos, neg) = match vote {
            1 => (self.0[Self::POS_POS], self.0[Self::NEG_POS]),
            -1 => (self.0[Self::POS_NEG], self.0[Self::NEG_NEG]),
            _ => (self.0[Self::POS_ABSTAIN], self.0[Self::NEG_ABSTAIN]),
        };
        let denom = pos + neg;
        if denom.is_finite() && denom > 0.0 {
            (pos / denom, neg / denom)
        } else {
            (self.marginal_pos(), self.marginal_neg())
        }
    }
}

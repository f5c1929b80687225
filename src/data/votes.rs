//! Vote matrix construction and validation.
//!
//! Callers hand us votes as nested rows, flat buffers, dense `nalgebra`
//! matrices or sparse `nalgebra_sparse` matrices. Whatever the source, we:
//!
//! - reject empty shapes and anything that is not exactly `-1`, `0` or `1`
//! - densify once, up front
//! - store votes example-major so the fitter reads one contiguous slice per
//!   example

use std::fmt::Display;

use nalgebra::{DMatrix, Scalar};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

use crate::domain::Vote;
use crate::error::SelectError;

/// Numeric element types accepted as votes.
pub trait VoteValue: Copy + Display {
    /// `Some` only for values exactly equal to `-1`, `0` or `1`.
    fn to_vote(self) -> Option<Vote>;
}

macro_rules! int_vote_value {
    ($($t:ty),*) => {$(
        impl VoteValue for $t {
            fn to_vote(self) -> Option<Vote> {
                match self {
                    -1 => Some(Vote::Negative),
                    0 => Some(Vote::Abstain),
                    1 => Some(Vote::Positive),
                    _ => None,
                }
            }
        }
    )*};
}

macro_rules! float_vote_value {
    ($($t:ty),*) => {$(
        impl VoteValue for $t {
            fn to_vote(self) -> Option<Vote> {
                if self == -1.0 {
                    Some(Vote::Negative)
                } else if self == 0.0 {
                    Some(Vote::Abstain)
                } else if self == 1.0 {
                    Some(Vote::Positive)
                } else {
                    None
                }
            }
        }
    )*};
}

int_vote_value!(i8, i16, i32, i64);
float_vote_value!(f32, f64);

impl VoteValue for Vote {
    fn to_vote(self) -> Option<Vote> {
        Some(self)
    }
}

impl Display for Vote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Validated, dense `m x n` vote matrix (examples x sources).
#[derive(Debug, Clone, PartialEq)]
pub struct VoteMatrix {
    // Stored transposed (sources x examples). nalgebra is column-major, so
    // column `i` holds example `i`'s votes contiguously.
    data: DMatrix<i8>,
}

impl VoteMatrix {
    /// Build from one `Vec` per example.
    pub fn from_rows<T: VoteValue>(rows: &[Vec<T>]) -> Result<Self, SelectError> {
        let examples = rows.len();
        let sources = rows.first().map_or(0, Vec::len);
        check_shape(examples, sources)?;

        let mut buf = Vec::with_capacity(examples * sources);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != sources {
                return Err(SelectError::ShapeMismatch {
                    expected: sources,
                    actual: row.len(),
                });
            }
            for (k, &value) in row.iter().enumerate() {
                buf.push(encode(i, k, value)?);
            }
        }
        Ok(Self::from_example_major(examples, sources, buf))
    }

    /// Build from a flat row-major buffer of `examples * sources` values.
    pub fn from_row_slice<T: VoteValue>(
        examples: usize,
        sources: usize,
        values: &[T],
    ) -> Result<Self, SelectError> {
        check_shape(examples, sources)?;
        if values.len() != examples * sources {
            return Err(SelectError::ShapeMismatch {
                expected: examples * sources,
                actual: values.len(),
            });
        }

        let buf = values
            .iter()
            .enumerate()
            .map(|(idx, &value)| encode(idx / sources, idx % sources, value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_example_major(examples, sources, buf))
    }

    /// Build from a dense `examples x sources` matrix.
    pub fn from_dense<T: VoteValue + Scalar>(matrix: &DMatrix<T>) -> Result<Self, SelectError> {
        let (examples, sources) = matrix.shape();
        check_shape(examples, sources)?;

        let mut buf = Vec::with_capacity(examples * sources);
        for i in 0..examples {
            for k in 0..sources {
                buf.push(encode(i, k, matrix[(i, k)])?);
            }
        }
        Ok(Self::from_example_major(examples, sources, buf))
    }

    /// Build from a sparse CSR matrix. Missing entries are abstentions.
    pub fn from_csr<T: VoteValue>(matrix: &CsrMatrix<T>) -> Result<Self, SelectError> {
        let (examples, sources) = (matrix.nrows(), matrix.ncols());
        check_shape(examples, sources)?;

        let mut buf = vec![0i8; examples * sources];
        for (i, k, &value) in matrix.triplet_iter() {
            buf[i * sources + k] = encode(i, k, value)?;
        }
        Ok(Self::from_example_major(examples, sources, buf))
    }

    /// Build from a sparse COO matrix. Missing entries are abstentions.
    ///
    /// Duplicate coordinates are summed (the usual COO convention) and the
    /// sum must itself be a valid vote.
    pub fn from_coo<T: VoteValue>(matrix: &CooMatrix<T>) -> Result<Self, SelectError> {
        let (examples, sources) = (matrix.nrows(), matrix.ncols());
        check_shape(examples, sources)?;

        let mut sums = vec![0i64; examples * sources];
        for (i, k, &value) in matrix.triplet_iter() {
            sums[i * sources + k] += i64::from(encode(i, k, value)?);
        }
        let buf = sums
            .into_iter()
            .enumerate()
            .map(|(idx, sum)| encode(idx / sources, idx % sources, sum))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_example_major(examples, sources, buf))
    }

    fn from_example_major(examples: usize, sources: usize, buf: Vec<i8>) -> Self {
        Self {
            data: DMatrix::from_vec(sources, examples, buf),
        }
    }

    /// Number of examples (rows, `m`).
    pub fn examples(&self) -> usize {
        self.data.ncols()
    }

    /// Number of sources (columns, `n`).
    pub fn sources(&self) -> usize {
        self.data.nrows()
    }

    /// Vote of source `k` on example `i`.
    ///
    /// Panics if either index is out of range.
    pub fn vote(&self, i: usize, k: usize) -> Vote {
        Vote::from_value(self.data[(k, i)]).unwrap_or(Vote::Abstain)
    }

    /// All votes for example `i`, indexed by source, as `-1 / 0 / 1`.
    pub(crate) fn example(&self, i: usize) -> &[i8] {
        let n = self.sources();
        &self.data.as_slice()[i * n..(i + 1) * n]
    }

    /// Fraction of examples on which source `k` does not abstain.
    pub fn coverage(&self, k: usize) -> f64 {
        let m = self.examples();
        let votes = (0..m).filter(|&i| !self.vote(i, k).is_abstain()).count();
        votes as f64 / m as f64
    }

    /// `n x n` counts of examples on which both sources vote (non-abstain).
    ///
    /// The diagonal holds each source's own vote count.
    pub fn co_votes(&self) -> DMatrix<usize> {
        let n = self.sources();
        let mut counts = DMatrix::<usize>::zeros(n, n);
        let mut active = Vec::with_capacity(n);
        for i in 0..self.examples() {
            active.clear();
            active.extend(
                self.example(i)
                    .iter()
                    .enumerate()
                    .filter_map(|(k, &v)| (v != 0).then_some(k)),
            );
            for &a in &active {
                for &b in &active {
                    counts[(a, b)] += 1;
                }
            }
        }
        counts
    }
}

fn check_shape(examples: usize, sources: usize) -> Result<(), SelectError> {
    if examples == 0 || sources == 0 {
        return Err(SelectError::EmptyMatrix {
            rows: examples,
            cols: sources,
        });
    }
    Ok(())
}

fn encode<T: VoteValue>(row: usize, col: usize, value: T) -> Result<i8, SelectError> {
    value
        .to_vote()
        .map(Vote::value)
        .ok_or_else(|| SelectError::InvalidVote {
            row,
            col,
            value: value.to_string(),
        })
}

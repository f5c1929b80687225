//! `lf-structure` library crate.
//!
//! Discovers which labeling sources behave as if correlated, using only their
//! votes. The pipeline is:
//!
//! - build a validated [`VoteMatrix`] (dense or sparse input)
//! - fit a small pairwise model per target source (`fit::fitter`)
//! - threshold the fitted interaction weights into a [`DependencySet`]
//!   (`fit::selection`)
//!
//! ```no_run
//! use lf_structure::{DependencySelector, SelectOptions, VoteMatrix};
//!
//! let votes = VoteMatrix::from_rows(&[vec![1i8, 1, 0], vec![-1, -1, 1]])?;
//! let deps = DependencySelector::default().select(&votes, &SelectOptions::default())?;
//! for dep in &deps {
//!     println!("{} -> {}", dep.source_a, dep.source_b);
//! }
//! # Ok::<(), lf_structure::SelectError>(())
//! ```

pub mod data;
pub mod domain;
pub mod error;
pub mod fit;

pub use data::{VoteMatrix, VoteValue};
pub use domain::{Dependency, DependencyKind, DependencySet, SelectOptions, Vote};
pub use error::SelectError;
pub use fit::{DEFAULT_SEED, DependencySelector, FitOptions, JointTable, Weights, fit_target};

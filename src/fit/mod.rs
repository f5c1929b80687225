//! Structure fitting orchestration.
//!
//! Responsibilities:
//!
//! - hold per-target weights and the joint scratch table (`weights`)
//! - fit the pairwise model for one target source (`fitter`)
//! - fit every source and threshold into edges (`selection`, parallel)

pub mod fitter;
pub mod selection;
pub mod weights;

pub use fitter::*;
pub use selection::*;
pub use weights::*;

//! Vote data: validated matrices and a synthetic generator.

pub mod synthetic;
pub mod votes;

pub use synthetic::{SourceProfile, SyntheticConfig, SyntheticVotes, generate_votes};
pub use votes::{VoteMatrix, VoteValue};

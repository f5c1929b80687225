//! Crate error type.
//!
//! Every fallible entry point returns `Result<_, SelectError>`. Input problems
//! are reported before any fitting starts; a failure on any target source
//! fails the whole selection.

/// Errors produced while building vote matrices or selecting dependencies.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectError {
    #[error("vote matrix must have at least one example and one source (got {rows}x{cols})")]
    EmptyMatrix { rows: usize, cols: usize },

    #[error("vote data shape mismatch: expected {expected} entries, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("invalid vote {value} at example {row}, source {col} (expected -1, 0 or 1)")]
    InvalidVote {
        row: usize,
        col: usize,
        value: String,
    },

    #[error("invalid option `{name}`: {reason}")]
    InvalidOption { name: &'static str, reason: String },

    #[error("target source {target} out of range for {sources} sources")]
    TargetOutOfRange { target: usize, sources: usize },

    #[error("weight vector has length {actual}, expected {expected}")]
    WeightShape { expected: usize, actual: usize },

    #[error("fit for target source {target} produced non-finite weights")]
    NonFinite { target: usize },
}

impl SelectError {
    pub(crate) fn option(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            name,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_entry() {
        let err = SelectError::InvalidVote {
            row: 3,
            col: 1,
            value: "2".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid vote 2 at example 3, source 1 (expected -1, 0 or 1)"
        );

        let err = SelectError::option("truncation", "must be >= 1");
        assert_eq!(err.to_string(), "invalid option `truncation`: must be >= 1");
    }
}

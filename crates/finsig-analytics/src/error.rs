use thiserror::Error;

/// Errors produced by the analytics engine.
///
/// Leaf operations fail hard on contract violations; composite snapshots
/// catch `InsufficientHistory` from optional sub-components, skip the
/// sub-score and annotate the omission instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("window of {required} bars exceeds available history of {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("series lengths differ: {left} vs {right}")]
    MismatchedSeries { left: usize, right: usize },

    #[error("statement field '{field}' is missing")]
    MissingField { field: &'static str },
}

impl AnalyticsError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code used in envelope error payloads.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InsufficientHistory { .. } => "analytics.insufficient_history",
            Self::InvalidInput { .. } => "analytics.invalid_input",
            Self::MismatchedSeries { .. } => "analytics.mismatched_series",
            Self::MissingField { .. } => "analytics.missing_field",
        }
    }
}

/// Fails with `InsufficientHistory` unless `available` covers `required`.
pub(crate) fn require_history(required: usize, available: usize) -> Result<(), AnalyticsError> {
    if available < required {
        return Err(AnalyticsError::InsufficientHistory {
            required,
            available,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_guard_reports_both_sides() {
        let err = require_history(15, 10).expect_err("must fail");
        assert_eq!(
            err,
            AnalyticsError::InsufficientHistory {
                required: 15,
                available: 10
            }
        );
        assert_eq!(err.code(), "analytics.insufficient_history");
    }
}

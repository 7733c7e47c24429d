//! Budget registry error types.

use payrun_shared::types::id::BudgetLineId;
use thiserror::Error;

/// Errors from budget-line balance operations.
#[derive(Debug, Error)]
pub enum BudgetError {
    /// Budget line is not registered.
    #[error("Budget line not found: {0}")]
    LineNotFound(BudgetLineId),

    /// The balance changed under us; the caller should re-read and retry.
    #[error("Version conflict on budget line {line_id}: expected {expected}, found {actual}")]
    VersionConflict {
        /// The contested line.
        line_id: BudgetLineId,
        /// The version the caller updated against.
        expected: u64,
        /// The version actually stored.
        actual: u64,
    },

    /// Backing registry failure.
    #[error("Budget registry error: {0}")]
    Backend(String),
}

impl BudgetError {
    /// Returns true if the operation may be retried as-is.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::VersionConflict { .. } | Self::Backend(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(
            BudgetError::VersionConflict {
                line_id: BudgetLineId::new(),
                expected: 1,
                actual: 2,
            }
            .is_retryable()
        );
        assert!(!BudgetError::LineNotFound(BudgetLineId::new()).is_retryable());
    }
}

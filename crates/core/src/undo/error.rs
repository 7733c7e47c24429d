//! Undo error types.

use thiserror::Error;

use payrun_shared::types::id::{BatchId, BudgetLineId};

use crate::store::StoreError;

/// Errors from the undo engine.
///
/// Failures of the tolerant sub-steps (WHT cleanup, archive cleanup,
/// payment reversion) are NOT errors — they surface as zero counts in the
/// [`UndoOperation`](super::UndoOperation) receipt plus log warnings.
#[derive(Debug, Error)]
pub enum UndoError {
    /// No batch with this id exists.
    #[error("Batch not found: {0}")]
    NotFound(BatchId),

    /// The batch has already been undone and can never be undone again.
    #[error("Batch {0} has already been undone")]
    AlreadyUndone(BatchId),

    /// A budget-line credit could not be applied. The batch stays
    /// `finalized`: financial correctness outranks audit tidiness, so
    /// nothing is marked undone until every balance is restored.
    #[error("Could not restore balance of budget line {budget_line_id}: {reason}")]
    RestorationFailed {
        /// The line whose credit failed.
        budget_line_id: BudgetLineId,
        /// Why it failed.
        reason: String,
    },

    /// Backing store failure before any balance was touched, or while
    /// committing the status flip (credits have been re-debited).
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl UndoError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyUndone(_) => "ALREADY_UNDONE",
            Self::RestorationFailed { .. } => "RESTORATION_FAILED",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns true if the caller should retry the undo.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RestorationFailed { .. } => true,
            Self::Storage(err) => err.is_retryable(),
            Self::NotFound(_) | Self::AlreadyUndone(_) => false,
        }
    }
}

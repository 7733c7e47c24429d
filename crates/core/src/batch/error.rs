//! Finalize error types.

use thiserror::Error;

use payrun_shared::types::id::{BatchId, BudgetLineId};

use crate::payment::ValidationError;
use crate::store::StoreError;

/// Errors from the batch finalizer.
#[derive(Debug, Error)]
pub enum FinalizeError {
    /// A batch with this id already exists. Not retried: the prior finalize
    /// stands and its debits are never re-applied.
    #[error("Batch {0} has already been finalized")]
    AlreadyFinalized(BatchId),

    /// One or more payments failed validation. Surfaced before any
    /// mutation; nothing to clean up.
    #[error("Validation failed for {} payment(s)", .0.len())]
    Validation(Vec<ValidationError>),

    /// A budget-line update lost the optimistic-concurrency race too many
    /// times. Transient: retry the whole finalize with the same batch id.
    #[error("Concurrent update conflict on budget line {budget_line_id}, retry the operation")]
    ConcurrencyConflict {
        /// The contested line.
        budget_line_id: BudgetLineId,
    },

    /// Backing store failure. Applied debits have been rolled back; retry
    /// with the same batch id.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl FinalizeError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyFinalized(_) => "ALREADY_FINALIZED",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::ConcurrencyConflict { .. } => "CONCURRENCY_CONFLICT",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns true if the caller should retry with the same batch id.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConcurrencyConflict { .. } => true,
            Self::Storage(err) => err.is_retryable(),
            Self::AlreadyFinalized(_) | Self::Validation(_) => false,
        }
    }
}

//! Undo retention view.
//!
//! Read-only projection of the most recent finalized batches — the
//! allow-list the UI layers above undo. Only this many batches are offered
//! for reversal; the undo engine itself enforces nothing beyond "the batch
//! must still exist and be finalized".

use payrun_shared::LedgerConfig;
use payrun_shared::types::id::BatchId;

use crate::store::{BatchStore, StoreError};

use super::types::Batch;

/// The undo-eligibility window over recent batches.
pub struct RetentionView<'a> {
    batches: &'a dyn BatchStore,
    retention: usize,
}

impl<'a> RetentionView<'a> {
    /// Creates a view over the configured retention window.
    #[must_use]
    pub fn new(batches: &'a dyn BatchStore, config: &LedgerConfig) -> Self {
        Self {
            batches,
            retention: config.undo_retention,
        }
    }

    /// The batches currently eligible for undo, newest first.
    ///
    /// # Errors
    ///
    /// Propagates store read failures.
    pub fn recent_finalized(&self) -> Result<Vec<Batch>, StoreError> {
        self.batches.recent_finalized(self.retention)
    }

    /// Returns true if the batch is inside the retention window.
    ///
    /// # Errors
    ///
    /// Propagates store read failures.
    pub fn is_eligible(&self, batch_id: BatchId) -> Result<bool, StoreError> {
        Ok(self
            .recent_finalized()?
            .iter()
            .any(|batch| batch.id == batch_id))
    }
}

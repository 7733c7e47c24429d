//! Document storage traits.
//!
//! The backing store is an external collaborator offering generic document
//! CRUD with query-by-field. The ledger consumes it through these traits;
//! the in-memory reference implementation lives in [`memory`].
//!
//! The store gives no multi-document transactional guarantees — the
//! finalizer and undo engine own the compensation logic layered on top.

pub mod memory;

use thiserror::Error;

use payrun_shared::types::id::{BatchId, PaymentId};

use crate::batch::types::{ArchivedPayment, Batch, WhtReturnEntry};
use crate::payment::Payment;

pub use memory::InMemoryStore;

/// Errors from backing-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed document does not exist.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// A document with the same key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// The operation timed out. The outcome is unknown: retry idempotently,
    /// never assume failure and compensate — compensating an operation that
    /// actually succeeded double-reverses the ledger.
    #[error("Store operation timed out")]
    Timeout,

    /// Backend failure.
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns true if the caller should retry the whole operation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Backend(_))
    }
}

/// Staged payment documents.
pub trait PaymentStore: Send + Sync {
    /// Reads a payment by id.
    fn payment(&self, id: PaymentId) -> Result<Option<Payment>, StoreError>;

    /// Inserts a new staged payment.
    fn insert_payment(&self, payment: Payment) -> Result<(), StoreError>;

    /// Replaces an existing payment document.
    fn update_payment(&self, payment: Payment) -> Result<(), StoreError>;

    /// Deletes a payment document. Deleting a missing payment is success.
    fn delete_payment(&self, id: PaymentId) -> Result<(), StoreError>;
}

/// Immutable transaction-log (batch) documents.
pub trait BatchStore: Send + Sync {
    /// Reads a batch by id.
    fn batch(&self, id: BatchId) -> Result<Option<Batch>, StoreError>;

    /// Inserts a new batch record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if the id already exists — the
    /// finalize idempotency guard relies on this.
    fn insert_batch(&self, batch: Batch) -> Result<(), StoreError>;

    /// Updates a batch record. Normal operation only ever flips the status
    /// to `undone` and attaches the undo receipt.
    fn update_batch(&self, batch: Batch) -> Result<(), StoreError>;

    /// Deletes a batch record.
    ///
    /// Only the finalizer's compensation path uses this, to clear the
    /// record of an aborted finalize. Undo never deletes a batch — it flips
    /// the status so the record stays addressable for audit.
    fn delete_batch(&self, id: BatchId) -> Result<(), StoreError>;

    /// The most recent finalized batches, newest first.
    fn recent_finalized(&self, limit: usize) -> Result<Vec<Batch>, StoreError>;
}

/// Archived payment-schedule copies.
pub trait ArchiveStore: Send + Sync {
    /// Inserts one archived copy.
    fn insert_archive(&self, archive: ArchivedPayment) -> Result<(), StoreError>;

    /// Lists the archived copies for a batch.
    fn archives_by_batch(&self, batch_id: BatchId) -> Result<Vec<ArchivedPayment>, StoreError>;

    /// Deletes every archived copy for a batch, returning the count.
    ///
    /// Deleting zero matching documents is success, not an error.
    fn delete_archives_by_batch(&self, batch_id: BatchId) -> Result<usize, StoreError>;
}

/// Withholding-tax return entries.
pub trait WhtStore: Send + Sync {
    /// Inserts one return entry.
    fn insert_wht(&self, entry: WhtReturnEntry) -> Result<(), StoreError>;

    /// Lists the return entries for a batch.
    fn wht_by_batch(&self, batch_id: BatchId) -> Result<Vec<WhtReturnEntry>, StoreError>;

    /// Deletes every return entry for a batch, returning the count.
    ///
    /// Queries by batch id rather than a stored id list, so the operation
    /// self-heals when some entries are already gone.
    fn delete_wht_by_batch(&self, batch_id: BatchId) -> Result<usize, StoreError>;
}

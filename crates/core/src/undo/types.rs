//! Undo receipt types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use payrun_shared::types::id::ActorId;

/// Receipt embedded in a batch once undone.
///
/// Records what the compensation actually did, sub-step by sub-step, so an
/// operator can reconcile anything a tolerated failure left behind. A count
/// of zero for a sub-step that had work to do means that sub-step was
/// skipped or failed and was logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoOperation {
    /// Budget lines credited back to their pre-finalize balances.
    pub restored_budget_lines: usize,
    /// Transaction-log entries retired (the batch status flip).
    pub removed_transactions: usize,
    /// Archived payment copies deleted.
    pub removed_archives: usize,
    /// Withholding return entries deleted.
    pub removed_wht: usize,
    /// Originating payments reverted to `pending`.
    pub reverted_payments: usize,
    /// When the undo ran.
    pub performed_at: DateTime<Utc>,
    /// Who performed it.
    pub performed_by: ActorId,
}

//! Undo engine.
//!
//! Reverses exactly one batch's effects using the amounts the batch itself
//! recorded. Budget restoration is the one sub-step that must succeed; the
//! cleanup sub-steps are each independently idempotent and tolerated on
//! failure — a partially-cleaned undo reports what it did through the
//! receipt rather than aborting.

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{error, info, warn};

use payrun_shared::LedgerConfig;
use payrun_shared::types::id::{ActorId, BatchId};

use crate::audit::{AuditAction, AuditRecord, AuditSink};
use crate::batch::types::{Batch, BatchStatus, LineDebit};
use crate::budget::{BudgetRegistry, apply_delta_with_retry};
use crate::payment::PaymentStatus;
use crate::store::{ArchiveStore, BatchStore, PaymentStore, WhtStore};

use super::error::UndoError;
use super::types::UndoOperation;

/// The undo engine.
pub struct UndoEngine<'a> {
    payments: &'a dyn PaymentStore,
    batches: &'a dyn BatchStore,
    archives: &'a dyn ArchiveStore,
    wht: &'a dyn WhtStore,
    budgets: &'a dyn BudgetRegistry,
    audit: &'a dyn AuditSink,
    config: LedgerConfig,
}

impl<'a> UndoEngine<'a> {
    /// Wires an undo engine to its collaborators.
    #[must_use]
    pub fn new(
        payments: &'a dyn PaymentStore,
        batches: &'a dyn BatchStore,
        archives: &'a dyn ArchiveStore,
        wht: &'a dyn WhtStore,
        budgets: &'a dyn BudgetRegistry,
        audit: &'a dyn AuditSink,
        config: LedgerConfig,
    ) -> Self {
        Self {
            payments,
            batches,
            archives,
            wht,
            budgets,
            audit,
            config,
        }
    }

    /// Reverses the batch with the given id.
    ///
    /// # Errors
    ///
    /// - [`UndoError::NotFound`] / [`UndoError::AlreadyUndone`] when the
    ///   batch is missing or already reversed
    /// - [`UndoError::RestorationFailed`] when a budget-line credit cannot
    ///   be applied; the batch stays `finalized`
    /// - [`UndoError::Storage`] when the status flip cannot be committed;
    ///   the applied credits are re-debited first
    pub fn undo(&self, batch_id: BatchId, actor: ActorId) -> Result<UndoOperation, UndoError> {
        let batch = self
            .batches
            .batch(batch_id)?
            .ok_or(UndoError::NotFound(batch_id))?;
        if batch.status == BatchStatus::Undone {
            return Err(UndoError::AlreadyUndone(batch_id));
        }

        // Step 1: restore balances. Must fully succeed before anything is
        // marked undone.
        let restored_budget_lines = self.restore_balances(&batch)?;

        // Steps 2-4: tolerant cleanup. Each sub-step is caught and logged;
        // none may abort the rest of the sequence.
        let removed_wht = match self.wht.delete_wht_by_batch(batch_id) {
            Ok(count) => count,
            Err(err) => {
                warn!(batch_id = %batch_id, error = %err, "WHT cleanup failed during undo");
                0
            }
        };

        let removed_archives = match self.archives.delete_archives_by_batch(batch_id) {
            Ok(count) => count,
            Err(err) => {
                warn!(batch_id = %batch_id, error = %err, "Archive cleanup failed during undo");
                0
            }
        };

        let reverted_payments = self.revert_payments(&batch);

        // Step 5: flip the batch to undone with the attached receipt. The
        // record itself is never deleted — it stays addressable for audit.
        let operation = UndoOperation {
            restored_budget_lines,
            removed_transactions: 1,
            removed_archives,
            removed_wht,
            reverted_payments,
            performed_at: Utc::now(),
            performed_by: actor,
        };

        let mut undone = batch.clone();
        undone.status = BatchStatus::Undone;
        undone.undo = Some(operation);
        if let Err(err) = self.batches.update_batch(undone) {
            // The flip did not commit; re-debit so a retry starts clean.
            error!(batch_id = %batch_id, error = %err, "Could not mark batch undone; re-debiting restored balances");
            self.redebit_lines(&batch.line_debits);
            return Err(UndoError::Storage(err));
        }

        // Step 6: audit. A sink failure is a warning, never a rollback.
        let record = AuditRecord::new(
            AuditAction::Undo,
            batch_id,
            json!({
                "restored_budget_lines": operation.restored_budget_lines,
                "removed_transactions": operation.removed_transactions,
                "removed_archives": operation.removed_archives,
                "removed_wht": operation.removed_wht,
                "reverted_payments": operation.reverted_payments,
            }),
            actor,
        );
        if let Err(err) = self.audit.record(record) {
            warn!(batch_id = %batch_id, error = %err, "Audit sink failed to record undo");
        }

        info!(
            batch_id = %batch_id,
            restored = operation.restored_budget_lines,
            wht = operation.removed_wht,
            archives = operation.removed_archives,
            "Undid batch"
        );
        Ok(operation)
    }

    /// Credits every recorded line debit back. On a failure partway the
    /// already-credited lines are re-debited so balances end where they
    /// started.
    fn restore_balances(&self, batch: &Batch) -> Result<usize, UndoError> {
        let mut credited: Vec<LineDebit> = Vec::with_capacity(batch.line_debits.len());

        for debit in &batch.line_debits {
            match apply_delta_with_retry(
                self.budgets,
                debit.budget_line_id,
                debit.amount,
                self.config.max_balance_retries,
            ) {
                Ok(_) => credited.push(*debit),
                Err(err) => {
                    error!(
                        batch_id = %batch.id,
                        budget_line_id = %debit.budget_line_id,
                        error = %err,
                        "Budget restoration failed; undoing applied credits"
                    );
                    self.redebit_lines(&credited);
                    return Err(UndoError::RestorationFailed {
                        budget_line_id: debit.budget_line_id,
                        reason: err.to_string(),
                    });
                }
            }
        }
        Ok(credited.len())
    }

    /// Re-applies debits after a failed restoration or status flip.
    fn redebit_lines(&self, credited: &[LineDebit]) {
        for debit in credited.iter().rev() {
            if let Err(err) = apply_delta_with_retry(
                self.budgets,
                debit.budget_line_id,
                -debit.amount,
                self.config.max_balance_retries,
            ) {
                error!(
                    budget_line_id = %debit.budget_line_id,
                    amount = %debit.amount,
                    error = %err,
                    "Failed to re-debit budget line; manual reconciliation required"
                );
            }
        }
    }

    /// Marks originating payments back to `pending`. A payment that was
    /// deleted independently since finalize logs a warning and is skipped —
    /// undo never aborts because one sub-record is already gone.
    fn revert_payments(&self, batch: &Batch) -> usize {
        let mut reverted = 0;
        for &payment_id in &batch.payment_ids {
            match self.payments.payment(payment_id) {
                Ok(Some(mut payment)) => {
                    payment.status = PaymentStatus::Pending;
                    payment.batch_id = None;
                    payment.taxes = None;
                    payment.remaining_balance = Decimal::ZERO;
                    match self.payments.update_payment(payment) {
                        Ok(()) => reverted += 1,
                        Err(err) => {
                            warn!(payment_id = %payment_id, error = %err, "Could not revert payment during undo");
                        }
                    }
                }
                Ok(None) => {
                    warn!(payment_id = %payment_id, "Payment missing during undo; skipping");
                }
                Err(err) => {
                    warn!(payment_id = %payment_id, error = %err, "Could not read payment during undo");
                }
            }
        }
        reverted
    }
}

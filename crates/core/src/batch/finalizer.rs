//! Batch finalizer.
//!
//! Converts a set of staged payments into one immutable batch: fixes tax
//! figures onto each payment, debits the touched budget lines, archives the
//! schedule, writes withholding return entries, and emits the audit record.
//!
//! The backing store offers no multi-document transaction, so the finalizer
//! owns the recovery contract: validation happens before any mutation, and
//! every mutation after the first is either completed or compensated before
//! an error is returned. The caller retries a failed finalize with the same
//! batch id; the idempotency guard prevents double-debiting once the batch
//! record has landed.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{error, info, warn};

use payrun_shared::LedgerConfig;
use payrun_shared::types::id::{ArchiveId, BatchId, BudgetLineId, PaymentId, WhtEntryId};
use payrun_shared::types::money::round_money;

use crate::audit::{AuditAction, AuditRecord, AuditSink};
use crate::budget::{BudgetError, BudgetRegistry, apply_delta_with_retry};
use crate::calc::{CalcEngine, TaxBreakdown};
use crate::payment::{Payment, PaymentStatus, TaxSnapshot, ValidationError, validate_payment};
use crate::rates::{RateResolver, resolve_rates};
use crate::store::{ArchiveStore, BatchStore, PaymentStore, StoreError, WhtStore};

use super::error::FinalizeError;
use super::types::{ArchivedPayment, Batch, BatchStatus, FinalizeContext, LineDebit, WhtReturnEntry};

/// A payment that passed validation, with its computed figures.
struct Prepared {
    payment: Payment,
    /// Breakdown at the full contract amount.
    full: TaxBreakdown,
    /// Breakdown actually applied this transaction (partial-aware).
    applied: TaxBreakdown,
}

impl Prepared {
    /// The snapshot fixed onto the payment and its archive copy.
    fn snapshot(&self) -> TaxSnapshot {
        TaxSnapshot {
            wht_amount: self.applied.wht,
            wht_rate_used: self.applied.wht_rate_used,
            levy_amount: self.applied.levy,
            vat_amount: self.applied.vat,
            momo_charge: self.applied.momo_charge,
            net_payable: self.full.net_payable,
            amount_this_transaction: self.applied.net_payable,
            budget_impact: round_money(self.applied.net_payable * self.payment.fx_rate),
        }
    }

    /// The payment as it will be persisted under the batch.
    fn finalized_payment(&self, batch_id: BatchId) -> Payment {
        let snapshot = self.snapshot();
        let is_partial = self
            .payment
            .partial_percent
            .is_some_and(|pct| pct < Decimal::ONE_HUNDRED);

        let mut payment = self.payment.clone();
        payment.status = if is_partial {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Paid
        };
        payment.batch_id = Some(batch_id);
        payment.remaining_balance = snapshot.net_payable - snapshot.amount_this_transaction;
        payment.taxes = Some(snapshot);
        payment
    }
}

/// The batch finalizer.
pub struct Finalizer<'a> {
    payments: &'a dyn PaymentStore,
    batches: &'a dyn BatchStore,
    archives: &'a dyn ArchiveStore,
    wht: &'a dyn WhtStore,
    budgets: &'a dyn BudgetRegistry,
    rates: &'a dyn RateResolver,
    audit: &'a dyn AuditSink,
    config: LedgerConfig,
}

impl<'a> Finalizer<'a> {
    /// Wires a finalizer to its collaborators.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        payments: &'a dyn PaymentStore,
        batches: &'a dyn BatchStore,
        archives: &'a dyn ArchiveStore,
        wht: &'a dyn WhtStore,
        budgets: &'a dyn BudgetRegistry,
        rates: &'a dyn RateResolver,
        audit: &'a dyn AuditSink,
        config: LedgerConfig,
    ) -> Self {
        Self {
            payments,
            batches,
            archives,
            wht,
            budgets,
            rates,
            audit,
            config,
        }
    }

    /// Finalizes the given staged payments into a batch.
    ///
    /// # Errors
    ///
    /// - [`FinalizeError::AlreadyFinalized`] if the batch id exists
    /// - [`FinalizeError::Validation`] if any payment is ineligible or a
    ///   required rate is unresolved (surfaced before any mutation)
    /// - [`FinalizeError::ConcurrencyConflict`] / [`FinalizeError::Storage`]
    ///   on transient failures; applied mutations have been compensated and
    ///   the caller should retry with the same batch id
    pub fn finalize(
        &self,
        batch_id: BatchId,
        payment_ids: &[PaymentId],
        ctx: &FinalizeContext,
    ) -> Result<Batch, FinalizeError> {
        // Step 1: idempotency guard. A duplicate id means the prior
        // finalize stands; debits are never re-applied.
        if self.batches.batch(batch_id)?.is_some() {
            return Err(FinalizeError::AlreadyFinalized(batch_id));
        }

        // Step 2: validate and compute. No mutation happens until every
        // payment has passed.
        if payment_ids.is_empty() {
            return Err(FinalizeError::Validation(vec![ValidationError::EmptyBatch]));
        }
        let prepared = self.prepare_payments(payment_ids)?;

        // Step 3: aggregate per-line debits, settlement-normalized.
        let line_debits = aggregate_line_debits(&prepared);
        let total_amount: Decimal = line_debits.iter().map(|d| d.amount).sum();

        // Step 4: debit each line through the per-line concurrency guard.
        let mut debited: Vec<LineDebit> = Vec::with_capacity(line_debits.len());
        for debit in &line_debits {
            match apply_delta_with_retry(
                self.budgets,
                debit.budget_line_id,
                -debit.amount,
                self.config.max_balance_retries,
            ) {
                Ok(_) => debited.push(*debit),
                Err(err) => {
                    self.rollback_debits(&debited);
                    return Err(map_budget_error(debit.budget_line_id, err));
                }
            }
        }

        // Step 5: persist the batch record, then its sub-records.
        let batch = Batch {
            id: batch_id,
            created_at: Utc::now(),
            payment_ids: prepared.iter().map(|p| p.payment.id).collect(),
            total_amount,
            payment_count: prepared.len(),
            primary_vendor: prepared
                .first()
                .map(|p| p.payment.vendor.clone())
                .unwrap_or_default(),
            line_debits,
            sheet_name: ctx.sheet_name.clone(),
            status: BatchStatus::Finalized,
            undo: None,
        };

        if let Err(err) = self.batches.insert_batch(batch.clone()) {
            self.rollback_debits(&debited);
            return Err(match err {
                StoreError::DuplicateKey(_) => FinalizeError::AlreadyFinalized(batch_id),
                other => FinalizeError::Storage(other),
            });
        }

        if let Err(err) = self.persist_sub_records(&batch, &prepared) {
            self.compensate_aborted_finalize(&batch, &prepared, &debited);
            return Err(err);
        }

        // Step 6: audit. A sink failure is a warning, never a rollback.
        let record = AuditRecord::new(
            AuditAction::Finalize,
            batch_id,
            json!({
                "total_amount": batch.total_amount,
                "payment_count": batch.payment_count,
                "budget_line_ids": batch
                    .line_debits
                    .iter()
                    .map(|d| d.budget_line_id.to_string())
                    .collect::<Vec<_>>(),
                "sheet_name": batch.sheet_name,
            }),
            ctx.actor,
        );
        if let Err(err) = self.audit.record(record) {
            warn!(batch_id = %batch_id, error = %err, "Audit sink failed to record finalize");
        }

        info!(
            batch_id = %batch_id,
            total = %batch.total_amount,
            payments = batch.payment_count,
            "Finalized batch"
        );
        Ok(batch)
    }

    /// Loads, validates, and computes figures for every payment. Collects
    /// all issues so the caller sees the full picture at once.
    fn prepare_payments(&self, payment_ids: &[PaymentId]) -> Result<Vec<Prepared>, FinalizeError> {
        let mut issues: Vec<ValidationError> = Vec::new();
        let mut prepared: Vec<Prepared> = Vec::with_capacity(payment_ids.len());

        for &payment_id in payment_ids {
            let Some(payment) = self.payments.payment(payment_id)? else {
                issues.push(ValidationError::PaymentNotFound(payment_id));
                continue;
            };

            if let Err(issue) = validate_payment(&payment) {
                issues.push(issue);
                continue;
            }

            match self.budgets.balance(payment.budget_line_id) {
                Ok(_) => {}
                Err(BudgetError::LineNotFound(line)) => {
                    issues.push(ValidationError::UnknownBudgetLine {
                        payment_id,
                        budget_line_id: line,
                    });
                    continue;
                }
                Err(err) => {
                    return Err(FinalizeError::Storage(StoreError::Backend(err.to_string())));
                }
            }

            let rates = resolve_rates(self.rates, &payment.procurement_type, &payment.tax_type);
            let full = CalcEngine::compute_taxes(&payment.tax_input(), &rates);
            if full.rates_unresolved {
                issues.push(ValidationError::UnresolvedRates {
                    payment_id,
                    procurement_type: payment.procurement_type.clone(),
                    tax_type: payment.tax_type.clone(),
                });
                continue;
            }

            let applied = match payment.partial_percent {
                Some(percentage) => {
                    match CalcEngine::compute_partial_payment(&payment.tax_input(), &rates, percentage)
                    {
                        Ok(breakdown) => breakdown,
                        Err(_) => {
                            issues.push(ValidationError::PercentageOutOfRange {
                                payment_id,
                                percentage,
                            });
                            continue;
                        }
                    }
                }
                None => full,
            };

            prepared.push(Prepared {
                payment,
                full,
                applied,
            });
        }

        if issues.is_empty() {
            Ok(prepared)
        } else {
            Err(FinalizeError::Validation(issues))
        }
    }

    /// Writes archives, WHT return entries, and payment updates for a
    /// batch whose record has landed.
    fn persist_sub_records(
        &self,
        batch: &Batch,
        prepared: &[Prepared],
    ) -> Result<(), FinalizeError> {
        let filing_period = batch.filing_period();

        for item in prepared {
            let finalized = item.finalized_payment(batch.id);

            self.archives.insert_archive(ArchivedPayment {
                id: ArchiveId::new(),
                batch_id: batch.id,
                payment: finalized.clone(),
                archived_at: batch.created_at,
            })?;

            if item.applied.wht > Decimal::ZERO {
                self.wht.insert_wht(WhtReturnEntry {
                    id: WhtEntryId::new(),
                    batch_id: batch.id,
                    vendor: item.payment.vendor.clone(),
                    base_amount: item.applied.base,
                    rate: item.applied.wht_rate_used,
                    amount: item.applied.wht,
                    filing_period: filing_period.clone(),
                })?;
            }

            self.payments.update_payment(finalized)?;
        }
        Ok(())
    }

    /// Credits back every debit applied by an aborted finalize.
    fn rollback_debits(&self, debited: &[LineDebit]) {
        for debit in debited.iter().rev() {
            if let Err(err) = apply_delta_with_retry(
                self.budgets,
                debit.budget_line_id,
                debit.amount,
                self.config.max_balance_retries,
            ) {
                error!(
                    budget_line_id = %debit.budget_line_id,
                    amount = %debit.amount,
                    error = %err,
                    "Failed to roll back budget debit; manual reconciliation required"
                );
            }
        }
    }

    /// Best-effort removal of everything an aborted finalize managed to
    /// write after the batch record landed.
    fn compensate_aborted_finalize(
        &self,
        batch: &Batch,
        prepared: &[Prepared],
        debited: &[LineDebit],
    ) {
        if let Err(err) = self.wht.delete_wht_by_batch(batch.id) {
            warn!(batch_id = %batch.id, error = %err, "Could not clear WHT entries of aborted finalize");
        }
        if let Err(err) = self.archives.delete_archives_by_batch(batch.id) {
            warn!(batch_id = %batch.id, error = %err, "Could not clear archives of aborted finalize");
        }
        for item in prepared {
            if let Err(err) = self.payments.update_payment(item.payment.clone()) {
                warn!(
                    payment_id = %item.payment.id,
                    error = %err,
                    "Could not restore staged payment after aborted finalize"
                );
            }
        }
        if let Err(err) = self.batches.delete_batch(batch.id) {
            error!(
                batch_id = %batch.id,
                error = %err,
                "Could not delete batch record of aborted finalize; retry will report AlreadyFinalized"
            );
        }
        self.rollback_debits(debited);
    }
}

/// Groups settlement-normalized budget impacts by budget line.
fn aggregate_line_debits(prepared: &[Prepared]) -> Vec<LineDebit> {
    let mut totals: HashMap<BudgetLineId, Decimal> = HashMap::new();
    for item in prepared {
        *totals
            .entry(item.payment.budget_line_id)
            .or_insert(Decimal::ZERO) += item.snapshot().budget_impact;
    }

    let mut debits: Vec<LineDebit> = totals
        .into_iter()
        .map(|(budget_line_id, amount)| LineDebit {
            budget_line_id,
            amount,
        })
        .collect();
    // Deterministic order for persistence and tests.
    debits.sort_by_key(|d| d.budget_line_id.into_inner());
    debits
}

fn map_budget_error(line: BudgetLineId, err: BudgetError) -> FinalizeError {
    match err {
        BudgetError::VersionConflict { .. } => FinalizeError::ConcurrencyConflict {
            budget_line_id: line,
        },
        other => FinalizeError::Storage(StoreError::Backend(other.to_string())),
    }
}

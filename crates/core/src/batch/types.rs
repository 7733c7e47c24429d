//! Batch domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use payrun_shared::types::id::{ActorId, ArchiveId, BatchId, BudgetLineId, PaymentId, WhtEntryId};

use crate::payment::Payment;
use crate::undo::UndoOperation;

/// Batch lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// Finalized and in effect.
    Finalized,
    /// Reversed by the undo engine.
    Undone,
}

impl BatchStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Finalized => "finalized",
            Self::Undone => "undone",
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One budget line's aggregated debit within a batch, in the settlement
/// currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDebit {
    /// The debited line.
    pub budget_line_id: BudgetLineId,
    /// The aggregated amount debited from it.
    pub amount: Decimal,
}

/// The immutable, auditable record of one finalize event.
///
/// Created exactly once; the only in-place update normal operation performs
/// is the undo status flip with its attached receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    /// Caller-supplied identifier; the finalize idempotency key.
    pub id: BatchId,
    /// When the batch was finalized.
    pub created_at: DateTime<Utc>,
    /// Payments included, in finalize order.
    pub payment_ids: Vec<PaymentId>,
    /// Total debited across all lines, in the settlement currency.
    pub total_amount: Decimal,
    /// Number of payments included.
    pub payment_count: usize,
    /// Vendor shown for the batch in listings.
    pub primary_vendor: String,
    /// Per-line aggregated debits. Their sum equals `total_amount`.
    pub line_debits: Vec<LineDebit>,
    /// Source weekly sheet.
    pub sheet_name: String,
    /// Lifecycle status.
    pub status: BatchStatus,
    /// Receipt attached when the batch is undone.
    pub undo: Option<UndoOperation>,
}

impl Batch {
    /// Returns true if the batch may still be undone.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.status == BatchStatus::Finalized
    }

    /// Sum of the per-line debits.
    #[must_use]
    pub fn debit_total(&self) -> Decimal {
        self.line_debits.iter().map(|d| d.amount).sum()
    }

    /// The withholding filing period this batch falls into.
    #[must_use]
    pub fn filing_period(&self) -> String {
        self.created_at.format("%Y-%m").to_string()
    }
}

/// Caller context for a finalize operation.
#[derive(Debug, Clone)]
pub struct FinalizeContext {
    /// The user performing the finalize.
    pub actor: ActorId,
    /// Name of the weekly sheet the payments came from.
    pub sheet_name: String,
}

/// Immutable archived copy of a payment as it was finalized.
///
/// Document generation reads these; they are deleted only by undo of the
/// same batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedPayment {
    /// Unique identifier.
    pub id: ArchiveId,
    /// The batch this copy belongs to.
    pub batch_id: BatchId,
    /// The payment exactly as finalized, tax snapshot included.
    pub payment: Payment,
    /// When the copy was archived.
    pub archived_at: DateTime<Utc>,
}

/// Withholding-tax return entry, one per payment with non-zero withholding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhtReturnEntry {
    /// Unique identifier.
    pub id: WhtEntryId,
    /// Back-reference to the batch.
    pub batch_id: BatchId,
    /// Vendor the tax was withheld from.
    pub vendor: String,
    /// Pre-tax base the withholding was computed on.
    pub base_amount: Decimal,
    /// Withholding rate applied.
    pub rate: Decimal,
    /// Amount withheld.
    pub amount: Decimal,
    /// Filing period (`YYYY-MM`).
    pub filing_period: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn batch() -> Batch {
        Batch {
            id: BatchId::new(),
            created_at: Utc.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap(),
            payment_ids: vec![PaymentId::new()],
            total_amount: dec!(300),
            payment_count: 1,
            primary_vendor: "Vendor".to_string(),
            line_debits: vec![
                LineDebit {
                    budget_line_id: BudgetLineId::new(),
                    amount: dec!(100),
                },
                LineDebit {
                    budget_line_id: BudgetLineId::new(),
                    amount: dec!(200),
                },
            ],
            sheet_name: "week-32".to_string(),
            status: BatchStatus::Finalized,
            undo: None,
        }
    }

    #[test]
    fn test_debit_total() {
        assert_eq!(batch().debit_total(), dec!(300));
    }

    #[test]
    fn test_can_undo_only_finalized() {
        let mut b = batch();
        assert!(b.can_undo());
        b.status = BatchStatus::Undone;
        assert!(!b.can_undo());
    }

    #[test]
    fn test_filing_period() {
        assert_eq!(batch().filing_period(), "2026-08");
    }
}

//! Payment domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use payrun_shared::types::id::{BatchId, BudgetLineId, PaymentId};
use payrun_shared::types::money::Currency;

use crate::calc::{PaymentMode, TaxInput, VatDecision};

/// Payment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Staged and editable; not yet part of any batch.
    Pending,
    /// Partially paid (percentage < 100 applied in a finalized batch).
    Partial,
    /// Fully paid under a finalized batch (immutable).
    Paid,
}

impl PaymentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Paid => "paid",
        }
    }

    /// Returns true if a payment in this status may be included in a batch.
    #[must_use]
    pub fn is_finalizable(&self) -> bool {
        matches!(self, Self::Pending | Self::Partial)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tax figures fixed onto a payment at finalize time.
///
/// Persisted when computed and never recomputed from current rates: once a
/// payment is `paid`, these fields are the batch's immutable facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSnapshot {
    /// Withholding amount deducted from the remittance.
    pub wht_amount: Decimal,
    /// The withholding rate that was applied.
    pub wht_rate_used: Decimal,
    /// Statutory levy amount.
    pub levy_amount: Decimal,
    /// VAT amount.
    pub vat_amount: Decimal,
    /// Mobile-money operator charge.
    pub momo_charge: Decimal,
    /// Net payable for the full contract amount, in the payment currency.
    pub net_payable: Decimal,
    /// Partial-aware net payable actually disbursed this transaction.
    pub amount_this_transaction: Decimal,
    /// `amount_this_transaction` normalized to the settlement currency.
    pub budget_impact: Decimal,
}

/// A staged payment on a weekly sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier within the weekly sheet.
    pub id: PaymentId,
    /// Vendor name.
    pub vendor: String,
    /// Free-text description.
    pub description: String,
    /// Procurement type; resolves to a withholding rate.
    pub procurement_type: String,
    /// Tax type; resolves to a levy rate.
    pub tax_type: String,
    /// VAT treatment decision.
    pub vat_decision: VatDecision,
    /// Payment currency.
    pub currency: Currency,
    /// Exchange rate from the payment currency to the settlement currency.
    pub fx_rate: Decimal,
    /// Pre-tax base amount in the payment currency.
    pub base_amount: Decimal,
    /// Budget line charged by this payment.
    pub budget_line_id: BudgetLineId,
    /// Owning department.
    pub department: String,
    /// Disbursement channel.
    pub payment_mode: PaymentMode,
    /// Optional partial-payment percentage (0 < p <= 100).
    pub partial_percent: Option<Decimal>,
    /// Lifecycle status.
    pub status: PaymentStatus,
    /// The batch this payment was finalized under, if any.
    pub batch_id: Option<BatchId>,
    /// Tax figures fixed at finalize time.
    pub taxes: Option<TaxSnapshot>,
    /// Outstanding net amount after a partial payment, for display.
    pub remaining_balance: Decimal,
}

impl Payment {
    /// The snapshot of fields the calculation engine reads.
    #[must_use]
    pub fn tax_input(&self) -> TaxInput {
        TaxInput {
            base_amount: self.base_amount,
            vat_decision: self.vat_decision,
            payment_mode: self.payment_mode,
        }
    }

    /// Returns true if this payment may still be included in a batch.
    #[must_use]
    pub fn is_finalizable(&self) -> bool {
        self.status.is_finalizable() && self.batch_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_finalizable() {
        assert!(PaymentStatus::Pending.is_finalizable());
        assert!(PaymentStatus::Partial.is_finalizable());
        assert!(!PaymentStatus::Paid.is_finalizable());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PaymentStatus::Pending.to_string(), "pending");
        assert_eq!(PaymentStatus::Partial.to_string(), "partial");
        assert_eq!(PaymentStatus::Paid.to_string(), "paid");
    }
}

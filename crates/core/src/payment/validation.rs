//! Payment validation.
//!
//! Validation runs before any mutation: a finalize that fails validation
//! leaves no partial state behind.

use rust_decimal::Decimal;
use thiserror::Error;

use payrun_shared::types::id::{BatchId, BudgetLineId, PaymentId};

use super::types::{Payment, PaymentStatus};

/// A single validation failure on a staged payment.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Finalize was called with no payments.
    #[error("Batch must include at least one payment")]
    EmptyBatch,

    /// Referenced payment does not exist.
    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    /// Vendor name is empty.
    #[error("Payment {0} has no vendor")]
    MissingVendor(PaymentId),

    /// Pre-tax base amount must be positive.
    #[error("Payment {payment_id} has non-positive base amount {amount}")]
    NonPositiveAmount {
        /// The offending payment.
        payment_id: PaymentId,
        /// The rejected amount.
        amount: Decimal,
    },

    /// FX rate must be positive.
    #[error("Payment {payment_id} has non-positive FX rate {rate}")]
    NonPositiveFxRate {
        /// The offending payment.
        payment_id: PaymentId,
        /// The rejected rate.
        rate: Decimal,
    },

    /// Partial percentage outside (0, 100].
    #[error("Payment {payment_id} has partial percentage {percentage} outside (0, 100]")]
    PercentageOutOfRange {
        /// The offending payment.
        payment_id: PaymentId,
        /// The rejected percentage.
        percentage: Decimal,
    },

    /// Payment status does not allow finalization.
    #[error("Payment {payment_id} is {status} and cannot be finalized")]
    NotFinalizable {
        /// The offending payment.
        payment_id: PaymentId,
        /// Its current status.
        status: PaymentStatus,
    },

    /// Payment already belongs to another batch.
    #[error("Payment {payment_id} already belongs to batch {batch_id}")]
    AlreadyInBatch {
        /// The offending payment.
        payment_id: PaymentId,
        /// The batch it belongs to.
        batch_id: BatchId,
    },

    /// Referenced budget line is not registered.
    #[error("Payment {payment_id} references unknown budget line {budget_line_id}")]
    UnknownBudgetLine {
        /// The offending payment.
        payment_id: PaymentId,
        /// The unknown line.
        budget_line_id: BudgetLineId,
    },

    /// A required withholding or levy rate could not be resolved.
    ///
    /// Finalizing with a silently-zero withholding would under-withhold, so
    /// this is a validation failure, never a default.
    #[error(
        "Payment {payment_id} has no registered rate for procurement type \
         {procurement_type:?} / tax type {tax_type:?}"
    )]
    UnresolvedRates {
        /// The offending payment.
        payment_id: PaymentId,
        /// Its procurement type.
        procurement_type: String,
        /// Its tax type.
        tax_type: String,
    },
}

/// Validates the intrinsic fields and eligibility of one staged payment.
///
/// # Errors
///
/// Returns the first field-level failure found on this payment.
pub fn validate_payment(payment: &Payment) -> Result<(), ValidationError> {
    if payment.vendor.trim().is_empty() {
        return Err(ValidationError::MissingVendor(payment.id));
    }
    if payment.base_amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount {
            payment_id: payment.id,
            amount: payment.base_amount,
        });
    }
    if payment.fx_rate <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveFxRate {
            payment_id: payment.id,
            rate: payment.fx_rate,
        });
    }
    if let Some(percentage) = payment.partial_percent {
        if percentage <= Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
            return Err(ValidationError::PercentageOutOfRange {
                payment_id: payment.id,
                percentage,
            });
        }
    }
    if let Some(batch_id) = payment.batch_id {
        return Err(ValidationError::AlreadyInBatch {
            payment_id: payment.id,
            batch_id,
        });
    }
    if !payment.status.is_finalizable() {
        return Err(ValidationError::NotFinalizable {
            payment_id: payment.id,
            status: payment.status,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::{PaymentMode, VatDecision};
    use payrun_shared::types::id::BudgetLineId;
    use payrun_shared::types::money::Currency;
    use rust_decimal_macros::dec;

    fn payment() -> Payment {
        Payment {
            id: PaymentId::new(),
            vendor: "Acme Supplies".to_string(),
            description: "Stationery".to_string(),
            procurement_type: "goods".to_string(),
            tax_type: "nhil".to_string(),
            vat_decision: VatDecision::Yes,
            currency: Currency::Ghs,
            fx_rate: Decimal::ONE,
            base_amount: dec!(1000),
            budget_line_id: BudgetLineId::new(),
            department: "Admin".to_string(),
            payment_mode: PaymentMode::BankTransfer,
            partial_percent: None,
            status: PaymentStatus::Pending,
            batch_id: None,
            taxes: None,
            remaining_balance: Decimal::ZERO,
        }
    }

    #[test]
    fn test_valid_payment_passes() {
        assert!(validate_payment(&payment()).is_ok());
    }

    #[test]
    fn test_missing_vendor() {
        let mut p = payment();
        p.vendor = "   ".to_string();
        assert!(matches!(
            validate_payment(&p),
            Err(ValidationError::MissingVendor(_))
        ));
    }

    #[test]
    fn test_non_positive_amount() {
        let mut p = payment();
        p.base_amount = Decimal::ZERO;
        assert!(matches!(
            validate_payment(&p),
            Err(ValidationError::NonPositiveAmount { .. })
        ));
    }

    #[test]
    fn test_non_positive_fx_rate() {
        let mut p = payment();
        p.fx_rate = dec!(-1);
        assert!(matches!(
            validate_payment(&p),
            Err(ValidationError::NonPositiveFxRate { .. })
        ));
    }

    #[test]
    fn test_percentage_out_of_range() {
        let mut p = payment();
        p.partial_percent = Some(dec!(120));
        assert!(matches!(
            validate_payment(&p),
            Err(ValidationError::PercentageOutOfRange { .. })
        ));

        p.partial_percent = Some(dec!(40));
        assert!(validate_payment(&p).is_ok());
    }

    #[test]
    fn test_paid_payment_rejected() {
        let mut p = payment();
        p.status = PaymentStatus::Paid;
        assert!(matches!(
            validate_payment(&p),
            Err(ValidationError::NotFinalizable { .. })
        ));
    }

    #[test]
    fn test_payment_in_another_batch_rejected() {
        let mut p = payment();
        p.batch_id = Some(BatchId::new());
        assert!(matches!(
            validate_payment(&p),
            Err(ValidationError::AlreadyInBatch { .. })
        ));
    }
}

//! Calculation engine domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// VAT treatment decided for a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VatDecision {
    /// VAT is charged on the pre-tax base.
    Yes,
    /// VAT is not charged, but the vendor is otherwise taxable.
    No,
    /// The vendor is exempt from VAT and from withholding.
    Exempt,
}

impl VatDecision {
    /// Returns true if VAT applies to the payment.
    #[must_use]
    pub fn vat_applies(&self) -> bool {
        matches!(self, Self::Yes)
    }

    /// Returns true if withholding tax applies to the payment.
    ///
    /// Exempt vendors are outside the withholding regime as well as VAT.
    #[must_use]
    pub fn withholding_applies(&self) -> bool {
        !matches!(self, Self::Exempt)
    }
}

/// Channel a payment is disbursed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    /// Direct bank transfer.
    BankTransfer,
    /// Physical cheque.
    Cheque,
    /// Mobile-money wallet; attracts the operator charge.
    MobileMoney,
}

impl PaymentMode {
    /// Returns true if the mobile-money operator charge applies.
    #[must_use]
    pub fn attracts_momo_charge(&self) -> bool {
        matches!(self, Self::MobileMoney)
    }
}

/// A resolved rate set for one payment.
///
/// `wht_rate` and `levy_rate` are `None` when the external registry has no
/// entry for the payment's procurement/tax type. "Unresolved" is distinct
/// from "resolved to zero" and is never silently substituted with a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSet {
    /// Withholding rate for the payment's procurement type.
    pub wht_rate: Option<Decimal>,
    /// Statutory levy rate for the payment's tax type.
    pub levy_rate: Option<Decimal>,
    /// VAT rate applied when the VAT decision is `Yes`.
    pub vat_rate: Decimal,
    /// Mobile-money operator charge rate.
    pub momo_rate: Decimal,
}

/// The snapshot of payment fields the engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxInput {
    /// Pre-tax base amount in the payment currency.
    pub base_amount: Decimal,
    /// VAT treatment.
    pub vat_decision: VatDecision,
    /// Disbursement channel.
    pub payment_mode: PaymentMode,
}

/// Computed tax components for one payment.
///
/// All monetary fields are rounded to 2 decimal places, half-up, once, at
/// the end of each component computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    /// The (possibly scaled) pre-tax base the components were computed from.
    pub base: Decimal,
    /// Withholding amount deducted from the vendor's remittance.
    pub wht: Decimal,
    /// The withholding rate actually used (zero when unresolved or exempt).
    pub wht_rate_used: Decimal,
    /// Statutory levy amount.
    pub levy: Decimal,
    /// VAT amount.
    pub vat: Decimal,
    /// Mobile-money operator charge.
    pub momo_charge: Decimal,
    /// Net amount remitted: `base + levy + vat - wht`.
    pub net_payable: Decimal,
    /// True when a required rate could not be resolved. Callers must refuse
    /// to finalize a payment with this flag set.
    pub rates_unresolved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vat_decision_predicates() {
        assert!(VatDecision::Yes.vat_applies());
        assert!(!VatDecision::No.vat_applies());
        assert!(!VatDecision::Exempt.vat_applies());

        assert!(VatDecision::Yes.withholding_applies());
        assert!(VatDecision::No.withholding_applies());
        assert!(!VatDecision::Exempt.withholding_applies());
    }

    #[test]
    fn test_payment_mode_momo_charge() {
        assert!(PaymentMode::MobileMoney.attracts_momo_charge());
        assert!(!PaymentMode::BankTransfer.attracts_momo_charge());
        assert!(!PaymentMode::Cheque.attracts_momo_charge());
    }

    #[test]
    fn test_vat_decision_serde_uppercase() {
        assert_eq!(serde_json::to_string(&VatDecision::Yes).unwrap(), "\"YES\"");
        assert_eq!(
            serde_json::from_str::<VatDecision>("\"EXEMPT\"").unwrap(),
            VatDecision::Exempt
        );
    }
}

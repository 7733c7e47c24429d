//! Tax computation over a payment snapshot and a resolved rate set.

use rust_decimal::Decimal;
use thiserror::Error;

use payrun_shared::types::money::round_money;

use super::types::{RateSet, TaxBreakdown, TaxInput};

/// Errors from the calculation engine.
#[derive(Debug, Error)]
pub enum CalcError {
    /// Partial-payment percentage outside (0, 100].
    #[error("Partial-payment percentage must be in (0, 100], got {0}")]
    InvalidPercentage(Decimal),
}

/// Stateless financial calculation engine.
///
/// All methods are pure functions: same inputs, same outputs, no side
/// effects. Rounding (2 dp, half-up) is applied once per component, never on
/// intermediate sums.
pub struct CalcEngine;

impl CalcEngine {
    /// Computes the tax components for a payment at its full base amount.
    ///
    /// - `wht = base * wht_rate`, zero when the VAT decision forbids
    ///   withholding or the rate is unresolved
    /// - `vat = base * vat_rate` only when the VAT decision is `YES`
    /// - `levy = base * levy_rate`, zero when unresolved
    /// - `momo_charge = base * momo_rate` only for mobile-money payments
    /// - `net_payable = base + levy + vat - wht` — withholding is deducted
    ///   from the vendor's remittance while levy and VAT are additive
    ///   charges; the ordering is a business-rule contract
    ///
    /// An unresolved required rate sets `rates_unresolved` instead of being
    /// substituted with any constant; callers must refuse to finalize such a
    /// payment.
    #[must_use]
    pub fn compute_taxes(input: &TaxInput, rates: &RateSet) -> TaxBreakdown {
        let base = round_money(input.base_amount);

        let wht_required = input.vat_decision.withholding_applies();
        let wht_rate_used = if wht_required {
            rates.wht_rate.unwrap_or(Decimal::ZERO)
        } else {
            Decimal::ZERO
        };
        let wht = round_money(base * wht_rate_used);

        let levy = round_money(base * rates.levy_rate.unwrap_or(Decimal::ZERO));

        let vat = if input.vat_decision.vat_applies() {
            round_money(base * rates.vat_rate)
        } else {
            Decimal::ZERO
        };

        let momo_charge = if input.payment_mode.attracts_momo_charge() {
            round_money(base * rates.momo_rate)
        } else {
            Decimal::ZERO
        };

        // Components are already at 2 dp; their sum is exact.
        let net_payable = base + levy + vat - wht;

        let rates_unresolved =
            (wht_required && rates.wht_rate.is_none()) || rates.levy_rate.is_none();

        TaxBreakdown {
            base,
            wht,
            wht_rate_used,
            levy,
            vat,
            momo_charge,
            net_payable,
            rates_unresolved,
        }
    }

    /// Computes the tax components for a partial payment.
    ///
    /// The base is scaled by `percentage / 100` and every component is
    /// recomputed from the scaled base by reapplying [`compute_taxes`].
    /// Partial payment is NOT a linear scaling of the full-payment result:
    /// future rate shapes may carry thresholds, so recomputation from the
    /// scaled base is the safe contract.
    ///
    /// # Errors
    ///
    /// Returns [`CalcError::InvalidPercentage`] unless `0 < percentage <= 100`.
    ///
    /// [`compute_taxes`]: CalcEngine::compute_taxes
    pub fn compute_partial_payment(
        input: &TaxInput,
        rates: &RateSet,
        percentage: Decimal,
    ) -> Result<TaxBreakdown, CalcError> {
        if percentage <= Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
            return Err(CalcError::InvalidPercentage(percentage));
        }

        let scaled = TaxInput {
            base_amount: input.base_amount * percentage / Decimal::ONE_HUNDRED,
            ..*input
        };
        Ok(Self::compute_taxes(&scaled, rates))
    }
}

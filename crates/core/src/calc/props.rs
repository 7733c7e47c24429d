//! Property-based tests for the calculation engine.

use proptest::prelude::*;
use rust_decimal::Decimal;

use payrun_shared::types::money::round_money;

use super::engine::CalcEngine;
use super::types::{PaymentMode, RateSet, TaxInput, VatDecision};

/// Strategy to generate positive base amounts (0.01 to 10,000,000.00).
fn positive_base() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate rates (0.00% to 50.00%).
fn rate() -> impl Strategy<Value = Decimal> {
    (0i64..5_000i64).prop_map(|v| Decimal::new(v, 4))
}

/// Strategy to generate partial percentages (0.01 to 100.00).
fn percentage() -> impl Strategy<Value = Decimal> {
    (1i64..=10_000i64).prop_map(|v| Decimal::new(v, 2))
}

fn vat_decision() -> impl Strategy<Value = VatDecision> {
    prop_oneof![
        Just(VatDecision::Yes),
        Just(VatDecision::No),
        Just(VatDecision::Exempt),
    ]
}

fn payment_mode() -> impl Strategy<Value = PaymentMode> {
    prop_oneof![
        Just(PaymentMode::BankTransfer),
        Just(PaymentMode::Cheque),
        Just(PaymentMode::MobileMoney),
    ]
}

fn rate_set() -> impl Strategy<Value = RateSet> {
    (rate(), rate(), rate(), rate()).prop_map(|(wht, levy, vat, momo)| RateSet {
        wht_rate: Some(wht),
        levy_rate: Some(levy),
        vat_rate: vat,
        momo_rate: momo,
    })
}

fn tax_input() -> impl Strategy<Value = TaxInput> {
    (positive_base(), vat_decision(), payment_mode()).prop_map(|(base, vat, mode)| TaxInput {
        base_amount: base,
        vat_decision: vat,
        payment_mode: mode,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Every monetary component is already at 2 decimal places: rounding is
    /// applied exactly once, at the end of each component computation.
    #[test]
    fn prop_components_carry_two_decimal_places(
        input in tax_input(),
        rates in rate_set(),
    ) {
        let b = CalcEngine::compute_taxes(&input, &rates);

        for component in [b.base, b.wht, b.levy, b.vat, b.momo_charge, b.net_payable] {
            prop_assert_eq!(round_money(component), component);
        }
    }

    /// `net_payable` is exactly `base + levy + vat - wht` over the rounded
    /// components; no second rounding pass is applied to the sum.
    #[test]
    fn prop_net_payable_identity(
        input in tax_input(),
        rates in rate_set(),
    ) {
        let b = CalcEngine::compute_taxes(&input, &rates);
        prop_assert_eq!(b.net_payable, b.base + b.levy + b.vat - b.wht);
    }

    /// No component is negative for a positive base and non-negative rates.
    #[test]
    fn prop_components_non_negative(
        input in tax_input(),
        rates in rate_set(),
    ) {
        let b = CalcEngine::compute_taxes(&input, &rates);

        for component in [b.wht, b.levy, b.vat, b.momo_charge] {
            prop_assert!(!component.is_sign_negative());
        }
    }

    /// With resolved rates the unresolved flag is never raised.
    #[test]
    fn prop_resolved_rates_never_flag(
        input in tax_input(),
        rates in rate_set(),
    ) {
        let b = CalcEngine::compute_taxes(&input, &rates);
        prop_assert!(!b.rates_unresolved);
    }

    /// An unresolved withholding rate raises the flag for every vendor the
    /// withholding regime applies to, and never yields a non-zero wht.
    #[test]
    fn prop_unresolved_wht_flags_or_is_irrelevant(
        input in tax_input(),
        mut rates in rate_set(),
    ) {
        rates.wht_rate = None;
        let b = CalcEngine::compute_taxes(&input, &rates);

        prop_assert_eq!(b.wht, Decimal::ZERO);
        prop_assert_eq!(b.rates_unresolved, input.vat_decision.withholding_applies());
    }

    /// Partial recomputation at 100% is identical to the full computation.
    #[test]
    fn prop_partial_at_hundred_equals_full(
        input in tax_input(),
        rates in rate_set(),
    ) {
        let full = CalcEngine::compute_taxes(&input, &rates);
        let partial = CalcEngine::compute_partial_payment(&input, &rates, Decimal::ONE_HUNDRED)
            .expect("100% is a valid percentage");
        prop_assert_eq!(full, partial);
    }

    /// A partial payment plus its complement reconstructs the full figure
    /// only up to per-component rounding: each of the two runs rounds five
    /// components independently, so the recombined net payable may drift
    /// from the single-run net by at most one cent per component and run.
    ///
    /// Rates here are linear; the drift is purely the rounding boundary.
    /// The exact counter-case lives in the engine unit tests.
    #[test]
    fn prop_partial_split_reconstructs_within_rounding(
        input in tax_input(),
        rates in rate_set(),
        pct in percentage(),
    ) {
        prop_assume!(pct < Decimal::ONE_HUNDRED);

        let full = CalcEngine::compute_taxes(&input, &rates);
        let part = CalcEngine::compute_partial_payment(&input, &rates, pct)
            .expect("generated percentage is valid");
        let rest = CalcEngine::compute_partial_payment(
            &input,
            &rates,
            Decimal::ONE_HUNDRED - pct,
        )
        .expect("complement percentage is valid");

        let drift = (part.net_payable + rest.net_payable - full.net_payable).abs();
        prop_assert!(drift <= Decimal::new(10, 2), "drift {drift} exceeds rounding bound");
    }

    /// Scaling the base scales the pre-rounding components linearly: the
    /// partial base itself is the rounded scaled base.
    #[test]
    fn prop_partial_base_is_rounded_scaled_base(
        input in tax_input(),
        rates in rate_set(),
        pct in percentage(),
    ) {
        let part = CalcEngine::compute_partial_payment(&input, &rates, pct)
            .expect("generated percentage is valid");
        let expected = round_money(input.base_amount * pct / Decimal::ONE_HUNDRED);
        prop_assert_eq!(part.base, expected);
    }
}

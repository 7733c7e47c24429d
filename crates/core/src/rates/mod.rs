//! Rate resolution collaborator.
//!
//! Withholding and levy rates live in an externally owned validation
//! registry keyed by procurement type and tax type. The resolver is always
//! an explicit dependency passed into the finalizer — never a module-level
//! cache consulted implicitly — so the calculation engine stays pure and
//! testable with fixed rate tables.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::calc::RateSet;

/// Maps categorical payment fields to numeric rates.
///
/// An absent registry entry resolves to `None`: "unresolved" is a signaled
/// condition, never an implicit zero or default.
pub trait RateResolver: Send + Sync {
    /// Resolves the withholding rate for a procurement type.
    fn resolve_withholding(&self, procurement_type: &str) -> Option<Decimal>;

    /// Resolves the statutory levy rate for a tax type.
    fn resolve_levy(&self, tax_type: &str) -> Option<Decimal>;

    /// The VAT rate applied when a payment's VAT decision is `YES`.
    fn vat_rate(&self) -> Decimal;

    /// The mobile-money operator charge rate.
    fn momo_rate(&self) -> Decimal;
}

/// Assembles the resolved rate set for one payment.
#[must_use]
pub fn resolve_rates(
    resolver: &dyn RateResolver,
    procurement_type: &str,
    tax_type: &str,
) -> RateSet {
    RateSet {
        wht_rate: resolver.resolve_withholding(procurement_type),
        levy_rate: resolver.resolve_levy(tax_type),
        vat_rate: resolver.vat_rate(),
        momo_rate: resolver.momo_rate(),
    }
}

/// Table-backed resolver over fixed rate registries.
///
/// The reference implementation for tests and single-process deployments.
#[derive(Debug, Clone, Default)]
pub struct FixedRateResolver {
    withholding: HashMap<String, Decimal>,
    levy: HashMap<String, Decimal>,
    vat: Decimal,
    momo: Decimal,
}

impl FixedRateResolver {
    /// Creates a resolver with the given system-wide VAT and momo rates and
    /// empty withholding/levy registries.
    #[must_use]
    pub fn new(vat: Decimal, momo: Decimal) -> Self {
        Self {
            withholding: HashMap::new(),
            levy: HashMap::new(),
            vat,
            momo,
        }
    }

    /// Registers a withholding rate for a procurement type.
    #[must_use]
    pub fn with_withholding(mut self, procurement_type: impl Into<String>, rate: Decimal) -> Self {
        self.withholding.insert(procurement_type.into(), rate);
        self
    }

    /// Registers a levy rate for a tax type.
    #[must_use]
    pub fn with_levy(mut self, tax_type: impl Into<String>, rate: Decimal) -> Self {
        self.levy.insert(tax_type.into(), rate);
        self
    }
}

impl RateResolver for FixedRateResolver {
    fn resolve_withholding(&self, procurement_type: &str) -> Option<Decimal> {
        self.withholding.get(procurement_type).copied()
    }

    fn resolve_levy(&self, tax_type: &str) -> Option<Decimal> {
        self.levy.get(tax_type).copied()
    }

    fn vat_rate(&self) -> Decimal {
        self.vat
    }

    fn momo_rate(&self) -> Decimal {
        self.momo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn resolver() -> FixedRateResolver {
        FixedRateResolver::new(dec!(0.15), dec!(0.01))
            .with_withholding("goods", dec!(0.03))
            .with_withholding("services", dec!(0.075))
            .with_levy("nhil", dec!(0.025))
    }

    #[test]
    fn test_resolves_registered_rates() {
        let r = resolver();
        assert_eq!(r.resolve_withholding("goods"), Some(dec!(0.03)));
        assert_eq!(r.resolve_withholding("services"), Some(dec!(0.075)));
        assert_eq!(r.resolve_levy("nhil"), Some(dec!(0.025)));
    }

    #[test]
    fn test_unregistered_types_are_unresolved() {
        let r = resolver();
        assert_eq!(r.resolve_withholding("works"), None);
        assert_eq!(r.resolve_levy("unknown"), None);
    }

    #[test]
    fn test_resolve_rates_assembles_full_set() {
        let r = resolver();
        let rates = resolve_rates(&r, "goods", "nhil");

        assert_eq!(rates.wht_rate, Some(dec!(0.03)));
        assert_eq!(rates.levy_rate, Some(dec!(0.025)));
        assert_eq!(rates.vat_rate, dec!(0.15));
        assert_eq!(rates.momo_rate, dec!(0.01));
    }

    #[test]
    fn test_resolve_rates_carries_unresolved_through() {
        let r = resolver();
        let rates = resolve_rates(&r, "works", "unknown");

        assert_eq!(rates.wht_rate, None);
        assert_eq!(rates.levy_rate, None);
    }
}

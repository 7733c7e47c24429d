//! Financial calculation engine.
//!
//! Pure, deterministic tax computation: withholding, levy, VAT, mobile-money
//! charge, and net payable, from a payment snapshot and a resolved rate set.
//! No I/O, no shared state.

pub mod engine;
pub mod types;

#[cfg(test)]
mod props;

pub use engine::{CalcEngine, CalcError};
pub use types::{PaymentMode, RateSet, TaxBreakdown, TaxInput, VatDecision};

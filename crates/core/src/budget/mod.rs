//! Budget-line balances.
//!
//! Budget master data is owned externally; the balance field is mutated
//! exclusively through batch finalize/undo. Updates go through a versioned
//! compare-and-swap so concurrent batches touching the same line serialize
//! instead of losing updates.

pub mod error;
pub mod registry;

pub use error::BudgetError;
pub use registry::{
    BudgetLine, BudgetRegistry, InMemoryBudgetRegistry, VersionedBalance, apply_delta_with_retry,
};

//! Budget-line registry trait and the in-memory reference implementation.

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use payrun_shared::types::id::BudgetLineId;
use payrun_shared::types::money::{Currency, Money};

use super::error::BudgetError;

/// A budget allocation bucket with a mutable remaining balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetLine {
    /// Unique identifier.
    pub id: BudgetLineId,
    /// Chart-of-accounts number.
    pub account_number: String,
    /// Department code/dimension.
    pub department: String,
    /// Total allocated amount.
    pub allocated: Decimal,
    /// Current remaining balance.
    pub balance: Decimal,
    /// Currency of the allocation (the settlement currency).
    pub currency: Currency,
}

impl BudgetLine {
    /// The remaining balance as a currency-tagged amount.
    #[must_use]
    pub fn remaining(&self) -> Money {
        Money::new(self.balance, self.currency)
    }

    /// Amount spent so far against the allocation.
    #[must_use]
    pub fn spent(&self) -> Money {
        Money::new(self.allocated - self.balance, self.currency)
    }
}

/// A balance read together with its version stamp.
///
/// The version is the optimistic-concurrency token: `apply_delta` only
/// succeeds against the version the caller read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionedBalance {
    /// The remaining balance.
    pub amount: Decimal,
    /// Monotonically increasing version stamp.
    pub version: u64,
}

/// Balance access for budget lines.
///
/// A blind read-modify-write on a balance is a correctness bug: all
/// mutations go through the conditional `apply_delta`, which serializes
/// concurrent finalize/undo operations per line.
pub trait BudgetRegistry: Send + Sync {
    /// Reads the current balance and version of a line.
    fn balance(&self, id: BudgetLineId) -> Result<VersionedBalance, BudgetError>;

    /// Applies `delta` to the line's balance, conditional on the version.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::VersionConflict`] if the stored version no
    /// longer matches `expected_version`.
    fn apply_delta(
        &self,
        id: BudgetLineId,
        delta: Decimal,
        expected_version: u64,
    ) -> Result<VersionedBalance, BudgetError>;
}

/// Applies `delta` with an optimistic read-CAS retry loop.
///
/// Re-reads the version on each conflict, up to `max_retries` attempts.
///
/// # Errors
///
/// Returns the final [`BudgetError::VersionConflict`] once retries are
/// exhausted, or any non-conflict error immediately.
pub fn apply_delta_with_retry(
    registry: &dyn BudgetRegistry,
    id: BudgetLineId,
    delta: Decimal,
    max_retries: u32,
) -> Result<VersionedBalance, BudgetError> {
    let mut attempt = 0;
    loop {
        let current = registry.balance(id)?;
        match registry.apply_delta(id, delta, current.version) {
            Ok(updated) => return Ok(updated),
            Err(err @ BudgetError::VersionConflict { .. }) => {
                attempt += 1;
                if attempt >= max_retries {
                    return Err(err);
                }
            }
            Err(other) => return Err(other),
        }
    }
}

/// Versioned line record stored by the in-memory registry.
#[derive(Debug, Clone)]
struct VersionedLine {
    line: BudgetLine,
    version: u64,
}

/// In-memory budget registry over a concurrent map.
///
/// The map's per-entry locking makes each `apply_delta` atomic, so the
/// version check and the balance write cannot interleave with another
/// writer on the same line.
#[derive(Debug, Default)]
pub struct InMemoryBudgetRegistry {
    lines: DashMap<BudgetLineId, VersionedLine>,
}

impl InMemoryBudgetRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a budget line, starting at version 0.
    pub fn insert_line(&self, line: BudgetLine) {
        self.lines
            .insert(line.id, VersionedLine { line, version: 0 });
    }

    /// Reads a full budget line record.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::LineNotFound`] for an unregistered id.
    pub fn line(&self, id: BudgetLineId) -> Result<BudgetLine, BudgetError> {
        self.lines
            .get(&id)
            .map(|entry| entry.line.clone())
            .ok_or(BudgetError::LineNotFound(id))
    }
}

impl BudgetRegistry for InMemoryBudgetRegistry {
    fn balance(&self, id: BudgetLineId) -> Result<VersionedBalance, BudgetError> {
        self.lines
            .get(&id)
            .map(|entry| VersionedBalance {
                amount: entry.line.balance,
                version: entry.version,
            })
            .ok_or(BudgetError::LineNotFound(id))
    }

    fn apply_delta(
        &self,
        id: BudgetLineId,
        delta: Decimal,
        expected_version: u64,
    ) -> Result<VersionedBalance, BudgetError> {
        let mut entry = self.lines.get_mut(&id).ok_or(BudgetError::LineNotFound(id))?;

        if entry.version != expected_version {
            return Err(BudgetError::VersionConflict {
                line_id: id,
                expected: expected_version,
                actual: entry.version,
            });
        }

        entry.line.balance += delta;
        entry.version += 1;
        Ok(VersionedBalance {
            amount: entry.line.balance,
            version: entry.version,
        })
    }
}

//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `PaymentId` where a
//! `BatchId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(PaymentId, "Unique identifier for a staged payment.");
typed_id!(
    BatchId,
    "Caller-supplied identifier for a finalized batch. Doubles as the finalize idempotency key."
);
typed_id!(BudgetLineId, "Unique identifier for a budget line.");
typed_id!(WhtEntryId, "Unique identifier for a withholding-tax return entry.");
typed_id!(ArchiveId, "Unique identifier for an archived payment copy.");
typed_id!(AuditRecordId, "Unique identifier for an audit record.");
typed_id!(ActorId, "Unique identifier for the user performing an operation.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_id_roundtrip() {
        let id = PaymentId::new();
        let parsed = PaymentId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_ids_are_distinct_types() {
        let uuid = Uuid::now_v7();
        let payment = PaymentId::from_uuid(uuid);
        let batch = BatchId::from_uuid(uuid);
        assert_eq!(payment.into_inner(), batch.into_inner());
    }

    #[test]
    fn test_new_ids_are_unique() {
        let a = BatchId::new();
        let b = BatchId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!(BudgetLineId::from_str("not-a-uuid").is_err());
    }
}

//! Audit record emission.
//!
//! Every mutating ledger action emits a record to an append-only audit sink
//! owned elsewhere. Emission is fire-and-forget from the core's
//! perspective: a sink failure is surfaced as a warning, never allowed to
//! block the financial operation itself.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use payrun_shared::types::id::{ActorId, AuditRecordId, BatchId};

/// Mutating ledger actions that produce audit records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// A batch was finalized.
    Finalize,
    /// A batch was undone.
    Undo,
}

impl AuditAction {
    /// Returns the canonical action identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Finalize => "FINALIZE",
            Self::Undo => "UNDO",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique identifier.
    pub id: AuditRecordId,
    /// The action performed.
    pub action: AuditAction,
    /// The batch the action applied to.
    pub batch_id: BatchId,
    /// Action-specific payload (totals, touched lines, receipt counts).
    pub payload: serde_json::Value,
    /// Who performed the action.
    pub actor: ActorId,
    /// When the record was emitted.
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Builds a record stamped with the current time.
    #[must_use]
    pub fn new(
        action: AuditAction,
        batch_id: BatchId,
        payload: serde_json::Value,
        actor: ActorId,
    ) -> Self {
        Self {
            id: AuditRecordId::new(),
            action,
            batch_id,
            payload,
            actor,
            recorded_at: Utc::now(),
        }
    }
}

/// Errors from the audit sink.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The sink rejected or failed to persist the record.
    #[error("Audit sink failure: {0}")]
    Sink(String),
}

/// Append-only audit log collaborator.
pub trait AuditSink: Send + Sync {
    /// Appends one record.
    fn record(&self, record: AuditRecord) -> Result<(), AuditError>;
}

/// In-memory audit sink for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded entry, in append order.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: AuditRecord) -> Result<(), AuditError> {
        self.records
            .lock()
            .map_err(|_| AuditError::Sink("audit sink lock poisoned".to_string()))?
            .push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_identifiers() {
        assert_eq!(AuditAction::Finalize.as_str(), "FINALIZE");
        assert_eq!(AuditAction::Undo.as_str(), "UNDO");
        assert_eq!(
            serde_json::to_string(&AuditAction::Finalize).unwrap(),
            "\"FINALIZE\""
        );
    }

    #[test]
    fn test_memory_sink_appends_in_order() {
        let sink = MemoryAuditSink::new();
        let batch_id = BatchId::new();
        let actor = ActorId::new();

        sink.record(AuditRecord::new(
            AuditAction::Finalize,
            batch_id,
            json!({"total": "11600.00"}),
            actor,
        ))
        .unwrap();
        sink.record(AuditRecord::new(AuditAction::Undo, batch_id, json!({}), actor))
            .unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].action, AuditAction::Finalize);
        assert_eq!(records[1].action, AuditAction::Undo);
        assert_eq!(records[0].batch_id, batch_id);
    }
}

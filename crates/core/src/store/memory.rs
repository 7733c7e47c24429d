//! In-memory reference store.

use dashmap::DashMap;

use payrun_shared::types::id::{ArchiveId, BatchId, PaymentId, WhtEntryId};

use crate::batch::types::{ArchivedPayment, Batch, BatchStatus, WhtReturnEntry};
use crate::payment::Payment;

use super::{ArchiveStore, BatchStore, PaymentStore, StoreError, WhtStore};

/// Concurrent in-memory document store implementing all four storage
/// traits. Used by tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    payments: DashMap<PaymentId, Payment>,
    batches: DashMap<BatchId, Batch>,
    archives: DashMap<ArchiveId, ArchivedPayment>,
    wht_entries: DashMap<WhtEntryId, WhtReturnEntry>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PaymentStore for InMemoryStore {
    fn payment(&self, id: PaymentId) -> Result<Option<Payment>, StoreError> {
        Ok(self.payments.get(&id).map(|entry| entry.value().clone()))
    }

    fn insert_payment(&self, payment: Payment) -> Result<(), StoreError> {
        if self.payments.contains_key(&payment.id) {
            return Err(StoreError::DuplicateKey(payment.id.to_string()));
        }
        self.payments.insert(payment.id, payment);
        Ok(())
    }

    fn update_payment(&self, payment: Payment) -> Result<(), StoreError> {
        if !self.payments.contains_key(&payment.id) {
            return Err(StoreError::NotFound(payment.id.to_string()));
        }
        self.payments.insert(payment.id, payment);
        Ok(())
    }

    fn delete_payment(&self, id: PaymentId) -> Result<(), StoreError> {
        self.payments.remove(&id);
        Ok(())
    }
}

impl BatchStore for InMemoryStore {
    fn batch(&self, id: BatchId) -> Result<Option<Batch>, StoreError> {
        Ok(self.batches.get(&id).map(|entry| entry.value().clone()))
    }

    fn insert_batch(&self, batch: Batch) -> Result<(), StoreError> {
        if self.batches.contains_key(&batch.id) {
            return Err(StoreError::DuplicateKey(batch.id.to_string()));
        }
        self.batches.insert(batch.id, batch);
        Ok(())
    }

    fn update_batch(&self, batch: Batch) -> Result<(), StoreError> {
        if !self.batches.contains_key(&batch.id) {
            return Err(StoreError::NotFound(batch.id.to_string()));
        }
        self.batches.insert(batch.id, batch);
        Ok(())
    }

    fn delete_batch(&self, id: BatchId) -> Result<(), StoreError> {
        self.batches.remove(&id);
        Ok(())
    }

    fn recent_finalized(&self, limit: usize) -> Result<Vec<Batch>, StoreError> {
        let mut finalized: Vec<Batch> = self
            .batches
            .iter()
            .filter(|entry| entry.status == BatchStatus::Finalized)
            .map(|entry| entry.value().clone())
            .collect();
        finalized.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        finalized.truncate(limit);
        Ok(finalized)
    }
}

impl ArchiveStore for InMemoryStore {
    fn insert_archive(&self, archive: ArchivedPayment) -> Result<(), StoreError> {
        self.archives.insert(archive.id, archive);
        Ok(())
    }

    fn archives_by_batch(&self, batch_id: BatchId) -> Result<Vec<ArchivedPayment>, StoreError> {
        Ok(self
            .archives
            .iter()
            .filter(|entry| entry.batch_id == batch_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn delete_archives_by_batch(&self, batch_id: BatchId) -> Result<usize, StoreError> {
        let matching: Vec<ArchiveId> = self
            .archives
            .iter()
            .filter(|entry| entry.batch_id == batch_id)
            .map(|entry| entry.id)
            .collect();
        for id in &matching {
            self.archives.remove(id);
        }
        Ok(matching.len())
    }
}

impl WhtStore for InMemoryStore {
    fn insert_wht(&self, entry: WhtReturnEntry) -> Result<(), StoreError> {
        self.wht_entries.insert(entry.id, entry);
        Ok(())
    }

    fn wht_by_batch(&self, batch_id: BatchId) -> Result<Vec<WhtReturnEntry>, StoreError> {
        Ok(self
            .wht_entries
            .iter()
            .filter(|entry| entry.batch_id == batch_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn delete_wht_by_batch(&self, batch_id: BatchId) -> Result<usize, StoreError> {
        let matching: Vec<WhtEntryId> = self
            .wht_entries
            .iter()
            .filter(|entry| entry.batch_id == batch_id)
            .map(|entry| entry.id)
            .collect();
        for id in &matching {
            self.wht_entries.remove(id);
        }
        Ok(matching.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn batch(status: BatchStatus) -> Batch {
        Batch {
            id: BatchId::new(),
            created_at: Utc::now(),
            payment_ids: vec![],
            total_amount: Decimal::ZERO,
            payment_count: 0,
            primary_vendor: "Vendor".to_string(),
            line_debits: vec![],
            sheet_name: "week-32".to_string(),
            status,
            undo: None,
        }
    }

    fn wht_entry(batch_id: BatchId) -> WhtReturnEntry {
        WhtReturnEntry {
            id: WhtEntryId::new(),
            batch_id,
            vendor: "Vendor".to_string(),
            base_amount: dec!(1000),
            rate: dec!(0.05),
            amount: dec!(50),
            filing_period: "2026-08".to_string(),
        }
    }

    #[test]
    fn test_duplicate_batch_insert_rejected() {
        let store = InMemoryStore::new();
        let b = batch(BatchStatus::Finalized);
        let id = b.id;
        store.insert_batch(b.clone()).unwrap();

        let duplicate = Batch { id, ..b };
        assert!(matches!(
            store.insert_batch(duplicate),
            Err(StoreError::DuplicateKey(_))
        ));
    }

    #[test]
    fn test_recent_finalized_orders_and_filters() {
        let store = InMemoryStore::new();
        for _ in 0..3 {
            store.insert_batch(batch(BatchStatus::Finalized)).unwrap();
        }
        store.insert_batch(batch(BatchStatus::Undone)).unwrap();

        let recent = store.recent_finalized(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].created_at >= recent[1].created_at);
        assert!(recent.iter().all(|b| b.status == BatchStatus::Finalized));
    }

    #[test]
    fn test_delete_wht_by_batch_counts() {
        let store = InMemoryStore::new();
        let batch_id = BatchId::new();
        let other_batch = BatchId::new();
        store.insert_wht(wht_entry(batch_id)).unwrap();
        store.insert_wht(wht_entry(batch_id)).unwrap();
        store.insert_wht(wht_entry(other_batch)).unwrap();

        assert_eq!(store.delete_wht_by_batch(batch_id).unwrap(), 2);
        // Second pass has nothing left to delete: still success.
        assert_eq!(store.delete_wht_by_batch(batch_id).unwrap(), 0);
        assert_eq!(store.wht_by_batch(other_batch).unwrap().len(), 1);
    }

    #[test]
    fn test_update_missing_payment_is_not_found() {
        use crate::calc::{PaymentMode, VatDecision};
        use crate::payment::PaymentStatus;
        use payrun_shared::types::id::BudgetLineId;
        use payrun_shared::types::money::Currency;

        let store = InMemoryStore::new();
        let payment = Payment {
            id: PaymentId::new(),
            vendor: "Vendor".to_string(),
            description: String::new(),
            procurement_type: "goods".to_string(),
            tax_type: "nhil".to_string(),
            vat_decision: VatDecision::No,
            currency: Currency::Ghs,
            fx_rate: Decimal::ONE,
            base_amount: dec!(100),
            budget_line_id: BudgetLineId::new(),
            department: "Admin".to_string(),
            payment_mode: PaymentMode::Cheque,
            partial_percent: None,
            status: PaymentStatus::Pending,
            batch_id: None,
            taxes: None,
            remaining_balance: Decimal::ZERO,
        };
        assert!(matches!(
            store.update_payment(payment),
            Err(StoreError::NotFound(_))
        ));
    }
}

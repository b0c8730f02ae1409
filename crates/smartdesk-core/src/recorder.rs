//! # Transaction Recorder
//!
//! Turns an open bill into a durable [`TransactionRecord`].
//!
//! ## Commit Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  commit(&mut bill)                                                      │
//! │                                                                         │
//! │  1. bill open?                  no  ──► InvalidState                    │
//! │  2. bill has lines?             no  ──► EmptyBill                       │
//! │  3. ledger.apply_batch(-qty)    any line short ──► InsufficientStock    │
//! │     (all lines checked before any is applied)      ledger untouched     │
//! │  4. build TransactionRecord                                             │
//! │  5. store.append_transaction    fails ──► ledger.apply_batch(+qty)      │
//! │                                          ──► PersistenceFailure         │
//! │                                              (or InsufficientStock on   │
//! │                                               a store stock conflict,   │
//! │                                               after ledger.refresh)     │
//! │  6. bill ──► committed, return record id                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! After a failed commit the store looks exactly as it did before and the
//! bill is still open so the operator can retry. The ledger is restored too;
//! on a stock conflict its lines are then re-read from the store, since
//! another writer has moved the stored count.

use std::sync::Arc;

use tracing::{info, warn};

use crate::bill::Bill;
use crate::error::{CoreError, CoreResult, StoreError};
use crate::ledger::InventoryLedger;
use crate::store::PersistenceStore;
use crate::types::{RecordSnapshot, TransactionRecord};

/// Commits bills against a shared ledger and a store.
#[derive(Debug)]
pub struct TransactionRecorder<S> {
    ledger: Arc<InventoryLedger>,
    store: S,
}

impl<S: PersistenceStore> TransactionRecorder<S> {
    pub fn new(ledger: Arc<InventoryLedger>, store: S) -> Self {
        TransactionRecorder { ledger, store }
    }

    pub fn ledger(&self) -> &Arc<InventoryLedger> {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Commits `bill` and returns the new record's id.
    pub async fn commit(&self, bill: &mut Bill) -> CoreResult<String> {
        let record = self.commit_record(bill).await?;
        Ok(record.id().to_string())
    }

    /// Commits `bill` and returns the full record.
    pub async fn commit_record(&self, bill: &mut Bill) -> CoreResult<TransactionRecord> {
        bill.ensure_open("commit")?;
        if bill.is_empty() {
            return Err(CoreError::EmptyBill(bill.id().to_string()));
        }

        let deductions: Vec<(String, i64)> = bill
            .lines()
            .iter()
            .map(|l| (l.product_id.clone(), -l.quantity))
            .collect();
        self.ledger.apply_batch(&deductions)?;

        let totals = bill.compute_total();
        let record = TransactionRecord::new(RecordSnapshot {
            bill_id: bill.id().to_string(),
            customer_name: bill.customer_name().map(str::to_string),
            customer_phone: bill.customer_phone().map(str::to_string),
            payment_method: bill.payment_method(),
            lines: bill.lines().to_vec(),
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
        });

        if let Err(store_err) = self.store.append_transaction(&record).await {
            self.roll_back(&deductions);
            warn!(
                bill_id = %bill.id(),
                error = %store_err,
                "Commit rolled back after store failure"
            );
            if matches!(store_err, StoreError::StockConflict { .. }) {
                self.refresh_lines(&deductions).await;
            }
            return Err(match store_err {
                StoreError::StockConflict {
                    product_id,
                    available,
                    requested,
                } => CoreError::InsufficientStock {
                    product_id,
                    available,
                    requested,
                },
                other => CoreError::PersistenceFailure(other),
            });
        }

        bill.mark_committed();
        info!(
            invoice = %record.invoice_number(),
            lines = record.lines().len(),
            total = %record.total(),
            "Transaction committed"
        );
        Ok(record)
    }

    async fn refresh_lines(&self, deductions: &[(String, i64)]) {
        for (product_id, _) in deductions {
            if let Err(err) = self.ledger.refresh(&self.store, product_id).await {
                warn!(product_id = %product_id, error = %err, "Ledger refresh failed");
            }
        }
    }

    fn roll_back(&self, deductions: &[(String, i64)]) {
        let restore: Vec<(String, i64)> = deductions
            .iter()
            .map(|(id, delta)| (id.clone(), -delta))
            .collect();
        // Adding stock back can only fail if a product vanished mid-commit.
        if let Err(err) = self.ledger.apply_batch(&restore) {
            warn!(error = %err, "Ledger rollback incomplete");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Persistence Store
//!
//! The boundary between the transactional core and durable storage.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PersistenceStore (trait)                                               │
//! │  ├── load_catalog()          startup: every product                     │
//! │  ├── load_product(id)        re-read one product after a conflict       │
//! │  ├── save_product(p)         catalog edits, shutdown flush              │
//! │  ├── delete_product(id)      catalog edits                              │
//! │  ├── append_transaction(r)   commit: durable before Ok, stock decrement │
//! │  └── list_transactions(n)    history, newest first                      │
//! │                                                                         │
//! │  Implementations                                                        │
//! │  ├── InMemoryStore           this module, tests and demos               │
//! │  └── SqliteStore             smartdesk-db                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## append_transaction contract
//! A store applies the record's stock decrements to its own copy of the
//! catalog in the same unit of work as the record write. If its copy holds
//! less than a line needs it fails with [`StoreError::StockConflict`] and
//! writes nothing. Records are append-only; there is no update or delete.
//!
//! ## save_product contract
//! A new product is stored whole. For an existing product only the catalog
//! fields (sku, name, category, hsn, unit, price) are replaced; the stored
//! `quantity_on_hand` is left as it is, so a stale in-memory copy can never
//! undo a sale another writer recorded.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{StoreError, StoreResult};
use crate::types::{Product, TransactionRecord};

/// Durable storage used by the ledger and the recorder.
pub trait PersistenceStore: Send + Sync {
    /// Every product in the catalog.
    fn load_catalog(&self) -> impl Future<Output = StoreResult<Vec<Product>>> + Send;

    /// The stored copy of one product, if it still exists.
    fn load_product(
        &self,
        product_id: &str,
    ) -> impl Future<Output = StoreResult<Option<Product>>> + Send;

    /// Inserts a product, or updates the catalog fields of an existing one.
    /// Stored stock of an existing product is not touched.
    fn save_product(&self, product: &Product) -> impl Future<Output = StoreResult<()>> + Send;

    fn delete_product(&self, product_id: &str) -> impl Future<Output = StoreResult<()>> + Send;

    /// Durably appends a committed record and applies its stock decrements.
    fn append_transaction(
        &self,
        record: &TransactionRecord,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Most recent records first, at most `limit`.
    fn list_transactions(
        &self,
        limit: usize,
    ) -> impl Future<Output = StoreResult<Vec<TransactionRecord>>> + Send;
}

// =============================================================================
// In-Memory Store
// =============================================================================

#[derive(Debug, Default)]
struct Inner {
    products: BTreeMap<String, Product>,
    transactions: Vec<TransactionRecord>,
    failing_appends: usize,
    unavailable: bool,
}

/// A [`PersistenceStore`] held entirely in memory.
///
/// Follows the same append contract as the SQLite store, and can be told to
/// fail so rollback paths can be exercised.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose catalog already holds `products`.
    pub fn with_catalog(products: impl IntoIterator<Item = Product>) -> Self {
        let store = InMemoryStore::new();
        {
            let mut inner = store.lock();
            for product in products {
                inner.products.insert(product.id.clone(), product);
            }
        }
        store
    }

    /// Makes the next `count` calls to `append_transaction` fail with
    /// `WriteFailed`.
    pub fn fail_next_appends(&self, count: usize) {
        self.lock().failing_appends = count;
    }

    /// While set, every call fails with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Sets the stored stock directly, as another writer sharing the store
    /// would.
    pub fn set_stock(&self, product_id: &str, quantity: i64) {
        if let Some(product) = self.lock().products.get_mut(product_id) {
            product.quantity_on_hand = quantity;
        }
    }

    /// Stored copy of a product.
    pub fn product(&self, product_id: &str) -> Option<Product> {
        self.lock().products.get(product_id).cloned()
    }

    pub fn transaction_count(&self) -> usize {
        self.lock().transactions.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn available(inner: &Inner) -> StoreResult<()> {
        if inner.unavailable {
            return Err(StoreError::Unavailable("in-memory store offline".to_string()));
        }
        Ok(())
    }
}

impl PersistenceStore for InMemoryStore {
    async fn load_catalog(&self) -> StoreResult<Vec<Product>> {
        let inner = self.lock();
        Self::available(&inner)?;
        Ok(inner.products.values().cloned().collect())
    }

    async fn load_product(&self, product_id: &str) -> StoreResult<Option<Product>> {
        let inner = self.lock();
        Self::available(&inner)?;
        Ok(inner.products.get(product_id).cloned())
    }

    async fn save_product(&self, product: &Product) -> StoreResult<()> {
        let mut inner = self.lock();
        Self::available(&inner)?;
        match inner.products.get_mut(&product.id) {
            Some(stored) => {
                let on_hand = stored.quantity_on_hand;
                *stored = product.clone();
                stored.quantity_on_hand = on_hand;
            }
            None => {
                inner.products.insert(product.id.clone(), product.clone());
            }
        }
        Ok(())
    }

    async fn delete_product(&self, product_id: &str) -> StoreResult<()> {
        let mut inner = self.lock();
        Self::available(&inner)?;
        inner.products.remove(product_id);
        Ok(())
    }

    async fn append_transaction(&self, record: &TransactionRecord) -> StoreResult<()> {
        let mut inner = self.lock();
        Self::available(&inner)?;

        if inner.failing_appends > 0 {
            inner.failing_appends -= 1;
            return Err(StoreError::WriteFailed(format!(
                "could not append {}",
                record.invoice_number()
            )));
        }

        if inner.transactions.iter().any(|t| t.id() == record.id()) {
            return Err(StoreError::InvalidRecord {
                id: record.id().to_string(),
                reason: "already recorded".to_string(),
            });
        }

        // Check every line first so a conflict writes nothing.
        for line in record.lines() {
            let requested = record.quantity_of(&line.product_id);
            let available = inner
                .products
                .get(&line.product_id)
                .map_or(0, |p| p.quantity_on_hand);
            if available < requested {
                return Err(StoreError::StockConflict {
                    product_id: line.product_id.clone(),
                    available,
                    requested,
                });
            }
        }

        for line in record.lines() {
            if let Some(product) = inner.products.get_mut(&line.product_id) {
                product.quantity_on_hand -= line.quantity;
                product.updated_at = record.committed_at();
            }
        }

        inner.transactions.push(record.clone());
        Ok(())
    }

    async fn list_transactions(&self, limit: usize) -> StoreResult<Vec<TransactionRecord>> {
        let inner = self.lock();
        Self::available(&inner)?;
        Ok(inner.transactions.iter().rev().take(limit).cloned().collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{LineItem, NewProduct, PaymentMethod, RecordSnapshot};

    fn product(sku: &str, quantity: i64) -> Product {
        Product::create(NewProduct {
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            category: "Chocolate".to_string(),
            hsn: "1023".to_string(),
            unit: "piece".to_string(),
            price: Money::from_cents(200),
            quantity_on_hand: quantity,
        })
        .unwrap()
    }

    fn record_for(product: &Product, quantity: i64) -> TransactionRecord {
        let line = LineItem::from_product(product, quantity);
        let subtotal = line.line_total();
        TransactionRecord::new(RecordSnapshot {
            bill_id: "bill-1".to_string(),
            customer_name: None,
            customer_phone: None,
            payment_method: PaymentMethod::Cash,
            lines: vec![line],
            subtotal,
            tax: Money::zero(),
            total: subtotal,
        })
    }

    #[tokio::test]
    async fn test_append_decrements_stored_stock() {
        let a = product("A", 5);
        let store = InMemoryStore::with_catalog(vec![a.clone()]);

        store.append_transaction(&record_for(&a, 3)).await.unwrap();

        assert_eq!(store.product(&a.id).unwrap().quantity_on_hand, 2);
        assert_eq!(store.transaction_count(), 1);
    }

    #[tokio::test]
    async fn test_append_conflict_writes_nothing() {
        let a = product("A", 2);
        let store = InMemoryStore::with_catalog(vec![a.clone()]);

        let err = store.append_transaction(&record_for(&a, 3)).await.unwrap_err();

        assert!(matches!(err, StoreError::StockConflict { available: 2, requested: 3, .. }));
        assert_eq!(store.product(&a.id).unwrap().quantity_on_hand, 2);
        assert_eq!(store.transaction_count(), 0);
    }

    #[tokio::test]
    async fn test_save_product_keeps_stored_stock() {
        let a = product("A", 5);
        let store = InMemoryStore::with_catalog(vec![a.clone()]);
        store.set_stock(&a.id, 1);

        let mut edited = a.clone();
        edited.price = Money::from_cents(250);
        edited.quantity_on_hand = 5;
        store.save_product(&edited).await.unwrap();

        let stored = store.load_product(&a.id).await.unwrap().unwrap();
        assert_eq!(stored.price.cents(), 250);
        assert_eq!(stored.quantity_on_hand, 1);

        let b = product("B", 7);
        store.save_product(&b).await.unwrap();
        assert_eq!(store.product(&b.id).unwrap().quantity_on_hand, 7);
        assert!(store.load_product("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let a = product("A", 5);
        let store = InMemoryStore::with_catalog(vec![a.clone()]);

        store.fail_next_appends(1);
        assert!(matches!(
            store.append_transaction(&record_for(&a, 1)).await,
            Err(StoreError::WriteFailed(_))
        ));
        assert!(store.append_transaction(&record_for(&a, 1)).await.is_ok());

        store.set_unavailable(true);
        assert!(matches!(store.load_catalog().await, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_list_transactions_newest_first() {
        let a = product("A", 10);
        let store = InMemoryStore::with_catalog(vec![a.clone()]);
        let first = record_for(&a, 1);
        let second = record_for(&a, 2);
        store.append_transaction(&first).await.unwrap();
        store.append_transaction(&second).await.unwrap();

        let listed = store.list_transactions(1).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id(), second.id());

        assert!(store.append_transaction(&first).await.is_err());
    }
}

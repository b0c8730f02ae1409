//! # SQLite Persistence Store
//!
//! [`PersistenceStore`] over the repositories, so the ledger and recorder
//! can run against the real database.

use smartdesk_core::{PersistenceStore, Product, StoreError, StoreResult, TransactionRecord};
use tracing::error;

use crate::error::DbError;
use crate::pool::Database;

/// The SQLite-backed store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        SqliteStore { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

/// Logs a database failure on its way out as a store error.
fn store_err(operation: &'static str) -> impl Fn(DbError) -> StoreError {
    move |err| {
        error!(operation, error = %err, "Store operation failed");
        StoreError::from(err)
    }
}

impl PersistenceStore for SqliteStore {
    async fn load_catalog(&self) -> StoreResult<Vec<Product>> {
        self.db
            .products()
            .list_all()
            .await
            .map_err(store_err("load_catalog"))
    }

    async fn load_product(&self, product_id: &str) -> StoreResult<Option<Product>> {
        self.db
            .products()
            .get_by_id(product_id)
            .await
            .map_err(store_err("load_product"))
    }

    async fn save_product(&self, product: &Product) -> StoreResult<()> {
        self.db
            .products()
            .save(product)
            .await
            .map_err(store_err("save_product"))
    }

    async fn delete_product(&self, product_id: &str) -> StoreResult<()> {
        match self.db.products().delete(product_id).await {
            Ok(()) | Err(DbError::NotFound { .. }) => Ok(()),
            Err(err) => Err(store_err("delete_product")(err)),
        }
    }

    async fn append_transaction(&self, record: &TransactionRecord) -> StoreResult<()> {
        self.db
            .transactions()
            .append(record)
            .await
            .map_err(store_err("append_transaction"))
    }

    async fn list_transactions(&self, limit: usize) -> StoreResult<Vec<TransactionRecord>> {
        let limit = u32::try_from(limit).unwrap_or(u32::MAX);
        self.db
            .transactions()
            .list_recent(limit)
            .await
            .map_err(store_err("list_transactions"))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use smartdesk_core::{
        Bill, CoreError, InventoryLedger, Money, NewProduct, TaxPolicy, TransactionRecorder,
    };
    use std::sync::Arc;

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

    async fn recorder_with(products: Vec<Product>) -> TransactionRecorder<SqliteStore> {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = db.store();
        for p in &products {
            store.save_product(p).await.unwrap();
        }
        let ledger = InventoryLedger::load(&store).await.unwrap();
        TransactionRecorder::new(Arc::new(ledger), store)
    }

    #[tokio::test]
    async fn test_commit_through_sqlite() {
        let a = product("A", 5);
        let a_id = a.id.clone();
        let recorder = recorder_with(vec![a]).await;

        let mut bill = Bill::open(TaxPolicy::none());
        bill.add_item(recorder.ledger(), &a_id, 3).unwrap();
        let id = recorder.commit(&mut bill).await.unwrap();

        assert_eq!(recorder.ledger().get_availability(&a_id).unwrap().quantity, 2);
        let db = recorder.store().database();
        assert_eq!(db.products().get_by_id(&a_id).await.unwrap().unwrap().quantity_on_hand, 2);
        assert!(db.transactions().get_by_id(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_closed_pool_rolls_back_ledger() {
        let a = product("A", 5);
        let a_id = a.id.clone();
        let recorder = recorder_with(vec![a]).await;

        let mut bill = Bill::open(TaxPolicy::none());
        bill.add_item(recorder.ledger(), &a_id, 3).unwrap();
        recorder.store().database().close().await;

        let err = recorder.commit(&mut bill).await.unwrap_err();
        assert!(matches!(err, CoreError::PersistenceFailure(_)));
        assert_eq!(recorder.ledger().get_availability(&a_id).unwrap().quantity, 5);
        assert!(bill.status().is_open());
    }

    #[tokio::test]
    async fn test_conflict_reloads_and_flush_keeps_stored_stock() {
        let a = product("A", 5);
        let a_id = a.id.clone();
        let recorder = recorder_with(vec![a]).await;
        let db = recorder.store().database().clone();

        // a second register on the same file sells 4
        sqlx::query("UPDATE products SET quantity_on_hand = quantity_on_hand - 4 WHERE id = ?1")
            .bind(&a_id)
            .execute(db.pool())
            .await
            .unwrap();

        let mut bill = Bill::open(TaxPolicy::none());
        bill.add_item(recorder.ledger(), &a_id, 3).unwrap();
        let err = recorder.commit(&mut bill).await.unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 1, requested: 3, .. }
        ));
        assert_eq!(recorder.ledger().get_availability(&a_id).unwrap().quantity, 1);

        recorder.ledger().flush(recorder.store()).await.unwrap();
        assert_eq!(db.products().get_by_id(&a_id).await.unwrap().unwrap().quantity_on_hand, 1);
    }

    #[tokio::test]
    async fn test_delete_missing_product_is_ok() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.store().delete_product("missing").await.is_ok());
    }
}

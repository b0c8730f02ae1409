//! # Inventory Ledger
//!
//! Current stock and price per product, owned by one instance with an
//! explicit lifecycle.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Startup          InventoryLedger::load(&store) ◄── load_catalog()     │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Running          adjust_stock / apply_batch / catalog operations      │
//! │     │             (each one atomic under the write lock)               │
//! │     │             refresh(&store, id) ◄── load_product() on conflict   │
//! │     ▼                                                                   │
//! │  Shutdown         ledger.flush(&store) ──► save_product() × N          │
//! │                   (catalog fields only, stored stock is kept)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariant
//! `quantity_on_hand >= 0` for every product before and after every call.
//! A call that would break it fails with `InsufficientStock` and leaves the
//! ledger untouched.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::store::PersistenceStore;
use crate::types::Product;
use crate::validation::validate_price;

/// Price and stock of one product at the moment of the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Availability {
    pub price: Money,
    pub quantity: i64,
}

/// The inventory ledger.
///
/// Readers and writers go through one `RwLock`, so no reader ever sees a
/// half-applied batch.
#[derive(Debug, Default)]
pub struct InventoryLedger {
    products: RwLock<HashMap<String, Product>>,
}

impl InventoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from already-validated products.
    ///
    /// Later duplicates of an id or sku are rejected.
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> CoreResult<Self> {
        let ledger = InventoryLedger::new();
        for product in products {
            ledger.add_product(product)?;
        }
        Ok(ledger)
    }

    /// Initializes the ledger from the store's catalog.
    pub async fn load<S: PersistenceStore>(store: &S) -> CoreResult<Self> {
        let products = store.load_catalog().await?;
        let ledger = InventoryLedger::from_products(products)?;
        info!(products = ledger.len(), "Inventory ledger loaded");
        Ok(ledger)
    }

    /// Replaces one product with the store's copy, or drops it if the store
    /// no longer has it.
    ///
    /// Used when the store reports that its stock differs from the ledger's.
    pub async fn refresh<S: PersistenceStore>(&self, store: &S, product_id: &str) -> CoreResult<()> {
        match store.load_product(product_id).await? {
            Some(product) => self.sync_product(product),
            None => {
                if self.write().remove(product_id).is_some() {
                    debug!(id = %product_id, "Product gone from store, dropped from ledger");
                }
                Ok(())
            }
        }
    }

    /// Installs a stored product, replacing the ledger's entry with the same id.
    pub fn sync_product(&self, product: Product) -> CoreResult<()> {
        product.validate()?;

        let mut products = self.write();
        if products
            .values()
            .any(|p| p.sku == product.sku && p.id != product.id)
        {
            return Err(CoreError::Duplicate {
                field: "sku".to_string(),
                value: product.sku,
            });
        }

        debug!(
            id = %product.id,
            quantity = product.quantity_on_hand,
            "Product synced from store"
        );
        products.insert(product.id.clone(), product);
        Ok(())
    }

    /// Writes every product's catalog fields back through the store.
    ///
    /// Stock is not written: the store keeps its own count, moved only by
    /// recorded transactions and relative adjustments.
    pub async fn flush<S: PersistenceStore>(&self, store: &S) -> CoreResult<()> {
        let snapshot = self.products();
        for product in &snapshot {
            store.save_product(product).await?;
        }
        info!(products = snapshot.len(), "Inventory ledger flushed");
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Product>> {
        self.products.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Product>> {
        self.products.write().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Stock Operations
    // =========================================================================

    /// Applies `delta` to one product's stock and returns the new quantity.
    ///
    /// ## Errors
    /// - `NotFound` if the product is unknown
    /// - `InsufficientStock` if the result would be negative
    pub fn adjust_stock(&self, product_id: &str, delta: i64) -> CoreResult<i64> {
        let mut products = self.write();
        let product = products
            .get_mut(product_id)
            .ok_or_else(|| CoreError::product_not_found(product_id))?;

        let new_quantity = checked_quantity(product, delta)?;
        product.quantity_on_hand = new_quantity;
        product.updated_at = Utc::now();

        debug!(product_id = %product_id, delta, quantity = new_quantity, "Stock adjusted");
        Ok(new_quantity)
    }

    /// Applies several deltas as one unit.
    ///
    /// Every delta is checked against the current state before any is
    /// applied; on the first failure nothing changes. Deltas for the same
    /// product are summed first.
    pub fn apply_batch(&self, deltas: &[(String, i64)]) -> CoreResult<()> {
        let mut combined: Vec<(&str, i64)> = Vec::with_capacity(deltas.len());
        for (product_id, delta) in deltas {
            match combined.iter_mut().find(|(id, _)| *id == product_id.as_str()) {
                Some((_, total)) => *total += delta,
                None => combined.push((product_id.as_str(), *delta)),
            }
        }

        let mut products = self.write();

        for (product_id, delta) in &combined {
            let product = products
                .get(*product_id)
                .ok_or_else(|| CoreError::product_not_found(*product_id))?;
            checked_quantity(product, *delta)?;
        }

        let now = Utc::now();
        for (product_id, delta) in &combined {
            if let Some(product) = products.get_mut(*product_id) {
                product.quantity_on_hand += delta;
                product.updated_at = now;
            }
        }

        debug!(products = combined.len(), "Stock batch applied");
        Ok(())
    }

    /// Current price and quantity of a product.
    pub fn get_availability(&self, product_id: &str) -> CoreResult<Availability> {
        self.read()
            .get(product_id)
            .map(|p| Availability {
                price: p.price,
                quantity: p.quantity_on_hand,
            })
            .ok_or_else(|| CoreError::product_not_found(product_id))
    }

    // =========================================================================
    // Catalog Operations
    // =========================================================================

    /// Adds a product to the catalog.
    pub fn add_product(&self, product: Product) -> CoreResult<()> {
        product.validate()?;

        let mut products = self.write();
        if products.contains_key(&product.id) {
            return Err(CoreError::Duplicate {
                field: "id".to_string(),
                value: product.id,
            });
        }
        if products.values().any(|p| p.sku == product.sku) {
            return Err(CoreError::Duplicate {
                field: "sku".to_string(),
                value: product.sku,
            });
        }

        debug!(id = %product.id, sku = %product.sku, "Product added to ledger");
        products.insert(product.id.clone(), product);
        Ok(())
    }

    /// Removes a product and returns it.
    pub fn remove_product(&self, product_id: &str) -> CoreResult<Product> {
        let removed = self
            .write()
            .remove(product_id)
            .ok_or_else(|| CoreError::product_not_found(product_id))?;
        debug!(id = %product_id, sku = %removed.sku, "Product removed from ledger");
        Ok(removed)
    }

    /// Changes a product's unit price and returns the previous one.
    ///
    /// Open bills keep the price they snapshotted.
    pub fn set_price(&self, product_id: &str, price: Money) -> CoreResult<Money> {
        validate_price(price)?;

        let mut products = self.write();
        let product = products
            .get_mut(product_id)
            .ok_or_else(|| CoreError::product_not_found(product_id))?;

        let previous = std::mem::replace(&mut product.price, price);
        product.updated_at = Utc::now();
        Ok(previous)
    }

    /// Clone of one product.
    pub fn get(&self, product_id: &str) -> CoreResult<Product> {
        self.read()
            .get(product_id)
            .cloned()
            .ok_or_else(|| CoreError::product_not_found(product_id))
    }

    pub fn find_by_sku(&self, sku: &str) -> Option<Product> {
        let sku = sku.trim();
        self.read().values().find(|p| p.sku == sku).cloned()
    }

    /// Every product, sorted by name then sku.
    pub fn products(&self) -> Vec<Product> {
        let mut all: Vec<Product> = self.read().values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.sku.cmp(&b.sku)));
        all
    }

    /// Products in `category`, sorted by name.
    pub fn products_in_category(&self, category: &str) -> Vec<Product> {
        let mut matching: Vec<Product> = self
            .read()
            .values()
            .filter(|p| p.category == category)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        matching
    }

    /// Case-insensitive substring search over sku and name, optionally
    /// within one category.
    pub fn search(&self, query: &str, category: Option<&str>, limit: usize) -> Vec<Product> {
        let needle = query.trim().to_lowercase();
        let mut hits: Vec<Product> = self
            .read()
            .values()
            .filter(|p| category.map_or(true, |c| p.category == c))
            .filter(|p| {
                needle.is_empty()
                    || format!("{} {}", p.sku, p.name).to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.name.cmp(&b.name));
        hits.truncate(limit);
        hits
    }

    /// Products whose stock is at or below `threshold`, lowest first.
    pub fn low_stock(&self, threshold: i64) -> Vec<Product> {
        let mut low: Vec<Product> = self
            .read()
            .values()
            .filter(|p| p.quantity_on_hand <= threshold)
            .cloned()
            .collect();
        low.sort_by(|a, b| {
            a.quantity_on_hand
                .cmp(&b.quantity_on_hand)
                .then_with(|| a.sku.cmp(&b.sku))
        });
        low
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

/// Quantity after `delta`, or `InsufficientStock` if it would go negative.
fn checked_quantity(product: &Product, delta: i64) -> CoreResult<i64> {
    match product.quantity_on_hand.checked_add(delta) {
        Some(q) if q >= 0 => Ok(q),
        _ => Err(CoreError::InsufficientStock {
            product_id: product.id.clone(),
            available: product.quantity_on_hand,
            requested: delta.saturating_neg(),
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Row Conversion
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SELECT ... FROM products                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductRow (sqlx::FromRow, raw columns)                                │
//! │       │                                                                 │
//! │       ▼  TryFrom: Product::validate()                                   │
//! │  Product (domain type)   or   DbError::InvalidRow                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A row edited by hand into a bad state (negative stock, blank sku) fails
//! to load instead of reaching the ledger.
//!
//! ## Stock Writes
//! `quantity_on_hand` of an existing row only moves relatively: the guarded
//! decrement in `TransactionRepository::append` and [`ProductRepository::add_stock`].
//! [`ProductRepository::save`] leaves it alone, so a register holding an
//! older count cannot overwrite another register's sale.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use smartdesk_core::{Money, Product};

const PRODUCT_COLUMNS: &str = "id, sku, name, category, hsn, unit, price_cents, \
                               quantity_on_hand, created_at, updated_at";

/// Raw `products` row.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: String,
    sku: String,
    name: String,
    category: String,
    hsn: String,
    unit: String,
    price_cents: i64,
    quantity_on_hand: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let product = Product {
            id: row.id,
            sku: row.sku,
            name: row.name,
            category: row.category,
            hsn: row.hsn,
            unit: row.unit,
            price: Money::from_cents(row.price_cents),
            quantity_on_hand: row.quantity_on_hand,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        product
            .validate()
            .map_err(|e| DbError::invalid_row(product.id.clone(), e))?;
        Ok(product)
    }
}

fn into_products(rows: Vec<ProductRow>) -> DbResult<Vec<Product>> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let all = repo.list_all().await?;
/// let restocked = repo.add_stock(&id, 12).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Every product, ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, sku"
        ))
        .fetch_all(&self.pool)
        .await?;

        into_products(rows)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Inserts a new product. A taken sku is a `UniqueViolation`.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, category, hsn, unit,
                price_cents, quantity_on_hand, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.hsn)
        .bind(&product.unit)
        .bind(product.price.cents())
        .bind(product.quantity_on_hand)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| sku_conflict(e, &product.sku))?;

        Ok(())
    }

    /// Inserts a product, or updates the catalog fields of an existing row.
    ///
    /// The stored `quantity_on_hand` of an existing row is kept.
    pub async fn save(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, sku = %product.sku, "Saving product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, category, hsn, unit,
                price_cents, quantity_on_hand, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT (id) DO UPDATE SET
                sku = excluded.sku,
                name = excluded.name,
                category = excluded.category,
                hsn = excluded.hsn,
                unit = excluded.unit,
                price_cents = excluded.price_cents,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.hsn)
        .bind(&product.unit)
        .bind(product.price.cents())
        .bind(product.quantity_on_hand)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| sku_conflict(e, &product.sku))?;

        Ok(())
    }

    /// Adds `delta` to the stored stock and returns the updated product.
    ///
    /// ## Errors
    /// - `NotFound` if no row has this id
    /// - `StockConflict` if the stored count is too low for a negative `delta`
    pub async fn add_stock(&self, id: &str, delta: i64) -> DbResult<Product> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "UPDATE products \
             SET quantity_on_hand = quantity_on_hand + ?2, updated_at = ?3 \
             WHERE id = ?1 AND quantity_on_hand + ?2 >= 0 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let product = Product::try_from(row)?;
                debug!(id = %id, delta, quantity = product.quantity_on_hand, "Stock added");
                Ok(product)
            }
            None => match self.get_by_id(id).await? {
                Some(stored) => Err(DbError::StockConflict {
                    product_id: id.to_string(),
                    available: stored.quantity_on_hand,
                    requested: delta.saturating_neg(),
                }),
                None => Err(DbError::not_found("Product", id)),
            },
        }
    }

    /// Deletes a product. Past transaction lines keep their snapshots.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        debug!(id = %id, "Product deleted");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Products with stock at or below `threshold`.
    pub async fn low_stock_count(&self, threshold: i64) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE quantity_on_hand <= ?1")
                .bind(threshold)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

/// Fills in the sku on a generic unique violation.
fn sku_conflict(err: sqlx::Error, sku: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { field, .. } if field.ends_with("sku") => {
            DbError::duplicate("sku", sku)
        }
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

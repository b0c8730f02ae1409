//! # Transaction Repository
//!
//! Append-only storage for committed transaction records.
//!
//! ## Append
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    for each line:                                                       │
//! │      UPDATE products SET quantity_on_hand = quantity_on_hand - qty      │
//! │       WHERE id = ? AND quantity_on_hand >= qty                          │
//! │      0 rows? ──► ROLLBACK, StockConflict                                │
//! │    INSERT transactions (summary columns + JSON payload)                 │
//! │    INSERT transaction_lines × N                                         │
//! │  COMMIT          (synchronous = FULL: durable when this returns)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guarded UPDATE is a compare-and-swap on stock: a second register
//! writing to the same file can cause a conflict, never a lost update.
//! There is no update or delete for transactions.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use smartdesk_core::{Money, TransactionRecord};

/// Count and revenue of transactions in a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesTotals {
    pub transaction_count: i64,
    pub revenue: Money,
}

#[derive(Debug, sqlx::FromRow)]
struct PayloadRow {
    id: String,
    payload: String,
}

impl TryFrom<PayloadRow> for TransactionRecord {
    type Error = DbError;

    fn try_from(row: PayloadRow) -> Result<Self, Self::Error> {
        serde_json::from_str(&row.payload).map_err(|e| DbError::invalid_row(row.id, e))
    }
}

fn into_records(rows: Vec<PayloadRow>) -> DbResult<Vec<TransactionRecord>> {
    rows.into_iter().map(TransactionRecord::try_from).collect()
}

/// Repository for committed transactions.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Writes `record` and applies its stock decrements in one SQL
    /// transaction.
    ///
    /// ## Errors
    /// - `StockConflict` if a product holds less than its line needs (or is
    ///   gone); nothing is written
    /// - `UniqueViolation` if the record was already appended
    pub async fn append(&self, record: &TransactionRecord) -> DbResult<()> {
        let payload = serde_json::to_string(record)
            .map_err(|e| DbError::Internal(format!("encode record: {e}")))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for line in record.lines() {
            let result = sqlx::query(
                r#"
                UPDATE products SET
                    quantity_on_hand = quantity_on_hand - ?2,
                    updated_at = ?3
                WHERE id = ?1 AND quantity_on_hand >= ?2
                "#,
            )
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(record.committed_at())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT quantity_on_hand FROM products WHERE id = ?1")
                        .bind(&line.product_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                tx.rollback()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

                return Err(DbError::StockConflict {
                    product_id: line.product_id.clone(),
                    available: available.unwrap_or(0),
                    requested: line.quantity,
                });
            }
        }

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, invoice_number, bill_id, customer_name, customer_phone,
                payment_method, subtotal_cents, tax_cents, total_cents,
                payload, committed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(record.id())
        .bind(record.invoice_number())
        .bind(record.bill_id())
        .bind(record.customer_name())
        .bind(record.customer_phone())
        .bind(record.payment_method().as_str())
        .bind(record.subtotal().cents())
        .bind(record.tax().cents())
        .bind(record.total().cents())
        .bind(&payload)
        .bind(record.committed_at())
        .execute(&mut *tx)
        .await?;

        for line in record.lines() {
            sqlx::query(
                r#"
                INSERT INTO transaction_lines (
                    id, transaction_id, product_id, sku, name,
                    quantity, unit_price_cents, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(record.id())
            .bind(&line.product_id)
            .bind(&line.sku)
            .bind(&line.name)
            .bind(line.quantity)
            .bind(line.unit_price.cents())
            .bind(line.line_total().cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            id = %record.id(),
            invoice = %record.invoice_number(),
            lines = record.lines().len(),
            "Transaction appended"
        );
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<TransactionRecord>> {
        let row: Option<PayloadRow> =
            sqlx::query_as("SELECT id, payload FROM transactions WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(TransactionRecord::try_from).transpose()
    }

    /// Newest first, at most `limit`.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<TransactionRecord>> {
        let rows: Vec<PayloadRow> = sqlx::query_as(
            "SELECT id, payload FROM transactions ORDER BY committed_at DESC, id LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed recent transactions");
        into_records(rows)
    }

    /// Every record, oldest first.
    pub async fn list_all(&self) -> DbResult<Vec<TransactionRecord>> {
        let rows: Vec<PayloadRow> =
            sqlx::query_as("SELECT id, payload FROM transactions ORDER BY committed_at, id")
                .fetch_all(&self.pool)
                .await?;

        into_records(rows)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Transactions committed at or after `since`.
    pub async fn totals_since(&self, since: DateTime<Utc>) -> DbResult<SalesTotals> {
        let (transaction_count, revenue_cents): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(total_cents), 0) FROM transactions WHERE committed_at >= ?1",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(SalesTotals {
            transaction_count,
            revenue: Money::from_cents(revenue_cents),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # smartdesk-register: Shell Boundary for SmartDesk POS
//!
//! The commands a presentation shell calls, wired to the ledger, the open
//! bill and the SQLite store.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     smartdesk-register                                  │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Shell (desktop window, terminal UI, test)                      │   │
//! │  │  commands::bill::add_to_bill(&register, id, qty)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │                                ▼                                        │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Register                                                       │   │
//! │  │  ┌──────────┐ ┌──────────────────────┐ ┌───────────┐ ┌────────┐ │   │
//! │  │  │ Database │ │ TransactionRecorder  │ │ BillState │ │ Config │ │   │
//! │  │  │ (pool)   │ │ ledger + SqliteStore │ │           │ │        │ │   │
//! │  │  └──────────┘ └──────────────────────┘ └───────────┘ └────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`commands`] - Catalog, bill, checkout and report commands
//! - [`state`] - Open bill and configuration
//! - [`error`] - [`ApiError`] for every command

pub mod commands;
pub mod error;
pub mod state;

use std::sync::Arc;

use smartdesk_core::{InventoryLedger, TransactionRecorder};
use smartdesk_db::{Database, DbConfig, SqliteStore};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::{BillState, ConfigState};

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,smartdesk=debug,sqlx=warn";

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=smartdesk_core=trace` - Trace the core only
/// - Default: [`DEFAULT_LOG_FILTER`]
///
/// Safe to call more than once; later calls leave the first subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        debug!("Tracing subscriber already installed");
    }
}

/// One till: database, ledger, recorder, the open bill and configuration.
///
/// ## Startup Sequence
/// ```text
/// 1. Create the database directory
/// 2. Connect (WAL, synchronous=FULL) and run migrations
/// 3. Load the ledger from the catalog
/// 4. Open an empty bill under the configured tax policy
/// ```
#[derive(Debug)]
pub struct Register {
    db: Database,
    recorder: TransactionRecorder<SqliteStore>,
    bill: BillState,
    config: ConfigState,
}

impl Register {
    /// Opens (or creates) the database at `config.database_path`.
    pub async fn open(config: ConfigState) -> ApiResult<Self> {
        if let Some(dir) = config.database_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                ApiError::internal(format!("Cannot create {}: {}", dir.display(), e))
            })?;
        }

        info!(path = %config.database_path.display(), "Opening register database");
        let db = Database::new(DbConfig::new(config.database_path.clone())).await?;
        Self::from_database(db, config).await
    }

    /// Builds a register over an already-connected database.
    pub async fn from_database(db: Database, config: ConfigState) -> ApiResult<Self> {
        config.tax_policy.validate()?;

        let store = db.store();
        let ledger = Arc::new(InventoryLedger::load(&store).await?);
        let recorder = TransactionRecorder::new(ledger, store);
        let bill = BillState::new(config.tax_policy.clone());

        info!(
            store = %config.store_name,
            products = recorder.ledger().len(),
            "Register ready"
        );
        Ok(Register {
            db,
            recorder,
            bill,
            config,
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn ledger(&self) -> &Arc<InventoryLedger> {
        self.recorder.ledger()
    }

    pub fn recorder(&self) -> &TransactionRecorder<SqliteStore> {
        &self.recorder
    }

    pub fn bill(&self) -> &BillState {
        &self.bill
    }

    pub fn config(&self) -> &ConfigState {
        &self.config
    }

    /// Flushes catalog fields to the store and closes the pool.
    pub async fn shutdown(self) -> ApiResult<()> {
        self.ledger().flush(self.recorder.store()).await?;
        self.db.close().await;
        info!("Register shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{bill, catalog, checkout};
    use smartdesk_core::{Money, NewProduct, TaxPolicy};
    use std::path::PathBuf;

    fn temp_config(tag: &str) -> (PathBuf, ConfigState) {
        let dir = std::env::temp_dir().join(format!("smartdesk-{tag}-{}", uuid::Uuid::new_v4()));
        let config = ConfigState {
            database_path: dir.join("nested").join("smartdesk.db"),
            tax_policy: TaxPolicy::none(),
            ..ConfigState::default()
        };
        (dir, config)
    }

    fn chocolate(quantity: i64) -> NewProduct {
        NewProduct {
            sku: "CHC0002".to_string(),
            name: "ChocolateVar 2".to_string(),
            category: "Chocolate".to_string(),
            hsn: "1023".to_string(),
            unit: "piece".to_string(),
            price: Money::from_cents(200),
            quantity_on_hand: quantity,
        }
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let (dir, config) = temp_config("reopen");

        let register = Register::open(config.clone()).await.unwrap();
        let product = catalog::create_product(&register, chocolate(5)).await.unwrap();
        bill::add_to_bill(&register, &product.id, 3).await.unwrap();
        let receipt = checkout::checkout(&register).await.unwrap();
        register.shutdown().await.unwrap();

        let reopened = Register::open(config).await.unwrap();
        assert_eq!(reopened.ledger().get_availability(&product.id).unwrap().quantity, 2);
        let record = reopened
            .database()
            .transactions()
            .get_by_id(&receipt.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.total(), Money::from_cents(600));
        reopened.shutdown().await.unwrap();

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_sale_on_second_register_survives_conflict_and_shutdown() {
        let (dir, config) = temp_config("two-tills");

        let first = Register::open(config.clone()).await.unwrap();
        let product = catalog::create_product(&first, chocolate(5)).await.unwrap();

        let second = Register::open(config.clone()).await.unwrap();
        bill::add_to_bill(&second, &product.id, 4).await.unwrap();
        checkout::checkout(&second).await.unwrap();

        // the first till still believes 5 are on hand
        bill::add_to_bill(&first, &product.id, 3).await.unwrap();
        let err = checkout::checkout(&first).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(first.ledger().get_availability(&product.id).unwrap().quantity, 1);
        assert!(bill::get_bill(&first).await.status.is_open());

        first.shutdown().await.unwrap();
        second.shutdown().await.unwrap();

        let reopened = Register::open(config).await.unwrap();
        assert_eq!(reopened.ledger().get_availability(&product.id).unwrap().quantity, 1);
        reopened.shutdown().await.unwrap();

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_restock_adds_to_stock_sold_elsewhere() {
        let (dir, config) = temp_config("restock");

        let first = Register::open(config.clone()).await.unwrap();
        let product = catalog::create_product(&first, chocolate(5)).await.unwrap();

        let second = Register::open(config.clone()).await.unwrap();
        bill::add_to_bill(&second, &product.id, 4).await.unwrap();
        checkout::checkout(&second).await.unwrap();
        second.shutdown().await.unwrap();

        let restocked = catalog::restock(&first, &product.id, 10).await.unwrap();

        assert_eq!(restocked.quantity_on_hand, 11);
        assert_eq!(first.ledger().get_availability(&product.id).unwrap().quantity, 11);
        first.shutdown().await.unwrap();

        let reopened = Register::open(config).await.unwrap();
        assert_eq!(reopened.ledger().get_availability(&product.id).unwrap().quantity, 11);
        reopened.shutdown().await.unwrap();

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[test]
    fn test_init_tracing_twice() {
        init_tracing();
        init_tracing();
    }
}

//! # smartdesk-db: SQLite Persistence for SmartDesk POS
//!
//! The durable side of the register: catalog and transaction history in a
//! local SQLite file, exposed both as repositories and as a
//! [`PersistenceStore`](smartdesk_core::PersistenceStore).
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      SmartDesk POS Data Flow                            │
//! │                                                                         │
//! │  TransactionRecorder::commit / InventoryLedger::load                   │
//! │       │                                                                 │
//! │       ▼  PersistenceStore                                               │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   smartdesk-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │◄───│ products      │    │  (embedded)  │   │   │
//! │  │   │   SqlitePool  │    │ transactions  │    │ 001_initial  │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  │   SqliteStore (store.rs)        backup.rs (JSON export)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  smartdesk.db in the per-user data directory                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use smartdesk_core::InventoryLedger;
//! use smartdesk_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("smartdesk.db")).await?;
//! let store = db.store();
//! let ledger = InventoryLedger::load(&store).await?;
//! ```

pub mod backup;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::SqliteStore;

pub use repository::product::ProductRepository;
pub use repository::transaction::{SalesTotals, TransactionRepository};

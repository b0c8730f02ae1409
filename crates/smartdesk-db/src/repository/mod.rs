//! # Repository Module
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Register command / SqliteStore                                        │
//! │       │                                                                 │
//! │       │  db.products().add_stock(&id, 12)                              │
//! │       ▼                                                                 │
//! │  ProductRepository          TransactionRepository                      │
//! │  ├── list_all / get_by_id   ├── append (guarded stock decrement)       │
//! │  ├── insert / save          ├── get_by_id / list_recent / list_all     │
//! │  ├── add_stock (relative)   └── count / totals_since                   │
//! │  └── delete / counts                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod product;
pub mod transaction;

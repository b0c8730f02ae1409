//! # State Module
//!
//! Register state, split by concern so each command locks only what it uses.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────┐          │
//! │  │  Database    │  │    BillState     │  │   ConfigState    │          │
//! │  │  (SQLite     │  │  Mutex<Bill>     │  │  store_name      │          │
//! │  │   pool)      │  │                  │  │  tax_policy      │          │
//! │  └──────────────┘  └──────────────────┘  └──────────────────┘          │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Database: internal connection pool                                  │
//! │  • BillState: tokio Mutex, held across the checkout write              │
//! │  • ConfigState: read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod bill;
mod config;

pub use bill::BillState;
pub use config::ConfigState;

//! # smartdesk-core: Transactional Core for SmartDesk POS
//!
//! Inventory bookkeeping, bill computation and the atomic commit that turns
//! a bill into a durable transaction record. Nothing in here touches a disk
//! or a socket; storage is reached through [`store::PersistenceStore`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      SmartDesk POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Presentation Shell (external)                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ smartdesk-register commands            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ smartdesk-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐   ┌───────────┐   ┌──────────────────────┐     │   │
//! │  │   │  ledger   │◄──│   bill    │   │      recorder        │     │   │
//! │  │   │ stock +   │   │ lines +   │──►│ validate, adjust,    │     │   │
//! │  │   │ price     │◄──┼───────────┼───│ persist, rollback    │     │   │
//! │  │   └───────────┘   └───────────┘   └──────────┬───────────┘     │   │
//! │  │                                              │ PersistenceStore │   │
//! │  └──────────────────────────────────────────────┼──────────────────┘   │
//! │                                                 ▼                       │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 smartdesk-db (SQLite store)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, LineItem, TransactionRecord, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`tax`] - Flat and per-category tax policies
//! - [`ledger`] - The inventory ledger
//! - [`bill`] - The bill builder
//! - [`recorder`] - The transaction recorder (commit)
//! - [`store`] - Persistence boundary trait and an in-memory store
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use smartdesk_core::money::Money;
//! use smartdesk_core::types::TaxRate;
//!
//! let price = Money::from_cents(1099);
//! let tax = price.calculate_tax(TaxRate::from_bps(1800)); // 18% GST
//! assert_eq!(tax.cents(), 198);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bill;
pub mod error;
pub mod ledger;
pub mod money;
pub mod recorder;
pub mod store;
pub mod tax;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use bill::{Bill, BillTotals};
pub use error::{CoreError, CoreResult, StoreError, StoreResult, ValidationError};
pub use ledger::{Availability, InventoryLedger};
pub use money::Money;
pub use recorder::TransactionRecorder;
pub use store::{InMemoryStore, PersistenceStore};
pub use tax::TaxPolicy;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed on a single bill.
pub const MAX_BILL_LINES: usize = 100;

/// Maximum quantity of a single product on one bill.
///
/// Guards against keying 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price a product may carry, in minor units (₹1,00,00,000.00).
///
/// At this price a full bill of [`MAX_BILL_LINES`] lines of
/// [`MAX_ITEM_QUANTITY`] units, plus tax, stays far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;

/// Stock level at or below which a product counts as low stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

//! # Register Commands
//!
//! Everything a shell can ask of the register.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── catalog.rs   ◄─── Product CRUD, restock, search, low stock
//! ├── bill.rs      ◄─── Open bill manipulation
//! ├── checkout.rs  ◄─── Commit + receipt
//! └── report.rs    ◄─── Sales summary, history, backup
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  Shell                                                                  │
//! │  ─────                                                                  │
//! │  let view = bill::add_to_bill(&register, &product_id, 3).await?;        │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  async fn add_to_bill(                                                  │
//! │      register: &Register,   ◄── ledger, bill, store, config             │
//! │      product_id: &str,                                                  │
//! │      quantity: i64,                                                     │
//! │  ) -> ApiResult<BillView>                                               │
//! │         │                                                               │
//! │         │ (serde, camelCase)                                            │
//! │         ▼                                                               │
//! │  Shell receives: BillView  or  { code, message }                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod bill;
pub mod catalog;
pub mod checkout;
pub mod report;

//! # Error Types
//!
//! Domain-specific error types for smartdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  smartdesk-core errors (this file)                                     │
//! │  ├── CoreError        - Ledger, bill and commit failures               │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── StoreError       - What a PersistenceStore reports                │
//! │                                                                         │
//! │  smartdesk-db errors (separate crate)                                  │
//! │  └── DbError          - sqlx failures, converted into StoreError       │
//! │                                                                         │
//! │  smartdesk-register errors                                             │
//! │  └── ApiError         - What the presentation shell sees               │
//! │                                                                         │
//! │  Flow: DbError → StoreError → CoreError → ApiError → Shell             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is recoverable at the shell boundary. None of them leaves the
//! ledger or the store half-updated.

use thiserror::Error;

use crate::types::BillStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product id is not in the ledger, or not on the bill.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Quantity is zero, negative, or above the per-line maximum.
    #[error("Invalid quantity {requested}: must be between 1 and {max}")]
    InvalidQuantity { requested: i64, max: i64 },

    /// Requested stock exceeds what the ledger holds.
    ///
    /// ## User Workflow
    /// ```text
    /// Bill: 6 × CHC0002
    ///      │
    ///      ▼
    /// Commit: available=5
    ///      │
    ///      ▼
    /// InsufficientStock { product_id, available: 5, requested: 6 }
    ///      │
    ///      ▼
    /// Shell shows: "Only 5 in stock"
    /// ```
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Operation on a bill that is no longer open.
    #[error("Bill {bill_id} is {status}, cannot {operation}")]
    InvalidState {
        bill_id: String,
        status: BillStatus,
        operation: String,
    },

    /// The store could not durably write; the ledger has been rolled back.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] StoreError),

    /// Commit attempted with no lines.
    #[error("Bill {0} has no items")]
    EmptyBill(String),

    /// Bill has reached the maximum number of distinct lines.
    #[error("Bill cannot have more than {max} lines")]
    BillTooLarge { max: usize },

    /// Catalog already holds a product with this id or sku.
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a product id.
    pub fn product_not_found(id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: "Product".to_string(),
            id: id.into(),
        }
    }

    /// Creates a NotFound error for a line missing from a bill.
    pub fn line_not_found(product_id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: "Bill line".to_string(),
            id: product_id.into(),
        }
    }
}

// =============================================================================
// Store Error
// =============================================================================

/// Failures reported by a [`PersistenceStore`](crate::store::PersistenceStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store cannot be reached (file missing, pool closed, ...).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A write was rejected or could not be made durable.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// A stored row failed validation when loaded.
    #[error("invalid record {id}: {reason}")]
    InvalidRecord { id: String, reason: String },

    /// The stored quantity disagrees with the ledger (another writer got there
    /// first).
    #[error("stock conflict for {product_id}: stored {available}, requested {requested}")]
    StockConflict {
        product_id: String,
        available: i64,
        requested: i64,
    },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID, malformed amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

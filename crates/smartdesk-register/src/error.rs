//! # API Error Type
//!
//! The one error type every register command returns.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Shell                        Register                                 │
//! │  ─────                        ────────                                 │
//! │                                                                         │
//! │  checkout(&register)                                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function  ──  ApiResult<T>                              │  │
//! │  │         │                                                        │  │
//! │  │         ├── CoreError::InsufficientStock ──► INSUFFICIENT_STOCK  │  │
//! │  │         ├── CoreError::InvalidState ───────► INVALID_STATE       │  │
//! │  │         ├── CoreError::PersistenceFailure ─► PERSISTENCE_FAILURE │  │
//! │  │         ├── DbError::* ────────────────────► DATABASE_ERROR ...  │  │
//! │  │         └── Success ─────────────────────────────────────────────┼─►│
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  { "code": "INSUFFICIENT_STOCK",                                        │
//! │    "message": "Insufficient stock for ...: 5 available, 6 requested" }  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every code is recoverable: the shell shows the message and the operator
//! carries on. No error leaves the ledger or the database half-written.

use serde::Serialize;
use smartdesk_core::{CoreError, ValidationError};
use smartdesk_db::DbError;
use thiserror::Error;
use ts_rs::TS;

/// Error returned from register commands.
///
/// ```json
/// { "code": "NOT_FOUND", "message": "Product not found: 3f2a..." }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
#[error("[{code:?}] {message}")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unknown product, or product not on the bill
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Zero, negative or oversized quantity
    InvalidQuantity,

    /// Requested quantity exceeds stock
    InsufficientStock,

    /// Operation on a bill that is committed or voided
    InvalidState,

    /// The store could not durably write; nothing was changed
    PersistenceFailure,

    /// Database operation failed outside a commit
    DatabaseError,

    /// Other business rule (empty bill, too many lines, duplicates)
    BusinessLogic,

    Internal,
}

/// Result alias for command functions.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::CheckViolation(msg) => {
                tracing::error!("Constraint violation: {}", msg);
                ApiError::validation("Value rejected by the database")
            }
            DbError::StockConflict {
                product_id,
                available,
                requested,
            } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!(
                    "Insufficient stock for {}: {} available, {} requested",
                    product_id, available, requested
                ),
            ),
            DbError::InvalidRow { id, reason } => {
                tracing::error!(id = %id, reason = %reason, "Invalid stored row");
                ApiError::new(ErrorCode::DatabaseError, format!("Stored record {} is invalid", id))
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::BackupFailed(e) => {
                tracing::error!("Backup failed: {}", e);
                ApiError::new(ErrorCode::Internal, format!("Backup failed: {}", e))
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            CoreError::InvalidQuantity { requested, max } => ApiError::new(
                ErrorCode::InvalidQuantity,
                format!("Quantity {} is invalid: must be between 1 and {}", requested, max),
            ),
            CoreError::InsufficientStock {
                product_id,
                available,
                requested,
            } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!(
                    "Insufficient stock for {}: {} available, {} requested",
                    product_id, available, requested
                ),
            ),
            CoreError::InvalidState {
                bill_id,
                status,
                operation,
            } => ApiError::new(
                ErrorCode::InvalidState,
                format!("Bill {} is {}, cannot {}", bill_id, status, operation),
            ),
            CoreError::PersistenceFailure(e) => {
                tracing::error!("Persistence failure: {}", e);
                ApiError::new(
                    ErrorCode::PersistenceFailure,
                    "Could not save the transaction; nothing was changed",
                )
            }
            CoreError::EmptyBill(_) => ApiError::new(ErrorCode::BusinessLogic, "The bill has no items"),
            CoreError::BillTooLarge { max } => ApiError::new(
                ErrorCode::BusinessLogic,
                format!("A bill cannot have more than {} lines", max),
            ),
            CoreError::Duplicate { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

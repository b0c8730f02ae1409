//! # Checkout Command
//!
//! Commits the open bill and hands back the receipt.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Checkout Flow                                   │
//! │                                                                         │
//! │  lock bill ──► QR/UPI? needs upi_id ──► recorder.commit_record(bill)    │
//! │                                              │                          │
//! │                      ┌───────────────────────┴──────────────┐           │
//! │                      ▼                                      ▼           │
//! │               Ok(record)                              Err(e)            │
//! │               receipt + fresh bill                    bill stays open,  │
//! │                                                       stock untouched   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use ts_rs::TS;

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::ConfigState;
use crate::Register;
use smartdesk_core::{Money, PaymentMethod, TransactionRecord};

/// Printed/displayed result of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_id: String,
    pub invoice_number: String,
    pub store_name: String,
    #[ts(as = "String")]
    pub committed_at: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub payment_method: PaymentMethod,
    pub items: Vec<ReceiptItem>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub total_display: String,
    /// `upi://pay?...` link for QR and UPI payments.
    pub upi_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItem {
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

impl Receipt {
    pub fn from_record(record: &TransactionRecord, config: &ConfigState) -> Self {
        let upi_uri = match (&config.upi_id, record.payment_method().uses_upi()) {
            (Some(upi_id), true) => Some(upi_payment_uri(upi_id, record.total())),
            _ => None,
        };

        Receipt {
            transaction_id: record.id().to_string(),
            invoice_number: record.invoice_number().to_string(),
            store_name: config.store_name.clone(),
            committed_at: record.committed_at(),
            customer_name: record.customer_name().map(str::to_string),
            customer_phone: record.customer_phone().map(str::to_string),
            payment_method: record.payment_method(),
            items: record
                .lines()
                .iter()
                .map(|line| ReceiptItem {
                    sku: line.sku.clone(),
                    name: line.name.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    line_total: line.line_total(),
                })
                .collect(),
            subtotal: record.subtotal(),
            tax: record.tax(),
            total: record.total(),
            total_display: config.format_currency(record.total()),
            upi_uri,
        }
    }
}

/// `upi://pay?pa=<id>&pn=Merchant&am=<amount>`, with the id percent-encoded.
pub fn upi_payment_uri(upi_id: &str, amount: Money) -> String {
    format!(
        "upi://pay?pa={}&pn=Merchant&am={}",
        urlencoding::encode(upi_id.trim()),
        amount
    )
}

/// Commits the open bill.
///
/// On success the register moves on to a fresh bill. On failure the bill is
/// left open and unchanged, so the operator can fix it (drop a line, retry)
/// and check out again.
///
/// ## Errors
/// - `BUSINESS_LOGIC` for an empty bill
/// - `INSUFFICIENT_STOCK` when any line exceeds stock
/// - `VALIDATION_ERROR` for QR/UPI without a configured UPI id
/// - `PERSISTENCE_FAILURE` when the store could not write
pub async fn checkout(register: &Register) -> ApiResult<Receipt> {
    let mut bill = register.bill().lock().await;

    if bill.payment_method().uses_upi() && register.config().upi_id.is_none() {
        return Err(ApiError::new(
            ErrorCode::ValidationError,
            "No UPI id configured; set SMARTDESK_UPI_ID or choose another payment method",
        ));
    }

    debug!(bill_id = %bill.id(), lines = bill.lines().len(), "checkout");
    let record = register.recorder().commit_record(&mut bill).await?;
    *bill = register.bill().fresh();

    Ok(Receipt::from_record(&record, register.config()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::bill::{add_to_bill, get_bill, remove_from_bill, set_payment_method};
    use crate::commands::testing::{id_of, register_with};
    use smartdesk_core::TaxPolicy;

    #[tokio::test]
    async fn test_checkout_commits_and_decrements() {
        let register = register_with(&[("A", 200, 5)], TaxPolicy::none()).await;
        let a = id_of(&register, "A");
        add_to_bill(&register, &a, 3).await.unwrap();
        let bill_id = get_bill(&register).await.id;

        let receipt = checkout(&register).await.unwrap();

        assert_eq!(receipt.total, Money::from_cents(600));
        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.store_name, "Smart Desk Mart");
        assert_eq!(receipt.upi_uri, None);
        assert_eq!(register.ledger().get_availability(&a).unwrap().quantity, 2);

        let stored = register.database().products().get_by_id(&a).await.unwrap().unwrap();
        assert_eq!(stored.quantity_on_hand, 2);
        let record = register
            .database()
            .transactions()
            .get_by_id(&receipt.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.bill_id(), bill_id);

        let next = get_bill(&register).await;
        assert_ne!(next.id, bill_id);
        assert!(next.lines.is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_everything() {
        let register = register_with(&[("A", 200, 5)], TaxPolicy::none()).await;
        let a = id_of(&register, "A");
        add_to_bill(&register, &a, 6).await.unwrap();

        let err = checkout(&register).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(register.ledger().get_availability(&a).unwrap().quantity, 5);
        assert_eq!(register.database().transactions().count().await.unwrap(), 0);
        let bill = get_bill(&register).await;
        assert!(bill.status.is_open());
        assert_eq!(bill.lines[0].quantity, 6);
    }

    #[tokio::test]
    async fn test_partial_failure_commits_nothing() {
        let register = register_with(&[("A", 200, 5), ("B", 100, 1)], TaxPolicy::none()).await;
        let a = id_of(&register, "A");
        let b = id_of(&register, "B");
        add_to_bill(&register, &a, 2).await.unwrap();
        add_to_bill(&register, &b, 2).await.unwrap();

        let err = checkout(&register).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(register.ledger().get_availability(&a).unwrap().quantity, 5);

        remove_from_bill(&register, &b).await.unwrap();
        checkout(&register).await.unwrap();
        assert_eq!(register.ledger().get_availability(&a).unwrap().quantity, 3);
        assert_eq!(register.ledger().get_availability(&b).unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn test_empty_bill_rejected() {
        let register = register_with(&[], TaxPolicy::none()).await;
        let err = checkout(&register).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
    }

    #[tokio::test]
    async fn test_closed_database_is_persistence_failure() {
        let register = register_with(&[("A", 200, 5)], TaxPolicy::none()).await;
        let a = id_of(&register, "A");
        add_to_bill(&register, &a, 3).await.unwrap();
        register.database().close().await;

        let err = checkout(&register).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::PersistenceFailure);
        assert_eq!(register.ledger().get_availability(&a).unwrap().quantity, 5);
        assert!(get_bill(&register).await.status.is_open());
    }

    #[tokio::test]
    async fn test_upi_checkout_returns_payment_uri() {
        let register = register_with(&[("A", 200, 5)], TaxPolicy::none()).await;
        let a = id_of(&register, "A");
        add_to_bill(&register, &a, 3).await.unwrap();
        set_payment_method(&register, "upi").await.unwrap();

        let receipt = checkout(&register).await.unwrap();

        assert_eq!(
            receipt.upi_uri.as_deref(),
            Some("upi://pay?pa=shop%40upi&pn=Merchant&am=6.00")
        );
    }

    #[test]
    fn test_upi_payment_uri_format() {
        assert_eq!(
            upi_payment_uri("merchant@bank", Money::from_cents(66)),
            "upi://pay?pa=merchant%40bank&pn=Merchant&am=0.66"
        );
    }

    #[test]
    fn test_upi_id_cannot_inject_query_parameters() {
        let uri = upi_payment_uri("shop@upi&am=0.01", Money::from_cents(600));

        assert_eq!(uri, "upi://pay?pa=shop%40upi%26am%3D0.01&pn=Merchant&am=6.00");
        assert_eq!(uri.matches("&am=").count(), 1);
    }
}

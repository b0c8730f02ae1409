//! # Bill Commands
//!
//! Edits to the register's open bill. Stock is not reserved here; it is only
//! checked and taken at checkout.

use serde::Serialize;
use tracing::{debug, info};
use ts_rs::TS;

use crate::error::{ApiError, ApiResult};
use crate::state::ConfigState;
use crate::Register;
use smartdesk_core::{Bill, BillStatus, BillTotals, LineItem, PaymentMethod};

/// The open bill as the shell displays it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillView {
    pub id: String,
    pub status: BillStatus,
    pub lines: Vec<LineItem>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub payment_method: PaymentMethod,
    pub totals: BillTotals,
    /// Total with the currency symbol, e.g. `₹6.00`.
    pub total_display: String,
}

impl BillView {
    pub fn from_bill(bill: &Bill, config: &ConfigState) -> Self {
        let totals = bill.compute_total();
        BillView {
            id: bill.id().to_string(),
            status: bill.status(),
            lines: bill.lines().to_vec(),
            customer_name: bill.customer_name().map(str::to_string),
            customer_phone: bill.customer_phone().map(str::to_string),
            payment_method: bill.payment_method(),
            totals,
            total_display: config.format_currency(totals.total),
        }
    }
}

/// Starts a new bill, voiding the current one if it has lines.
pub async fn open_bill(register: &Register) -> ApiResult<BillView> {
    let mut bill = register.bill().lock().await;
    if bill.status().is_open() && !bill.is_empty() {
        bill.void()?;
        info!(bill_id = %bill.id(), "Open bill voided by open_bill");
    }
    *bill = register.bill().fresh();

    debug!(bill_id = %bill.id(), "Bill opened");
    Ok(BillView::from_bill(&bill, register.config()))
}

pub async fn get_bill(register: &Register) -> BillView {
    let bill = register.bill().lock().await;
    BillView::from_bill(&bill, register.config())
}

/// Adds `quantity` of a product to the open bill.
pub async fn add_to_bill(register: &Register, product_id: &str, quantity: i64) -> ApiResult<BillView> {
    let mut bill = register.bill().lock().await;
    bill.add_item(register.ledger(), product_id, quantity)?;
    Ok(BillView::from_bill(&bill, register.config()))
}

/// Adds a product by sku, as a barcode scan does.
pub async fn add_sku_to_bill(register: &Register, sku: &str, quantity: i64) -> ApiResult<BillView> {
    let product = register
        .ledger()
        .find_by_sku(sku)
        .ok_or_else(|| ApiError::not_found("Product", sku.trim()))?;
    add_to_bill(register, &product.id, quantity).await
}

pub async fn remove_from_bill(register: &Register, product_id: &str) -> ApiResult<BillView> {
    let mut bill = register.bill().lock().await;
    bill.remove_item(product_id)?;
    Ok(BillView::from_bill(&bill, register.config()))
}

/// Sets a line's quantity. Zero removes the line.
pub async fn update_bill_item(
    register: &Register,
    product_id: &str,
    quantity: i64,
) -> ApiResult<BillView> {
    let mut bill = register.bill().lock().await;
    bill.set_quantity(product_id, quantity)?;
    Ok(BillView::from_bill(&bill, register.config()))
}

pub async fn set_customer(
    register: &Register,
    name: Option<&str>,
    phone: Option<&str>,
) -> ApiResult<BillView> {
    let mut bill = register.bill().lock().await;
    bill.set_customer(name, phone)?;
    Ok(BillView::from_bill(&bill, register.config()))
}

/// Sets the payment method from its name (`cash`, `upi`, `credit card`, ...).
pub async fn set_payment_method(register: &Register, method: &str) -> ApiResult<BillView> {
    let method: PaymentMethod = method.parse()?;
    let mut bill = register.bill().lock().await;
    bill.set_payment_method(method)?;
    Ok(BillView::from_bill(&bill, register.config()))
}

/// Voids the open bill and starts a fresh one. Returns the voided bill.
pub async fn void_bill(register: &Register) -> ApiResult<BillView> {
    let mut bill = register.bill().lock().await;
    bill.void()?;
    let voided = BillView::from_bill(&bill, register.config());
    *bill = register.bill().fresh();

    info!(bill_id = %voided.id, lines = voided.lines.len(), "Bill voided");
    Ok(voided)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{id_of, register_with};
    use crate::error::ErrorCode;
    use smartdesk_core::{Money, TaxPolicy};

    #[tokio::test]
    async fn test_add_and_total() {
        let register = register_with(&[("A", 200, 5)], TaxPolicy::none()).await;
        let a = id_of(&register, "A");

        let view = add_to_bill(&register, &a, 3).await.unwrap();

        assert_eq!(view.totals.subtotal, Money::from_cents(600));
        assert_eq!(view.totals.total, Money::from_cents(600));
        assert_eq!(view.total_display, "₹6.00");
        // Bills never touch stock.
        assert_eq!(register.ledger().get_availability(&a).unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn test_add_by_sku_and_update() {
        let register = register_with(&[("CHC0002", 200, 50)], TaxPolicy::none()).await;

        let view = add_sku_to_bill(&register, " CHC0002 ", 2).await.unwrap();
        assert_eq!(view.lines[0].quantity, 2);

        let id = view.lines[0].product_id.clone();
        let view = update_bill_item(&register, &id, 7).await.unwrap();
        assert_eq!(view.totals.total_quantity, 7);

        let view = update_bill_item(&register, &id, 0).await.unwrap();
        assert!(view.lines.is_empty());

        let err = add_sku_to_bill(&register, "NOPE", 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_remove_missing_line_is_not_found() {
        let register = register_with(&[("A", 200, 5)], TaxPolicy::none()).await;
        let a = id_of(&register, "A");

        let err = remove_from_bill(&register, &a).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_customer_and_payment_method() {
        let register = register_with(&[], TaxPolicy::none()).await;

        let view = set_customer(&register, Some("Asha"), Some("+919876543210")).await.unwrap();
        assert_eq!(view.customer_name.as_deref(), Some("Asha"));

        let err = set_customer(&register, None, Some("12ab")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let view = set_payment_method(&register, "Credit Card").await.unwrap();
        assert_eq!(view.payment_method, PaymentMethod::CreditCard);

        let err = set_payment_method(&register, "cheque").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_void_installs_fresh_bill() {
        let register = register_with(&[("A", 200, 5)], TaxPolicy::none()).await;
        let a = id_of(&register, "A");
        add_to_bill(&register, &a, 2).await.unwrap();

        let voided = void_bill(&register).await.unwrap();
        assert_eq!(voided.status, BillStatus::Voided);
        assert_eq!(voided.lines.len(), 1);

        let current = get_bill(&register).await;
        assert_ne!(current.id, voided.id);
        assert!(current.lines.is_empty());
        assert_eq!(register.ledger().get_availability(&a).unwrap().quantity, 5);
        assert_eq!(register.database().transactions().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_open_bill_discards_lines() {
        let register = register_with(&[("A", 200, 5)], TaxPolicy::none()).await;
        let a = id_of(&register, "A");
        let first = add_to_bill(&register, &a, 1).await.unwrap();

        let fresh = open_bill(&register).await.unwrap();

        assert_ne!(fresh.id, first.id);
        assert!(fresh.lines.is_empty());
    }
}

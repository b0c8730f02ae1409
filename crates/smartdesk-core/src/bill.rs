//! # Bill Builder
//!
//! Accumulates line items for one in-progress sale and computes its totals.
//!
//! ## Bill Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Bill::open()                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │   ┌────────┐  add_item / remove_item / set_quantity / set_customer      │
//! │   │  open  │◄──────────────────────────────────────────────┐           │
//! │   └───┬────┘───────────────────────────────────────────────┘           │
//! │       │                                                                 │
//! │       ├── TransactionRecorder::commit ──► committed  (terminal)         │
//! │       │                                                                 │
//! │       └── void() ─────────────────────► voided     (terminal)           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals are never stored. [`Bill::compute_total`] derives them from the
//! current lines every time it is called.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::ledger::InventoryLedger;
use crate::money::Money;
use crate::tax::TaxPolicy;
use crate::types::{BillStatus, LineItem, PaymentMethod};
use crate::validation::validate_phone;
use crate::{MAX_BILL_LINES, MAX_ITEM_QUANTITY};

/// Computed totals of a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub line_count: usize,
    pub total_quantity: i64,
}

/// One in-progress sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Bill {
    id: String,
    status: BillStatus,
    lines: Vec<LineItem>,
    tax_policy: TaxPolicy,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    payment_method: PaymentMethod,
    #[ts(as = "String")]
    created_at: DateTime<Utc>,
}

impl Bill {
    /// Starts an empty, open bill.
    pub fn open(tax_policy: TaxPolicy) -> Self {
        Bill {
            id: Uuid::new_v4().to_string(),
            status: BillStatus::Open,
            lines: Vec::new(),
            tax_policy,
            customer_name: None,
            customer_phone: None,
            payment_method: PaymentMethod::default(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> BillStatus {
        self.status
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn tax_policy(&self) -> &TaxPolicy {
        &self.tax_policy
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    pub fn customer_phone(&self) -> Option<&str> {
        self.customer_phone.as_deref()
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line for `product_id`, if the product is on the bill.
    pub fn line(&self, product_id: &str) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    // =========================================================================
    // Mutations (open bills only)
    // =========================================================================

    /// Adds `quantity` of a product, snapshotting its current ledger price.
    ///
    /// A product already on the bill has its quantity increased; the price
    /// captured by the first add is kept. Stock is not checked here, only at
    /// commit.
    ///
    /// ## Errors
    /// - `InvalidState` if the bill is not open
    /// - `InvalidQuantity` if `quantity` is not in `1..=MAX_ITEM_QUANTITY`,
    ///   or the merged quantity would exceed it
    /// - `NotFound` if the ledger does not know the product
    /// - `BillTooLarge` if a new line would exceed `MAX_BILL_LINES`
    pub fn add_item(
        &mut self,
        ledger: &InventoryLedger,
        product_id: &str,
        quantity: i64,
    ) -> CoreResult<()> {
        self.ensure_open("add items")?;
        check_quantity(quantity)?;

        let product = ledger.get(product_id)?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            let merged = line.quantity + quantity;
            check_quantity(merged)?;
            line.quantity = merged;
            debug!(bill_id = %self.id, sku = %line.sku, quantity = merged, "Bill line merged");
            return Ok(());
        }

        if self.lines.len() >= MAX_BILL_LINES {
            return Err(CoreError::BillTooLarge {
                max: MAX_BILL_LINES,
            });
        }

        debug!(bill_id = %self.id, sku = %product.sku, quantity, "Bill line added");
        self.lines.push(LineItem::from_product(&product, quantity));
        Ok(())
    }

    /// Removes a product's line and returns it.
    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<LineItem> {
        self.ensure_open("remove items")?;

        let index = self
            .lines
            .iter()
            .position(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::line_not_found(product_id))?;

        let removed = self.lines.remove(index);
        debug!(bill_id = %self.id, sku = %removed.sku, "Bill line removed");
        Ok(removed)
    }

    /// Replaces a line's quantity. Zero removes the line.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        self.ensure_open("change quantities")?;

        if quantity == 0 {
            self.remove_item(product_id)?;
            return Ok(());
        }
        check_quantity(quantity)?;

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::line_not_found(product_id))?;
        line.quantity = quantity;
        Ok(())
    }

    /// Attaches customer details. Blank values clear the field.
    pub fn set_customer(&mut self, name: Option<&str>, phone: Option<&str>) -> CoreResult<()> {
        self.ensure_open("set the customer")?;

        let name = name.map(str::trim).filter(|n| !n.is_empty());
        let phone = phone.map(str::trim).filter(|p| !p.is_empty());
        if let Some(phone) = phone {
            validate_phone(phone)?;
        }

        self.customer_name = name.map(str::to_string);
        self.customer_phone = phone.map(str::to_string);
        Ok(())
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) -> CoreResult<()> {
        self.ensure_open("change the payment method")?;
        self.payment_method = method;
        Ok(())
    }

    /// Discards the bill. Nothing reaches the ledger or the store.
    pub fn void(&mut self) -> CoreResult<()> {
        self.ensure_open("void")?;
        self.status = BillStatus::Voided;
        debug!(bill_id = %self.id, lines = self.lines.len(), "Bill voided");
        Ok(())
    }

    // =========================================================================
    // Totals
    // =========================================================================

    /// Subtotal, tax and total of the current lines.
    ///
    /// ```text
    /// subtotal = Σ line.quantity × line.unit_price
    /// tax      = tax_policy.tax_for(lines)
    /// total    = subtotal + tax
    /// ```
    pub fn compute_total(&self) -> BillTotals {
        let subtotal: Money = self.lines.iter().map(LineItem::line_total).sum();
        let tax = self.tax_policy.tax_for(&self.lines);

        BillTotals {
            subtotal,
            tax,
            total: subtotal + tax,
            line_count: self.lines.len(),
            total_quantity: self.lines.iter().map(|l| l.quantity).sum(),
        }
    }

    // =========================================================================
    // Internal
    // =========================================================================

    pub(crate) fn ensure_open(&self, operation: &str) -> CoreResult<()> {
        if self.status.is_open() {
            return Ok(());
        }
        Err(CoreError::InvalidState {
            bill_id: self.id.clone(),
            status: self.status,
            operation: operation.to_string(),
        })
    }

    pub(crate) fn mark_committed(&mut self) {
        self.status = BillStatus::Committed;
    }
}

fn check_quantity(quantity: i64) -> CoreResult<()> {
    if quantity <= 0 || quantity > MAX_ITEM_QUANTITY {
        return Err(CoreError::InvalidQuantity {
            requested: quantity,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewProduct, Product, TaxRate};
    use crate::MAX_PRICE_CENTS;

    fn product(sku: &str, category: &str, price_cents: i64, quantity: i64) -> Product {
        Product::create(NewProduct {
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            category: category.to_string(),
            hsn: "1023".to_string(),
            unit: "piece".to_string(),
            price: Money::from_cents(price_cents),
            quantity_on_hand: quantity,
        })
        .unwrap()
    }

    fn ledger_with_a() -> (InventoryLedger, String) {
        let a = product("A", "Chocolate", 200, 5);
        let id = a.id.clone();
        (InventoryLedger::from_products(vec![a]).unwrap(), id)
    }

    #[test]
    fn test_add_item_and_subtotal() {
        let (ledger, a) = ledger_with_a();
        let mut bill = Bill::open(TaxPolicy::none());

        bill.add_item(&ledger, &a, 3).unwrap();

        let totals = bill.compute_total();
        assert_eq!(totals.subtotal.to_string(), "6.00");
        assert_eq!(totals.total.cents(), 600);
        assert_eq!(totals.line_count, 1);
    }

    #[test]
    fn test_add_item_does_not_check_stock() {
        let (ledger, a) = ledger_with_a();
        let mut bill = Bill::open(TaxPolicy::none());

        bill.add_item(&ledger, &a, 6).unwrap();
        assert_eq!(bill.line(&a).unwrap().quantity, 6);
        assert_eq!(ledger.get_availability(&a).unwrap().quantity, 5);
    }

    #[test]
    fn test_add_item_rejects_bad_quantity_and_unknown_product() {
        let (ledger, a) = ledger_with_a();
        let mut bill = Bill::open(TaxPolicy::none());

        assert!(matches!(
            bill.add_item(&ledger, &a, 0),
            Err(CoreError::InvalidQuantity { requested: 0, .. })
        ));
        assert!(matches!(
            bill.add_item(&ledger, &a, -2),
            Err(CoreError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            bill.add_item(&ledger, &a, MAX_ITEM_QUANTITY + 1),
            Err(CoreError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            bill.add_item(&ledger, "ghost", 1),
            Err(CoreError::NotFound { .. })
        ));
        assert!(bill.is_empty());
    }

    #[test]
    fn test_merge_keeps_first_price_snapshot() {
        let (ledger, a) = ledger_with_a();
        let mut bill = Bill::open(TaxPolicy::none());

        bill.add_item(&ledger, &a, 1).unwrap();
        ledger.set_price(&a, Money::from_cents(999)).unwrap();
        bill.add_item(&ledger, &a, 2).unwrap();

        assert_eq!(bill.lines().len(), 1);
        let line = bill.line(&a).unwrap();
        assert_eq!(line.quantity, 3);
        assert_eq!(line.unit_price.cents(), 200);

        assert!(matches!(
            bill.add_item(&ledger, &a, MAX_ITEM_QUANTITY),
            Err(CoreError::InvalidQuantity { .. })
        ));
        assert_eq!(bill.line(&a).unwrap().quantity, 3);
    }

    #[test]
    fn test_remove_item_never_added_is_not_found() {
        let (ledger, a) = ledger_with_a();
        let mut bill = Bill::open(TaxPolicy::none());

        assert!(matches!(
            bill.remove_item(&a),
            Err(CoreError::NotFound { .. })
        ));

        bill.add_item(&ledger, &a, 2).unwrap();
        let removed = bill.remove_item(&a).unwrap();
        assert_eq!(removed.quantity, 2);
        assert!(bill.is_empty());
    }

    #[test]
    fn test_set_quantity() {
        let (ledger, a) = ledger_with_a();
        let mut bill = Bill::open(TaxPolicy::none());
        bill.add_item(&ledger, &a, 2).unwrap();

        bill.set_quantity(&a, 4).unwrap();
        assert_eq!(bill.line(&a).unwrap().quantity, 4);

        bill.set_quantity(&a, 0).unwrap();
        assert!(bill.is_empty());
        assert!(bill.set_quantity(&a, 1).is_err());
    }

    #[test]
    fn test_compute_total_is_idempotent() {
        let choc = product("CHC0001", "Chocolate", 1099, 10);
        let milk = product("MLK0001", "Dairy & Eggs", 4500, 10);
        let (c, m) = (choc.id.clone(), milk.id.clone());
        let ledger = InventoryLedger::from_products(vec![choc, milk]).unwrap();

        let mut bill = Bill::open(TaxPolicy::gst_default());
        bill.add_item(&ledger, &c, 2).unwrap();
        bill.add_item(&ledger, &m, 1).unwrap();

        let first = bill.compute_total();
        let second = bill.compute_total();
        assert_eq!(first, second);

        // 21.98 at 18% = 3.9564 → 3.96; 45.00 at 5% = 2.25
        assert_eq!(first.subtotal.cents(), 6698);
        assert_eq!(first.tax.cents(), 396 + 225);
        assert_eq!(first.total.cents(), 6698 + 621);
        assert_eq!(first.total_quantity, 3);
    }

    #[test]
    fn test_flat_policy_totals() {
        let (ledger, a) = ledger_with_a();
        let mut bill = Bill::open(TaxPolicy::flat(TaxRate::from_percent(10)));
        bill.add_item(&ledger, &a, 3).unwrap();

        let totals = bill.compute_total();
        assert_eq!(totals.tax.cents(), 60);
        assert_eq!(totals.total.cents(), 660);
    }

    #[test]
    fn test_void_is_terminal() {
        let (ledger, a) = ledger_with_a();
        let mut bill = Bill::open(TaxPolicy::none());
        bill.add_item(&ledger, &a, 1).unwrap();

        bill.void().unwrap();
        assert_eq!(bill.status(), BillStatus::Voided);
        assert_eq!(ledger.get_availability(&a).unwrap().quantity, 5);

        assert!(matches!(
            bill.add_item(&ledger, &a, 1),
            Err(CoreError::InvalidState { status: BillStatus::Voided, .. })
        ));
        assert!(matches!(bill.void(), Err(CoreError::InvalidState { .. })));
    }

    #[test]
    fn test_set_customer() {
        let mut bill = Bill::open(TaxPolicy::none());

        bill.set_customer(Some(" Asha "), Some("9876543210")).unwrap();
        assert_eq!(bill.customer_name(), Some("Asha"));
        assert_eq!(bill.customer_phone(), Some("9876543210"));

        assert!(bill.set_customer(None, Some("12ab")).is_err());
        assert_eq!(bill.customer_phone(), Some("9876543210"));

        bill.set_customer(Some(""), None).unwrap();
        assert!(bill.customer_name().is_none());

        bill.set_payment_method(PaymentMethod::Upi).unwrap();
        assert_eq!(bill.payment_method(), PaymentMethod::Upi);
    }

    #[test]
    fn test_bill_line_limit() {
        let products: Vec<Product> = (0..=MAX_BILL_LINES)
            .map(|i| product(&format!("SKU{i:05}"), "Chocolate", 100, 10))
            .collect();
        let ids: Vec<String> = products.iter().map(|p| p.id.clone()).collect();
        let ledger = InventoryLedger::from_products(products).unwrap();

        let mut bill = Bill::open(TaxPolicy::none());
        for id in &ids[..MAX_BILL_LINES] {
            bill.add_item(&ledger, id, 1).unwrap();
        }
        assert!(matches!(
            bill.add_item(&ledger, &ids[MAX_BILL_LINES], 1),
            Err(CoreError::BillTooLarge { .. })
        ));
        // merging into an existing line is still allowed
        bill.add_item(&ledger, &ids[0], 1).unwrap();
    }

    #[test]
    fn test_largest_bill_totals_without_overflow() {
        let products: Vec<Product> = (0..MAX_BILL_LINES)
            .map(|i| product(&format!("SKU{i:05}"), "Chocolate", MAX_PRICE_CENTS, MAX_ITEM_QUANTITY))
            .collect();
        let ids: Vec<String> = products.iter().map(|p| p.id.clone()).collect();
        let ledger = InventoryLedger::from_products(products).unwrap();

        let mut bill = Bill::open(TaxPolicy::flat(TaxRate::from_percent(28)));
        for id in &ids {
            bill.add_item(&ledger, id, MAX_ITEM_QUANTITY).unwrap();
        }

        let subtotal = MAX_PRICE_CENTS * MAX_ITEM_QUANTITY * MAX_BILL_LINES as i64;
        let totals = bill.compute_total();
        assert_eq!(totals.subtotal.cents(), subtotal);
        assert_eq!(totals.tax.cents(), subtotal / 100 * 28);
        assert_eq!(totals.total.cents(), subtotal + subtotal / 100 * 28);
    }
}

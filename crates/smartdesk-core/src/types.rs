//! # Domain Types
//!
//! Core domain types used throughout SmartDesk POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌──────────────────────┐  │
//! │  │    Product      │   │    LineItem     │   │  TransactionRecord   │  │
//! │  │  ─────────────  │   │  ─────────────  │   │  ──────────────────  │  │
//! │  │  id (UUID)      │──►│  product_id     │──►│  id (UUID)           │  │
//! │  │  sku (business) │   │  unit_price     │   │  invoice_number      │  │
//! │  │  price          │   │   (snapshot)    │   │  lines (snapshot)    │  │
//! │  │  qty on hand    │   │  quantity       │   │  totals, timestamp   │  │
//! │  └─────────────────┘   └─────────────────┘   └──────────────────────┘  │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │    TaxRate      │   │   BillStatus    │                             │
//! │  │  bps (u32)      │   │  Open           │                             │
//! │  │  1800 = 18%     │   │  Committed      │                             │
//! │  └─────────────────┘   │  Voided         │                             │
//! │                        └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Products carry an immutable `id` (UUID v4) used by the ledger and bills,
//! and a human-facing `sku` used for lookup and receipts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate in basis points (1 bps = 0.01%).
///
/// 1800 bps = 18% (the GST slab for most packaged goods).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a whole percentage (GST slabs are whole).
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        TaxRate(pct * 100)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
///
/// Only the [`InventoryLedger`](crate::ledger::InventoryLedger) changes
/// `quantity_on_hand`; everything else sees clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier (e.g. `SKU10004`, `CHC0042`).
    pub sku: String,

    /// Display name shown to the operator and on the invoice.
    pub name: String,

    /// Catalog category; selects the GST slab under a category tax table.
    pub category: String,

    /// HSN classification code printed on GST invoices.
    pub hsn: String,

    /// Selling unit (piece, kg, litre, gram).
    pub unit: String,

    /// Unit price (MRP).
    pub price: Money,

    /// Current stock. Never negative.
    pub quantity_on_hand: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Builds a product from operator input, assigning id and timestamps.
    pub fn create(new: NewProduct) -> Result<Product, ValidationError> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            sku: new.sku.trim().to_string(),
            name: new.name.trim().to_string(),
            category: new.category.trim().to_string(),
            hsn: new.hsn.trim().to_string(),
            unit: new.unit.trim().to_string(),
            price: new.price,
            quantity_on_hand: new.quantity_on_hand,
            created_at: now,
            updated_at: now,
        };
        product.validate()?;
        Ok(product)
    }

    /// Checks every field rule. Also applied to rows loaded from storage.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_uuid(&self.id)?;
        validation::validate_sku(&self.sku)?;
        validation::validate_product_name(&self.name)?;
        validation::validate_price(self.price)?;
        validation::validate_stock(self.quantity_on_hand)?;
        Ok(())
    }
}

/// Operator input for a new catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub hsn: String,
    pub unit: String,
    pub price: Money,
    pub quantity_on_hand: i64,
}

// =============================================================================
// Bill Status
// =============================================================================

/// Lifecycle state of a bill.
///
/// ```text
/// open ──add/remove──► open
/// open ──commit──────► committed   (terminal)
/// open ──void────────► voided      (terminal)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    #[default]
    Open,
    Committed,
    Voided,
}

impl BillStatus {
    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self, BillStatus::Open)
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BillStatus::Open => "open",
            BillStatus::Committed => "committed",
            BillStatus::Voided => "voided",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Scan-to-pay QR code.
    Qr,
    CreditCard,
    DebitCard,
    /// Cash on hand.
    #[default]
    Cash,
    Upi,
}

impl PaymentMethod {
    /// Whether checkout should hand back a UPI payment URI.
    pub fn uses_upi(&self) -> bool {
        matches!(self, PaymentMethod::Qr | PaymentMethod::Upi)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Qr => "qr",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Upi => "upi",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the stored form and the labels a shell typically shows.
impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "qr" => Ok(PaymentMethod::Qr),
            "credit_card" | "credit" => Ok(PaymentMethod::CreditCard),
            "debit_card" | "debit" => Ok(PaymentMethod::DebitCard),
            "cash" | "cash_on_hand" => Ok(PaymentMethod::Cash),
            "upi" => Ok(PaymentMethod::Upi),
            _ => Err(ValidationError::InvalidFormat {
                field: "payment method".to_string(),
                reason: format!("unknown method '{}'", s.trim()),
            }),
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One product-quantity-price entry on a bill.
///
/// Uses the snapshot pattern: sku, name, category and unit price are frozen
/// when the line is first added, so a later catalog price change does not
/// touch an open bill or a committed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub category: String,
    pub unit_price: Money,
    pub quantity: i64,
}

impl LineItem {
    /// Snapshots `product` at its current price.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        LineItem {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            unit_price: product.price,
            quantity,
        }
    }

    /// Unit price × quantity, before tax.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Transaction Record
// =============================================================================

/// Immutable snapshot of a committed bill.
///
/// Fields are private: a record is built once by the
/// [`TransactionRecorder`](crate::recorder::TransactionRecorder) and
/// afterwards only read or deserialized back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionRecord {
    id: String,
    invoice_number: String,
    bill_id: String,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    payment_method: PaymentMethod,
    lines: Vec<LineItem>,
    subtotal: Money,
    tax: Money,
    total: Money,
    #[ts(as = "String")]
    committed_at: DateTime<Utc>,
}

/// Everything the recorder captures from a bill at commit time.
#[derive(Debug, Clone)]
pub(crate) struct RecordSnapshot {
    pub bill_id: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub payment_method: PaymentMethod,
    pub lines: Vec<LineItem>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

impl TransactionRecord {
    pub(crate) fn new(snapshot: RecordSnapshot) -> Self {
        let id = Uuid::new_v4();
        let committed_at = Utc::now();
        let invoice_number = generate_invoice_number(&id, committed_at);

        TransactionRecord {
            id: id.to_string(),
            invoice_number,
            bill_id: snapshot.bill_id,
            customer_name: snapshot.customer_name,
            customer_phone: snapshot.customer_phone,
            payment_method: snapshot.payment_method,
            lines: snapshot.lines,
            subtotal: snapshot.subtotal,
            tax: snapshot.tax,
            total: snapshot.total,
            committed_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn invoice_number(&self) -> &str {
        &self.invoice_number
    }

    pub fn bill_id(&self) -> &str {
        &self.bill_id
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

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn tax(&self) -> Money {
        self.tax
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn committed_at(&self) -> DateTime<Utc> {
        self.committed_at
    }

    /// Total units sold of `product_id` in this record.
    pub fn quantity_of(&self, product_id: &str) -> i64 {
        self.lines
            .iter()
            .filter(|l| l.product_id == product_id)
            .map(|l| l.quantity)
            .sum()
    }
}

/// Invoice number in format `INV<yyyymmddHHMMSS>-<XXXXXX>`.
///
/// The suffix comes from the record's UUID so two commits in the same second
/// still get distinct numbers.
fn generate_invoice_number(id: &Uuid, at: DateTime<Utc>) -> String {
    let simple = id.simple().to_string();
    format!(
        "INV{}-{}",
        at.format("%Y%m%d%H%M%S"),
        simple[..6].to_uppercase()
    )
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product() -> NewProduct {
        NewProduct {
            sku: "CHC0002".to_string(),
            name: "ChocolateVar 2".to_string(),
            category: "Chocolate".to_string(),
            hsn: "1023".to_string(),
            unit: "piece".to_string(),
            price: Money::from_cents(200),
            quantity_on_hand: 5,
        }
    }

    #[test]
    fn test_tax_rate_conversions() {
        let rate = TaxRate::from_percent(18);
        assert_eq!(rate.bps(), 1800);
        assert!((rate.percentage() - 18.0).abs() < 0.001);
        assert!(TaxRate::default().is_zero());
    }

    #[test]
    fn test_product_create_validates() {
        let product = Product::create(new_product()).unwrap();
        assert_eq!(product.sku, "CHC0002");
        assert!(Uuid::parse_str(&product.id).is_ok());

        let mut bad = new_product();
        bad.quantity_on_hand = -1;
        assert!(Product::create(bad).is_err());

        let mut bad = new_product();
        bad.price = Money::from_cents(-1);
        assert!(Product::create(bad).is_err());

        let mut bad = new_product();
        bad.price = Money::from_cents(i64::MAX / 2 + 1);
        assert!(Product::create(bad).is_err());
    }

    #[test]
    fn test_bill_status_display_and_default() {
        assert_eq!(BillStatus::default(), BillStatus::Open);
        assert_eq!(BillStatus::Voided.to_string(), "voided");
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("Cash on hand".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("Credit Card".parse::<PaymentMethod>().unwrap(), PaymentMethod::CreditCard);
        assert_eq!("UPI".parse::<PaymentMethod>().unwrap(), PaymentMethod::Upi);
        assert!("cheque".parse::<PaymentMethod>().is_err());
        assert!(PaymentMethod::Qr.uses_upi());
        assert!(!PaymentMethod::DebitCard.uses_upi());
    }

    #[test]
    fn test_line_item_snapshot() {
        let mut product = Product::create(new_product()).unwrap();
        let line = LineItem::from_product(&product, 3);
        product.price = Money::from_cents(999);

        assert_eq!(line.unit_price.cents(), 200);
        assert_eq!(line.line_total().cents(), 600);
    }

    #[test]
    fn test_invoice_number_format() {
        let id = Uuid::parse_str("a1b2c3d4-0000-4000-8000-000000000000").unwrap();
        let at = DateTime::parse_from_rfc3339("2026-01-31T09:05:07Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(generate_invoice_number(&id, at), "INV20260131090507-A1B2C3");
    }
}

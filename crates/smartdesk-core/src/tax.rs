//! # Tax Policy
//!
//! How a bill's subtotal turns into tax.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Flat                         │  CategoryTable (GST slabs)              │
//! │  ───────────────────────────  │  ─────────────────────────────────────  │
//! │  tax = tax(subtotal, rate)    │  group line totals by category rate     │
//! │                               │  tax = Σ tax(group subtotal, rate)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rounding happens once per distinct rate, never per line, so a bill of
//! many cheap items does not accumulate rounding error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{LineItem, TaxRate};
use crate::validation::validate_tax_rate_bps;

/// GST slab (whole percent) per catalog category.
pub const GST_CATEGORY_RATES: &[(&str, u32)] = &[
    ("Fresh Produce", 0),
    ("Dairy & Eggs", 5),
    ("Breads & Buns", 5),
    ("Pastries, Cakes & Desserts", 18),
    ("Beverages", 12),
    ("Snacks & Packaged Foods", 12),
    ("Frozen Foods", 12),
    ("Pulses, Rice & Grains", 0),
    ("Oils & Masalas", 5),
    ("Personal Care", 18),
    ("Household Essentials", 18),
    ("Stationery & Office Supplies", 12),
    ("Baby Care", 12),
    ("Pet Supplies", 12),
    ("Electronics & Accessories", 18),
    ("Home Appliances", 18),
    ("Furniture & Home Décor", 18),
    ("Gardening & Outdoor", 12),
    ("Automotive & Tools", 18),
    ("Health & Wellness", 12),
    ("Sports & Fitness", 18),
    ("Home Safety & Security Systems", 18),
    ("Chocolate", 18),
];

/// Slab applied to categories missing from the table.
pub const GST_DEFAULT_PERCENT: u32 = 18;

/// Configurable tax rule for a bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaxPolicy {
    /// One rate for every line.
    Flat { rate: TaxRate },
    /// Rate looked up by the line's category snapshot.
    CategoryTable {
        rates: BTreeMap<String, TaxRate>,
        default: TaxRate,
    },
}

impl TaxPolicy {
    pub fn flat(rate: TaxRate) -> Self {
        TaxPolicy::Flat { rate }
    }

    /// A tax-free policy.
    pub fn none() -> Self {
        TaxPolicy::flat(TaxRate::zero())
    }

    pub fn category_table<I, S>(rates: I, default: TaxRate) -> Self
    where
        I: IntoIterator<Item = (S, TaxRate)>,
        S: Into<String>,
    {
        TaxPolicy::CategoryTable {
            rates: rates.into_iter().map(|(c, r)| (c.into(), r)).collect(),
            default,
        }
    }

    /// The GST category slabs from [`GST_CATEGORY_RATES`].
    pub fn gst_default() -> Self {
        TaxPolicy::category_table(
            GST_CATEGORY_RATES
                .iter()
                .map(|(category, pct)| (*category, TaxRate::from_percent(*pct))),
            TaxRate::from_percent(GST_DEFAULT_PERCENT),
        )
    }

    /// Rate applied to a line in `category`.
    pub fn rate_for(&self, category: &str) -> TaxRate {
        match self {
            TaxPolicy::Flat { rate } => *rate,
            TaxPolicy::CategoryTable { rates, default } => {
                rates.get(category).copied().unwrap_or(*default)
            }
        }
    }

    /// Tax owed on `lines`. Pure: same lines, same answer.
    pub fn tax_for(&self, lines: &[LineItem]) -> Money {
        let mut by_rate: BTreeMap<TaxRate, Money> = BTreeMap::new();
        for line in lines {
            *by_rate.entry(self.rate_for(&line.category)).or_default() += line.line_total();
        }

        by_rate
            .into_iter()
            .map(|(rate, taxable)| taxable.calculate_tax(rate))
            .sum()
    }

    /// Rejects rates above 100%.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            TaxPolicy::Flat { rate } => validate_tax_rate_bps(rate.bps()),
            TaxPolicy::CategoryTable { rates, default } => {
                validate_tax_rate_bps(default.bps())?;
                rates
                    .values()
                    .try_for_each(|rate| validate_tax_rate_bps(rate.bps()))
            }
        }
    }
}

impl Default for TaxPolicy {
    fn default() -> Self {
        TaxPolicy::gst_default()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(category: &str, unit_cents: i64, quantity: i64) -> LineItem {
        LineItem {
            product_id: format!("p-{category}-{unit_cents}"),
            sku: "SKU1".to_string(),
            name: "Item".to_string(),
            category: category.to_string(),
            unit_price: Money::from_cents(unit_cents),
            quantity,
        }
    }

    #[test]
    fn test_flat_tax_is_tax_of_subtotal() {
        let policy = TaxPolicy::flat(TaxRate::from_bps(825));
        // 3 × 0.35 = 1.05 subtotal; 1.05 × 8.25% = 0.0866 → 0.09
        let lines = vec![line("A", 35, 1), line("B", 35, 1), line("C", 35, 1)];
        assert_eq!(policy.tax_for(&lines).cents(), 9);
    }

    #[test]
    fn test_category_table_groups_by_rate() {
        let policy = TaxPolicy::gst_default();
        let lines = vec![
            line("Fresh Produce", 1000, 2), // 0%
            line("Dairy & Eggs", 1000, 1),  // 5% of 10.00 = 0.50
            line("Chocolate", 500, 2),      // 18% of 10.00 = 1.80
            line("Unlisted", 1000, 1),      // default 18% of 10.00 = 1.80
        ];
        // Chocolate and Unlisted share the 18% group: 20.00 × 18% = 3.60
        assert_eq!(policy.tax_for(&lines).cents(), 50 + 360);
    }

    #[test]
    fn test_rate_lookup() {
        let policy = TaxPolicy::gst_default();
        assert_eq!(policy.rate_for("Beverages"), TaxRate::from_percent(12));
        assert_eq!(policy.rate_for("Nope"), TaxRate::from_percent(18));
        assert_eq!(TaxPolicy::none().rate_for("Beverages"), TaxRate::zero());
    }

    #[test]
    fn test_validate() {
        assert!(TaxPolicy::gst_default().validate().is_ok());
        assert!(TaxPolicy::flat(TaxRate::from_bps(10001)).validate().is_err());
        let bad = TaxPolicy::category_table([("X", TaxRate::from_bps(20000))], TaxRate::zero());
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_empty_lines_no_tax() {
        assert!(TaxPolicy::gst_default().tax_for(&[]).is_zero());
    }
}

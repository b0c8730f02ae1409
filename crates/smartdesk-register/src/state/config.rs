//! # Configuration State
//!
//! Register configuration loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`SMARTDESK_*`)
//! 2. Defaults (this file)
//!
//! Read-only after initialization, so no lock.

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Serialize;
use smartdesk_core::validation::validate_tax_rate_bps;
use smartdesk_core::{Money, TaxPolicy, TaxRate, DEFAULT_LOW_STOCK_THRESHOLD};
use tracing::warn;

/// Register configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// Store name (printed on receipts)
    pub store_name: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Tax rule for new bills.
    pub tax_policy: TaxPolicy,

    /// Merchant UPI id. QR/UPI checkouts need it.
    pub upi_id: Option<String>,

    /// Stock at or below this counts as low.
    pub low_stock_threshold: i64,

    /// Where `backup` writes its JSON files.
    pub backup_dir: PathBuf,
}

impl Default for ConfigState {
    /// Returns the default configuration.
    ///
    /// ## Default Values
    /// - Store: "Smart Desk Mart"
    /// - Currency: ₹
    /// - Tax: the GST category table
    /// - Low stock: 5 or fewer
    /// - Database: `smartdesk.db` in the per-user data directory
    fn default() -> Self {
        let data_dir = default_data_dir();
        ConfigState {
            database_path: data_dir.join("smartdesk.db"),
            store_name: "Smart Desk Mart".to_string(),
            currency_symbol: "₹".to_string(),
            tax_policy: TaxPolicy::gst_default(),
            upi_id: None,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            backup_dir: data_dir.join("backups"),
        }
    }
}

impl ConfigState {
    /// Creates a ConfigState from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `SMARTDESK_DB_PATH`: Database file
    /// - `SMARTDESK_STORE_NAME`: Store name
    /// - `SMARTDESK_TAX_RATE`: Flat tax percent (e.g. "18" or "8.25"),
    ///   replacing the GST table
    /// - `SMARTDESK_UPI_ID`: Merchant UPI id
    /// - `SMARTDESK_LOW_STOCK`: Low-stock threshold
    /// - `SMARTDESK_BACKUP_DIR`: Backup directory
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ConfigState::default();

        if let Some(path) = lookup("SMARTDESK_DB_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(store_name) = lookup("SMARTDESK_STORE_NAME") {
            config.store_name = store_name;
        }

        if let Some(rate) = lookup("SMARTDESK_TAX_RATE") {
            match parse_tax_percent(&rate) {
                Some(rate) => config.tax_policy = TaxPolicy::flat(rate),
                None => warn!(value = %rate, "Ignoring invalid SMARTDESK_TAX_RATE"),
            }
        }

        if let Some(upi_id) = lookup("SMARTDESK_UPI_ID") {
            let upi_id = upi_id.trim();
            config.upi_id = (!upi_id.is_empty()).then(|| upi_id.to_string());
        }

        if let Some(threshold) = lookup("SMARTDESK_LOW_STOCK") {
            match threshold.trim().parse::<i64>() {
                Ok(value) if value >= 0 => config.low_stock_threshold = value,
                _ => warn!(value = %threshold, "Ignoring invalid SMARTDESK_LOW_STOCK"),
            }
        }

        if let Some(dir) = lookup("SMARTDESK_BACKUP_DIR") {
            config.backup_dir = PathBuf::from(dir);
        }

        config
    }

    /// Formats an amount with the currency symbol.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(Money::from_cents(1234)), "₹12.34");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        format!(
            "{}{}{}.{:02}",
            if amount.is_negative() { "-" } else { "" },
            self.currency_symbol,
            amount.major().abs(),
            amount.minor()
        )
    }
}

/// Percent string to a rate; 0 to 100 with up to two decimals.
fn parse_tax_percent(value: &str) -> Option<TaxRate> {
    let percent = value.trim().parse::<f64>().ok()?;
    if !percent.is_finite() || percent < 0.0 {
        return None;
    }
    let bps = (percent * 100.0).round() as u32;
    validate_tax_rate_bps(bps).ok()?;
    Some(TaxRate::from_bps(bps))
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", "smartdesk", "pos")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_format_currency() {
        let config = ConfigState::default();
        assert_eq!(config.format_currency(Money::from_cents(1234)), "₹12.34");
        assert_eq!(config.format_currency(Money::from_cents(1)), "₹0.01");
        assert_eq!(config.format_currency(Money::from_cents(0)), "₹0.00");
        assert_eq!(config.format_currency(Money::from_cents(-1234)), "-₹12.34");
    }

    #[test]
    fn test_defaults() {
        let config = ConfigState::from_lookup(|_| None);
        assert_eq!(config, ConfigState::default());
        assert_eq!(config.tax_policy, TaxPolicy::gst_default());
        assert_eq!(config.low_stock_threshold, 5);
        assert!(config.database_path.ends_with("smartdesk.db"));
    }

    #[test]
    fn test_overrides() {
        let config = ConfigState::from_lookup(lookup_from(&[
            ("SMARTDESK_DB_PATH", "/tmp/register.db"),
            ("SMARTDESK_STORE_NAME", "Corner Store"),
            ("SMARTDESK_TAX_RATE", "8.25"),
            ("SMARTDESK_UPI_ID", " shop@upi "),
            ("SMARTDESK_LOW_STOCK", "10"),
        ]));

        assert_eq!(config.database_path, PathBuf::from("/tmp/register.db"));
        assert_eq!(config.store_name, "Corner Store");
        assert_eq!(config.tax_policy, TaxPolicy::flat(TaxRate::from_bps(825)));
        assert_eq!(config.upi_id.as_deref(), Some("shop@upi"));
        assert_eq!(config.low_stock_threshold, 10);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = ConfigState::from_lookup(lookup_from(&[
            ("SMARTDESK_TAX_RATE", "150"),
            ("SMARTDESK_LOW_STOCK", "-1"),
            ("SMARTDESK_UPI_ID", "   "),
        ]));

        assert_eq!(config.tax_policy, TaxPolicy::gst_default());
        assert_eq!(config.low_stock_threshold, 5);
        assert_eq!(config.upi_id, None);
        assert_eq!(parse_tax_percent("abc"), None);
        assert_eq!(parse_tax_percent("-3"), None);
    }
}

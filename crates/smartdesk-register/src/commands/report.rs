//! # Report Commands
//!
//! Sales summaries per period, recent history and JSON backup.
//!
//! ## Period Boundaries (UTC)
//! ```text
//! Daily    today 00:00
//! Weekly   Monday 00:00 of this week
//! Monthly  1st of this month 00:00
//! Yearly   1 January 00:00
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use crate::commands::checkout::Receipt;
use crate::error::{ApiError, ApiResult};
use crate::Register;
use smartdesk_core::Money;
use smartdesk_db::backup::write_backup;

/// Default number of rows for [`recent_transactions`].
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportPeriod::Daily => "daily",
            ReportPeriod::Weekly => "weekly",
            ReportPeriod::Monthly => "monthly",
            ReportPeriod::Yearly => "yearly",
        };
        f.write_str(s)
    }
}

impl FromStr for ReportPeriod {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" => Ok(ReportPeriod::Daily),
            "weekly" | "week" => Ok(ReportPeriod::Weekly),
            "monthly" | "month" => Ok(ReportPeriod::Monthly),
            "yearly" | "year" => Ok(ReportPeriod::Yearly),
            other => Err(ApiError::validation(format!("Unknown report period '{}'", other))),
        }
    }
}

/// Start of the period containing `now`.
pub fn period_start(period: ReportPeriod, now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    let days_back = match period {
        ReportPeriod::Daily => 0,
        ReportPeriod::Weekly => today.weekday().num_days_from_monday(),
        ReportPeriod::Monthly => today.day0(),
        ReportPeriod::Yearly => today.ordinal0(),
    };

    today
        .checked_sub_days(Days::new(u64::from(days_back)))
        .unwrap_or(today)
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// Dashboard figures for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub period: ReportPeriod,
    #[ts(as = "String")]
    pub generated_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub since: DateTime<Utc>,
    pub product_count: usize,
    pub transaction_count: i64,
    pub revenue: Money,
    pub revenue_display: String,
    pub low_stock_count: usize,
}

pub async fn sales_summary(register: &Register, period: ReportPeriod) -> ApiResult<SalesSummary> {
    let now = Utc::now();
    let since = period_start(period, now);
    let totals = register.database().transactions().totals_since(since).await?;
    let config = register.config();

    Ok(SalesSummary {
        period,
        generated_at: now,
        since,
        product_count: register.ledger().len(),
        transaction_count: totals.transaction_count,
        revenue: totals.revenue,
        revenue_display: config.format_currency(totals.revenue),
        low_stock_count: register.ledger().low_stock(config.low_stock_threshold).len(),
    })
}

/// Most recent transactions first, as receipts.
pub async fn recent_transactions(register: &Register, limit: Option<usize>) -> ApiResult<Vec<Receipt>> {
    let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, 1000) as u32;
    let records = register.database().transactions().list_recent(limit).await?;
    Ok(records
        .iter()
        .map(|record| Receipt::from_record(record, register.config()))
        .collect())
}

/// Writes a JSON backup into the configured directory and returns its path.
pub async fn backup(register: &Register) -> ApiResult<String> {
    let path = write_backup(register.database(), &register.config().backup_dir).await?;
    info!(path = %path.display(), "Backup requested");
    Ok(path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::bill::add_to_bill;
    use crate::commands::checkout::checkout;
    use crate::commands::testing::{id_of, register_with};
    use chrono::TimeZone;
    use smartdesk_core::TaxPolicy;
    use smartdesk_db::backup::read_backup;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_period_start() {
        // A Friday
        let now = at(2026, 10, 16, 15);

        assert_eq!(period_start(ReportPeriod::Daily, now), at(2026, 10, 16, 0));
        assert_eq!(period_start(ReportPeriod::Weekly, now), at(2026, 10, 12, 0));
        assert_eq!(period_start(ReportPeriod::Monthly, now), at(2026, 10, 1, 0));
        assert_eq!(period_start(ReportPeriod::Yearly, now), at(2026, 1, 1, 0));

        // Monday is its own week start
        assert_eq!(period_start(ReportPeriod::Weekly, at(2026, 10, 12, 9)), at(2026, 10, 12, 0));
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("Weekly".parse::<ReportPeriod>().unwrap(), ReportPeriod::Weekly);
        assert_eq!("year".parse::<ReportPeriod>().unwrap(), ReportPeriod::Yearly);
        assert!("hourly".parse::<ReportPeriod>().is_err());
    }

    #[tokio::test]
    async fn test_sales_summary_counts_checkouts() {
        let register = register_with(&[("A", 200, 5), ("B", 150, 50)], TaxPolicy::none()).await;
        let a = id_of(&register, "A");
        let b = id_of(&register, "B");

        add_to_bill(&register, &a, 3).await.unwrap();
        checkout(&register).await.unwrap();
        add_to_bill(&register, &b, 2).await.unwrap();
        checkout(&register).await.unwrap();

        let summary = sales_summary(&register, ReportPeriod::Daily).await.unwrap();
        assert_eq!(summary.transaction_count, 2);
        assert_eq!(summary.revenue, Money::from_cents(900));
        assert_eq!(summary.revenue_display, "₹9.00");
        assert_eq!(summary.product_count, 2);
        // A is down to 2
        assert_eq!(summary.low_stock_count, 1);

        let history = recent_transactions(&register, None).await.unwrap();
        let mut totals: Vec<i64> = history.iter().map(|r| r.total.cents()).collect();
        totals.sort();
        assert_eq!(totals, vec![300, 600]);
    }

    #[tokio::test]
    async fn test_backup_writes_file() {
        let register = register_with(&[("A", 200, 5)], TaxPolicy::none()).await;
        let a = id_of(&register, "A");
        add_to_bill(&register, &a, 1).await.unwrap();
        checkout(&register).await.unwrap();

        let path = backup(&register).await.unwrap();
        let snapshot = read_backup(std::path::Path::new(&path)).await.unwrap();

        assert_eq!(snapshot.products.len(), 1);
        assert_eq!(snapshot.transactions.len(), 1);
        tokio::fs::remove_dir_all(&register.config().backup_dir).await.unwrap();
    }
}

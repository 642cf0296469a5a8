use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{db_types::Rupiah, traits::EngineError};

/// The width of the periods a sales report is grouped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportBucket {
    Day,
    Month,
    Year,
}

impl ReportBucket {
    /// The period label for a timestamp, e.g. `2024-10-01`, `2024-10` or `2024`.
    pub fn period_of(&self, timestamp: DateTime<Utc>) -> String {
        let format = match self {
            ReportBucket::Day => "%Y-%m-%d",
            ReportBucket::Month => "%Y-%m",
            ReportBucket::Year => "%Y",
        };
        timestamp.format(format).to_string()
    }
}

impl Display for ReportBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportBucket::Day => write!(f, "day"),
            ReportBucket::Month => write!(f, "month"),
            ReportBucket::Year => write!(f, "year"),
        }
    }
}

impl FromStr for ReportBucket {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Self::Day),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            s => Err(EngineError::validation("bucket", format!("'{s}' is not one of day, month or year"))),
        }
    }
}

/// A single completed sale, as read from the store.
#[derive(Debug, Clone, FromRow)]
pub struct SaleRecord {
    pub created_at: DateTime<Utc>,
    pub total_amount: Rupiah,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReportRow {
    pub period: String,
    pub order_count: i64,
    pub revenue: Rupiah,
    /// Revenue divided by order count, rounded down to the whole Rupiah
    pub average_value: Rupiah,
}

/// Groups sales into periods, in ascending period order. Periods without sales are omitted.
pub fn aggregate_sales(records: &[SaleRecord], bucket: ReportBucket) -> Vec<SalesReportRow> {
    let mut periods = BTreeMap::<String, (i64, Rupiah)>::new();
    for record in records {
        let entry = periods.entry(bucket.period_of(record.created_at)).or_default();
        entry.0 += 1;
        entry.1 += record.total_amount;
    }
    periods
        .into_iter()
        .map(|(period, (order_count, revenue))| SalesReportRow {
            period,
            order_count,
            revenue,
            average_value: revenue.div_count(order_count),
        })
        .collect()
}

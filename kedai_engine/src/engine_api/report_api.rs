use std::fmt::Debug;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use log::*;

use crate::{
    acl::{authorize, Capability},
    db_types::Principal,
    engine_api::report_objects::{aggregate_sales, ReportBucket, SalesReportRow},
    traits::{EngineError, SalesReporting},
};

/// Revenue reports over completed orders.
pub struct ReportApi<B> {
    db: B,
}

impl<B> Debug for ReportApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReportApi")
    }
}

impl<B> ReportApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> ReportApi<B>
where B: SalesReporting
{
    /// Order counts, revenue and average order value of completed orders placed between `start` and `end` (both
    /// inclusive, UTC), grouped by `bucket` in ascending order.
    pub async fn sales_report(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        bucket: ReportBucket,
        principal: &Principal,
    ) -> Result<Vec<SalesReportRow>, EngineError> {
        authorize(principal, Capability::ViewSalesReport)?;
        if start > end {
            return Err(EngineError::validation("start_date", format!("{start} is after the end date, {end}")));
        }
        let day_after = end.succ_opt().ok_or_else(|| EngineError::validation("end_date", "is out of range"))?;
        let from = Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN));
        let until = Utc.from_utc_datetime(&day_after.and_time(NaiveTime::MIN));
        let sales = self.db.fetch_completed_sales(from, until).await?;
        let rows = aggregate_sales(&sales, bucket);
        debug!("📊️ Sales report {start} to {end} by {bucket}: {} sales in {} periods", sales.len(), rows.len());
        Ok(rows)
    }

    /// As [`Self::sales_report`], with the dates (`YYYY-MM-DD`) and bucket given as strings.
    pub async fn sales_report_from_strings(
        &self,
        start: &str,
        end: &str,
        bucket: &str,
        principal: &Principal,
    ) -> Result<Vec<SalesReportRow>, EngineError> {
        let start = parse_date("start_date", start)?;
        let end = parse_date("end_date", end)?;
        let bucket = bucket.parse::<ReportBucket>()?;
        self.sales_report(start, end, bucket, principal).await
    }
}

fn parse_date(field: &str, s: &str) -> Result<NaiveDate, EngineError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| EngineError::validation(field, format!("'{s}' is not a YYYY-MM-DD date. {e}")))
}

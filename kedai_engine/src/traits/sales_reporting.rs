use chrono::{DateTime, Utc};

use crate::{engine_api::report_objects::SaleRecord, traits::EngineError};

#[allow(async_fn_in_trait)]
pub trait SalesReporting {
    /// Fetches the placement time and total of every `completed` order placed in `[from, until)`, ordered by
    /// placement time.
    async fn fetch_completed_sales(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<SaleRecord>, EngineError>;
}

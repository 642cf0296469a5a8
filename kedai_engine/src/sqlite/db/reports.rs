use chrono::{DateTime, Utc};
use log::trace;
use sqlx::SqliteConnection;

use crate::engine_api::report_objects::SaleRecord;

/// Fetches every completed order placed in `[from, until)`, oldest first.
pub async fn completed_sales(
    from: DateTime<Utc>,
    until: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<SaleRecord>, sqlx::Error> {
    let sales: Vec<SaleRecord> = sqlx::query_as(
        r#"
            SELECT created_at, total_amount FROM orders
            WHERE status = 'completed' AND created_at >= $1 AND created_at < $2
            ORDER BY created_at ASC
        "#,
    )
    .bind(from)
    .bind(until)
    .fetch_all(conn)
    .await?;
    trace!("📊️ {} completed sales between {from} and {until}", sales.len());
    Ok(sales)
}

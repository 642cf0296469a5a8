use chrono::{DateTime, Utc};
use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{OrderStatusType, StatusHistoryEntry};

/// Appends an entry to the status history of an order. History entries are never modified afterwards.
pub async fn append(
    order_id: i64,
    status: OrderStatusType,
    changed_by: Option<i64>,
    notes: Option<&str>,
    timestamp: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<StatusHistoryEntry, sqlx::Error> {
    let entry: StatusHistoryEntry = sqlx::query_as(
        r#"
            INSERT INTO order_status_history (order_id, status, changed_by, notes, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(status)
    .bind(changed_by)
    .bind(notes)
    .bind(timestamp)
    .fetch_one(conn)
    .await?;
    trace!("📦️ Order #{order_id} history: {status} (by {changed_by:?})");
    Ok(entry)
}

/// The full history of an order, oldest first.
pub async fn fetch_history(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<StatusHistoryEntry>, sqlx::Error> {
    let history = sqlx::query_as("SELECT * FROM order_status_history WHERE order_id = $1 ORDER BY created_at, id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(history)
}

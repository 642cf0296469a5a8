use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use super::{is_foreign_key_violation, order_history};
use crate::{
    db_types::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatusType},
    engine_api::order_objects::OrderQueryFilter,
    traits::EngineError,
};

/// Inserts the order header, its line items and the initial `pending` history entry.
///
/// This is not atomic. Embed this call inside a transaction and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, EngineError> {
    let total = order.total();
    let inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                user_id,
                customer_name,
                customer_phone,
                queue_id,
                order_type,
                total_amount,
                notes,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, $9)
            RETURNING *;
        "#,
    )
    .bind(order.user_id)
    .bind(&order.customer_name)
    .bind(&order.customer_phone)
    .bind(&order.queue_id)
    .bind(order.order_type)
    .bind(total)
    .bind(&order.notes)
    .bind(order.created_at)
    .bind(order.created_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match (is_foreign_key_violation(&e), order.user_id) {
        (true, Some(id)) => EngineError::AccountNotFound(id),
        _ => EngineError::from(e),
    })?;
    trace!("📦️ Order #{} header inserted with queue id {}", inserted.id, inserted.queue_id);
    for (i, item) in order.items.iter().enumerate() {
        insert_item(inserted.id, item, order.created_at, conn).await.map_err(|e| {
            if is_foreign_key_violation(&e) {
                let reason = format!("product {} does not exist", item.product_id);
                EngineError::validation(format!("items[{i}].product_id"), reason)
            } else {
                EngineError::from(e)
            }
        })?;
    }
    order_history::append(
        inserted.id,
        OrderStatusType::Pending,
        order.placed_by,
        Some("Order placed"),
        order.created_at,
        conn,
    )
    .await
    .map_err(|e| match (is_foreign_key_violation(&e), order.placed_by) {
        (true, Some(id)) => EngineError::AccountNotFound(id),
        _ => EngineError::from(e),
    })?;
    debug!("📦️ Order #{} ({}) saved with {} items, total {total}", inserted.id, inserted.queue_id, order.items.len());
    Ok(inserted)
}

async fn insert_item(
    order_id: i64,
    item: &NewOrderItem,
    created_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price, subtotal, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(item.subtotal())
    .bind(created_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Returns all orders with the given queue id, the most recent first.
pub async fn fetch_orders_by_queue_id(queue_id: &str, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE queue_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(queue_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`.
///
/// Resulting orders are ordered by `created_at` in descending order
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(queue_id) = query.queue_id {
        where_clause.push("queue_id = ");
        where_clause.push_bind_unseparated(queue_id);
    }
    if let Some(order_type) = query.order_type {
        where_clause.push("order_type = ");
        where_clause.push_bind_unseparated(order_type);
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        where_clause.push("status IN (");
        for (i, status) in statuses.into_iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status);
        }
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }
    trace!("📦️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("📦️ Order search returned {} results", orders.len());
    Ok(orders)
}

/// Moves an order to `to`, provided its current status is one of `from`. Entering `Completed` also stamps
/// `completed_at`.
///
/// Returns the updated order, or `None` if the order does not exist or is not in one of the `from` statuses.
pub async fn update_status_from(
    id: i64,
    from: &[OrderStatusType],
    to: OrderStatusType,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    if from.is_empty() {
        return Ok(None);
    }
    let mut builder = QueryBuilder::new("UPDATE orders SET status = ");
    builder.push_bind(to);
    builder.push(", updated_at = ");
    builder.push_bind(now);
    if to == OrderStatusType::Completed {
        builder.push(", completed_at = ");
        builder.push_bind(now);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" AND status IN (");
    let mut statuses = builder.separated(", ");
    for status in from {
        statuses.push_bind(*status);
    }
    statuses.push_unseparated(") RETURNING *");
    let order = builder.build_query_as::<Order>().fetch_optional(conn).await?;
    Ok(order)
}

/// Permanently removes an order. Items, history and payments go with it.
pub async fn delete_order(id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

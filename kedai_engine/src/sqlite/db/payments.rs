//! Payment rows.
//!
//! Status changes here are compare-and-write updates: each one names the status it expects to find, so that two
//! sessions racing on the same payment cannot both succeed.
use chrono::{DateTime, Utc};
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::{Payment, PaymentId, PaymentMethod, PaymentStatus, Rupiah};

/// Marks live payments for an order as `expired` if their validity window has closed, or if they were created at or
/// before `reuse_cutoff`. Returns the number of payments that were expired.
pub async fn expire_stale_for_order(
    order_id: i64,
    now: DateTime<Utc>,
    reuse_cutoff: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE payments SET status = 'expired', updated_at = $1
            WHERE order_id = $2 AND status IN ('unpaid', 'pending') AND (expires_at <= $3 OR created_at <= $4)
        "#,
    )
    .bind(now)
    .bind(order_id)
    .bind(now)
    .bind(reuse_cutoff)
    .execute(conn)
    .await?;
    if result.rows_affected() > 0 {
        trace!("💰️ {} stale payments for order #{order_id} marked as expired", result.rows_affected());
    }
    Ok(result.rows_affected())
}

/// Marks the payment as `expired` if it is still `unpaid` and its validity window has closed.
///
/// With an `owner`, only payments for that account's orders are touched.
pub async fn expire_if_overdue(
    id: &PaymentId,
    owner: Option<i64>,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE payments SET status = 'expired', updated_at = ");
    builder.push_bind(now);
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" AND status = 'unpaid' AND expires_at <= ");
    builder.push_bind(now);
    push_owner_clause(&mut builder, owner);
    let result = builder.build().execute(conn).await?;
    let expired = result.rows_affected() > 0;
    if expired {
        trace!("💰️ Payment {id} was overdue and has been marked as expired");
    }
    Ok(expired)
}

pub async fn fetch_payment(id: &PaymentId, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(payment)
}

/// Fetches a payment, but only if its order belongs to `owner`. With no owner, this is the same as [`fetch_payment`].
pub async fn fetch_owned_payment(
    id: &PaymentId,
    owner: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM payments WHERE id = ");
    builder.push_bind(id);
    push_owner_clause(&mut builder, owner);
    let payment = builder.build_query_as::<Payment>().fetch_optional(conn).await?;
    Ok(payment)
}

/// The live payment for an order, if there is one. There can be at most one.
pub async fn fetch_live_payment(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 AND status IN ('unpaid', 'pending')")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

/// All payments for an order, oldest first.
pub async fn fetch_payments_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Payment>, sqlx::Error> {
    let payments = sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 ORDER BY created_at, id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(payments)
}

/// Inserts a new `unpaid` payment. Fails with a unique violation if the order already has a live payment.
pub async fn insert_payment(
    id: &PaymentId,
    order_id: i64,
    method: PaymentMethod,
    amount: Rupiah,
    now: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Payment, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
            INSERT INTO payments (id, order_id, method, amount, status, created_at, updated_at, expires_at)
            VALUES ($1, $2, $3, $4, 'unpaid', $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(order_id)
    .bind(method)
    .bind(amount)
    .bind(now)
    .bind(now)
    .bind(expires_at)
    .fetch_one(conn)
    .await?;
    Ok(payment)
}

/// Restarts the reuse and validity windows of a live payment.
pub async fn refresh_payment(
    id: &PaymentId,
    now: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
            UPDATE payments SET created_at = $1, updated_at = $2, expires_at = $3
            WHERE id = $4 AND status IN ('unpaid', 'pending')
            RETURNING *;
        "#,
    )
    .bind(now)
    .bind(now)
    .bind(expires_at)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

/// Marks an `unpaid`, unexpired payment as `paid`. If `owner` is given, the payment's order must belong to that
/// account. Returns `None` if no payment matched.
pub async fn mark_paid(
    id: &PaymentId,
    owner: Option<i64>,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE payments SET status = 'paid', paid_at = ");
    builder.push_bind(now);
    builder.push(", updated_at = ");
    builder.push_bind(now);
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" AND status = 'unpaid' AND expires_at > ");
    builder.push_bind(now);
    push_owner_clause(&mut builder, owner);
    builder.push(" RETURNING *");
    let payment = builder.build_query_as::<Payment>().fetch_optional(conn).await?;
    Ok(payment)
}

/// Unconditionally moves a payment to `status`, unless it is already there.
///
/// `paid_at` is stamped when moving to `Paid` and cleared otherwise. Moving to `Unpaid` opens a new validity window
/// ending at `expires_at`. Returns `None` if the payment does not exist or is already in `status`.
pub async fn override_status(
    id: &PaymentId,
    status: PaymentStatus,
    now: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE payments SET status = ");
    builder.push_bind(status);
    builder.push(", updated_at = ");
    builder.push_bind(now);
    match status {
        PaymentStatus::Paid => {
            builder.push(", paid_at = ");
            builder.push_bind(now);
        },
        PaymentStatus::Unpaid => {
            builder.push(", paid_at = NULL, expires_at = ");
            builder.push_bind(expires_at);
        },
        _ => {
            builder.push(", paid_at = NULL");
        },
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" AND status <> ");
    builder.push_bind(status);
    builder.push(" RETURNING *");
    let payment = builder.build_query_as::<Payment>().fetch_optional(conn).await?;
    Ok(payment)
}

fn push_owner_clause(builder: &mut QueryBuilder<'_, sqlx::Sqlite>, owner: Option<i64>) {
    if let Some(owner) = owner {
        builder.push(" AND order_id IN (SELECT id FROM orders WHERE user_id = ");
        builder.push_bind(owner);
        builder.push(")");
    }
}

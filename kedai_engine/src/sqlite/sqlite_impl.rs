//! `SqliteDatabase` is a concrete implementation of a Kedai engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
//!
//! Every mutating transaction issues a write before its first read. SQLite then queues competing writers on the busy
//! timeout, rather than failing a transaction that tries to upgrade a stale read snapshot.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{SqliteConnection, SqlitePool};

use super::db::{
    accounts,
    is_foreign_key_violation,
    is_unique_violation,
    new_pool,
    order_history,
    orders,
    payments,
    reports,
};
use crate::{
    acl::Scope,
    config::PaymentSettings,
    db_types::{
        Account,
        ConfirmationSource,
        NewOrder,
        Order,
        OrderItem,
        OrderStatusType,
        Payment,
        PaymentId,
        PaymentMethod,
        PaymentStatus,
        StatusHistoryEntry,
    },
    engine_api::{
        order_objects::OrderQueryFilter,
        payment_objects::{PaymentRequest, PaymentTicket},
        report_objects::SaleRecord,
    },
    helpers::{new_payment_id, QrPayload},
    traits::{AccountManagement, EngineError, OrderManagement, PaymentManagement, SalesReporting},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, EngineError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn run_migrations(&self) -> Result<(), EngineError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete for {}", self.url);
        Ok(())
    }

    /// Closes every pooled connection. The handle must not be used afterwards.
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("🗃️ Connection pool for {} closed", self.url);
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, EngineError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_order_history(&self, order_id: i64) -> Result<Vec<StatusHistoryEntry>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        let history = order_history::fetch_history(order_id, &mut conn).await?;
        Ok(history)
    }

    async fn fetch_orders_by_queue_id(&self, queue_id: &str) -> Result<Vec<Order>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_by_queue_id(queue_id, &mut conn).await?;
        Ok(orders)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn transition_order(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
        changed_by: Option<i64>,
        notes: Option<String>,
    ) -> Result<bool, EngineError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let predecessors = new_status.predecessors();
        if let Some(order) = orders::update_status_from(order_id, &predecessors, new_status, now, &mut tx).await? {
            order_history::append(order.id, new_status, changed_by, notes.as_deref(), now, &mut tx)
                .await
                .map_err(|e| history_error(e, changed_by))?;
            tx.commit().await?;
            debug!("📦️ Order #{order_id} is now {new_status}");
            return Ok(true);
        }
        match orders::fetch_order(order_id, &mut tx).await? {
            None => {
                debug!("📦️ Order #{order_id} does not exist, so it cannot move to {new_status}");
                Ok(false)
            },
            Some(order) if order.status == new_status => {
                debug!("📦️ Order #{order_id} is already {new_status}");
                Ok(false)
            },
            Some(order) => {
                let msg = format!("Order {order_id} is {} and cannot move to {new_status}", order.status);
                debug!("📦️ {msg}");
                Err(EngineError::Conflict(msg))
            },
        }
    }

    async fn delete_order(&self, order_id: i64) -> Result<bool, EngineError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = orders::delete_order(order_id, &mut conn).await?;
        if deleted {
            info!("📦️ Order #{order_id} has been permanently deleted");
        }
        Ok(deleted)
    }
}

impl PaymentManagement for SqliteDatabase {
    async fn request_payment(
        &self,
        request: PaymentRequest,
        settings: &PaymentSettings,
    ) -> Result<PaymentTicket, EngineError> {
        let PaymentRequest { order_id, amount, scope } = request;
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        payments::expire_stale_for_order(order_id, now, now - settings.reuse_window, &mut tx).await?;
        let order = orders::fetch_order(order_id, &mut tx)
            .await?
            .filter(|o| scope.permits(o.user_id))
            .ok_or(EngineError::OrderNotFound(order_id))?;
        if order.status.is_terminal() {
            return Err(EngineError::Conflict(format!("Order {order_id} is {} and cannot be paid", order.status)));
        }
        if amount.abs_diff(order.total_amount) > settings.tolerance {
            let reason = format!("{amount} does not match the order total of {}", order.total_amount);
            return Err(EngineError::validation("amount", reason));
        }
        let expires_at = now + settings.validity;
        let (payment, reused) = match payments::fetch_live_payment(order_id, &mut tx).await? {
            Some(live) => {
                let payment = payments::refresh_payment(&live.id, now, expires_at, &mut tx)
                    .await?
                    .ok_or_else(|| EngineError::Conflict(format!("Payment {} changed status", live.id)))?;
                debug!("💰️ Reusing payment {} for order #{order_id}", payment.id);
                (payment, true)
            },
            None => {
                let id = new_payment_id(PaymentMethod::Qris, now);
                match payments::insert_payment(&id, order_id, PaymentMethod::Qris, amount, now, expires_at, &mut tx)
                    .await
                {
                    Ok(payment) => {
                        debug!("💰️ New payment {id} of {amount} issued for order #{order_id}");
                        (payment, false)
                    },
                    Err(e) if is_unique_violation(&e) => {
                        warn!("💰️ Another session issued a payment for order #{order_id} first. Reusing it.");
                        let payment = payments::fetch_live_payment(order_id, &mut tx).await?.ok_or_else(|| {
                            EngineError::Conflict(format!("Order {order_id} is being paid in another session"))
                        })?;
                        (payment, true)
                    },
                    Err(e) => return Err(e.into()),
                }
            },
        };
        let payload = QrPayload::build(&settings.merchant, &payment.id, payment.amount)?;
        let image = payload.to_svg()?;
        tx.commit().await?;
        Ok(PaymentTicket::new(&payment, payload.to_string(), image, reused))
    }

    async fn fetch_payment(&self, payment_id: &PaymentId, scope: Scope) -> Result<Payment, EngineError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        payments::expire_if_overdue(payment_id, scope.owner(), now, &mut tx).await?;
        let payment = payments::fetch_owned_payment(payment_id, scope.owner(), &mut tx).await?;
        tx.commit().await?;
        payment.ok_or_else(|| EngineError::PaymentNotFound(payment_id.clone()))
    }

    async fn confirm_payment(
        &self,
        payment_id: &PaymentId,
        source: ConfirmationSource,
        confirmed_by: Option<i64>,
        scope: Scope,
    ) -> Result<Payment, EngineError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        if let Some(payment) = payments::mark_paid(payment_id, scope.owner(), now, &mut tx).await? {
            let note = source.history_note(payment_id);
            advance_paid_order(&payment, &note, confirmed_by, now, &mut tx).await?;
            tx.commit().await?;
            info!("💰️ Payment {payment_id} of {} confirmed ({source})", payment.amount);
            return Ok(payment);
        }
        let expired = payments::expire_if_overdue(payment_id, scope.owner(), now, &mut tx).await?;
        let current = payments::fetch_owned_payment(payment_id, scope.owner(), &mut tx).await?;
        tx.commit().await?;
        match current {
            None => Err(EngineError::PaymentNotFound(payment_id.clone())),
            Some(_) if expired => Err(EngineError::Conflict(format!("Payment {payment_id} has expired"))),
            Some(p) => {
                let msg = format!("Payment {payment_id} is {} and cannot be confirmed", p.status);
                Err(EngineError::Conflict(msg))
            },
        }
    }

    async fn set_payment_status(
        &self,
        payment_id: &PaymentId,
        status: PaymentStatus,
        changed_by: Option<i64>,
        settings: &PaymentSettings,
    ) -> Result<Payment, EngineError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let updated =
            payments::override_status(payment_id, status, now, now + settings.validity, &mut tx).await.map_err(|e| {
                if is_unique_violation(&e) {
                    EngineError::Conflict(format!(
                        "The order already has a live payment, so {payment_id} cannot be made {status}"
                    ))
                } else {
                    EngineError::from(e)
                }
            })?;
        let Some(payment) = updated else {
            let current = payments::fetch_payment(payment_id, &mut tx)
                .await?
                .ok_or_else(|| EngineError::PaymentNotFound(payment_id.clone()))?;
            debug!("💰️ Payment {payment_id} is already {}", current.status);
            return Ok(current);
        };
        match status {
            PaymentStatus::Paid => {
                let note = ConfirmationSource::Staff.history_note(payment_id);
                advance_paid_order(&payment, &note, changed_by, now, &mut tx).await?;
            },
            PaymentStatus::Unpaid | PaymentStatus::Cancelled => {
                let note = format!("Payment {payment_id} marked as {status} by staff");
                let from = [OrderStatusType::Processing];
                let to = OrderStatusType::Pending;
                if orders::update_status_from(payment.order_id, &from, to, now, &mut tx).await?.is_some() {
                    order_history::append(payment.order_id, to, changed_by, Some(&note), now, &mut tx)
                        .await
                        .map_err(|e| history_error(e, changed_by))?;
                    debug!("📦️ Order #{} is pending again after payment {payment_id} was reversed", payment.order_id);
                }
            },
            _ => {},
        }
        tx.commit().await?;
        info!("💰️ Payment {payment_id} status set to {status} by staff");
        Ok(payment)
    }

    async fn fetch_payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        let payments = payments::fetch_payments_for_order(order_id, &mut conn).await?;
        Ok(payments)
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_account(&self, account_id: i64) -> Result<Option<Account>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        let account = accounts::fetch_account(account_id, &mut conn).await?;
        Ok(account)
    }
}

impl SalesReporting for SqliteDatabase {
    async fn fetch_completed_sales(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<SaleRecord>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        let sales = reports::completed_sales(from, until, &mut conn).await?;
        Ok(sales)
    }
}

/// Moves the order that `payment` belongs to from `pending` to `processing`. Orders in any other status are left
/// alone.
async fn advance_paid_order(
    payment: &Payment,
    note: &str,
    changed_by: Option<i64>,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), EngineError> {
    let from = [OrderStatusType::Pending];
    let to = OrderStatusType::Processing;
    match orders::update_status_from(payment.order_id, &from, to, now, conn).await? {
        Some(order) => {
            order_history::append(order.id, to, changed_by, Some(note), now, conn)
                .await
                .map_err(|e| history_error(e, changed_by))?;
            debug!("📦️ Order #{} is now processing after payment {}", order.id, payment.id);
        },
        None => debug!("📦️ Order #{} is not pending. Payment {} leaves it unchanged", payment.order_id, payment.id),
    }
    Ok(())
}

fn history_error(e: sqlx::Error, changed_by: Option<i64>) -> EngineError {
    match changed_by {
        Some(id) if is_foreign_key_violation(&e) => EngineError::AccountNotFound(id),
        _ => EngineError::from(e),
    }
}

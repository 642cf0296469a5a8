use crate::{
    db_types::{NewOrder, Order, OrderItem, OrderStatusType, StatusHistoryEntry},
    engine_api::order_objects::OrderQueryFilter,
    traits::EngineError,
};

/// The `OrderManagement` trait defines the behaviour for creating, querying and updating orders in the database
/// backend.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    /// Takes a new order, and in a single atomic transaction,
    /// * inserts the order header with its total,
    /// * inserts every line item,
    /// * appends the initial `pending` status history entry.
    ///
    /// If any step fails, nothing is persisted. Returns the newly created order.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, EngineError>;

    /// Fetches the order with the given id. If no order exists, `None` is returned.
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, EngineError>;

    /// Fetches the line items for the given order, in insertion order.
    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, EngineError>;

    /// Fetches the status history for the given order, oldest first.
    async fn fetch_order_history(&self, order_id: i64) -> Result<Vec<StatusHistoryEntry>, EngineError>;

    /// Fetches all orders carrying the given queue id, most recent first. Queue ids are not unique, so there may be
    /// more than one.
    async fn fetch_orders_by_queue_id(&self, queue_id: &str) -> Result<Vec<Order>, EngineError>;

    /// Fetches orders according to the criteria in the filter, most recent first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, EngineError>;

    /// Moves the order to `new_status` and appends a history entry, in one transaction.
    ///
    /// Returns `false` if the order does not exist, or is already in `new_status`. If the order exists but the
    /// lifecycle does not allow the move, [`EngineError::Conflict`] is returned. Moving into `Completed` stamps the
    /// completion time.
    async fn transition_order(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
        changed_by: Option<i64>,
        notes: Option<String>,
    ) -> Result<bool, EngineError>;

    /// Permanently removes the order along with its items, history and payments. Returns `false` if there was no such
    /// order.
    async fn delete_order(&self, order_id: i64) -> Result<bool, EngineError>;
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderItem, OrderStatusType, OrderType, Rupiah, StatusHistoryEntry};

/// An order as submitted by a client. Nothing in here is trusted until [`crate::OrderFlowApi::create_order`] has
/// validated it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub customer_name: String,
    /// Optional for customers, who default to the phone number on their account.
    pub customer_phone: Option<String>,
    /// `dine_in` or `take_away`
    pub order_type: String,
    pub notes: Option<String>,
    pub items: Vec<OrderItemRequest>,
    /// Ignored. The engine always computes the total from the line items.
    pub total_amount: Option<Rupiah>,
}

impl NewOrderRequest {
    pub fn new<S: Into<String>>(customer_name: S, customer_phone: Option<&str>, order_type: &str) -> Self {
        Self {
            customer_name: customer_name.into(),
            customer_phone: customer_phone.map(String::from),
            order_type: order_type.to_string(),
            ..Default::default()
        }
    }

    pub fn with_item(mut self, product_id: i64, quantity: i64, unit_price: Rupiah) -> Self {
        self.items.push(OrderItemRequest {
            product_id: Some(product_id),
            quantity: Some(quantity),
            unit_price: Some(unit_price),
        });
        self
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: Option<i64>,
    pub quantity: Option<i64>,
    pub unit_price: Option<Rupiah>,
}

/// The response to a successful order submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order_id: i64,
    pub queue_id: String,
    pub total: Rupiah,
}

impl From<&Order> for OrderCreated {
    fn from(order: &Order) -> Self {
        Self { order_id: order.id, queue_id: order.queue_id.clone(), total: order.total_amount }
    }
}

/// An order with its line items and status history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub history: Vec<StatusHistoryEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub user_id: Option<i64>,
    pub queue_id: Option<String>,
    pub order_type: Option<OrderType>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<Vec<OrderStatusType>>,
    pub limit: Option<i64>,
}

impl OrderQueryFilter {
    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_queue_id<S: Into<String>>(mut self, queue_id: S) -> Self {
        self.queue_id = Some(queue_id.into());
        self
    }

    pub fn with_order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = Some(order_type);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() &&
            self.queue_id.is_none() &&
            self.order_type.is_none() &&
            self.since.is_none() &&
            self.until.is_none() &&
            self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true)
    }
}

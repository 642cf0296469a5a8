use std::fmt::Debug;

use chrono::Utc;
use kedai_common::{normalize_phone, phones_match, Rupiah};
use log::*;

use crate::{
    acl::{authorize, Capability, Scope},
    db_types::{NewOrder, NewOrderItem, Order, OrderStatusType, OrderType, Principal, StatusHistoryEntry},
    engine_api::order_objects::{NewOrderRequest, OrderCreated, OrderDetail, OrderItemRequest, OrderQueryFilter},
    helpers::new_queue_id,
    traits::{AccountManagement, EngineError, OrderManagement},
};

/// `OrderFlowApi` is the primary API for placing orders and moving them through their lifecycle.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement + AccountManagement
{
    /// Places a new order.
    ///
    /// The request is validated in full before anything is written. The total is always computed from the line
    /// items. Customers may only order under their own phone number, and own the resulting order. Orders entered by
    /// staff on behalf of walk-in customers have no owner.
    pub async fn create_order(
        &self,
        request: NewOrderRequest,
        principal: &Principal,
    ) -> Result<OrderCreated, EngineError> {
        let scope = authorize(principal, Capability::PlaceOrder)?;
        let customer_name = request.customer_name.trim();
        if customer_name.is_empty() {
            return Err(EngineError::validation("customer_name", "is required"));
        }
        let customer_phone = match scope {
            Scope::Owner(account_id) => self.customer_phone(account_id, request.customer_phone.as_deref()).await?,
            Scope::Any => supplied_phone(request.customer_phone.as_deref())?
                .ok_or_else(|| EngineError::validation("customer_phone", "is required"))?,
        };
        let order_type = parse_order_type(&request.order_type)?;
        let items = validate_items(&request.items)?;
        if request.total_amount.is_some() {
            trace!("📦️ Ignoring the client-supplied order total");
        }
        let now = Utc::now();
        let order = NewOrder {
            user_id: scope.owner(),
            customer_name: customer_name.to_string(),
            customer_phone,
            queue_id: new_queue_id(order_type, now),
            order_type,
            notes: request.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            items,
            placed_by: Some(principal.account_id),
            created_at: now,
        };
        let order = self.db.insert_order(order).await?;
        info!("📦️ Order #{} ({}) placed for {}", order.id, order.queue_id, order.total_amount);
        Ok(OrderCreated::from(&order))
    }

    /// Moves an order to a new status. Only staff and admins may do this.
    ///
    /// Returns `false` if the order does not exist or is already in the requested status.
    pub async fn update_order_status(
        &self,
        order_id: i64,
        status: &str,
        principal: &Principal,
        notes: Option<String>,
    ) -> Result<bool, EngineError> {
        authorize(principal, Capability::UpdateOrderStatus)?;
        let new_status = status.parse::<OrderStatusType>().map_err(|_| {
            let reason = format!("'{status}' is not one of pending, processing, completed or cancelled");
            EngineError::validation("status", reason)
        })?;
        let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        self.db.transition_order(order_id, new_status, Some(principal.account_id), notes).await
    }

    /// Permanently removes an order with its items, history and payments. Admins only.
    pub async fn delete_order(&self, order_id: i64, principal: &Principal) -> Result<bool, EngineError> {
        authorize(principal, Capability::DeleteOrder)?;
        let deleted = self.db.delete_order(order_id).await?;
        if deleted {
            warn!("📦️ Order #{order_id} was deleted by account #{}", principal.account_id);
        }
        Ok(deleted)
    }

    /// Fetches an order with its items and history. Customers asking for someone else's order are told it does not
    /// exist.
    pub async fn fetch_order(&self, order_id: i64, principal: &Principal) -> Result<OrderDetail, EngineError> {
        let order = self.visible_order(order_id, principal).await?;
        self.detail(order).await
    }

    /// Fetches the most recent visible order carrying the queue id, if any.
    pub async fn fetch_order_by_queue_id(
        &self,
        queue_id: &str,
        principal: &Principal,
    ) -> Result<Option<OrderDetail>, EngineError> {
        let scope = authorize(principal, Capability::ViewOrder)?;
        let queue_id = queue_id.trim().to_ascii_uppercase();
        let orders = self.db.fetch_orders_by_queue_id(&queue_id).await?;
        if orders.len() > 1 {
            debug!("📦️ {} orders share queue id {queue_id}. Using the most recent one.", orders.len());
        }
        match orders.into_iter().find(|o| scope.permits(o.user_id)) {
            Some(order) => Ok(Some(self.detail(order).await?)),
            None => Ok(None),
        }
    }

    /// Searches orders. Customers only ever see their own, whatever the filter says.
    pub async fn search_orders(
        &self,
        mut filter: OrderQueryFilter,
        principal: &Principal,
    ) -> Result<Vec<Order>, EngineError> {
        let scope = authorize(principal, Capability::ViewOrder)?;
        if let Scope::Owner(account_id) = scope {
            filter.user_id = Some(account_id);
        }
        if let (Some(since), Some(until)) = (filter.since, filter.until) {
            if since > until {
                return Err(EngineError::validation("since", "must not be later than until"));
            }
        }
        self.db.search_orders(filter).await
    }

    pub async fn order_history(
        &self,
        order_id: i64,
        principal: &Principal,
    ) -> Result<Vec<StatusHistoryEntry>, EngineError> {
        let order = self.visible_order(order_id, principal).await?;
        self.db.fetch_order_history(order.id).await
    }

    async fn visible_order(&self, order_id: i64, principal: &Principal) -> Result<Order, EngineError> {
        let scope = authorize(principal, Capability::ViewOrder)?;
        self.db
            .fetch_order(order_id)
            .await?
            .filter(|o| scope.permits(o.user_id))
            .ok_or(EngineError::OrderNotFound(order_id))
    }

    async fn detail(&self, order: Order) -> Result<OrderDetail, EngineError> {
        let items = self.db.fetch_order_items(order.id).await?;
        let history = self.db.fetch_order_history(order.id).await?;
        Ok(OrderDetail { order, items, history })
    }

    /// Customers order under the phone number on their account. A supplied number must match it.
    async fn customer_phone(&self, account_id: i64, supplied: Option<&str>) -> Result<String, EngineError> {
        let account = self.db.fetch_account(account_id).await?.ok_or(EngineError::AccountNotFound(account_id))?;
        let on_file = account.phone.as_deref().and_then(normalize_phone);
        match (supplied_phone(supplied)?, on_file) {
            (Some(phone), Some(on_file)) if phones_match(&phone, &on_file) => Ok(phone),
            (Some(_), _) => {
                debug!("📦️ Account #{account_id} tried to order under a phone number that is not theirs");
                Err(EngineError::validation("customer_phone", "does not match the phone number on your account"))
            },
            (None, Some(on_file)) => Ok(on_file),
            (None, None) => Err(EngineError::validation("customer_phone", "is required")),
        }
    }
}

/// Normalises a client-supplied phone number. Blank input counts as not supplied.
fn supplied_phone(phone: Option<&str>) -> Result<Option<String>, EngineError> {
    match phone.map(str::trim).filter(|p| !p.is_empty()) {
        None => Ok(None),
        Some(p) => normalize_phone(p)
            .map(Some)
            .ok_or_else(|| EngineError::validation("customer_phone", format!("'{p}' is not a valid phone number"))),
    }
}

fn parse_order_type(s: &str) -> Result<OrderType, EngineError> {
    s.parse::<OrderType>()
        .map_err(|_| EngineError::validation("order_type", format!("'{s}' is not one of dine_in or take_away")))
}

fn validate_items(items: &[OrderItemRequest]) -> Result<Vec<NewOrderItem>, EngineError> {
    if items.is_empty() {
        return Err(EngineError::validation("items", "an order needs at least one item"));
    }
    let items = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let required = |name: &str| EngineError::validation(format!("items[{i}].{name}"), "is required");
            let product_id = item.product_id.ok_or_else(|| required("product_id"))?;
            let quantity = item.quantity.ok_or_else(|| required("quantity"))?;
            if quantity < 1 {
                return Err(EngineError::validation(format!("items[{i}].quantity"), "must be at least 1"));
            }
            let unit_price = item.unit_price.ok_or_else(|| required("unit_price"))?;
            if unit_price.value() < 0 {
                return Err(EngineError::validation(format!("items[{i}].unit_price"), "must not be negative"));
            }
            if unit_price.checked_mul(quantity).is_none() {
                return Err(EngineError::validation(format!("items[{i}].quantity"), "total is too large"));
            }
            Ok(NewOrderItem::new(product_id, quantity, unit_price))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if Rupiah::checked_sum(items.iter().map(NewOrderItem::subtotal)).is_none() {
        return Err(EngineError::validation("items", "total is too large"));
    }
    Ok(items)
}

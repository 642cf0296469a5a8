use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use kedai_common::Rupiah;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid {kind}: {value}")]
pub struct ConversionError {
    pub kind: &'static str,
    pub value: String,
}

impl ConversionError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

//--------------------------------------         Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Staff,
    Customer,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Staff => write!(f, "staff"),
            Role::Customer => write!(f, "customer"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            "customer" => Ok(Self::Customer),
            s => Err(ConversionError::new("role", s)),
        }
    }
}

//--------------------------------------       Principal       ---------------------------------------------------------
/// The authenticated caller, as supplied by the identity service. The engine trusts it as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub account_id: i64,
    pub role: Role,
}

impl Principal {
    pub fn new(account_id: i64, role: Role) -> Self {
        Self { account_id, role }
    }

    pub fn customer(account_id: i64) -> Self {
        Self::new(account_id, Role::Customer)
    }

    pub fn staff(account_id: i64) -> Self {
        Self::new(account_id, Role::Staff)
    }

    pub fn admin(account_id: i64) -> Self {
        Self::new(account_id, Role::Admin)
    }

    pub fn is_customer(&self) -> bool {
        self.role == Role::Customer
    }
}

//--------------------------------------        Account        ---------------------------------------------------------
/// A row from the identity service's `users` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
}

//--------------------------------------       OrderType       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    DineIn,
    TakeAway,
}

impl OrderType {
    /// The two-letter prefix used in queue identifiers.
    pub fn queue_prefix(&self) -> &'static str {
        match self {
            OrderType::DineIn => "DI",
            OrderType::TakeAway => "TA",
        }
    }
}

impl Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::DineIn => write!(f, "dine_in"),
            OrderType::TakeAway => write!(f, "take_away"),
        }
    }
}

impl FromStr for OrderType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dine_in" => Ok(Self::DineIn),
            "take_away" => Ok(Self::TakeAway),
            s => Err(ConversionError::new("order type", s)),
        }
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The order has been placed and is awaiting payment or preparation.
    Pending,
    /// The order has been paid for (or accepted by staff) and is being prepared.
    Processing,
    /// The order has been handed over to the customer.
    Completed,
    /// The order has been cancelled by staff.
    Cancelled,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the lifecycle permits moving directly from `self` to `next`.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!(
            (self, next),
            (Pending, Processing) |
                (Pending, Completed) |
                (Pending, Cancelled) |
                (Processing, Completed) |
                (Processing, Cancelled)
        )
    }

    /// The statuses from which a transition into `self` is allowed.
    pub fn predecessors(&self) -> Vec<OrderStatusType> {
        use OrderStatusType::*;
        [Pending, Processing, Completed, Cancelled].into_iter().filter(|s| s.can_transition_to(*self)).collect()
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Processing => write!(f, "processing"),
            OrderStatusType::Completed => write!(f, "completed"),
            OrderStatusType::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError::new("order status", s)),
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// The owning customer account. `None` for walk-in orders entered by staff.
    pub user_id: Option<i64>,
    pub customer_name: String,
    pub customer_phone: String,
    pub queue_id: String,
    pub order_type: OrderType,
    pub total_amount: Rupiah,
    pub notes: Option<String>,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn is_owned_by(&self, account_id: i64) -> bool {
        self.user_id == Some(account_id)
    }
}

//--------------------------------------      OrderItem        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// The price of one unit at the time the order was placed.
    pub unit_price: Rupiah,
    pub subtotal: Rupiah,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Rupiah,
}

impl NewOrderItem {
    pub fn new(product_id: i64, quantity: i64, unit_price: Rupiah) -> Self {
        Self { product_id, quantity, unit_price }
    }

    pub fn subtotal(&self) -> Rupiah {
        self.unit_price * self.quantity
    }
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
/// A fully validated order, ready to be persisted. Build these with the order flow API rather than by hand.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<i64>,
    pub customer_name: String,
    /// Already normalised
    pub customer_phone: String,
    pub queue_id: String,
    pub order_type: OrderType,
    pub notes: Option<String>,
    pub items: Vec<NewOrderItem>,
    /// The account that placed the order, recorded in the initial history entry.
    pub placed_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn total(&self) -> Rupiah {
        self.items.iter().map(NewOrderItem::subtotal).sum()
    }
}

//--------------------------------------  StatusHistoryEntry   ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub id: i64,
    pub order_id: i64,
    pub status: OrderStatusType,
    pub changed_by: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------      PaymentId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct PaymentId(pub String);

impl PaymentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PaymentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PaymentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

//--------------------------------------    PaymentMethod      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// A bank transfer initiated by scanning a QR code
    Qris,
}

impl PaymentMethod {
    /// The tag used as the leading component of payment identifiers.
    pub fn tag(&self) -> &'static str {
        match self {
            PaymentMethod::Qris => "QRIS",
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Qris => write!(f, "qris"),
        }
    }
}

//--------------------------------------    PaymentStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Pending,
    Paid,
    Cancelled,
    Expired,
}

impl PaymentStatus {
    /// Live payments are the ones that may still be paid, and of which there is at most one per order.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Unpaid | Self::Pending)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Unpaid => write!(f, "unpaid"),
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Cancelled => write!(f, "cancelled"),
            PaymentStatus::Expired => write!(f, "expired"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            s => Err(ConversionError::new("payment status", s)),
        }
    }
}

//--------------------------------------       Payment         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: i64,
    pub method: PaymentMethod,
    pub amount: Rupiah,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set if and only if the status is `Paid`
    pub paid_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

/// Where a payment confirmation came from. Recorded in the order history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationSource {
    /// The customer-facing "simulate payment" path
    Simulated,
    /// A staff member marked the payment as received
    Staff,
}

impl ConfirmationSource {
    pub fn history_note(&self, payment_id: &PaymentId) -> String {
        match self {
            ConfirmationSource::Simulated => format!("Payment {payment_id} confirmed (simulated)"),
            ConfirmationSource::Staff => format!("Payment {payment_id} confirmed by staff"),
        }
    }
}

impl Display for ConfirmationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfirmationSource::Simulated => write!(f, "simulated"),
            ConfirmationSource::Staff => write!(f, "staff"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn order_lifecycle() {
        use OrderStatusType::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Processing));
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Pending));
        assert_eq!(Completed.predecessors(), vec![Pending, Processing]);
        assert!(Pending.predecessors().is_empty());
    }

    #[test]
    fn status_strings_are_a_closed_set() {
        assert_eq!("processing".parse::<OrderStatusType>().unwrap(), OrderStatusType::Processing);
        assert!("Processing".parse::<OrderStatusType>().is_err());
        assert!("shipped".parse::<OrderStatusType>().is_err());
        assert_eq!("take_away".parse::<OrderType>().unwrap(), OrderType::TakeAway);
        assert!("takeaway".parse::<OrderType>().is_err());
        assert_eq!("expired".parse::<PaymentStatus>().unwrap(), PaymentStatus::Expired);
    }

    #[test]
    fn new_order_total() {
        let order = NewOrder {
            user_id: None,
            customer_name: "Budi".into(),
            customer_phone: "+6281234567890".into(),
            queue_id: "TA12345678001".into(),
            order_type: OrderType::TakeAway,
            notes: None,
            items: vec![
                NewOrderItem::new(1, 2, Rupiah::from(15_000)),
                NewOrderItem::new(2, 1, Rupiah::from(8_000)),
            ],
            placed_by: None,
            created_at: Utc::now(),
        };
        assert_eq!(order.total(), Rupiah::from(38_000));
    }
}

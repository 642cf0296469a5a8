use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    acl::Scope,
    db_types::{Payment, PaymentId, Rupiah},
};

/// A validated request for a QR payment, handed to the backend.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub order_id: i64,
    pub amount: Rupiah,
    /// Orders outside this scope are reported as not found.
    pub scope: Scope,
}

/// Everything a client needs to present a QR payment to the customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTicket {
    pub payment_id: PaymentId,
    pub order_id: i64,
    pub amount: Rupiah,
    pub qr_payload: String,
    /// The payload rendered as an SVG image
    pub qr_image: String,
    pub expires_at: DateTime<Utc>,
    /// True when an existing live payment was handed out again
    pub reused: bool,
}

impl PaymentTicket {
    pub fn new(payment: &Payment, qr_payload: String, qr_image: String, reused: bool) -> Self {
        Self {
            payment_id: payment.id.clone(),
            order_id: payment.order_id,
            amount: payment.amount,
            qr_payload,
            qr_image,
            expires_at: payment.expires_at,
            reused,
        }
    }
}

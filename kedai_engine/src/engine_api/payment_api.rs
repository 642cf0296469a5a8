use std::fmt::Debug;

use log::*;

use crate::{
    acl::{authorize, Capability},
    config::PaymentSettings,
    db_types::{ConfirmationSource, Payment, PaymentId, PaymentStatus, Principal, Rupiah},
    engine_api::payment_objects::{PaymentRequest, PaymentTicket},
    traits::{EngineError, OrderManagement, PaymentManagement},
};

/// `PaymentApi` manages QR payments for orders: issuing them, reporting their status, confirming them, and staff
/// overrides.
///
/// Unpaid payments expire lazily. Any call that reads a payment past its validity window marks it as `expired` first.
pub struct PaymentApi<B> {
    db: B,
    settings: PaymentSettings,
}

impl<B> Debug for PaymentApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentApi ({:?})", self.settings)
    }
}

impl<B> PaymentApi<B> {
    pub fn new(db: B, settings: PaymentSettings) -> Self {
        Self { db, settings }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn settings(&self) -> &PaymentSettings {
        &self.settings
    }
}

impl<B> PaymentApi<B>
where B: PaymentManagement + OrderManagement
{
    /// Issues a QR payment for an order, or hands out the order's current live payment again if it was created within
    /// the reuse window. Either way, the returned payment is valid for a fresh validity window.
    ///
    /// The amount must be within the configured tolerance of the order total.
    pub async fn request_payment(
        &self,
        order_id: i64,
        amount: Rupiah,
        principal: &Principal,
    ) -> Result<PaymentTicket, EngineError> {
        let scope = authorize(principal, Capability::RequestPayment)?;
        if !amount.is_positive() {
            return Err(EngineError::validation("amount", "must be positive"));
        }
        let request = PaymentRequest { order_id, amount, scope };
        let ticket = self.db.request_payment(request, &self.settings).await?;
        info!(
            "💰️ Payment {} for order #{order_id} handed out (reused: {}), valid until {}",
            ticket.payment_id, ticket.reused, ticket.expires_at
        );
        Ok(ticket)
    }

    pub async fn check_payment_status(
        &self,
        payment_id: &PaymentId,
        principal: &Principal,
    ) -> Result<Payment, EngineError> {
        let scope = authorize(principal, Capability::ViewPayment)?;
        self.db.fetch_payment(payment_id, scope).await
    }

    /// Confirms an unpaid payment and moves its order into `processing`.
    ///
    /// Customers may confirm payments for their own orders. This is the simulated payment path, since no real payment
    /// network is involved. Staff confirmations are recorded as such in the order history.
    pub async fn confirm_payment(&self, payment_id: &PaymentId, principal: &Principal) -> Result<Payment, EngineError> {
        let scope = authorize(principal, Capability::ConfirmPayment)?;
        let source = if principal.is_customer() { ConfirmationSource::Simulated } else { ConfirmationSource::Staff };
        self.db.confirm_payment(payment_id, source, Some(principal.account_id), scope).await
    }

    /// Staff override of a payment's status. Only `paid`, `unpaid` and `cancelled` may be set this way.
    pub async fn set_payment_status(
        &self,
        payment_id: &PaymentId,
        status: &str,
        principal: &Principal,
    ) -> Result<Payment, EngineError> {
        authorize(principal, Capability::OverridePaymentStatus)?;
        let status = match status.parse::<PaymentStatus>() {
            Ok(s @ (PaymentStatus::Paid | PaymentStatus::Unpaid | PaymentStatus::Cancelled)) => s,
            _ => {
                let reason = format!("'{status}' is not one of paid, unpaid or cancelled");
                return Err(EngineError::validation("status", reason));
            },
        };
        self.db.set_payment_status(payment_id, status, Some(principal.account_id), &self.settings).await
    }

    /// Every payment issued for an order, oldest first.
    pub async fn payments_for_order(&self, order_id: i64, principal: &Principal) -> Result<Vec<Payment>, EngineError> {
        let scope = authorize(principal, Capability::ViewPayment)?;
        let order = self
            .db
            .fetch_order(order_id)
            .await?
            .filter(|o| scope.permits(o.user_id))
            .ok_or(EngineError::OrderNotFound(order_id))?;
        self.db.fetch_payments_for_order(order.id).await
    }
}

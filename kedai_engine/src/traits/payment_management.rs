use crate::{
    acl::Scope,
    config::PaymentSettings,
    db_types::{ConfirmationSource, Payment, PaymentId, PaymentStatus},
    engine_api::payment_objects::{PaymentRequest, PaymentTicket},
    traits::EngineError,
};

/// The `PaymentManagement` trait defines the payment lifecycle behaviour of a backend.
///
/// Methods taking a [`Scope`] must treat a payment whose order is outside the scope exactly as if it did not exist.
#[allow(async_fn_in_trait)]
pub trait PaymentManagement {
    /// Issues a QR payment for an order, in a single atomic transaction:
    /// * live payments for the order that have expired, or fall outside the reuse window, are marked `expired`,
    /// * the order is loaded and checked against the scope, its status, and the requested amount,
    /// * a remaining live payment is refreshed and reused, otherwise a new `unpaid` payment is inserted,
    /// * the QR payload is built.
    ///
    /// If any step fails, no payment row is created or changed.
    async fn request_payment(
        &self,
        request: PaymentRequest,
        settings: &PaymentSettings,
    ) -> Result<PaymentTicket, EngineError>;

    /// Fetches a payment, marking it `expired` first if it is unpaid and past its expiry time.
    async fn fetch_payment(&self, payment_id: &PaymentId, scope: Scope) -> Result<Payment, EngineError>;

    /// Marks an `unpaid` payment as `paid` and moves a `pending` owning order to `processing` with a history entry
    /// naming the confirmation source, in one transaction.
    ///
    /// Confirming a payment in any other status, or one that is past its expiry time, fails with
    /// [`EngineError::Conflict`].
    async fn confirm_payment(
        &self,
        payment_id: &PaymentId,
        source: ConfirmationSource,
        confirmed_by: Option<i64>,
        scope: Scope,
    ) -> Result<Payment, EngineError>;

    /// Staff override of the payment status.
    ///
    /// * `Paid` has the same side effects as [`Self::confirm_payment`].
    /// * `Unpaid` and `Cancelled` clear the paid time and reset a `processing` order back to `pending`. `Unpaid`
    ///   opens a fresh validity window.
    ///
    /// Setting a payment to its current status is a no-op.
    async fn set_payment_status(
        &self,
        payment_id: &PaymentId,
        status: PaymentStatus,
        changed_by: Option<i64>,
        settings: &PaymentSettings,
    ) -> Result<Payment, EngineError>;

    /// All payments ever issued for an order, oldest first.
    async fn fetch_payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>, EngineError>;
}

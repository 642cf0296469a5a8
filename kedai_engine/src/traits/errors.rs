use thiserror::Error;

use crate::{db_types::PaymentId, helpers::QrPayloadError};

/// The single error type surfaced by the engine.
///
/// Callers at the transport boundary should use [`EngineError::status_code`] and [`EngineError::public_message`] to
/// build responses. Database errors carry driver detail that must not reach the client.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("Invalid value for {field}: {reason}")]
    Validation { field: String, reason: String },
    #[error("Insufficient permissions. {0}")]
    Forbidden(String),
    #[error("Order {0} not found")]
    OrderNotFound(i64),
    #[error("Payment {0} not found")]
    PaymentNotFound(PaymentId),
    #[error("Account {0} not found")]
    AccountNotFound(i64),
    #[error("Conflict. {0}")]
    Conflict(String),
    #[error("Could not build the payment code. {0}")]
    PaymentCodeError(String),
    #[error("Internal database error: {0}")]
    DatabaseError(String),
}

impl EngineError {
    pub fn validation<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        Self::Validation { field: field.into(), reason: reason.into() }
    }

    /// True when the caller can fix the request.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::DatabaseError(_) | Self::PaymentCodeError(_))
    }

    /// The HTTP status code this error maps onto.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Forbidden(_) => 403,
            Self::OrderNotFound(_) | Self::PaymentNotFound(_) | Self::AccountNotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::PaymentCodeError(_) | Self::DatabaseError(_) => 500,
        }
    }

    /// A message that is safe to show to the caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::DatabaseError(_) | Self::PaymentCodeError(_) => {
                "An internal error occurred. Please try again later.".to_string()
            },
            e => e.to_string(),
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(e: sqlx::Error) -> Self {
        EngineError::DatabaseError(e.to_string())
    }
}

impl From<QrPayloadError> for EngineError {
    fn from(e: QrPayloadError) -> Self {
        EngineError::PaymentCodeError(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for EngineError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        EngineError::DatabaseError(format!("Migration failed. {e}"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn database_errors_are_not_leaked() {
        let e = EngineError::from(sqlx::Error::RowNotFound);
        assert!(!e.is_client_error());
        assert_eq!(e.status_code(), 500);
        assert!(!e.public_message().contains("row"));
    }

    #[test]
    fn client_errors_keep_their_message() {
        let e = EngineError::validation("customer_name", "must not be empty");
        assert!(e.is_client_error());
        assert_eq!(e.status_code(), 400);
        assert_eq!(e.public_message(), "Invalid value for customer_name: must not be empty");
        assert_eq!(EngineError::Conflict("Payment is already paid".into()).status_code(), 409);
        assert_eq!(EngineError::PaymentNotFound("QRIS-1-X".into()).status_code(), 404);
    }
}

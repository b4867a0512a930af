//! Billing error types.

use common::PaymentIntentId;
use thiserror::Error;

use crate::payment_intent::PaymentIntentStatus;

/// Errors that can occur in the billing ledger.
#[derive(Debug, Error)]
pub enum BillingError {
    /// No payment intent with this id exists.
    #[error("Payment intent {0} not found")]
    PaymentIntentNotFound(PaymentIntentId),

    /// Refunds need a captured payment.
    #[error("Cannot refund payment in {status} status")]
    RefundNotAllowed {
        payment_intent_id: PaymentIntentId,
        status: PaymentIntentStatus,
    },

    /// The payment intent cannot take this transition.
    #[error("Payment intent {payment_intent_id} is in {status} status")]
    InvalidState {
        payment_intent_id: PaymentIntentId,
        status: PaymentIntentStatus,
    },

    /// The request itself is malformed.
    #[error("Invalid billing request: {0}")]
    InvalidRequest(String),
}

impl BillingError {
    /// Wire error code.
    pub fn code(&self) -> &'static str {
        match self {
            BillingError::PaymentIntentNotFound(_) => "PAYMENT_INTENT_NOT_FOUND",
            BillingError::RefundNotAllowed { .. } => "REFUND_FAILED",
            BillingError::InvalidState { .. } => "PAYMENT_INVALID_STATE",
            BillingError::InvalidRequest(_) => "INVALID_REQUEST",
        }
    }

    /// HTTP status the error maps to.
    pub fn http_status(&self) -> u16 {
        match self {
            BillingError::PaymentIntentNotFound(_) => 404,
            BillingError::RefundNotAllowed { .. } | BillingError::InvalidRequest(_) => 400,
            BillingError::InvalidState { .. } => 409,
        }
    }

    /// Structured details for the error envelope.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            BillingError::RefundNotAllowed {
                payment_intent_id,
                status,
            }
            | BillingError::InvalidState {
                payment_intent_id,
                status,
            } => Some(serde_json::json!({
                "paymentIntentId": payment_intent_id,
                "status": status,
            })),
            _ => None,
        }
    }
}

/// Failure to deliver a webhook to the orders service.
#[derive(Debug, Error)]
#[error("Order notification failed: {0}")]
pub struct NotifyError(pub String);

/// Convenience type alias for billing results.
pub type Result<T> = std::result::Result<T, BillingError>;

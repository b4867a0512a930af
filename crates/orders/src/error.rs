//! Orchestrator error types.

use common::OrderId;
use menu::ValidationReport;
use thiserror::Error;

use crate::status::OrderStatus;

/// A failed call to a downstream service.
///
/// Every variant counts as a failure of the step that made the call; the
/// orchestrator never retries.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// The service could not be reached or timed out.
    #[error("{service} service unreachable: {reason}")]
    Transport {
        service: &'static str,
        reason: String,
    },

    /// The service answered with an error.
    #[error("{service} service rejected the request ({status} {code}): {message}")]
    Rejected {
        service: &'static str,
        status: u16,
        code: String,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// The service answered with a body that could not be decoded.
    #[error("{service} service sent an unreadable response: {reason}")]
    InvalidResponse {
        service: &'static str,
        reason: String,
    },
}

impl ServiceError {
    /// Returns the name of the service that failed.
    pub fn service(&self) -> &'static str {
        match self {
            ServiceError::Transport { service, .. }
            | ServiceError::Rejected { service, .. }
            | ServiceError::InvalidResponse { service, .. } => service,
        }
    }

    /// Returns the error code the service answered with, if it answered.
    pub fn upstream_code(&self) -> Option<&str> {
        match self {
            ServiceError::Rejected { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Failure of the order store.
#[derive(Debug, Clone, Error)]
#[error("Order repository error: {0}")]
pub struct RepositoryError(pub String);

/// Errors that can occur while placing, canceling or advancing an order.
#[derive(Debug, Error)]
pub enum SagaError {
    /// The create request was malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The menu rejected at least one line; nothing was persisted.
    #[error("Menu validation failed")]
    MenuValidationFailed(ValidationReport),

    /// The menu could not be asked; nothing was persisted.
    #[error("Menu service unavailable: {0}")]
    MenuUnavailable(#[source] ServiceError),

    /// Stock could not be reserved; the order was canceled.
    #[error("Inventory reservation failed for order {order_id}: {source}")]
    InventoryReserveFailed {
        order_id: OrderId,
        source: ServiceError,
    },

    /// The payment intent could not be created; the order was canceled.
    #[error("Payment intent creation failed for order {order_id}: {source}")]
    PaymentIntentFailed {
        order_id: OrderId,
        source: ServiceError,
    },

    /// The refund was refused; the order stays paid.
    #[error("Refund failed for order {order_id}: {source}")]
    RefundFailed {
        order_id: OrderId,
        source: ServiceError,
    },

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order is not in a state that allows the operation.
    #[error("Order {order_id} is {actual}, expected {expected}")]
    InvalidState {
        order_id: OrderId,
        expected: &'static str,
        actual: OrderStatus,
    },

    /// Order store error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl SagaError {
    /// Wire error code.
    pub fn code(&self) -> &'static str {
        match self {
            SagaError::InvalidRequest(_) => "INVALID_REQUEST",
            SagaError::MenuValidationFailed(_) => "MENU_VALIDATION_FAILED",
            SagaError::MenuUnavailable(_) => "MENU_SERVICE_UNAVAILABLE",
            SagaError::InventoryReserveFailed { .. } => "INVENTORY_RESERVE_FAILED",
            SagaError::PaymentIntentFailed { .. } => "PAYMENT_INTENT_FAILED",
            SagaError::RefundFailed { .. } => "REFUND_FAILED",
            SagaError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            SagaError::InvalidState { .. } => "ORDER_INVALID_STATE",
            SagaError::Repository(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status the error maps to.
    pub fn http_status(&self) -> u16 {
        match self {
            SagaError::InvalidRequest(_) | SagaError::MenuValidationFailed(_) => 400,
            SagaError::OrderNotFound(_) => 404,
            SagaError::InvalidState { .. } => 409,
            SagaError::MenuUnavailable(_)
            | SagaError::InventoryReserveFailed { .. }
            | SagaError::PaymentIntentFailed { .. }
            | SagaError::RefundFailed { .. } => 503,
            SagaError::Repository(_) => 500,
        }
    }

    /// Structured details for the error envelope.
    ///
    /// Failures after the order was persisted carry its id.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            SagaError::MenuValidationFailed(report) => Some(serde_json::json!({
                "validatedItems": report.validated_items,
            })),
            SagaError::MenuUnavailable(source) => Some(upstream(None, source)),
            SagaError::InventoryReserveFailed { order_id, source }
            | SagaError::PaymentIntentFailed { order_id, source }
            | SagaError::RefundFailed { order_id, source } => {
                Some(upstream(Some(*order_id), source))
            }
            SagaError::InvalidState {
                order_id, actual, ..
            } => Some(serde_json::json!({
                "orderId": order_id,
                "status": actual,
            })),
            _ => None,
        }
    }

    /// Returns the persisted order this failure belongs to, if any.
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            SagaError::InventoryReserveFailed { order_id, .. }
            | SagaError::PaymentIntentFailed { order_id, .. }
            | SagaError::RefundFailed { order_id, .. }
            | SagaError::InvalidState { order_id, .. }
            | SagaError::OrderNotFound(order_id) => Some(*order_id),
            _ => None,
        }
    }
}

fn upstream(order_id: Option<OrderId>, source: &ServiceError) -> serde_json::Value {
    let mut details = serde_json::json!({ "service": source.service() });
    if let Some(order_id) = order_id {
        details["orderId"] = serde_json::json!(order_id);
    }
    if let ServiceError::Rejected {
        status,
        code,
        details: upstream_details,
        ..
    } = source
    {
        details["upstream"] = serde_json::json!({
            "status": status,
            "code": code,
            "details": upstream_details,
        });
    }
    details
}

/// Convenience type alias for orchestrator results.
pub type Result<T> = std::result::Result<T, SagaError>;

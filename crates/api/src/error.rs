//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use billing::{BillingError, NotifyError};
use common::{ErrorBody, ErrorEnvelope};
use inventory::InventoryError;
use menu::MenuError;
use orders::{SagaError, ServiceError};

use crate::trace::TraceId;

/// API-level error, rendered as the error envelope
/// `{"error": {"code", "message", "traceId", "details"?}}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
    trace_id: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
            trace_id: None,
        }
    }

    /// Malformed request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
    }

    /// Missing resource.
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn with_details(mut self, details: Option<serde_json::Value>) -> Self {
        self.details = details;
        self
    }

    pub fn with_trace_id(mut self, trace_id: String) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    fn from_parts(
        status: u16,
        code: &'static str,
        message: String,
        details: Option<serde_json::Value>,
    ) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, code, message).with_details(details)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let trace_id = self
            .trace_id
            .unwrap_or_else(|| TraceId::generate().to_string());

        if self.status.is_server_error() {
            tracing::error!(code = self.code, error = %self.message, %trace_id, "request failed");
        } else {
            tracing::debug!(code = self.code, error = %self.message, %trace_id, "request rejected");
        }

        let body = ErrorEnvelope {
            error: ErrorBody {
                code: self.code.to_string(),
                message: self.message,
                trace_id,
                details: self.details,
            },
        };
        (self.status, axum::Json(body)).into_response()
    }
}

impl From<MenuError> for ApiError {
    fn from(err: MenuError) -> Self {
        ApiError::from_parts(err.http_status(), err.code(), err.to_string(), None)
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        ApiError::from_parts(err.http_status(), err.code(), err.to_string(), err.details())
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        ApiError::from_parts(err.http_status(), err.code(), err.to_string(), err.details())
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::from_parts(err.http_status(), err.code(), err.to_string(), err.details())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

/// Failure while wiring the application at startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to build service client: {0}")]
    Gateway(#[from] ServiceError),

    #[error("Failed to build orders notifier: {0}")]
    Notifier(#[from] NotifyError),
}

#[cfg(test)]
mod tests {
    use common::{ItemId, OrderId};

    use super::*;

    #[test]
    fn test_inventory_conflict_keeps_details() {
        let err: ApiError = InventoryError::InsufficientStock {
            item_id: ItemId::new("X"),
            requested: 3,
            available: 1,
        }
        .into();

        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "INSUFFICIENT_STOCK");
        assert_eq!(err.details.unwrap()["requested"], 3);
    }

    #[test]
    fn test_saga_not_found() {
        let err: ApiError = SagaError::OrderNotFound(OrderId::new()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "ORDER_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let response = ApiError::bad_request("items must not be empty")
            .with_trace_id("trace_abc".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "INVALID_REQUEST");
        assert_eq!(json["error"]["traceId"], "trace_abc");
        assert!(json["error"].get("details").is_none());
    }
}

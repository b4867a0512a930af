//! Per-request trace ids.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::Serialize;

use crate::error::ApiError;

/// Header a caller can use to pass its own trace id.
pub const TRACE_HEADER: &str = "x-trace-id";

/// Correlates one request across logs and response bodies.
///
/// Taken from the `x-trace-id` header when present, generated otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId(String);

impl TraceId {
    /// Generates a fresh `trace_<hex>` id.
    pub fn generate() -> Self {
        Self(format!("trace_{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wraps a response body so it carries this trace id.
    pub fn attach<T>(&self, body: T) -> Traced<T> {
        Traced {
            body,
            trace_id: self.0.clone(),
        }
    }

    /// Converts an error and stamps it with this trace id.
    pub fn error(&self, err: impl Into<ApiError>) -> ApiError {
        err.into().with_trace_id(self.0.clone())
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for TraceId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let supplied = parts
            .headers
            .get(TRACE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty() && value.len() <= 128);

        Ok(match supplied {
            Some(value) => Self(value.to_string()),
            None => Self::generate(),
        })
    }
}

/// A success body with `traceId` added next to its own fields.
#[derive(Debug, Serialize)]
pub struct Traced<T> {
    #[serde(flatten)]
    pub body: T,
    #[serde(rename = "traceId")]
    pub trace_id: String,
}

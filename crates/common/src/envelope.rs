//! Uniform error envelope.
//!
//! Every service answers failures with
//! `{"error": {"code", "message", "traceId", "details"?}}`.

use serde::{Deserialize, Serialize};

/// Body of the error envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// SCREAMING_SNAKE_CASE error code.
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub trace_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Top-level error document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

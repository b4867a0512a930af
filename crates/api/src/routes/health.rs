//! Health check endpoints.

use axum::Json;
use serde::Serialize;

use crate::trace::{TraceId, Traced};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// GET /health and GET /v1/<service>/health.
pub async fn check(trace: TraceId, service: &'static str) -> Json<Traced<HealthResponse>> {
    Json(trace.attach(HealthResponse {
        status: "ok",
        service,
    }))
}

//! Payment intent, capture and refund endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use billing::{
    CaptureReceipt, CreatePaymentIntentRequest, CreateRefundRequest, PaymentIntent,
    PaymentIntentReceipt, RefundReceipt,
};
use common::PaymentIntentId;

use crate::error::ApiError;
use crate::routes::{creation_status, health, parse_id};
use crate::state::AppState;
use crate::trace::{TraceId, Traced};

/// Routes under `/v1/billing`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/billing/payment-intents", post(create_payment_intent))
        .route("/v1/billing/payment-intents/{id}", get(show_payment_intent))
        .route("/v1/billing/payments/{id}/capture", post(capture))
        .route("/v1/billing/refunds", post(refund))
        .route("/v1/billing/health", get(|trace: TraceId| health::check(trace, "billing")))
}

fn payment_intent_id(raw: &str) -> Result<PaymentIntentId, ApiError> {
    parse_id(raw, "PAYMENT_INTENT_NOT_FOUND", "Payment intent")
}

/// POST /v1/billing/payment-intents
#[tracing::instrument(skip(trace, state, payload), fields(trace_id = %trace))]
pub async fn create_payment_intent(
    trace: TraceId,
    State(state): State<AppState>,
    payload: Result<Json<CreatePaymentIntentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Traced<PaymentIntentReceipt>>), ApiError> {
    let Json(request) = payload.map_err(|e| trace.error(e))?;
    let receipt = state
        .ledger
        .create_payment_intent(request)
        .await
        .map_err(|e| trace.error(e))?;

    Ok((
        creation_status(&receipt),
        Json(trace.attach(receipt.into_inner())),
    ))
}

/// GET /v1/billing/payment-intents/{id}
pub async fn show_payment_intent(
    trace: TraceId,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Traced<PaymentIntent>>, ApiError> {
    let payment_intent_id = payment_intent_id(&id).map_err(|e| trace.error(e))?;
    let intent = state
        .ledger
        .get_payment_intent(payment_intent_id)
        .await
        .map_err(|e| trace.error(e))?;
    Ok(Json(trace.attach(intent)))
}

/// POST /v1/billing/payments/{id}/capture: also tells the orders service.
#[tracing::instrument(skip(trace, state), fields(trace_id = %trace))]
pub async fn capture(
    trace: TraceId,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Traced<CaptureReceipt>>, ApiError> {
    let payment_intent_id = payment_intent_id(&id).map_err(|e| trace.error(e))?;
    let receipt = state
        .ledger
        .capture(payment_intent_id)
        .await
        .map_err(|e| trace.error(e))?;
    Ok(Json(trace.attach(receipt)))
}

/// POST /v1/billing/refunds: also tells the orders service.
#[tracing::instrument(skip(trace, state, payload), fields(trace_id = %trace))]
pub async fn refund(
    trace: TraceId,
    State(state): State<AppState>,
    payload: Result<Json<CreateRefundRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Traced<RefundReceipt>>), ApiError> {
    let Json(request) = payload.map_err(|e| trace.error(e))?;
    let receipt = state
        .ledger
        .refund(request)
        .await
        .map_err(|e| trace.error(e))?;
    Ok((StatusCode::CREATED, Json(trace.attach(receipt))))
}

//! Order placement, cancellation and billing callbacks.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use common::OrderId;
use orders::{CreateOrder, Order, OrderEvent, OrderEventKind};

use crate::error::ApiError;
use crate::routes::{creation_status, health, parse_id};
use crate::state::AppState;
use crate::trace::{TraceId, Traced};

/// Routes under `/v1/orders`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/orders", post(create))
        .route("/v1/orders/health", get(|trace: TraceId| health::check(trace, "orders")))
        .route("/v1/orders/{id}", get(show))
        .route("/v1/orders/{id}/cancel", post(cancel))
        .route("/v1/orders/{id}/events/{event}", post(event))
}

fn order_id(raw: &str) -> Result<OrderId, ApiError> {
    parse_id(raw, "ORDER_NOT_FOUND", "Order")
}

/// POST /v1/orders: validate, persist, reserve stock and open a payment
/// intent. Replays with a known idempotency key answer 200.
#[tracing::instrument(skip(trace, state, payload), fields(trace_id = %trace))]
pub async fn create(
    trace: TraceId,
    State(state): State<AppState>,
    payload: Result<Json<CreateOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<Traced<Order>>), ApiError> {
    let Json(command) = payload.map_err(|e| trace.error(e))?;
    let placed = state
        .orchestrator
        .create_order(command)
        .await
        .map_err(|e| trace.error(e))?;

    Ok((
        creation_status(&placed),
        Json(trace.attach(placed.into_inner())),
    ))
}

/// GET /v1/orders/{id}
#[tracing::instrument(skip(trace, state), fields(trace_id = %trace))]
pub async fn show(
    trace: TraceId,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Traced<Order>>, ApiError> {
    let order_id = order_id(&id).map_err(|e| trace.error(e))?;
    let order = state
        .orchestrator
        .get_order(order_id)
        .await
        .map_err(|e| trace.error(e))?;
    Ok(Json(trace.attach(order)))
}

/// POST /v1/orders/{id}/cancel: refunds a paid order first.
#[tracing::instrument(skip(trace, state), fields(trace_id = %trace))]
pub async fn cancel(
    trace: TraceId,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Traced<Order>>, ApiError> {
    let order_id = order_id(&id).map_err(|e| trace.error(e))?;
    let order = state
        .orchestrator
        .cancel_order(order_id)
        .await
        .map_err(|e| trace.error(e))?;
    Ok(Json(trace.attach(order)))
}

/// POST /v1/orders/{id}/events/{payment-captured|refunded}
#[tracing::instrument(skip(trace, state, body), fields(trace_id = %trace))]
pub async fn event(
    trace: TraceId,
    State(state): State<AppState>,
    Path((id, event)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Traced<Order>>, ApiError> {
    let order_id = order_id(&id).map_err(|e| trace.error(e))?;
    let kind: OrderEventKind = event
        .parse()
        .map_err(|e: orders::UnknownEvent| {
            trace.error(ApiError::not_found("UNKNOWN_EVENT", e.to_string()))
        })?;

    let body: serde_json::Value = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_default()
    };

    let order = state
        .orchestrator
        .handle_event(order_id, OrderEvent::from_webhook(kind, &body))
        .await
        .map_err(|e| trace.error(e))?;
    Ok(Json(trace.attach(order)))
}

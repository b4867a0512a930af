//! Stock and reservation endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use common::{ItemId, ReservationId};
use inventory::{
    Reservation, ReservationReceipt, ReservationState, ReserveRequest, StockLevel, StockUpdate,
};

use crate::error::ApiError;
use crate::routes::{Items, creation_status, health, parse_id};
use crate::state::AppState;
use crate::trace::{TraceId, Traced};

/// Routes under `/v1/inventory`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/inventory/reservations", post(reserve))
        .route("/v1/inventory/reservations/{id}", get(show_reservation))
        .route("/v1/inventory/reservations/{id}/commit", post(commit))
        .route("/v1/inventory/reservations/{id}/release", post(release))
        .route("/v1/inventory/stock", get(list_stock))
        .route("/v1/inventory/stock/{item_id}", put(update_stock))
        .route("/v1/inventory/health", get(|trace: TraceId| health::check(trace, "inventory")))
}

fn reservation_id(raw: &str) -> Result<ReservationId, ApiError> {
    parse_id(raw, "RESERVATION_NOT_FOUND", "Reservation")
}

/// POST /v1/inventory/reservations
#[tracing::instrument(skip(trace, state, payload), fields(trace_id = %trace))]
pub async fn reserve(
    trace: TraceId,
    State(state): State<AppState>,
    payload: Result<Json<ReserveRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Traced<ReservationReceipt>>), ApiError> {
    let Json(request) = payload.map_err(|e| trace.error(e))?;
    let receipt = state
        .inventory
        .reserve(request)
        .await
        .map_err(|e| trace.error(e))?;

    Ok((
        creation_status(&receipt),
        Json(trace.attach(receipt.into_inner())),
    ))
}

/// GET /v1/inventory/reservations/{id}
pub async fn show_reservation(
    trace: TraceId,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Traced<Reservation>>, ApiError> {
    let reservation_id = reservation_id(&id).map_err(|e| trace.error(e))?;
    let reservation = state
        .inventory
        .get_reservation(reservation_id)
        .await
        .map_err(|e| trace.error(e))?;
    Ok(Json(trace.attach(reservation)))
}

/// POST /v1/inventory/reservations/{id}/commit
#[tracing::instrument(skip(trace, state), fields(trace_id = %trace))]
pub async fn commit(
    trace: TraceId,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Traced<ReservationState>>, ApiError> {
    let reservation_id = reservation_id(&id).map_err(|e| trace.error(e))?;
    let reservation = state
        .inventory
        .commit(reservation_id)
        .await
        .map_err(|e| trace.error(e))?;
    Ok(Json(trace.attach(reservation)))
}

/// POST /v1/inventory/reservations/{id}/release
#[tracing::instrument(skip(trace, state), fields(trace_id = %trace))]
pub async fn release(
    trace: TraceId,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Traced<ReservationState>>, ApiError> {
    let reservation_id = reservation_id(&id).map_err(|e| trace.error(e))?;
    let reservation = state
        .inventory
        .release(reservation_id)
        .await
        .map_err(|e| trace.error(e))?;
    Ok(Json(trace.attach(reservation)))
}

/// GET /v1/inventory/stock
pub async fn list_stock(
    trace: TraceId,
    State(state): State<AppState>,
) -> Json<Traced<Items<StockLevel>>> {
    let items = state.inventory.list_stock().await;
    Json(trace.attach(Items { items }))
}

/// PUT /v1/inventory/stock/{itemId}
#[tracing::instrument(skip(trace, state, payload), fields(trace_id = %trace))]
pub async fn update_stock(
    trace: TraceId,
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    payload: Result<Json<StockUpdate>, JsonRejection>,
) -> Result<Json<Traced<StockLevel>>, ApiError> {
    let Json(update) = payload.map_err(|e| trace.error(e))?;
    let level = state
        .inventory
        .upsert_stock(ItemId::new(item_id), update)
        .await
        .map_err(|e| trace.error(e))?;
    Ok(Json(trace.attach(level)))
}

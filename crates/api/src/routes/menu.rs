//! Menu catalog endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use common::ItemId;
use menu::{MenuItem, MenuItemPatch, NewMenuItem, ValidationReport, ValidationRequest};
use serde::Deserialize;

use crate::error::ApiError;
use crate::routes::{Items, health};
use crate::state::AppState;
use crate::trace::{TraceId, Traced};

/// Routes under `/v1/menu`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/menu/validation", post(validate))
        .route("/v1/menu/health", get(|trace: TraceId| health::check(trace, "menu")))
        .route("/v1/menu/items", get(list).post(create))
        .route("/v1/menu/items/{id}", get(show).patch(update))
        .route("/v1/menu/items/{id}/availability", post(set_availability))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub available: bool,
}

/// POST /v1/menu/validation: an invalid report is still a 200.
#[tracing::instrument(skip(trace, state, payload), fields(trace_id = %trace))]
pub async fn validate(
    trace: TraceId,
    State(state): State<AppState>,
    payload: Result<Json<ValidationRequest>, JsonRejection>,
) -> Result<Json<Traced<ValidationReport>>, ApiError> {
    let Json(request) = payload.map_err(|e| trace.error(e))?;
    let report = state.catalog.validate(&request).await;
    Ok(Json(trace.attach(report)))
}

/// GET /v1/menu/items: available items only.
pub async fn list(trace: TraceId, State(state): State<AppState>) -> Json<Traced<Items<MenuItem>>> {
    let items = state.catalog.list_available().await;
    Json(trace.attach(Items { items }))
}

/// GET /v1/menu/items/{id}
pub async fn show(
    trace: TraceId,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Traced<MenuItem>>, ApiError> {
    let item = state
        .catalog
        .get(&ItemId::new(id))
        .await
        .map_err(|e| trace.error(e))?;
    Ok(Json(trace.attach(item)))
}

/// POST /v1/menu/items
#[tracing::instrument(skip(trace, state, payload), fields(trace_id = %trace))]
pub async fn create(
    trace: TraceId,
    State(state): State<AppState>,
    payload: Result<Json<NewMenuItem>, JsonRejection>,
) -> Result<(StatusCode, Json<Traced<MenuItem>>), ApiError> {
    let Json(new_item) = payload.map_err(|e| trace.error(e))?;
    let item = state
        .catalog
        .create(new_item)
        .await
        .map_err(|e| trace.error(e))?;
    Ok((StatusCode::CREATED, Json(trace.attach(item))))
}

/// PATCH /v1/menu/items/{id}
#[tracing::instrument(skip(trace, state, payload), fields(trace_id = %trace))]
pub async fn update(
    trace: TraceId,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<MenuItemPatch>, JsonRejection>,
) -> Result<Json<Traced<MenuItem>>, ApiError> {
    let Json(patch) = payload.map_err(|e| trace.error(e))?;
    let item = state
        .catalog
        .update(&ItemId::new(id), patch)
        .await
        .map_err(|e| trace.error(e))?;
    Ok(Json(trace.attach(item)))
}

/// POST /v1/menu/items/{id}/availability
#[tracing::instrument(skip(trace, state, payload), fields(trace_id = %trace))]
pub async fn set_availability(
    trace: TraceId,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AvailabilityRequest>, JsonRejection>,
) -> Result<Json<Traced<MenuItem>>, ApiError> {
    let Json(request) = payload.map_err(|e| trace.error(e))?;
    let item = state
        .catalog
        .set_availability(&ItemId::new(id), request.available)
        .await
        .map_err(|e| trace.error(e))?;
    Ok(Json(trace.attach(item)))
}

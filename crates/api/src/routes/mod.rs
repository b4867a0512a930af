//! HTTP handlers, one module per service.

pub mod billing;
pub mod health;
pub mod inventory;
pub mod menu;
pub mod metrics;
pub mod orders;

use std::str::FromStr;

use axum::http::StatusCode;
use common::Idempotent;
use serde::Serialize;

use crate::error::ApiError;

/// A list response body.
#[derive(Debug, Serialize)]
pub struct Items<T> {
    pub items: Vec<T>,
}

/// 201 for a new record, 200 for one returned from an earlier request.
pub(crate) fn creation_status<T>(result: &Idempotent<T>) -> StatusCode {
    if result.is_replay() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    }
}

/// Parses an id from the path. An id that cannot exist is reported as not
/// found.
pub(crate) fn parse_id<T: FromStr>(
    raw: &str,
    code: &'static str,
    what: &str,
) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::not_found(code, format!("{what} {raw} not found")))
}

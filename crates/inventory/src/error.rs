//! Inventory error types.

use common::{ItemId, ReservationId};
use thiserror::Error;

use crate::reservation::ReservationStatus;

/// Errors that can occur in the inventory store.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Not enough unreserved stock to admit the reservation.
    #[error("Insufficient stock for item {item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: ItemId,
        requested: u32,
        available: u32,
    },

    /// No reservation with this id exists.
    #[error("Reservation {0} not found")]
    ReservationNotFound(ReservationId),

    /// The reservation is not in a state that allows the operation.
    #[error("Reservation {reservation_id} is in {status} state")]
    InvalidState {
        reservation_id: ReservationId,
        status: ReservationStatus,
    },

    /// The request itself is malformed.
    #[error("Invalid inventory request: {0}")]
    InvalidRequest(String),
}

impl InventoryError {
    /// Wire error code.
    pub fn code(&self) -> &'static str {
        match self {
            InventoryError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            InventoryError::ReservationNotFound(_) => "RESERVATION_NOT_FOUND",
            InventoryError::InvalidState { .. } => "RESERVATION_INVALID_STATE",
            InventoryError::InvalidRequest(_) => "INVALID_REQUEST",
        }
    }

    /// HTTP status the error maps to.
    pub fn http_status(&self) -> u16 {
        match self {
            InventoryError::InsufficientStock { .. } | InventoryError::InvalidState { .. } => 409,
            InventoryError::ReservationNotFound(_) => 404,
            InventoryError::InvalidRequest(_) => 400,
        }
    }

    /// Structured details for the error envelope.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            InventoryError::InsufficientStock {
                item_id,
                requested,
                available,
            } => Some(serde_json::json!({
                "itemId": item_id,
                "requested": requested,
                "available": available,
            })),
            InventoryError::InvalidState {
                reservation_id,
                status,
            } => Some(serde_json::json!({
                "reservationId": reservation_id,
                "status": status,
            })),
            _ => None,
        }
    }
}

/// Convenience type alias for inventory results.
pub type Result<T> = std::result::Result<T, InventoryError>;

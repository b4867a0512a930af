//! Reservation records and their state machine.

use chrono::{DateTime, Utc};
use common::{IdempotencyKey, ItemId, OrderId, ReservationId};
use serde::{Deserialize, Serialize};

/// The state of a reservation in its lifecycle.
///
/// State transitions:
/// ```text
/// Reserved ──┬──► Committed
///            ├──► Released
///            └──► Expired
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Stock is held for the order.
    #[default]
    Reserved,

    /// Stock was deducted for good (terminal state).
    Committed,

    /// Stock was handed back on request (terminal state).
    Released,

    /// Stock was handed back because the hold timed out (terminal state).
    Expired,
}

impl ReservationStatus {
    /// Returns true while the reservation still holds stock.
    pub fn is_held(&self) -> bool {
        matches!(self, ReservationStatus::Reserved)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        !self.is_held()
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Reserved => "reserved",
            ReservationStatus::Committed => "committed",
            ReservationStatus::Released => "released",
            ReservationStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_qty() -> u32 {
    1
}

/// One item held by a reservation.
///
/// Deserializes from a full order line item too; price fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservedItem {
    pub item_id: ItemId,
    #[serde(default = "default_qty")]
    pub qty: u32,
}

impl ReservedItem {
    pub fn new(item_id: impl Into<ItemId>, qty: u32) -> Self {
        Self {
            item_id: item_id.into(),
            qty,
        }
    }
}

/// A hold on stock for one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: ReservationId,
    pub order_id: OrderId,
    pub items: Vec<ReservedItem>,
    pub status: ReservationStatus,
    #[serde(skip_serializing, default)]
    pub idempotency_key: Option<IdempotencyKey>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Reservation {
    /// Returns a receipt for this reservation.
    pub fn receipt(&self) -> ReservationReceipt {
        ReservationReceipt {
            reservation_id: self.id,
            status: self.status,
            expires_at: self.expires_at,
        }
    }

    /// Returns the id/status pair reported by commit and release.
    pub fn state(&self) -> ReservationState {
        ReservationState {
            reservation_id: self.id,
            status: self.status,
        }
    }

    /// Returns true if the hold has run out at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status.is_held() && self.expires_at <= now
    }
}

/// Request body of `POST /v1/inventory/reservations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveRequest {
    pub order_id: OrderId,
    pub items: Vec<ReservedItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<IdempotencyKey>,
}

/// Answer to a reservation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationReceipt {
    pub reservation_id: ReservationId,
    pub status: ReservationStatus,
    pub expires_at: DateTime<Utc>,
}

/// Answer to commit and release requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationState {
    pub reservation_id: ReservationId,
    pub status: ReservationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_reserved() {
        assert_eq!(ReservationStatus::default(), ReservationStatus::Reserved);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ReservationStatus::Reserved.is_terminal());
        assert!(ReservationStatus::Committed.is_terminal());
        assert!(ReservationStatus::Released.is_terminal());
        assert!(ReservationStatus::Expired.is_terminal());
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&ReservationStatus::Committed).unwrap();
        assert_eq!(json, "\"committed\"");
        assert_eq!(ReservationStatus::Expired.to_string(), "expired");
    }

    #[test]
    fn test_reserved_item_ignores_price() {
        let item: ReservedItem =
            serde_json::from_str(r#"{"itemId": "X", "qty": 2, "unitPrice": "5.00"}"#).unwrap();
        assert_eq!(item, ReservedItem::new("X", 2));
    }
}

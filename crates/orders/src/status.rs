//! Order state machine.

use serde::{Deserialize, Serialize};

/// The state of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Validating ──► Reserved ──► Paid
///      │             │          │
///      └─────────────┴──────────┴──► Canceled
/// ```
///
/// `Completed` is part of the wire vocabulary but no operation reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Items were validated and the order persisted; stock not yet held.
    #[default]
    Validating,

    /// Stock is held; a payment intent may be attached.
    Reserved,

    /// Payment was captured.
    Paid,

    /// The order was rolled back or canceled (terminal state).
    Canceled,

    /// Fulfilled (terminal state).
    Completed,
}

impl OrderStatus {
    /// Returns true if the reservation step may run.
    pub fn can_reserve(&self) -> bool {
        matches!(self, OrderStatus::Validating)
    }

    /// Returns true if a captured payment may move the order to paid.
    pub fn can_mark_paid(&self) -> bool {
        matches!(self, OrderStatus::Reserved)
    }

    /// Returns true if a client may cancel the order.
    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            OrderStatus::Validating | OrderStatus::Reserved | OrderStatus::Paid
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Canceled | OrderStatus::Completed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Validating => "validating",
            OrderStatus::Reserved => "reserved",
            OrderStatus::Paid => "paid",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_validating() {
        assert_eq!(OrderStatus::default(), OrderStatus::Validating);
    }

    #[test]
    fn test_cancelable_states() {
        assert!(OrderStatus::Validating.can_cancel());
        assert!(OrderStatus::Reserved.can_cancel());
        assert!(OrderStatus::Paid.can_cancel());
        assert!(!OrderStatus::Canceled.can_cancel());
        assert!(!OrderStatus::Completed.can_cancel());
    }

    #[test]
    fn test_only_reserved_can_be_paid() {
        assert!(OrderStatus::Reserved.can_mark_paid());
        assert!(!OrderStatus::Validating.can_mark_paid());
        assert!(!OrderStatus::Paid.can_mark_paid());
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Canceled.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(!OrderStatus::Paid.is_terminal());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Canceled).unwrap(),
            "\"canceled\""
        );
        assert_eq!(OrderStatus::Reserved.to_string(), "reserved");
    }
}

//! Webhook events that advance an order from outside the saga.

use std::str::FromStr;

use common::{PaymentIntentId, RefundId};

/// A billing callback for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    /// The payment for the order was captured.
    PaymentCaptured {
        payment_intent_id: Option<PaymentIntentId>,
    },

    /// The payment for the order was refunded.
    Refunded { refund_id: Option<RefundId> },
}

impl OrderEvent {
    /// Builds an event from its URL name and JSON body.
    ///
    /// Bodies are informational; missing or malformed ids are ignored.
    pub fn from_webhook(kind: OrderEventKind, body: &serde_json::Value) -> Self {
        match kind {
            OrderEventKind::PaymentCaptured => OrderEvent::PaymentCaptured {
                payment_intent_id: id_field(body, "paymentIntentId"),
            },
            OrderEventKind::Refunded => OrderEvent::Refunded {
                refund_id: id_field(body, "refundId"),
            },
        }
    }

    /// Returns the event kind.
    pub fn kind(&self) -> OrderEventKind {
        match self {
            OrderEvent::PaymentCaptured { .. } => OrderEventKind::PaymentCaptured,
            OrderEvent::Refunded { .. } => OrderEventKind::Refunded,
        }
    }
}

fn id_field<T: FromStr>(body: &serde_json::Value, field: &str) -> Option<T> {
    body.get(field)?.as_str()?.parse().ok()
}

/// The event name used in `/v1/orders/{id}/events/{kind}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderEventKind {
    PaymentCaptured,
    Refunded,
}

impl OrderEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderEventKind::PaymentCaptured => "payment-captured",
            OrderEventKind::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for OrderEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unknown event name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown order event: {0}")]
pub struct UnknownEvent(pub String);

impl FromStr for OrderEventKind {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payment-captured" => Ok(OrderEventKind::PaymentCaptured),
            "refunded" => Ok(OrderEventKind::Refunded),
            other => Err(UnknownEvent(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(
            "payment-captured".parse::<OrderEventKind>().unwrap(),
            OrderEventKind::PaymentCaptured
        );
        assert_eq!(OrderEventKind::Refunded.to_string(), "refunded");
        assert!("shipped".parse::<OrderEventKind>().is_err());
    }

    #[test]
    fn test_from_webhook_reads_ids() {
        let id = PaymentIntentId::new();
        let event = OrderEvent::from_webhook(
            OrderEventKind::PaymentCaptured,
            &serde_json::json!({"paymentIntentId": id.to_string(), "amount": "10.00"}),
        );
        assert_eq!(
            event,
            OrderEvent::PaymentCaptured {
                payment_intent_id: Some(id)
            }
        );
    }

    #[test]
    fn test_from_webhook_tolerates_empty_body() {
        let event = OrderEvent::from_webhook(OrderEventKind::Refunded, &serde_json::Value::Null);
        assert_eq!(event, OrderEvent::Refunded { refund_id: None });
        assert_eq!(event.kind(), OrderEventKind::Refunded);
    }
}

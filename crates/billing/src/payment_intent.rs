//! Payment intents.

use chrono::{DateTime, Utc};
use common::{IdempotencyKey, Money, OrderId, PaymentIntentId};
use serde::{Deserialize, Serialize};

/// The state of a payment intent.
///
/// State transitions:
/// ```text
/// RequiresPaymentMethod ──┬──► Captured ──► Refunded
/// Processing ─────────────┘
/// ```
/// `Failed` is reported by payment processors and never entered here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    #[default]
    RequiresPaymentMethod,
    Processing,
    Captured,
    Refunded,
    Failed,
}

impl PaymentIntentStatus {
    /// Returns true if the intent can move to `Captured`.
    pub fn can_capture(&self) -> bool {
        matches!(
            self,
            PaymentIntentStatus::RequiresPaymentMethod | PaymentIntentStatus::Processing
        )
    }

    /// Returns true if money can be returned.
    pub fn can_refund(&self) -> bool {
        matches!(self, PaymentIntentStatus::Captured)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentIntentStatus::RequiresPaymentMethod => "requires_payment_method",
            PaymentIntentStatus::Processing => "processing",
            PaymentIntentStatus::Captured => "captured",
            PaymentIntentStatus::Refunded => "refunded",
            PaymentIntentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentIntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Money the restaurant intends to collect for one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    #[serde(rename = "paymentIntentId")]
    pub id: PaymentIntentId,
    pub order_id: OrderId,
    pub amount: Money,
    pub currency: String,
    pub status: PaymentIntentStatus,
    #[serde(skip_serializing, default)]
    pub client_secret: String,
    #[serde(skip_serializing, default)]
    pub idempotency_key: Option<IdempotencyKey>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentIntent {
    /// Returns the creation receipt, the only place the client secret shows.
    pub fn receipt(&self) -> PaymentIntentReceipt {
        PaymentIntentReceipt {
            payment_intent_id: self.id,
            status: self.status,
            client_secret: self.client_secret.clone(),
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Request body of `POST /v1/billing/payment-intents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentRequest {
    pub order_id: OrderId,
    pub amount: Money,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<IdempotencyKey>,
}

/// Answer to payment intent creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentReceipt {
    pub payment_intent_id: PaymentIntentId,
    pub status: PaymentIntentStatus,
    pub client_secret: String,
}

/// Answer to a capture request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureReceipt {
    pub payment_intent_id: PaymentIntentId,
    pub status: PaymentIntentStatus,
}

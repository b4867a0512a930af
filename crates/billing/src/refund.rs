//! Refund records.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, PaymentIntentId, RefundId};
use serde::{Deserialize, Serialize};

/// Refunds settle synchronously, so only `Completed` is ever recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    Completed,
}

/// Money returned against a captured payment intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Refund {
    pub id: RefundId,
    pub order_id: OrderId,
    pub payment_intent_id: PaymentIntentId,
    pub amount: Money,
    pub status: RefundStatus,
    pub created_at: DateTime<Utc>,
}

impl Refund {
    pub fn receipt(&self) -> RefundReceipt {
        RefundReceipt {
            refund_id: self.id,
            payment_intent_id: self.payment_intent_id,
            order_id: self.order_id,
            amount: self.amount,
            status: self.status,
        }
    }
}

/// Request body of `POST /v1/billing/refunds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRefundRequest {
    pub order_id: OrderId,
    pub payment_intent_id: PaymentIntentId,
    pub amount: Money,
}

/// Answer to a refund request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundReceipt {
    pub refund_id: RefundId,
    pub payment_intent_id: PaymentIntentId,
    pub order_id: OrderId,
    pub amount: Money,
    pub status: RefundStatus,
}

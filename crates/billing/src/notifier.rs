//! Webhook notifications to the orders service.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::{Money, OrderId, PaymentIntentId, RefundId};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::NotifyError;

/// Body of `POST /v1/orders/{id}/events/payment-captured`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCapturedNotice {
    pub payment_intent_id: PaymentIntentId,
    pub amount: Money,
    pub currency: String,
}

/// Body of `POST /v1/orders/{id}/events/refunded`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundedNotice {
    pub refund_id: RefundId,
    pub payment_intent_id: PaymentIntentId,
    pub amount: Money,
}

/// Outbound channel from billing to the orders service.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    /// Reports that the payment for an order was captured.
    async fn payment_captured(
        &self,
        order_id: OrderId,
        notice: PaymentCapturedNotice,
    ) -> Result<(), NotifyError>;

    /// Reports that the payment for an order was refunded.
    async fn refunded(&self, order_id: OrderId, notice: RefundedNotice) -> Result<(), NotifyError>;
}

/// Posts notifications to the orders service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpOrderNotifier {
    client: reqwest::Client,
    orders_url: String,
}

impl HttpOrderNotifier {
    /// Creates a notifier for the orders service at `orders_url`.
    pub fn new(orders_url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError(e.to_string()))?;
        Ok(Self {
            client,
            orders_url: orders_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post<B: Serialize + Sync>(
        &self,
        order_id: OrderId,
        event: &str,
        body: &B,
    ) -> Result<(), NotifyError> {
        let url = format!("{}/v1/orders/{order_id}/events/{event}", self.orders_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| NotifyError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError(format!("{url} answered {status}")))
        }
    }
}

#[async_trait]
impl OrderNotifier for HttpOrderNotifier {
    async fn payment_captured(
        &self,
        order_id: OrderId,
        notice: PaymentCapturedNotice,
    ) -> Result<(), NotifyError> {
        self.post(order_id, "payment-captured", &notice).await
    }

    async fn refunded(&self, order_id: OrderId, notice: RefundedNotice) -> Result<(), NotifyError> {
        self.post(order_id, "refunded", &notice).await
    }
}

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    PaymentCaptured {
        order_id: OrderId,
        notice: PaymentCapturedNotice,
    },
    Refunded {
        order_id: OrderId,
        notice: RefundedNotice,
    },
}

/// In-memory notifier for testing and for running billing without an
/// orders service.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingNotifier {
    /// Creates a new recording notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following notification fail (nothing is recorded).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns everything delivered so far.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }

    async fn record(&self, notification: Notification) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError("orders service unreachable".to_string()));
        }
        self.sent.lock().await.push(notification);
        Ok(())
    }
}

#[async_trait]
impl OrderNotifier for RecordingNotifier {
    async fn payment_captured(
        &self,
        order_id: OrderId,
        notice: PaymentCapturedNotice,
    ) -> Result<(), NotifyError> {
        self.record(Notification::PaymentCaptured { order_id, notice })
            .await
    }

    async fn refunded(&self, order_id: OrderId, notice: RefundedNotice) -> Result<(), NotifyError> {
        self.record(Notification::Refunded { order_id, notice }).await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn notice() -> PaymentCapturedNotice {
        PaymentCapturedNotice {
            payment_intent_id: PaymentIntentId::new(),
            amount: Money::from_cents(1000),
            currency: "USD".to_string(),
        }
    }

    #[tokio::test]
    async fn test_http_notifier_posts_webhook() {
        let server = MockServer::start().await;
        let order_id = OrderId::new();
        Mock::given(method("POST"))
            .and(path(format!("/v1/orders/{order_id}/events/payment-captured")))
            .and(body_partial_json(serde_json::json!({"amount": "10.00"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = HttpOrderNotifier::new(server.uri(), Duration::from_secs(2)).unwrap();
        notifier.payment_captured(order_id, notice()).await.unwrap();
    }

    #[tokio::test]
    async fn test_http_notifier_reports_non_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let notifier = HttpOrderNotifier::new(server.uri(), Duration::from_secs(2)).unwrap();
        let result = notifier.payment_captured(OrderId::new(), notice()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        let order_id = OrderId::new();
        notifier.payment_captured(order_id, notice()).await.unwrap();

        notifier.set_failing(true);
        assert!(notifier.payment_captured(order_id, notice()).await.is_err());

        assert_eq!(notifier.notifications().await.len(), 1);
    }
}

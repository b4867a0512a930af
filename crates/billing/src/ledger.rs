//! In-memory billing ledger.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use common::{IdempotencyKey, Idempotent, PaymentIntentId, RefundId};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{BillingError, Result};
use crate::notifier::{OrderNotifier, PaymentCapturedNotice, RefundedNotice};
use crate::payment_intent::{
    CaptureReceipt, CreatePaymentIntentRequest, PaymentIntent, PaymentIntentReceipt,
    PaymentIntentStatus,
};
use crate::refund::{CreateRefundRequest, Refund, RefundReceipt, RefundStatus};

#[derive(Debug, Default)]
struct BillingState {
    intents: HashMap<PaymentIntentId, PaymentIntent>,
    by_key: HashMap<IdempotencyKey, PaymentIntentId>,
    refunds: Vec<Refund>,
}

/// Payment intents and refunds, plus the channel used to tell the orders
/// service about captures and refunds.
#[derive(Clone)]
pub struct BillingLedger {
    state: Arc<RwLock<BillingState>>,
    notifier: Arc<dyn OrderNotifier>,
}

impl BillingLedger {
    /// Creates an empty ledger that reports to `notifier`.
    pub fn new(notifier: Arc<dyn OrderNotifier>) -> Self {
        Self {
            state: Arc::default(),
            notifier,
        }
    }

    /// Creates a payment intent, or returns the one already stored under the
    /// same idempotency key.
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<Idempotent<PaymentIntentReceipt>> {
        if request.amount.is_negative() {
            return Err(BillingError::InvalidRequest(
                "amount must not be negative".to_string(),
            ));
        }
        let currency = request.currency.trim().to_ascii_uppercase();
        if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(BillingError::InvalidRequest(format!(
                "unsupported currency '{}'",
                request.currency
            )));
        }

        let mut state = self.state.write().await;

        if let Some(key) = &request.idempotency_key {
            if let Some(existing) = state.by_key.get(key).and_then(|id| state.intents.get(id)) {
                tracing::debug!(payment_intent_id = %existing.id, "payment intent replayed");
                return Ok(Idempotent::Replayed(existing.receipt()));
            }
        }

        let now = Utc::now();
        let intent = PaymentIntent {
            id: PaymentIntentId::new(),
            order_id: request.order_id,
            amount: request.amount,
            currency,
            status: PaymentIntentStatus::RequiresPaymentMethod,
            client_secret: format!("secret_{}", Uuid::new_v4().simple()),
            idempotency_key: request.idempotency_key.clone(),
            created_at: now,
            updated_at: now,
        };
        let receipt = intent.receipt();

        if let Some(key) = request.idempotency_key {
            state.by_key.insert(key, intent.id);
        }
        state.intents.insert(intent.id, intent);

        metrics::counter!("billing_payment_intents_total").increment(1);
        tracing::info!(payment_intent_id = %receipt.payment_intent_id, "payment intent created");
        Ok(Idempotent::Created(receipt))
    }

    /// Loads a payment intent by id.
    pub async fn get_payment_intent(&self, id: PaymentIntentId) -> Result<PaymentIntent> {
        self.state
            .read()
            .await
            .intents
            .get(&id)
            .cloned()
            .ok_or(BillingError::PaymentIntentNotFound(id))
    }

    /// Captures a payment intent and tells the orders service.
    ///
    /// Capturing an already captured intent returns its current state and
    /// does not notify again.
    #[tracing::instrument(skip(self))]
    pub async fn capture(&self, id: PaymentIntentId) -> Result<CaptureReceipt> {
        let (receipt, order_id, notice) = {
            let mut state = self.state.write().await;
            let intent = state
                .intents
                .get_mut(&id)
                .ok_or(BillingError::PaymentIntentNotFound(id))?;

            if intent.status == PaymentIntentStatus::Captured {
                return Ok(CaptureReceipt {
                    payment_intent_id: id,
                    status: intent.status,
                });
            }
            if !intent.status.can_capture() {
                return Err(BillingError::InvalidState {
                    payment_intent_id: id,
                    status: intent.status,
                });
            }

            intent.status = PaymentIntentStatus::Captured;
            intent.updated_at = Utc::now();
            let notice = PaymentCapturedNotice {
                payment_intent_id: id,
                amount: intent.amount,
                currency: intent.currency.clone(),
            };
            let receipt = CaptureReceipt {
                payment_intent_id: id,
                status: intent.status,
            };
            (receipt, intent.order_id, notice)
        };

        metrics::counter!("billing_captures_total").increment(1);
        tracing::info!(%order_id, "payment captured");

        if let Err(e) = self.notifier.payment_captured(order_id, notice).await {
            tracing::warn!(%order_id, error = %e, "payment-captured notification failed");
        }
        Ok(receipt)
    }

    /// Refunds a captured payment intent and tells the orders service.
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn refund(&self, request: CreateRefundRequest) -> Result<RefundReceipt> {
        if request.amount.is_negative() {
            return Err(BillingError::InvalidRequest(
                "amount must not be negative".to_string(),
            ));
        }

        let refund = {
            let mut state = self.state.write().await;
            let intent = state
                .intents
                .get_mut(&request.payment_intent_id)
                .ok_or(BillingError::PaymentIntentNotFound(request.payment_intent_id))?;

            if intent.order_id != request.order_id {
                return Err(BillingError::InvalidRequest(format!(
                    "payment intent {} does not belong to order {}",
                    intent.id, request.order_id
                )));
            }
            if !intent.status.can_refund() {
                return Err(BillingError::RefundNotAllowed {
                    payment_intent_id: intent.id,
                    status: intent.status,
                });
            }

            let now = Utc::now();
            intent.status = PaymentIntentStatus::Refunded;
            intent.updated_at = now;

            let refund = Refund {
                id: RefundId::new(),
                order_id: request.order_id,
                payment_intent_id: request.payment_intent_id,
                amount: request.amount,
                status: RefundStatus::Completed,
                created_at: now,
            };
            state.refunds.push(refund.clone());
            refund
        };

        metrics::counter!("billing_refunds_total").increment(1);
        tracing::info!(refund_id = %refund.id, "payment refunded");

        let notice = RefundedNotice {
            refund_id: refund.id,
            payment_intent_id: refund.payment_intent_id,
            amount: refund.amount,
        };
        if let Err(e) = self.notifier.refunded(refund.order_id, notice).await {
            tracing::warn!(order_id = %refund.order_id, error = %e, "refunded notification failed");
        }
        Ok(refund.receipt())
    }

    /// Returns the refunds recorded against a payment intent.
    pub async fn refunds_for(&self, payment_intent_id: PaymentIntentId) -> Vec<Refund> {
        self.state
            .read()
            .await
            .refunds
            .iter()
            .filter(|refund| refund.payment_intent_id == payment_intent_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use common::{Money, OrderId};

    use super::*;
    use crate::notifier::{Notification, RecordingNotifier};

    fn ledger() -> (BillingLedger, RecordingNotifier) {
        let notifier = RecordingNotifier::new();
        (BillingLedger::new(Arc::new(notifier.clone())), notifier)
    }

    fn intent_request(key: Option<&str>) -> CreatePaymentIntentRequest {
        CreatePaymentIntentRequest {
            order_id: OrderId::new(),
            amount: Money::from_cents(1000),
            currency: "usd".to_string(),
            idempotency_key: key.and_then(IdempotencyKey::parse),
        }
    }

    #[tokio::test]
    async fn test_create_payment_intent() {
        let (ledger, _) = ledger();
        let receipt = ledger
            .create_payment_intent(intent_request(None))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(receipt.status, PaymentIntentStatus::RequiresPaymentMethod);
        assert!(receipt.client_secret.starts_with("secret_"));

        let intent = ledger.get_payment_intent(receipt.payment_intent_id).await.unwrap();
        assert_eq!(intent.currency, "USD");
        assert_eq!(intent.amount.to_string(), "10.00");
    }

    #[tokio::test]
    async fn test_idempotent_create() {
        let (ledger, _) = ledger();
        let first = ledger
            .create_payment_intent(intent_request(Some("k_payment")))
            .await
            .unwrap();
        let second = ledger
            .create_payment_intent(intent_request(Some("k_payment")))
            .await
            .unwrap();

        assert!(second.is_replay());
        assert_eq!(first.into_inner(), second.into_inner());
    }

    #[tokio::test]
    async fn test_invalid_currency_rejected() {
        let (ledger, _) = ledger();
        let mut request = intent_request(None);
        request.currency = "dollars".to_string();
        assert!(matches!(
            ledger.create_payment_intent(request).await,
            Err(BillingError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_capture_notifies_once() {
        let (ledger, notifier) = ledger();
        let request = intent_request(None);
        let order_id = request.order_id;
        let id = ledger
            .create_payment_intent(request)
            .await
            .unwrap()
            .into_inner()
            .payment_intent_id;

        let first = ledger.capture(id).await.unwrap();
        let second = ledger.capture(id).await.unwrap();
        assert_eq!(first.status, PaymentIntentStatus::Captured);
        assert_eq!(second.status, PaymentIntentStatus::Captured);

        let sent = notifier.notifications().await;
        assert_eq!(sent.len(), 1);
        assert!(matches!(
            &sent[0],
            Notification::PaymentCaptured { order_id: o, .. } if *o == order_id
        ));
    }

    #[tokio::test]
    async fn test_capture_survives_notification_failure() {
        let (ledger, notifier) = ledger();
        notifier.set_failing(true);
        let id = ledger
            .create_payment_intent(intent_request(None))
            .await
            .unwrap()
            .into_inner()
            .payment_intent_id;

        let receipt = ledger.capture(id).await.unwrap();
        assert_eq!(receipt.status, PaymentIntentStatus::Captured);
    }

    #[tokio::test]
    async fn test_refund_requires_capture() {
        let (ledger, _) = ledger();
        let request = intent_request(None);
        let order_id = request.order_id;
        let id = ledger
            .create_payment_intent(request)
            .await
            .unwrap()
            .into_inner()
            .payment_intent_id;

        let refund = CreateRefundRequest {
            order_id,
            payment_intent_id: id,
            amount: Money::from_cents(1000),
        };
        assert!(matches!(
            ledger.refund(refund.clone()).await,
            Err(BillingError::RefundNotAllowed { .. })
        ));

        ledger.capture(id).await.unwrap();
        let receipt = ledger.refund(refund.clone()).await.unwrap();
        assert_eq!(receipt.status, RefundStatus::Completed);

        let intent = ledger.get_payment_intent(id).await.unwrap();
        assert_eq!(intent.status, PaymentIntentStatus::Refunded);
        assert_eq!(ledger.refunds_for(id).await.len(), 1);

        // Refunded money cannot be captured or refunded again.
        assert!(matches!(
            ledger.capture(id).await,
            Err(BillingError::InvalidState { .. })
        ));
        assert!(matches!(
            ledger.refund(refund).await,
            Err(BillingError::RefundNotAllowed { .. })
        ));
    }

    #[tokio::test]
    async fn test_refund_for_another_order_rejected() {
        let (ledger, notifier) = ledger();
        let request = intent_request(None);
        let order_id = request.order_id;
        let id = ledger
            .create_payment_intent(request)
            .await
            .unwrap()
            .into_inner()
            .payment_intent_id;
        ledger.capture(id).await.unwrap();

        let result = ledger
            .refund(CreateRefundRequest {
                order_id: OrderId::new(),
                payment_intent_id: id,
                amount: Money::from_cents(1000),
            })
            .await;
        assert!(matches!(result, Err(BillingError::InvalidRequest(_))));

        let intent = ledger.get_payment_intent(id).await.unwrap();
        assert_eq!(intent.status, PaymentIntentStatus::Captured);
        assert!(ledger.refunds_for(id).await.is_empty());

        // Only the capture reached the orders service.
        let sent = notifier.notifications().await;
        assert_eq!(sent.len(), 1);
        assert!(matches!(
            &sent[0],
            Notification::PaymentCaptured { order_id: o, .. } if *o == order_id
        ));
    }

    #[tokio::test]
    async fn test_unknown_intent() {
        let (ledger, _) = ledger();
        assert!(matches!(
            ledger.capture(PaymentIntentId::new()).await,
            Err(BillingError::PaymentIntentNotFound(_))
        ));
    }
}

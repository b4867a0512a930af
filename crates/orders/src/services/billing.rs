//! Billing gateway.

use std::sync::Arc;

use async_trait::async_trait;
use billing::{
    BillingError, BillingLedger, CaptureReceipt, CreatePaymentIntentRequest,
    CreateRefundRequest, PaymentIntentReceipt, RefundReceipt,
};
use common::PaymentIntentId;

use crate::error::ServiceError;

/// Payment collection for orders.
#[async_trait]
pub trait BillingService: Send + Sync {
    /// Opens a payment intent for an order total.
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntentReceipt, ServiceError>;

    /// Captures an intent.
    async fn capture(
        &self,
        payment_intent_id: PaymentIntentId,
    ) -> Result<CaptureReceipt, ServiceError>;

    /// Returns captured money.
    async fn refund(&self, request: CreateRefundRequest) -> Result<RefundReceipt, ServiceError>;
}

#[async_trait]
impl<T: BillingService + ?Sized> BillingService for Arc<T> {
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntentReceipt, ServiceError> {
        (**self).create_payment_intent(request).await
    }

    async fn capture(
        &self,
        payment_intent_id: PaymentIntentId,
    ) -> Result<CaptureReceipt, ServiceError> {
        (**self).capture(payment_intent_id).await
    }

    async fn refund(&self, request: CreateRefundRequest) -> Result<RefundReceipt, ServiceError> {
        (**self).refund(request).await
    }
}

impl From<BillingError> for ServiceError {
    fn from(err: BillingError) -> Self {
        ServiceError::Rejected {
            service: "billing",
            status: err.http_status(),
            code: err.code().to_string(),
            message: err.to_string(),
            details: err.details(),
        }
    }
}

#[async_trait]
impl BillingService for BillingLedger {
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntentReceipt, ServiceError> {
        Ok(BillingLedger::create_payment_intent(self, request)
            .await?
            .into_inner())
    }

    async fn capture(
        &self,
        payment_intent_id: PaymentIntentId,
    ) -> Result<CaptureReceipt, ServiceError> {
        Ok(BillingLedger::capture(self, payment_intent_id).await?)
    }

    async fn refund(&self, request: CreateRefundRequest) -> Result<RefundReceipt, ServiceError> {
        Ok(BillingLedger::refund(self, request).await?)
    }
}

#[cfg(test)]
mod tests {
    use billing::{PaymentIntentStatus, RecordingNotifier};
    use common::{Money, OrderId};

    use super::*;

    #[tokio::test]
    async fn test_refund_before_capture_is_rejected() {
        let ledger = BillingLedger::new(Arc::new(RecordingNotifier::new()));
        let service: &dyn BillingService = &ledger;
        let order_id = OrderId::new();

        let intent = service
            .create_payment_intent(CreatePaymentIntentRequest {
                order_id,
                amount: Money::from_cents(1000),
                currency: "USD".to_string(),
                idempotency_key: None,
            })
            .await
            .unwrap();

        let err = service
            .refund(CreateRefundRequest {
                order_id,
                payment_intent_id: intent.payment_intent_id,
                amount: Money::from_cents(1000),
            })
            .await
            .unwrap_err();
        assert_eq!(err.upstream_code(), Some("REFUND_FAILED"));

        let captured = service.capture(intent.payment_intent_id).await.unwrap();
        assert_eq!(captured.status, PaymentIntentStatus::Captured);
    }
}

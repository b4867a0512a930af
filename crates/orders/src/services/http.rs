//! HTTP gateways to services running in other processes.

use std::time::Duration;

use async_trait::async_trait;
use billing::{
    CaptureReceipt, CreatePaymentIntentRequest, CreateRefundRequest, PaymentIntentReceipt,
    RefundReceipt,
};
use common::{ErrorEnvelope, PaymentIntentId, ReservationId};
use inventory::{ReservationReceipt, ReservationState, ReserveRequest};
use menu::{ValidationReport, ValidationRequest};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ServiceUrls;
use crate::error::ServiceError;
use crate::services::{BillingService, InventoryService, MenuService};

/// JSON over HTTP to one service. Any non-2xx answer, transport error or
/// undecodable body is an error; nothing is retried.
#[derive(Debug, Clone)]
struct ServiceClient {
    service: &'static str,
    client: reqwest::Client,
    base_url: String,
}

impl ServiceClient {
    fn new(service: &'static str, base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Transport {
                service,
                reason: e.to_string(),
            })?;
        Ok(Self {
            service,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ServiceError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        self.send(self.client.post(url).json(body)).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let url = format!("{}{path}", self.base_url);
        self.send(self.client.post(url)).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ServiceError> {
        let response = request.send().await.map_err(|e| self.transport(e))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport(e))?;

        if !status.is_success() {
            return Err(self.rejection(status.as_u16(), &body));
        }

        serde_json::from_slice(&body).map_err(|e| ServiceError::InvalidResponse {
            service: self.service,
            reason: e.to_string(),
        })
    }

    fn transport(&self, err: reqwest::Error) -> ServiceError {
        let reason = if err.is_timeout() {
            "request timed out".to_string()
        } else {
            err.to_string()
        };
        ServiceError::Transport {
            service: self.service,
            reason,
        }
    }

    fn rejection(&self, status: u16, body: &[u8]) -> ServiceError {
        match serde_json::from_slice::<ErrorEnvelope>(body) {
            Ok(envelope) => ServiceError::Rejected {
                service: self.service,
                status,
                code: envelope.error.code,
                message: envelope.error.message,
                details: envelope.error.details,
            },
            Err(_) => ServiceError::Rejected {
                service: self.service,
                status,
                code: "UPSTREAM_ERROR".to_string(),
                message: String::from_utf8_lossy(body).chars().take(200).collect(),
                details: None,
            },
        }
    }
}

/// Menu service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMenuService {
    client: ServiceClient,
}

impl HttpMenuService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            client: ServiceClient::new("menu", base_url, timeout)?,
        })
    }

    pub fn from_urls(urls: &ServiceUrls) -> Result<Self, ServiceError> {
        Self::new(&urls.menu, urls.timeout)
    }
}

#[async_trait]
impl MenuService for HttpMenuService {
    async fn validate(
        &self,
        request: ValidationRequest,
    ) -> Result<ValidationReport, ServiceError> {
        self.client.post("/v1/menu/validation", &request).await
    }
}

/// Inventory service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpInventoryService {
    client: ServiceClient,
}

impl HttpInventoryService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            client: ServiceClient::new("inventory", base_url, timeout)?,
        })
    }

    pub fn from_urls(urls: &ServiceUrls) -> Result<Self, ServiceError> {
        Self::new(&urls.inventory, urls.timeout)
    }
}

#[async_trait]
impl InventoryService for HttpInventoryService {
    async fn reserve(&self, request: ReserveRequest) -> Result<ReservationReceipt, ServiceError> {
        self.client
            .post("/v1/inventory/reservations", &request)
            .await
    }

    async fn commit(
        &self,
        reservation_id: ReservationId,
    ) -> Result<ReservationState, ServiceError> {
        self.client
            .post_empty(&format!(
                "/v1/inventory/reservations/{reservation_id}/commit"
            ))
            .await
    }

    async fn release(
        &self,
        reservation_id: ReservationId,
    ) -> Result<ReservationState, ServiceError> {
        self.client
            .post_empty(&format!(
                "/v1/inventory/reservations/{reservation_id}/release"
            ))
            .await
    }
}

/// Billing service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBillingService {
    client: ServiceClient,
}

impl HttpBillingService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            client: ServiceClient::new("billing", base_url, timeout)?,
        })
    }

    pub fn from_urls(urls: &ServiceUrls) -> Result<Self, ServiceError> {
        Self::new(&urls.billing, urls.timeout)
    }
}

#[async_trait]
impl BillingService for HttpBillingService {
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntentReceipt, ServiceError> {
        self.client
            .post("/v1/billing/payment-intents", &request)
            .await
    }

    async fn capture(
        &self,
        payment_intent_id: PaymentIntentId,
    ) -> Result<CaptureReceipt, ServiceError> {
        self.client
            .post_empty(&format!("/v1/billing/payments/{payment_intent_id}/capture"))
            .await
    }

    async fn refund(&self, request: CreateRefundRequest) -> Result<RefundReceipt, ServiceError> {
        self.client.post("/v1/billing/refunds", &request).await
    }
}

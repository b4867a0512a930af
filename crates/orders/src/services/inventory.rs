//! Inventory gateway.

use std::sync::Arc;

use async_trait::async_trait;
use common::ReservationId;
use inventory::{
    InventoryError, InventoryStore, ReservationReceipt, ReservationState, ReserveRequest,
};

use crate::error::ServiceError;

/// Stock reservation for orders.
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Holds stock for every line of an order, all or nothing.
    async fn reserve(&self, request: ReserveRequest) -> Result<ReservationReceipt, ServiceError>;

    /// Deducts held stock for good.
    async fn commit(&self, reservation_id: ReservationId)
    -> Result<ReservationState, ServiceError>;

    /// Hands held stock back. Releasing a finished reservation is a no-op.
    async fn release(
        &self,
        reservation_id: ReservationId,
    ) -> Result<ReservationState, ServiceError>;
}

#[async_trait]
impl<T: InventoryService + ?Sized> InventoryService for Arc<T> {
    async fn reserve(&self, request: ReserveRequest) -> Result<ReservationReceipt, ServiceError> {
        (**self).reserve(request).await
    }

    async fn commit(
        &self,
        reservation_id: ReservationId,
    ) -> Result<ReservationState, ServiceError> {
        (**self).commit(reservation_id).await
    }

    async fn release(
        &self,
        reservation_id: ReservationId,
    ) -> Result<ReservationState, ServiceError> {
        (**self).release(reservation_id).await
    }
}

impl From<InventoryError> for ServiceError {
    fn from(err: InventoryError) -> Self {
        ServiceError::Rejected {
            service: "inventory",
            status: err.http_status(),
            code: err.code().to_string(),
            message: err.to_string(),
            details: err.details(),
        }
    }
}

#[async_trait]
impl InventoryService for InventoryStore {
    async fn reserve(&self, request: ReserveRequest) -> Result<ReservationReceipt, ServiceError> {
        Ok(InventoryStore::reserve(self, request).await?.into_inner())
    }

    async fn commit(
        &self,
        reservation_id: ReservationId,
    ) -> Result<ReservationState, ServiceError> {
        Ok(InventoryStore::commit(self, reservation_id).await?)
    }

    async fn release(
        &self,
        reservation_id: ReservationId,
    ) -> Result<ReservationState, ServiceError> {
        Ok(InventoryStore::release(self, reservation_id).await?)
    }
}

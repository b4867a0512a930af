//! Order persistence.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{IdempotencyKey, OrderId};
use tokio::sync::RwLock;

use crate::error::RepositoryError;
use crate::order::Order;

/// Storage for orders. Orders are never deleted.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stores a new order.
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError>;

    /// Overwrites an existing order.
    async fn save(&self, order: &Order) -> Result<(), RepositoryError>;

    /// Loads an order by id.
    async fn find(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Loads the order created with `key`, if any.
    ///
    /// Keys are not enforced unique: two concurrent creates with the same
    /// key can both miss here and both insert. The earliest order wins
    /// subsequent lookups.
    async fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<Order>, RepositoryError>;
}

#[async_trait]
impl<T: OrderRepository + ?Sized> OrderRepository for Arc<T> {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        (**self).insert(order).await
    }

    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        (**self).save(order).await
    }

    async fn find(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        (**self).find(id).await
    }

    async fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<Order>, RepositoryError> {
        (**self).find_by_idempotency_key(key).await
    }
}

/// In-memory order store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Returns true if no order was stored.
    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id()) {
            return Err(RepositoryError(format!(
                "order {} already exists",
                order.id()
            )));
        }
        orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&order.id()) {
            Some(stored) => {
                *stored = order.clone();
                Ok(())
            }
            None => Err(RepositoryError(format!("order {} does not exist", order.id()))),
        }
    }

    async fn find(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .filter(|order| order.idempotency_key() == Some(key))
            .min_by_key(|order| order.created_at())
            .cloned())
    }
}

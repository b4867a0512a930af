//! In-memory inventory store.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use common::{IdempotencyKey, Idempotent, ItemId, ReservationId};
use tokio::sync::RwLock;

use crate::error::{InventoryError, Result};
use crate::reservation::{
    Reservation, ReservationReceipt, ReservationState, ReservationStatus, ReserveRequest,
};
use crate::stock::{Stock, StockLevel, StockUpdate};

/// Tunables for the inventory store.
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    /// Quantity given to an item the first time it is reserved without any
    /// stock record. `None` treats unknown items as out of stock.
    pub default_stock: Option<u32>,
    /// How long a reservation holds stock before it may be expired.
    pub reservation_ttl: Duration,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            default_stock: Some(100),
            reservation_ttl: Duration::minutes(15),
        }
    }
}

#[derive(Debug, Default)]
struct InventoryState {
    stock: HashMap<ItemId, Stock>,
    reservations: HashMap<ReservationId, Reservation>,
    by_key: HashMap<IdempotencyKey, ReservationId>,
}

impl InventoryState {
    fn reservation_mut(&mut self, id: ReservationId) -> Result<&mut Reservation> {
        self.reservations
            .get_mut(&id)
            .ok_or(InventoryError::ReservationNotFound(id))
    }

    /// Hands the held quantities of `reservation_id` back and marks it with
    /// `status`. Stock and status change under the same lock.
    fn return_stock(&mut self, reservation_id: ReservationId, status: ReservationStatus) {
        let Some(reservation) = self.reservations.get_mut(&reservation_id) else {
            return;
        };
        for item in &reservation.items {
            if let Some(stock) = self.stock.get_mut(&item.item_id) {
                stock.unhold(item.qty);
            }
        }
        reservation.status = status;
    }
}

/// Stock and reservations behind a single lock, so the availability check
/// and the hold it admits happen atomically.
#[derive(Debug, Clone, Default)]
pub struct InventoryStore {
    state: Arc<RwLock<InventoryState>>,
    config: InventoryConfig,
}

impl InventoryStore {
    /// Creates an empty store with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with the given settings.
    pub fn with_config(config: InventoryConfig) -> Self {
        Self {
            state: Arc::default(),
            config,
        }
    }

    /// Holds stock for an order.
    ///
    /// Replays return the reservation stored under the same idempotency key
    /// without touching stock. Either every line is admitted or none is.
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn reserve(&self, request: ReserveRequest) -> Result<Idempotent<ReservationReceipt>> {
        if request.items.is_empty() {
            return Err(InventoryError::InvalidRequest(
                "a reservation needs at least one item".to_string(),
            ));
        }
        if let Some(item) = request.items.iter().find(|item| item.qty == 0) {
            return Err(InventoryError::InvalidRequest(format!(
                "quantity for item {} must be at least 1",
                item.item_id
            )));
        }

        let mut state = self.state.write().await;

        if let Some(key) = &request.idempotency_key {
            if let Some(existing) = state.by_key.get(key).and_then(|id| state.reservations.get(id)) {
                tracing::debug!(reservation_id = %existing.id, "reservation replayed");
                return Ok(Idempotent::Replayed(existing.receipt()));
            }
        }

        // Sum repeated lines so the same item listed twice is checked once.
        let mut demand: Vec<(ItemId, u32)> = Vec::new();
        for item in &request.items {
            match demand.iter_mut().find(|(id, _)| *id == item.item_id) {
                Some((_, qty)) => {
                    *qty = qty.checked_add(item.qty).ok_or_else(|| {
                        InventoryError::InvalidRequest(format!(
                            "total quantity for item {} is too large",
                            item.item_id
                        ))
                    })?;
                }
                None => demand.push((item.item_id.clone(), item.qty)),
            }
        }

        for (item_id, requested) in &demand {
            let available = match state.stock.get(item_id) {
                Some(stock) => stock.available(),
                None => self.config.default_stock.unwrap_or(0),
            };
            if available < *requested {
                metrics::counter!("inventory_reservations_rejected_total").increment(1);
                tracing::info!(%item_id, requested, available, "insufficient stock");
                return Err(InventoryError::InsufficientStock {
                    item_id: item_id.clone(),
                    requested: *requested,
                    available,
                });
            }
        }

        for (item_id, requested) in demand {
            let default_stock = self.config.default_stock.unwrap_or(0);
            state
                .stock
                .entry(item_id.clone())
                .or_insert_with(|| Stock::new(item_id.clone(), item_id.as_str(), default_stock))
                .hold(requested);
        }

        let now = Utc::now();
        let reservation = Reservation {
            id: ReservationId::new(),
            order_id: request.order_id,
            items: request.items,
            status: ReservationStatus::Reserved,
            idempotency_key: request.idempotency_key.clone(),
            created_at: now,
            expires_at: now + self.config.reservation_ttl,
        };
        let receipt = reservation.receipt();

        if let Some(key) = request.idempotency_key {
            state.by_key.insert(key, reservation.id);
        }
        state.reservations.insert(reservation.id, reservation);

        metrics::counter!("inventory_reservations_total").increment(1);
        tracing::info!(reservation_id = %receipt.reservation_id, "stock reserved");
        Ok(Idempotent::Created(receipt))
    }

    /// Deducts the held stock for good.
    ///
    /// Only a `reserved` reservation can be committed; committing twice is a
    /// conflict, not a no-op.
    pub async fn commit(&self, reservation_id: ReservationId) -> Result<ReservationState> {
        let mut state = self.state.write().await;
        let reservation = state.reservation_mut(reservation_id)?;
        if !reservation.status.is_held() {
            return Err(InventoryError::InvalidState {
                reservation_id,
                status: reservation.status,
            });
        }
        reservation.status = ReservationStatus::Committed;
        let items = reservation.items.clone();
        let committed = reservation.state();

        for item in items {
            if let Some(stock) = state.stock.get_mut(&item.item_id) {
                stock.consume(item.qty);
            }
        }

        tracing::info!(%reservation_id, "reservation committed");
        Ok(committed)
    }

    /// Hands the held stock back. Releasing a reservation that no longer
    /// holds stock reports its current status.
    pub async fn release(&self, reservation_id: ReservationId) -> Result<ReservationState> {
        let mut state = self.state.write().await;
        let status = state.reservation_mut(reservation_id)?.status;
        if status.is_held() {
            state.return_stock(reservation_id, ReservationStatus::Released);
            tracing::info!(%reservation_id, "reservation released");
        } else {
            tracing::debug!(%reservation_id, %status, "release of settled reservation ignored");
        }
        Ok(state.reservation_mut(reservation_id)?.state())
    }

    /// Expires every held reservation whose hold ran out at `now` and
    /// returns their ids. Meant to be driven by an external sweeper.
    pub async fn expire_due(&self, now: DateTime<Utc>) -> Vec<ReservationId> {
        let mut state = self.state.write().await;
        let due: Vec<ReservationId> = state
            .reservations
            .values()
            .filter(|reservation| reservation.is_due(now))
            .map(|reservation| reservation.id)
            .collect();

        for id in &due {
            state.return_stock(*id, ReservationStatus::Expired);
        }
        if !due.is_empty() {
            metrics::counter!("inventory_reservations_expired_total").increment(due.len() as u64);
            tracing::info!(count = due.len(), "reservations expired");
        }
        due
    }

    /// Loads a reservation by id.
    pub async fn get_reservation(&self, reservation_id: ReservationId) -> Result<Reservation> {
        self.state
            .read()
            .await
            .reservations
            .get(&reservation_id)
            .cloned()
            .ok_or(InventoryError::ReservationNotFound(reservation_id))
    }

    /// Returns all stock ordered by item id.
    pub async fn list_stock(&self) -> Vec<StockLevel> {
        let state = self.state.read().await;
        let mut levels: Vec<StockLevel> = state.stock.values().map(Stock::level).collect();
        levels.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        levels
    }

    /// Returns the stock of one item, if tracked.
    pub async fn stock_level(&self, item_id: &ItemId) -> Option<StockLevel> {
        self.state.read().await.stock.get(item_id).map(Stock::level)
    }

    /// Creates or updates the stock record of an item.
    pub async fn upsert_stock(&self, item_id: ItemId, update: StockUpdate) -> Result<StockLevel> {
        let mut state = self.state.write().await;
        let stock = state.stock.entry(item_id.clone()).or_insert_with(|| {
            let name = update
                .item_name
                .clone()
                .unwrap_or_else(|| item_id.to_string());
            Stock::new(item_id.clone(), name, 0)
        });

        if let Some(quantity) = update.quantity {
            if !stock.set_quantity(quantity) {
                return Err(InventoryError::InvalidRequest(format!(
                    "quantity {quantity} is below the {} units currently reserved",
                    stock.reserved_quantity()
                )));
            }
        }
        if let Some(name) = update.item_name {
            stock.item_name = name;
        }

        tracing::info!(%item_id, quantity = stock.quantity(), "stock updated");
        Ok(stock.level())
    }
}

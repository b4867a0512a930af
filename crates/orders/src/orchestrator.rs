//! Order saga orchestrator.

use std::time::Instant;

use billing::{CreatePaymentIntentRequest, CreateRefundRequest};
use common::{IdempotencyKey, Idempotent, OrderId, ReservationId};
use inventory::{ReserveRequest, ReservedItem};
use menu::ValidationRequest;

use crate::error::{Result, SagaError, ServiceError};
use crate::events::OrderEvent;
use crate::order::{CreateOrder, Order};
use crate::repository::OrderRepository;
use crate::services::{BillingService, InventoryService, MenuService};
use crate::status::OrderStatus;
use crate::steps::{DEFAULT_CURRENCY, SAGA_TYPE, SagaStep};

/// Drives orders through menu validation, stock reservation and payment.
///
/// Steps run one after another. A failed step after the order was persisted
/// releases whatever stock it holds and cancels the order. Nothing is
/// retried.
pub struct Orchestrator<R, M, I, B>
where
    R: OrderRepository,
    M: MenuService,
    I: InventoryService,
    B: BillingService,
{
    repository: R,
    menu: M,
    inventory: I,
    billing: B,
}

impl<R, M, I, B> Orchestrator<R, M, I, B>
where
    R: OrderRepository,
    M: MenuService,
    I: InventoryService,
    B: BillingService,
{
    /// Creates a new orchestrator.
    pub fn new(repository: R, menu: M, inventory: I, billing: B) -> Self {
        Self {
            repository,
            menu,
            inventory,
            billing,
        }
    }

    /// Places an order.
    ///
    /// A request carrying an idempotency key that already produced an order
    /// returns that order untouched, whatever its current state.
    #[tracing::instrument(skip(self, command), fields(saga_type = SAGA_TYPE))]
    pub async fn create_order(&self, command: CreateOrder) -> Result<Idempotent<Order>> {
        command.check()?;
        let key = command.key().cloned();

        if let Some(key) = &key {
            if let Some(existing) = self.repository.find_by_idempotency_key(key).await? {
                metrics::counter!("saga_orders_replayed_total").increment(1);
                tracing::info!(order_id = %existing.id(), "order replayed");
                return Ok(Idempotent::Replayed(existing));
            }
        }

        let saga_start = Instant::now();
        let result = self.place_order(command, key).await;
        metrics::histogram!("saga_duration_seconds").record(saga_start.elapsed().as_secs_f64());

        result.map(Idempotent::Created)
    }

    async fn place_order(
        &self,
        command: CreateOrder,
        key: Option<IdempotencyKey>,
    ) -> Result<Order> {
        // 1. Validate with the menu. Nothing is persisted on failure.
        tracing::info!(step = %SagaStep::ValidateItems, "saga step started");
        let report = self
            .menu
            .validate(ValidationRequest {
                items: command.items.clone(),
                idempotency_key: SagaStep::ValidateItems.idempotency_key(key.as_ref()),
            })
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "menu validation unavailable");
                SagaError::MenuUnavailable(e)
            })?;

        if !report.valid {
            metrics::counter!("saga_validation_rejections_total").increment(1);
            tracing::info!(failures = report.failures().count(), "menu validation rejected order");
            return Err(SagaError::MenuValidationFailed(report));
        }

        // 2. Persist in validating.
        let mut order = Order::place(command)?;
        let order_id = order.id();
        self.repository.insert(&order).await?;
        metrics::counter!("saga_orders_created_total").increment(1);
        tracing::info!(%order_id, total = %order.total_amount(), "order persisted");

        // 3. Reserve stock.
        tracing::info!(%order_id, step = %SagaStep::ReserveInventory, "saga step started");
        let reserve = ReserveRequest {
            order_id,
            items: order
                .items()
                .iter()
                .map(|item| ReservedItem::new(item.item_id.clone(), item.qty))
                .collect(),
            idempotency_key: SagaStep::ReserveInventory.idempotency_key(key.as_ref()),
        };
        match self.inventory.reserve(reserve).await {
            Ok(receipt) => {
                order.mark_reserved(receipt.reservation_id)?;
                self.repository.save(&order).await?;
            }
            Err(source) => {
                self.compensate(&mut order, SagaStep::ReserveInventory, &source)
                    .await?;
                return Err(SagaError::InventoryReserveFailed { order_id, source });
            }
        }

        // 4. Open the payment intent.
        tracing::info!(%order_id, step = %SagaStep::CreatePaymentIntent, "saga step started");
        let intent = CreatePaymentIntentRequest {
            order_id,
            amount: order.total_amount(),
            currency: DEFAULT_CURRENCY.to_string(),
            idempotency_key: SagaStep::CreatePaymentIntent.idempotency_key(key.as_ref()),
        };
        match self.billing.create_payment_intent(intent).await {
            Ok(receipt) => {
                order.attach_payment_intent(receipt.payment_intent_id)?;
                self.repository.save(&order).await?;
            }
            Err(source) => {
                self.compensate(&mut order, SagaStep::CreatePaymentIntent, &source)
                    .await?;
                return Err(SagaError::PaymentIntentFailed { order_id, source });
            }
        }

        tracing::info!(%order_id, "order placed, awaiting payment");
        Ok(order)
    }

    /// Undoes the completed steps of a failed placement and cancels the
    /// order.
    #[tracing::instrument(skip(self, order, reason), fields(order_id = %order.id()))]
    async fn compensate(
        &self,
        order: &mut Order,
        failed_step: SagaStep,
        reason: &ServiceError,
    ) -> Result<()> {
        metrics::counter!("saga_compensations_total", "step" => failed_step.as_str()).increment(1);
        tracing::warn!(step = %failed_step, error = %reason, "saga step failed, compensating");

        if let Some(reservation_id) = order.reservation_id() {
            self.release_reservation(order.id(), reservation_id).await;
        }

        order.cancel();
        self.repository.save(order).await?;
        metrics::counter!("saga_orders_canceled_total").increment(1);
        Ok(())
    }

    /// Loads an order by id.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.repository
            .find(order_id)
            .await?
            .ok_or(SagaError::OrderNotFound(order_id))
    }

    /// Cancels an order.
    ///
    /// A paid order is refunded first; if the refund is refused the order
    /// stays paid and its stock stays deducted. Canceling a canceled order
    /// returns it unchanged.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order> {
        let mut order = self.get_order(order_id).await?;

        if order.status() == OrderStatus::Canceled {
            tracing::debug!("order already canceled");
            return Ok(order);
        }
        if !order.status().can_cancel() {
            return Err(SagaError::InvalidState {
                order_id,
                expected: "validating, reserved or paid",
                actual: order.status(),
            });
        }

        if order.status() == OrderStatus::Paid {
            match order.payment_intent_id() {
                Some(payment_intent_id) => {
                    let refund = CreateRefundRequest {
                        order_id,
                        payment_intent_id,
                        amount: order.total_amount(),
                    };
                    let receipt = self.billing.refund(refund).await.map_err(|source| {
                        tracing::warn!(error = %source, "refund failed, order stays paid");
                        SagaError::RefundFailed { order_id, source }
                    })?;
                    tracing::info!(refund_id = %receipt.refund_id, "payment refunded");
                }
                None => tracing::warn!("paid order has no payment intent, nothing to refund"),
            }
        }

        if let Some(reservation_id) = order.reservation_id() {
            self.release_reservation(order_id, reservation_id).await;
        }

        order.cancel();
        self.repository.save(&order).await?;
        metrics::counter!("saga_orders_canceled_total").increment(1);
        tracing::info!("order canceled");
        Ok(order)
    }

    /// Applies a billing callback to an order.
    #[tracing::instrument(skip(self), fields(event = %event.kind()))]
    pub async fn handle_event(&self, order_id: OrderId, event: OrderEvent) -> Result<Order> {
        let mut order = self.get_order(order_id).await?;

        match event {
            OrderEvent::PaymentCaptured { payment_intent_id } => {
                if !order.status().can_mark_paid() {
                    return Err(SagaError::InvalidState {
                        order_id,
                        expected: "reserved",
                        actual: order.status(),
                    });
                }
                if let (Some(reported), Some(attached)) =
                    (payment_intent_id, order.payment_intent_id())
                {
                    if reported != attached {
                        tracing::warn!(%reported, %attached, "capture reported for another payment intent");
                    }
                }

                if let Some(reservation_id) = order.reservation_id() {
                    match self.inventory.commit(reservation_id).await {
                        Ok(state) => tracing::debug!(status = %state.status, "reservation committed"),
                        Err(e) => tracing::warn!(%reservation_id, error = %e, "reservation commit failed"),
                    }
                }

                order.mark_paid()?;
                self.repository.save(&order).await?;
                metrics::counter!("saga_orders_paid_total").increment(1);
                tracing::info!("order paid");
            }
            OrderEvent::Refunded { refund_id } => {
                let was_canceled = order.status() == OrderStatus::Canceled;
                order.cancel();
                self.repository.save(&order).await?;
                if !was_canceled {
                    metrics::counter!("saga_orders_canceled_total").increment(1);
                }
                tracing::info!(refund_id = ?refund_id, "order canceled after refund");
            }
        }

        Ok(order)
    }

    async fn release_reservation(&self, order_id: OrderId, reservation_id: ReservationId) {
        match self.inventory.release(reservation_id).await {
            Ok(state) => {
                tracing::debug!(%order_id, %reservation_id, status = %state.status, "reservation released")
            }
            Err(e) => {
                tracing::warn!(%order_id, %reservation_id, error = %e, "reservation release failed")
            }
        }
    }
}

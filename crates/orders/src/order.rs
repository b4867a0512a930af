//! The order aggregate and the command that creates it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{IdempotencyKey, LineItem, Money, OrderId, PaymentIntentId, ReservationId, total_of};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SagaError};
use crate::status::OrderStatus;

/// Customer id used when the request names none.
pub const ANONYMOUS_CUSTOMER: &str = "anonymous";

/// Who placed the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Request body of `POST /v1/orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrder {
    #[serde(default)]
    pub customer: Customer,
    pub items: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<IdempotencyKey>,
}

impl CreateOrder {
    /// Creates a command for an anonymous customer.
    pub fn new(items: Vec<LineItem>) -> Self {
        Self {
            customer: Customer::default(),
            items,
            idempotency_key: None,
        }
    }

    /// Sets the customer.
    pub fn for_customer(mut self, id: impl Into<String>, name: Option<String>) -> Self {
        self.customer = Customer {
            id: Some(id.into()),
            name,
        };
        self
    }

    /// Sets the idempotency key. Blank keys are ignored.
    pub fn with_idempotency_key(mut self, key: &str) -> Self {
        self.idempotency_key = IdempotencyKey::parse(key);
        self
    }

    /// Rejects requests no downstream service should see.
    pub(crate) fn check(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(SagaError::InvalidRequest(
                "order must contain at least one item".to_string(),
            ));
        }
        for item in &self.items {
            if item.item_id.as_str().trim().is_empty() {
                return Err(SagaError::InvalidRequest("itemId must not be empty".to_string()));
            }
            if item.qty == 0 {
                return Err(SagaError::InvalidRequest(format!(
                    "qty for item {} must be at least 1",
                    item.item_id
                )));
            }
            if item.unit_price.is_negative() {
                return Err(SagaError::InvalidRequest(format!(
                    "unitPrice for item {} must not be negative",
                    item.item_id
                )));
            }
        }

        // Repeated lines for one item are reserved as a single quantity.
        let mut quantities: HashMap<&str, u32> = HashMap::new();
        for item in &self.items {
            let qty = quantities.entry(item.item_id.as_str()).or_default();
            *qty = qty.checked_add(item.qty).ok_or_else(|| {
                SagaError::InvalidRequest(format!("total qty for item {} is too large", item.item_id))
            })?;
        }

        total_of(&self.items).map_err(|_| {
            SagaError::InvalidRequest("order total is out of range".to_string())
        })?;
        Ok(())
    }

    /// Returns the client key with blank keys treated as absent.
    pub(crate) fn key(&self) -> Option<&IdempotencyKey> {
        self.idempotency_key
            .as_ref()
            .filter(|key| !key.as_str().trim().is_empty())
    }
}

/// A customer order, owned by the orchestrator.
///
/// The total is computed once from the line items when the order is placed
/// and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "orderId")]
    id: OrderId,
    customer_id: String,
    customer_name: Option<String>,
    items: Vec<LineItem>,
    total_amount: Money,
    status: OrderStatus,
    reservation_id: Option<ReservationId>,
    payment_intent_id: Option<PaymentIntentId>,
    #[serde(skip_serializing)]
    idempotency_key: Option<IdempotencyKey>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Places a new order in `validating` from a checked command.
    pub fn place(command: CreateOrder) -> Result<Self> {
        let now = Utc::now();
        let total_amount = total_of(&command.items).map_err(|_| {
            SagaError::InvalidRequest("order total is out of range".to_string())
        })?;
        Ok(Self {
            id: OrderId::new(),
            customer_id: command
                .customer
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| ANONYMOUS_CUSTOMER.to_string()),
            customer_name: command.customer.name,
            items: command.items,
            total_amount,
            status: OrderStatus::Validating,
            reservation_id: None,
            payment_intent_id: None,
            idempotency_key: command
                .idempotency_key
                .filter(|key| !key.as_str().trim().is_empty()),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn reservation_id(&self) -> Option<ReservationId> {
        self.reservation_id
    }

    pub fn payment_intent_id(&self) -> Option<PaymentIntentId> {
        self.payment_intent_id
    }

    pub fn idempotency_key(&self) -> Option<&IdempotencyKey> {
        self.idempotency_key.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Records the stock hold and moves to `reserved`.
    pub fn mark_reserved(&mut self, reservation_id: ReservationId) -> Result<()> {
        self.require(self.status.can_reserve(), "validating")?;
        self.reservation_id = Some(reservation_id);
        self.transition(OrderStatus::Reserved);
        Ok(())
    }

    /// Attaches the payment intent created for a reserved order.
    pub fn attach_payment_intent(&mut self, payment_intent_id: PaymentIntentId) -> Result<()> {
        self.require(self.status == OrderStatus::Reserved, "reserved")?;
        self.payment_intent_id = Some(payment_intent_id);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Moves a reserved order to `paid`.
    pub fn mark_paid(&mut self) -> Result<()> {
        self.require(self.status.can_mark_paid(), "reserved")?;
        self.transition(OrderStatus::Paid);
        Ok(())
    }

    /// Moves the order to `canceled` whatever its state.
    pub fn cancel(&mut self) {
        self.transition(OrderStatus::Canceled);
    }

    fn require(&self, allowed: bool, expected: &'static str) -> Result<()> {
        if allowed {
            Ok(())
        } else {
            Err(SagaError::InvalidState {
                order_id: self.id,
                expected,
                actual: self.status,
            })
        }
    }

    fn transition(&mut self, to: OrderStatus) {
        tracing::debug!(order_id = %self.id, from = %self.status, %to, "order transition");
        self.status = to;
        self.updated_at = Utc::now();
    }
}

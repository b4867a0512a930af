//! Order placement saga steps.

use common::IdempotencyKey;

/// The saga type identifier for order placement.
pub const SAGA_TYPE: &str = "OrderPlacement";

/// Currency used for payment intents.
pub const DEFAULT_CURRENCY: &str = "USD";

/// The remote calls made while placing an order, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SagaStep {
    ValidateItems,
    ReserveInventory,
    CreatePaymentIntent,
}

impl SagaStep {
    /// Returns the step name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStep::ValidateItems => "validate_items",
            SagaStep::ReserveInventory => "reserve_inventory",
            SagaStep::CreatePaymentIntent => "create_payment_intent",
        }
    }

    /// Suffix appended to the client's idempotency key for this step.
    pub fn idempotency_scope(&self) -> &'static str {
        match self {
            SagaStep::ValidateItems => "validation",
            SagaStep::ReserveInventory => "reservation",
            SagaStep::CreatePaymentIntent => "payment",
        }
    }

    /// Derives the downstream key for this step. No client key, no
    /// downstream key.
    pub fn idempotency_key(&self, key: Option<&IdempotencyKey>) -> Option<IdempotencyKey> {
        key.map(|key| key.scoped(self.idempotency_scope()))
    }
}

impl std::fmt::Display for SagaStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Shared types for the restaurant services.
//!
//! Everything that crosses a service boundary lives here: identifiers,
//! fixed-point money, order line items, idempotency keys and the error
//! envelope every service answers with.

pub mod envelope;
pub mod idempotency;
pub mod ids;
pub mod line_item;
pub mod money;

pub use envelope::{ErrorBody, ErrorEnvelope};
pub use idempotency::{IdempotencyKey, Idempotent};
pub use ids::{ItemId, OrderId, PaymentIntentId, RefundId, ReservationId};
pub use line_item::{LineItem, total_of};
pub use money::{AmountOverflow, Money, MoneyParseError};

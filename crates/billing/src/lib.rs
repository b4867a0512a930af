//! Billing service: payment intents, captures and refunds.
//!
//! Captures and refunds are reported back to the orders service through an
//! [`OrderNotifier`]. Notification failures are logged and never undo the
//! billing state change that triggered them.

pub mod error;
pub mod ledger;
pub mod notifier;
pub mod payment_intent;
pub mod refund;

pub use error::{BillingError, NotifyError, Result};
pub use ledger::BillingLedger;
pub use notifier::{
    HttpOrderNotifier, Notification, OrderNotifier, PaymentCapturedNotice, RecordingNotifier,
    RefundedNotice,
};
pub use payment_intent::{
    CaptureReceipt, CreatePaymentIntentRequest, PaymentIntent, PaymentIntentReceipt,
    PaymentIntentStatus,
};
pub use refund::{CreateRefundRequest, Refund, RefundReceipt, RefundStatus};

//! Order saga orchestrator.
//!
//! The orders service owns the order lifecycle and drives the menu, inventory
//! and billing services through a fixed sequence of steps:
//!
//! ```text
//! validate items ──► persist ──► reserve stock ──► open payment intent
//!                                     │                    │
//!                                     ▼                    ▼
//!                                  cancel          release stock, cancel
//! ```
//!
//! Billing later reports captures and refunds through [`OrderEvent`]s.

pub mod config;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod order;
pub mod repository;
pub mod services;
pub mod status;
pub mod steps;

pub use config::ServiceUrls;
pub use error::{RepositoryError, Result, SagaError, ServiceError};
pub use events::{OrderEvent, OrderEventKind, UnknownEvent};
pub use orchestrator::Orchestrator;
pub use order::{Customer, CreateOrder, Order};
pub use repository::{InMemoryOrderRepository, OrderRepository};
pub use services::{
    BillingService, HttpBillingService, HttpInventoryService, HttpMenuService, InventoryService,
    MenuService,
};
pub use status::OrderStatus;
pub use steps::SagaStep;

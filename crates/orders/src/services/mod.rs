//! Narrow gateways to the leaf services.
//!
//! Each gateway has an in-process implementation on the leaf's own store
//! (used when every service runs in one process, and in tests) and an HTTP
//! implementation in [`http`].

pub mod billing;
pub mod http;
pub mod inventory;
pub mod menu;

pub use billing::BillingService;
pub use http::{HttpBillingService, HttpInventoryService, HttpMenuService};
pub use inventory::InventoryService;
pub use menu::MenuService;

//! Menu catalog service.
//!
//! Holds item prices and availability and answers batch validation requests
//! from the orders service before an order is persisted.

pub mod catalog;
pub mod error;
pub mod item;
pub mod validation;

pub use catalog::MenuCatalog;
pub use error::{MenuError, Result};
pub use item::{MenuItem, MenuItemPatch, NewMenuItem};
pub use validation::{ItemValidation, ValidationIssue, ValidationReport, ValidationRequest};

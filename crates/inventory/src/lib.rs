//! Inventory service: per-item stock and time-limited reservations.
//!
//! A reservation moves stock from available to reserved; committing it
//! deducts the stock for good, releasing or expiring it hands the quantity
//! back.

pub mod error;
pub mod reservation;
pub mod stock;
pub mod store;

pub use error::{InventoryError, Result};
pub use reservation::{
    ReservationReceipt, ReservationState, ReservationStatus, Reservation, ReserveRequest,
    ReservedItem,
};
pub use stock::{Stock, StockLevel, StockUpdate};
pub use store::{InventoryConfig, InventoryStore};

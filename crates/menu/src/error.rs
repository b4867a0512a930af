//! Menu error types.

use common::ItemId;
use thiserror::Error;

/// Errors that can occur in the menu catalog.
#[derive(Debug, Error)]
pub enum MenuError {
    /// No item with this id exists.
    #[error("Menu item {0} not found")]
    ItemNotFound(ItemId),

    /// An item with this id already exists.
    #[error("Menu item {0} already exists")]
    DuplicateItem(ItemId),

    /// The item definition is not acceptable.
    #[error("Invalid menu item: {0}")]
    InvalidItem(String),
}

/// Convenience type alias for menu results.
pub type Result<T> = std::result::Result<T, MenuError>;

impl MenuError {
    /// Wire error code.
    pub fn code(&self) -> &'static str {
        match self {
            MenuError::ItemNotFound(_) => "ITEM_NOT_FOUND",
            MenuError::DuplicateItem(_) => "ITEM_ALREADY_EXISTS",
            MenuError::InvalidItem(_) => "INVALID_MENU_ITEM",
        }
    }

    /// HTTP status the error maps to.
    pub fn http_status(&self) -> u16 {
        match self {
            MenuError::ItemNotFound(_) => 404,
            MenuError::DuplicateItem(_) => 409,
            MenuError::InvalidItem(_) => 400,
        }
    }
}

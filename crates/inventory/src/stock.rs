//! Per-item stock.

use chrono::{DateTime, Utc};
use common::ItemId;
use serde::{Deserialize, Serialize};

/// Stock of one menu item.
///
/// Available quantity is always derived from `quantity - reserved_quantity`
/// and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stock {
    pub item_id: ItemId,
    pub item_name: String,
    quantity: u32,
    reserved_quantity: u32,
    pub updated_at: DateTime<Utc>,
}

impl Stock {
    /// Creates stock with nothing reserved.
    pub fn new(item_id: ItemId, item_name: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_id,
            item_name: item_name.into(),
            quantity,
            reserved_quantity: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn reserved_quantity(&self) -> u32 {
        self.reserved_quantity
    }

    /// Returns the unreserved quantity.
    pub fn available(&self) -> u32 {
        self.quantity.saturating_sub(self.reserved_quantity)
    }

    /// Moves `qty` from available to reserved. Callers check availability
    /// first; this never lets reserved exceed quantity.
    pub(crate) fn hold(&mut self, qty: u32) {
        self.reserved_quantity = (self.reserved_quantity + qty).min(self.quantity);
        self.updated_at = Utc::now();
    }

    /// Hands `qty` back from reserved to available.
    pub(crate) fn unhold(&mut self, qty: u32) {
        self.reserved_quantity = self.reserved_quantity.saturating_sub(qty);
        self.updated_at = Utc::now();
    }

    /// Deducts `qty` held units from stock for good.
    pub(crate) fn consume(&mut self, qty: u32) {
        self.quantity = self.quantity.saturating_sub(qty);
        self.reserved_quantity = self.reserved_quantity.saturating_sub(qty);
        self.updated_at = Utc::now();
    }

    /// Sets the on-hand quantity. Returns false if it would drop below what
    /// is currently reserved.
    pub(crate) fn set_quantity(&mut self, quantity: u32) -> bool {
        if quantity < self.reserved_quantity {
            return false;
        }
        self.quantity = quantity;
        self.updated_at = Utc::now();
        true
    }

    /// Returns the reportable view of this stock.
    pub fn level(&self) -> StockLevel {
        StockLevel {
            item_id: self.item_id.clone(),
            item_name: self.item_name.clone(),
            quantity: self.quantity,
            reserved_quantity: self.reserved_quantity,
            available_quantity: self.available(),
            updated_at: self.updated_at,
        }
    }
}

/// Stock as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub item_id: ItemId,
    pub item_name: String,
    pub quantity: u32,
    pub reserved_quantity: u32,
    pub available_quantity: u32,
    pub updated_at: DateTime<Utc>,
}

/// Request body of `PUT /v1/inventory/stock/{itemId}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdate {
    pub quantity: Option<u32>,
    pub item_name: Option<String>,
}

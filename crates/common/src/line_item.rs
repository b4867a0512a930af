//! Order line items shared by the orders, menu and inventory services.

use serde::{Deserialize, Serialize};

use crate::money::AmountOverflow;
use crate::{ItemId, Money};

fn default_qty() -> u32 {
    1
}

/// One requested menu item with quantity and the price the client saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub item_id: ItemId,
    #[serde(default = "default_qty")]
    pub qty: u32,
    pub unit_price: Money,
}

impl LineItem {
    /// Creates a line item.
    pub fn new(item_id: impl Into<ItemId>, qty: u32, unit_price: Money) -> Self {
        Self {
            item_id: item_id.into(),
            qty,
            unit_price,
        }
    }

    /// Returns `qty * unit_price`.
    pub fn subtotal(&self) -> Result<Money, AmountOverflow> {
        self.unit_price.checked_mul(self.qty).ok_or(AmountOverflow)
    }
}

/// Exact decimal sum of all line subtotals. Fails rather than round.
pub fn total_of(items: &[LineItem]) -> Result<Money, AmountOverflow> {
    items.iter().try_fold(Money::zero(), |total, item| {
        total.checked_add(item.subtotal()?).ok_or(AmountOverflow)
    })
}

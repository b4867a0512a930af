//! Batch validation of order line items against the catalog.

use common::{IdempotencyKey, ItemId, LineItem, Money};
use serde::{Deserialize, Serialize};

use crate::item::MenuItem;

/// Request body of `POST /v1/menu/validation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    pub items: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<IdempotencyKey>,
}

/// Why a single line failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationIssue {
    ItemNotFound,
    ItemUnavailable,
    PriceMismatch,
}

/// Per-line validation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemValidation {
    pub item_id: ItemId,
    pub qty: u32,
    pub unit_price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ValidationIssue>,
}

impl ItemValidation {
    /// Checks one requested line against its catalog entry, if any.
    ///
    /// Availability is checked before price: an unavailable item with a
    /// stale price reports `ITEM_UNAVAILABLE`.
    pub fn check(line: &LineItem, entry: Option<&MenuItem>) -> Self {
        let Some(entry) = entry else {
            return Self {
                item_id: line.item_id.clone(),
                qty: line.qty,
                unit_price: line.unit_price,
                current_price: None,
                available: None,
                valid: false,
                error: Some(ValidationIssue::ItemNotFound),
            };
        };

        let error = if !entry.available {
            Some(ValidationIssue::ItemUnavailable)
        } else if !entry.price.matches(line.unit_price) {
            Some(ValidationIssue::PriceMismatch)
        } else {
            None
        };

        Self {
            item_id: line.item_id.clone(),
            qty: line.qty,
            unit_price: line.unit_price,
            current_price: Some(entry.price),
            available: Some(entry.available),
            valid: error.is_none(),
            error,
        }
    }
}

/// Response body of `POST /v1/menu/validation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub validated_items: Vec<ItemValidation>,
}

impl ValidationReport {
    /// Builds the report; it is valid only if every line is.
    pub fn from_items(validated_items: Vec<ItemValidation>) -> Self {
        Self {
            valid: validated_items.iter().all(|item| item.valid),
            validated_items,
        }
    }

    /// Returns the lines that failed.
    pub fn failures(&self) -> impl Iterator<Item = &ItemValidation> {
        self.validated_items.iter().filter(|item| !item.valid)
    }
}

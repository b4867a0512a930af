//! Menu item records.

use chrono::{DateTime, Utc};
use common::{ItemId, Money};
use serde::{Deserialize, Serialize};

use crate::error::{MenuError, Result};

/// A dish or drink offered by the restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub category: String,
    pub available: bool,
    pub ingredients: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_category() -> String {
    "main".to_string()
}

fn default_available() -> bool {
    true
}

/// Request body for creating a menu item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMenuItem {
    /// Explicit id; a UUID is generated when omitted.
    #[serde(default)]
    pub id: Option<ItemId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
}

impl NewMenuItem {
    /// Creates an available item in the `main` category.
    pub fn new(name: impl Into<String>, price: Money) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            price,
            category: default_category(),
            available: true,
            ingredients: None,
        }
    }

    /// Sets an explicit id.
    pub fn with_id(mut self, id: impl Into<ItemId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets availability.
    pub fn available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    pub(crate) fn into_item(self, now: DateTime<Utc>) -> Result<MenuItem> {
        if self.name.trim().is_empty() {
            return Err(MenuError::InvalidItem("name is required".to_string()));
        }
        if self.price.is_negative() {
            return Err(MenuError::InvalidItem(
                "price must not be negative".to_string(),
            ));
        }

        Ok(MenuItem {
            id: self.id.unwrap_or_else(ItemId::generate),
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            available: self.available,
            ingredients: self.ingredients,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update of a menu item. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub category: Option<String>,
    pub available: Option<bool>,
    pub ingredients: Option<Vec<String>>,
}

impl MenuItem {
    pub(crate) fn apply_patch(&mut self, patch: MenuItemPatch, now: DateTime<Utc>) -> Result<()> {
        if let Some(price) = patch.price {
            if price.is_negative() {
                return Err(MenuError::InvalidItem(
                    "price must not be negative".to_string(),
                ));
            }
            self.price = price;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(available) = patch.available {
            self.available = available;
        }
        if let Some(ingredients) = patch.ingredients {
            self.ingredients = Some(ingredients);
        }
        self.updated_at = now;
        Ok(())
    }
}

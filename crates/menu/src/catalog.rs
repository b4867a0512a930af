//! In-memory menu catalog.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use common::ItemId;
use tokio::sync::RwLock;

use crate::error::{MenuError, Result};
use crate::item::{MenuItem, MenuItemPatch, NewMenuItem};
use crate::validation::{ItemValidation, ValidationReport, ValidationRequest};

/// Menu catalog holding every item keyed by id.
///
/// Cheap to clone; clones share the same underlying items.
#[derive(Debug, Clone, Default)]
pub struct MenuCatalog {
    items: Arc<RwLock<HashMap<ItemId, MenuItem>>>,
}

impl MenuCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item to the catalog.
    pub async fn create(&self, new_item: NewMenuItem) -> Result<MenuItem> {
        let item = new_item.into_item(Utc::now())?;
        let mut items = self.items.write().await;
        if items.contains_key(&item.id) {
            return Err(MenuError::DuplicateItem(item.id));
        }
        items.insert(item.id.clone(), item.clone());

        tracing::info!(item_id = %item.id, name = %item.name, "menu item created");
        Ok(item)
    }

    /// Loads an item by id.
    pub async fn get(&self, id: &ItemId) -> Result<MenuItem> {
        self.items
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| MenuError::ItemNotFound(id.clone()))
    }

    /// Returns available items ordered by name.
    pub async fn list_available(&self) -> Vec<MenuItem> {
        let mut available: Vec<MenuItem> = self
            .items
            .read()
            .await
            .values()
            .filter(|item| item.available)
            .cloned()
            .collect();
        available.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        available
    }

    /// Applies a partial update.
    pub async fn update(&self, id: &ItemId, patch: MenuItemPatch) -> Result<MenuItem> {
        let mut items = self.items.write().await;
        let item = items
            .get_mut(id)
            .ok_or_else(|| MenuError::ItemNotFound(id.clone()))?;
        item.apply_patch(patch, Utc::now())?;
        Ok(item.clone())
    }

    /// Toggles availability of an item.
    pub async fn set_availability(&self, id: &ItemId, available: bool) -> Result<MenuItem> {
        let item = self
            .update(
                id,
                MenuItemPatch {
                    available: Some(available),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(item_id = %id, available, "menu item availability changed");
        Ok(item)
    }

    /// Validates requested lines against current prices and availability.
    ///
    /// Lines are reported in request order. The idempotency key is accepted
    /// for protocol symmetry; validation has no side effects to deduplicate.
    #[tracing::instrument(skip(self, request), fields(lines = request.items.len()))]
    pub async fn validate(&self, request: &ValidationRequest) -> ValidationReport {
        let items = self.items.read().await;
        let validated = request
            .items
            .iter()
            .map(|line| ItemValidation::check(line, items.get(&line.item_id)))
            .collect();
        let report = ValidationReport::from_items(validated);

        metrics::counter!("menu_validations_total", "valid" => report.valid.to_string())
            .increment(1);
        if !report.valid {
            tracing::info!(failures = report.failures().count(), "menu validation failed");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use common::{LineItem, Money};

    use super::*;
    use crate::validation::ValidationIssue;

    async fn seeded() -> MenuCatalog {
        let catalog = MenuCatalog::new();
        catalog
            .create(NewMenuItem::new("Margherita", Money::from_cents(1299)).with_id("margherita"))
            .await
            .unwrap();
        catalog
            .create(
                NewMenuItem::new("Tiramisu", Money::from_cents(650))
                    .with_id("tiramisu")
                    .available(false),
            )
            .await
            .unwrap();
        catalog
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let catalog = seeded().await;
        let item = catalog.get(&ItemId::new("margherita")).await.unwrap();
        assert_eq!(item.name, "Margherita");
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let catalog = seeded().await;
        let result = catalog
            .create(NewMenuItem::new("Other", Money::from_cents(100)).with_id("margherita"))
            .await;
        assert!(matches!(result, Err(MenuError::DuplicateItem(_))));
    }

    #[tokio::test]
    async fn test_list_available_skips_unavailable() {
        let catalog = seeded().await;
        let names: Vec<String> = catalog
            .list_available()
            .await
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(names, vec!["Margherita"]);
    }

    #[tokio::test]
    async fn test_set_availability() {
        let catalog = seeded().await;
        let id = ItemId::new("tiramisu");
        let item = catalog.set_availability(&id, true).await.unwrap();
        assert!(item.available);
        assert_eq!(catalog.list_available().await.len(), 2);
    }

    #[tokio::test]
    async fn test_update_unknown_item() {
        let catalog = MenuCatalog::new();
        let result = catalog
            .update(&ItemId::new("nope"), MenuItemPatch::default())
            .await;
        assert!(matches!(result, Err(MenuError::ItemNotFound(_))));
    }

    #[tokio::test]
    async fn test_validate_preserves_request_order() {
        let catalog = seeded().await;
        let request = ValidationRequest {
            items: vec![
                LineItem::new("ghost", 1, Money::from_cents(100)),
                LineItem::new("margherita", 2, Money::from_cents(1299)),
                LineItem::new("tiramisu", 1, Money::from_cents(650)),
            ],
            idempotency_key: None,
        };

        let report = catalog.validate(&request).await;

        assert!(!report.valid);
        let errors: Vec<Option<ValidationIssue>> =
            report.validated_items.iter().map(|item| item.error).collect();
        assert_eq!(
            errors,
            vec![
                Some(ValidationIssue::ItemNotFound),
                None,
                Some(ValidationIssue::ItemUnavailable),
            ]
        );
    }
}

//! Catalog of drinks and ingredients.

use common::{ItemId, ItemKind, Money};
use store::{Item, ItemQuery, RowLock, Store, StoreTx};

use crate::error::{DomainError, Result};
use crate::guard;
use crate::rules;

/// Request to add an item to the catalog.
///
/// `kind` is kept as text because rejecting an unknown kind is a business
/// rule, not a parsing concern.
#[derive(Debug, Clone)]
pub struct CreateItem {
    pub id: ItemId,
    pub kind: String,
    pub description: String,
    pub price: Money,
    pub extra: bool,
}

/// Replacement values for an existing item. The kind is fixed at creation
/// and cannot be changed.
#[derive(Debug, Clone)]
pub struct ItemUpdate {
    pub description: String,
    pub price: Money,
    pub extra: bool,
}

/// Service over catalog items.
#[derive(Clone)]
pub struct Catalog<S: Store> {
    store: S,
}

impl<S: Store> Catalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Adds a new item under its caller-assigned identifier.
    #[tracing::instrument(skip(self), fields(item_id = %cmd.id))]
    pub async fn create_item(&self, cmd: CreateItem) -> Result<Item> {
        if !cmd.id.is_valid() {
            return Err(DomainError::invalid(format!(
                "item id must be positive, got {}",
                cmd.id
            )));
        }
        let kind: ItemKind = cmd.kind.parse().map_err(|_| {
            DomainError::invalid(format!(
                "item kind must be DRINK or INGREDIENT, got '{}'",
                cmd.kind
            ))
        })?;
        rules::require_text("description", &cmd.description)?;
        rules::require_price(cmd.price)?;

        let item = Item {
            id: cmd.id,
            kind,
            description: cmd.description,
            price: cmd.price,
            extra: cmd.extra,
        };

        let mut tx = self.store.begin().await?;
        if tx.get_item(item.id, RowLock::None).await?.is_some() {
            return Err(DomainError::conflict(format!(
                "item {} already exists",
                item.id
            )));
        }
        tx.insert_item(&item).await?;
        tx.commit().await?;

        metrics::counter!("catalog_items_written_total", "op" => "create").increment(1);
        tracing::info!(item_id = %item.id, kind = %item.kind, "item created");
        Ok(item)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_item(&self, id: ItemId) -> Result<Item> {
        let mut tx = self.store.begin().await?;
        let item = tx
            .get_item(id, RowLock::None)
            .await?
            .ok_or_else(|| DomainError::not_found("item", id))?;
        tx.commit().await?;
        Ok(item)
    }

    /// Lists items ordered by identifier, optionally only one kind.
    #[tracing::instrument(skip(self))]
    pub async fn list_items(&self, kind: Option<ItemKind>) -> Result<Vec<Item>> {
        let mut tx = self.store.begin().await?;
        let items = tx.list_items(&ItemQuery { kind }).await?;
        tx.commit().await?;
        Ok(items)
    }

    /// Replaces description, price and flag of an item that no unfinished
    /// order uses.
    #[tracing::instrument(skip(self))]
    pub async fn update_item(&self, id: ItemId, update: ItemUpdate) -> Result<Item> {
        let mut tx = self.store.begin().await?;
        let current = tx
            .get_item(id, RowLock::Exclusive)
            .await?
            .ok_or_else(|| DomainError::not_found("item", id))?;
        rules::require_text("description", &update.description)?;
        rules::require_price(update.price)?;
        guard::ensure_item_unused(&mut tx, &current).await?;

        let item = Item {
            description: update.description,
            price: update.price,
            extra: update.extra,
            ..current
        };
        tx.update_item(&item).await?;
        tx.commit().await?;

        metrics::counter!("catalog_items_written_total", "op" => "update").increment(1);
        tracing::info!(item_id = %id, "item updated");
        Ok(item)
    }

    /// Deletes an item that no unfinished order uses. Ingredient links to
    /// it are removed in the same unit.
    #[tracing::instrument(skip(self))]
    pub async fn delete_item(&self, id: ItemId) -> Result<()> {
        let mut tx = self.store.begin().await?;
        let current = tx
            .get_item(id, RowLock::Exclusive)
            .await?
            .ok_or_else(|| DomainError::not_found("item", id))?;
        guard::ensure_item_unused(&mut tx, &current).await?;

        tx.delete_item(id).await?;
        tx.commit().await?;

        metrics::counter!("catalog_items_written_total", "op" => "delete").increment(1);
        tracing::info!(item_id = %id, "item deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use store::InMemoryStore;

    use super::*;

    fn create(id: i64, kind: &str, cents: i64) -> CreateItem {
        CreateItem {
            id: ItemId::new(id),
            kind: kind.to_string(),
            description: format!("item {id}"),
            price: Money::from_cents(cents),
            extra: false,
        }
    }

    #[tokio::test]
    async fn create_and_get_item() {
        let catalog = Catalog::new(InMemoryStore::new());
        let created = catalog.create_item(create(5, "INGREDIENT", 200)).await.unwrap();
        assert_eq!(created.kind, ItemKind::Ingredient);

        let fetched = catalog.get_item(ItemId::new(5)).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn duplicate_id_is_conflict() {
        let catalog = Catalog::new(InMemoryStore::new());
        catalog.create_item(create(5, "INGREDIENT", 200)).await.unwrap();

        let result = catalog.create_item(create(5, "DRINK", 500)).await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn unknown_kind_is_invalid() {
        let catalog = Catalog::new(InMemoryStore::new());
        let result = catalog.create_item(create(5, "SIDE", 200)).await;
        assert!(matches!(result, Err(DomainError::Invalid(_))));
    }

    #[tokio::test]
    async fn non_positive_id_and_price_are_invalid() {
        let catalog = Catalog::new(InMemoryStore::new());
        assert!(matches!(
            catalog.create_item(create(0, "DRINK", 200)).await,
            Err(DomainError::Invalid(_))
        ));
        assert!(matches!(
            catalog.create_item(create(1, "DRINK", 0)).await,
            Err(DomainError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn missing_item_is_not_found() {
        let catalog = Catalog::new(InMemoryStore::new());
        let result = catalog.get_item(ItemId::new(42)).await;
        assert!(matches!(result, Err(DomainError::NotFound { entity: "item", .. })));
    }

    #[tokio::test]
    async fn list_filters_by_kind() {
        let catalog = Catalog::new(InMemoryStore::new());
        catalog.create_item(create(5, "INGREDIENT", 200)).await.unwrap();
        catalog.create_item(create(10, "DRINK", 500)).await.unwrap();

        assert_eq!(catalog.list_items(None).await.unwrap().len(), 2);
        let drinks = catalog.list_items(Some(ItemKind::Drink)).await.unwrap();
        assert_eq!(drinks.len(), 1);
        assert_eq!(drinks[0].id, ItemId::new(10));
    }

    #[tokio::test]
    async fn update_keeps_kind() {
        let catalog = Catalog::new(InMemoryStore::new());
        catalog.create_item(create(10, "DRINK", 500)).await.unwrap();

        let updated = catalog
            .update_item(
                ItemId::new(10),
                ItemUpdate {
                    description: "Suco de laranja".to_string(),
                    price: Money::from_cents(650),
                    extra: true,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.kind, ItemKind::Drink);
        assert_eq!(updated.price, Money::from_cents(650));
        assert!(updated.extra);
    }

    #[tokio::test]
    async fn update_missing_item_is_not_found_even_with_blank_fields() {
        let catalog = Catalog::new(InMemoryStore::new());
        let result = catalog
            .update_item(
                ItemId::new(3),
                ItemUpdate {
                    description: " ".to_string(),
                    price: Money::zero(),
                    extra: false,
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { entity: "item", .. })));
    }

    #[tokio::test]
    async fn update_with_blank_description_is_invalid() {
        let catalog = Catalog::new(InMemoryStore::new());
        catalog.create_item(create(10, "DRINK", 500)).await.unwrap();
        let result = catalog
            .update_item(
                ItemId::new(10),
                ItemUpdate {
                    description: String::new(),
                    price: Money::from_cents(500),
                    extra: false,
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::Invalid(_))));
    }

    #[tokio::test]
    async fn delete_missing_item_is_not_found() {
        let catalog = Catalog::new(InMemoryStore::new());
        assert!(matches!(
            catalog.delete_item(ItemId::new(3)).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}

//! Usage guard: catalog entries referenced by unfinished orders are frozen.
//!
//! The transaction-level checks run inside the same unit as the mutation they
//! protect, after the target row has been locked `Exclusive`. Order writes
//! take `Share` locks on the same rows, so a check cannot pass while an
//! order that would flip it is being written.

use common::{ItemId, ItemKind, ProductId};
use store::{Item, RowLock, Store, StoreTx};

use crate::error::{DomainError, Result};

/// True if a non-finalized order references the item, either as a drink
/// line or through a product whose ingredient set contains it.
pub(crate) async fn item_in_use<T: StoreTx>(tx: &mut T, item: &Item) -> Result<bool> {
    // Drink lines only ever point at drinks and ingredient links only at
    // ingredients, so the kind decides which relation to scan.
    let count = match item.kind {
        ItemKind::Drink => tx.count_active_orders_with_drink(item.id).await?,
        ItemKind::Ingredient => tx.count_active_orders_with_ingredient(item.id).await?,
    };
    Ok(count > 0)
}

/// True if a non-finalized order has a product line for the product.
pub(crate) async fn product_in_use<T: StoreTx>(tx: &mut T, product_id: ProductId) -> Result<bool> {
    Ok(tx.count_active_orders_with_product(product_id).await? > 0)
}

pub(crate) async fn ensure_item_unused<T: StoreTx>(tx: &mut T, item: &Item) -> Result<()> {
    if item_in_use(tx, item).await? {
        metrics::counter!("usage_guard_rejections_total", "entity" => "item").increment(1);
        tracing::warn!(item_id = %item.id, kind = %item.kind, "item is in use by an unfinished order");
        return Err(DomainError::conflict(format!(
            "item {} is in use by an unfinished order",
            item.id
        )));
    }
    Ok(())
}

pub(crate) async fn ensure_product_unused<T: StoreTx>(tx: &mut T, product_id: ProductId) -> Result<()> {
    if product_in_use(tx, product_id).await? {
        metrics::counter!("usage_guard_rejections_total", "entity" => "product").increment(1);
        tracing::warn!(%product_id, "product is in use by an unfinished order");
        return Err(DomainError::conflict(format!(
            "product {product_id} is in use by an unfinished order"
        )));
    }
    Ok(())
}

/// Read-only usage checks over a store.
#[derive(Clone)]
pub struct UsageGuard<S: Store> {
    store: S,
}

impl<S: Store> UsageGuard<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reports whether an unfinished order references the item.
    #[tracing::instrument(skip(self))]
    pub async fn is_item_in_use(&self, id: ItemId) -> Result<bool> {
        let mut tx = self.store.begin().await?;
        let item = tx
            .get_item(id, RowLock::None)
            .await?
            .ok_or_else(|| DomainError::not_found("item", id))?;
        let in_use = item_in_use(&mut tx, &item).await?;
        tx.commit().await?;
        Ok(in_use)
    }

    /// Reports whether an unfinished order references the product.
    #[tracing::instrument(skip(self))]
    pub async fn is_product_in_use(&self, id: ProductId) -> Result<bool> {
        let mut tx = self.store.begin().await?;
        if tx.get_product(id, RowLock::None).await?.is_none() {
            return Err(DomainError::not_found("product", id));
        }
        let in_use = product_in_use(&mut tx, id).await?;
        tx.commit().await?;
        Ok(in_use)
    }
}

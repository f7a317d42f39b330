//! Composite products (burgers) built from ingredient items.
//!
//! A product and its ingredient links are always written together. Updates
//! replace the whole ingredient set (delete all, insert all); there is no
//! incremental patch.

use common::{ItemId, ItemKind, Money, ProductId};
use serde::Serialize;
use store::{IngredientLine, Item, Product, ProductQuery, RowLock, Store, StoreTx};

use crate::error::{DomainError, Result};
use crate::guard;
use crate::rules;

/// One requested ingredient of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientRequest {
    pub item_id: ItemId,
    pub quantity: u32,
}

impl IngredientRequest {
    pub fn new(item_id: impl Into<ItemId>, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
        }
    }
}

/// Full definition of a product, used for create and for update.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub description: String,
    pub price: Money,
    pub ingredients: Vec<IngredientRequest>,
}

/// A resolved ingredient of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientView {
    pub item: Item,
    pub quantity: u32,
}

/// A product together with its resolved ingredients, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub ingredients: Vec<IngredientView>,
}

/// Checks every requested ingredient against the catalog and returns the
/// link rows to write. Referenced items are share-locked.
async fn resolve_ingredients<T: StoreTx>(
    tx: &mut T,
    requested: &[IngredientRequest],
) -> Result<Vec<IngredientLine>> {
    if requested.is_empty() {
        return Err(DomainError::invalid(
            "a product needs at least one ingredient",
        ));
    }
    rules::require_distinct("ingredient", requested.iter().map(|r| r.item_id))?;

    let mut lines = Vec::with_capacity(requested.len());
    for request in requested {
        rules::require_quantity("ingredient", request.item_id, request.quantity)?;
        let item = tx
            .get_item(request.item_id, RowLock::Share)
            .await?
            .ok_or_else(|| DomainError::not_found("item", request.item_id))?;
        match item.kind {
            ItemKind::Ingredient => {}
            ItemKind::Drink => {
                return Err(DomainError::invalid(format!(
                    "item {} is not an ingredient",
                    item.id
                )));
            }
        }
        lines.push(IngredientLine {
            item_id: item.id,
            quantity: request.quantity,
        });
    }
    Ok(lines)
}

/// Loads a product's ingredient lines and resolves each against the catalog.
pub(crate) async fn load_view<T: StoreTx>(tx: &mut T, product: Product) -> Result<ProductView> {
    let lines = tx.ingredient_lines(product.id, RowLock::None).await?;
    let mut ingredients = Vec::with_capacity(lines.len());
    for line in lines {
        // Links cascade with their item, so a missing item means the row
        // vanished between the two reads; skip it rather than fail the read.
        if let Some(item) = tx.get_item(line.item_id, RowLock::None).await? {
            ingredients.push(IngredientView {
                item,
                quantity: line.quantity,
            });
        }
    }
    Ok(ProductView {
        product,
        ingredients,
    })
}

fn validate_draft(draft: &ProductDraft) -> Result<()> {
    rules::require_text("description", &draft.description)?;
    rules::require_price(draft.price)
}

/// Service over composite products.
#[derive(Clone)]
pub struct ProductService<S: Store> {
    store: S,
}

impl<S: Store> ProductService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a product with its full ingredient set in one unit.
    #[tracing::instrument(skip(self, draft), fields(ingredients = draft.ingredients.len()))]
    pub async fn create_product(&self, id: ProductId, draft: ProductDraft) -> Result<ProductView> {
        if !id.is_valid() {
            return Err(DomainError::invalid(format!(
                "product id must be positive, got {id}"
            )));
        }
        validate_draft(&draft)?;

        let mut tx = self.store.begin().await?;
        if tx.get_product(id, RowLock::None).await?.is_some() {
            return Err(DomainError::conflict(format!("product {id} already exists")));
        }

        let product = Product {
            id,
            description: draft.description,
            price: draft.price,
        };
        tx.insert_product(&product).await?;
        let lines = resolve_ingredients(&mut tx, &draft.ingredients).await?;
        tx.insert_ingredient_lines(id, &lines).await?;
        let view = load_view(&mut tx, product).await?;
        tx.commit().await?;

        metrics::counter!("products_written_total", "op" => "create").increment(1);
        tracing::info!(product_id = %id, "product created");
        Ok(view)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<ProductView> {
        let mut tx = self.store.begin().await?;
        let product = tx
            .get_product(id, RowLock::None)
            .await?
            .ok_or_else(|| DomainError::not_found("product", id))?;
        let view = load_view(&mut tx, product).await?;
        tx.commit().await?;
        Ok(view)
    }

    /// Lists every product ordered by identifier.
    pub async fn list_products(&self) -> Result<Vec<ProductView>> {
        self.query(ProductQuery::all()).await
    }

    /// Lists products whose description contains `term`, ignoring case.
    pub async fn search_products(&self, term: &str) -> Result<Vec<ProductView>> {
        self.query(ProductQuery::description_contains(term)).await
    }

    #[tracing::instrument(skip(self))]
    async fn query(&self, query: ProductQuery) -> Result<Vec<ProductView>> {
        let mut tx = self.store.begin().await?;
        let products = tx.list_products(&query).await?;
        let mut views = Vec::with_capacity(products.len());
        for product in products {
            views.push(load_view(&mut tx, product).await?);
        }
        tx.commit().await?;
        Ok(views)
    }

    /// Replaces description, price and the entire ingredient set of a
    /// product that no unfinished order uses.
    #[tracing::instrument(skip(self, draft), fields(ingredients = draft.ingredients.len()))]
    pub async fn update_product(&self, id: ProductId, draft: ProductDraft) -> Result<ProductView> {
        let mut tx = self.store.begin().await?;
        if tx.get_product(id, RowLock::Exclusive).await?.is_none() {
            return Err(DomainError::not_found("product", id));
        }
        validate_draft(&draft)?;
        guard::ensure_product_unused(&mut tx, id).await?;

        let product = Product {
            id,
            description: draft.description,
            price: draft.price,
        };
        tx.update_product(&product).await?;
        tx.delete_ingredient_lines(id).await?;
        let lines = resolve_ingredients(&mut tx, &draft.ingredients).await?;
        tx.insert_ingredient_lines(id, &lines).await?;
        let view = load_view(&mut tx, product).await?;
        tx.commit().await?;

        metrics::counter!("products_written_total", "op" => "update").increment(1);
        tracing::info!(product_id = %id, "product updated");
        Ok(view)
    }

    /// Deletes a product and its ingredient links once no unfinished order
    /// uses it.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<()> {
        let mut tx = self.store.begin().await?;
        if tx.get_product(id, RowLock::Exclusive).await?.is_none() {
            return Err(DomainError::not_found("product", id));
        }
        guard::ensure_product_unused(&mut tx, id).await?;

        tx.delete_ingredient_lines(id).await?;
        tx.delete_product(id).await?;
        tx.commit().await?;

        metrics::counter!("products_written_total", "op" => "delete").increment(1);
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}

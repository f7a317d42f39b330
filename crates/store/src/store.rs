use async_trait::async_trait;
use common::{ItemId, OrderId, ProductId};

use crate::{
    DrinkLine, IngredientLine, Item, ItemQuery, OrderQuery, OrderRecord, Product, ProductLine,
    ProductQuery, Result,
};

/// Row lock taken by a lookup inside a transaction.
///
/// Guarded mutations lock their target `Exclusive` before checking usage;
/// order writes lock every catalog row they reference `Share`. The two
/// modes conflict, so a usage check and a concurrent order write on the
/// same row are serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowLock {
    #[default]
    None,
    Share,
    Exclusive,
}

/// Entry point of a store backend.
///
/// All implementations must be thread-safe (Send + Sync) and cheap to clone
/// handles onto the same underlying storage.
#[async_trait]
pub trait Store: Send + Sync {
    type Tx: StoreTx;

    /// Opens a new atomic unit of work.
    async fn begin(&self) -> Result<Self::Tx>;
}

/// One atomic unit of work.
///
/// Writes are visible to other transactions only after [`StoreTx::commit`].
/// Dropping the transaction without committing discards every write.
#[async_trait]
pub trait StoreTx: Send {
    // -- items --

    async fn get_item(&mut self, id: ItemId, lock: RowLock) -> Result<Option<Item>>;

    /// Lists items ordered by identifier.
    async fn list_items(&mut self, query: &ItemQuery) -> Result<Vec<Item>>;

    async fn insert_item(&mut self, item: &Item) -> Result<()>;

    /// Updates description, price and flag. The kind column is never written.
    async fn update_item(&mut self, item: &Item) -> Result<()>;

    /// Deletes an item and every ingredient link that points at it.
    async fn delete_item(&mut self, id: ItemId) -> Result<bool>;

    // -- products --

    async fn get_product(&mut self, id: ProductId, lock: RowLock) -> Result<Option<Product>>;

    /// Lists products ordered by identifier.
    async fn list_products(&mut self, query: &ProductQuery) -> Result<Vec<Product>>;

    async fn insert_product(&mut self, product: &Product) -> Result<()>;

    async fn update_product(&mut self, product: &Product) -> Result<()>;

    /// Deletes the product row. Fails with `ReferenceViolation` while
    /// ingredient links still exist.
    async fn delete_product(&mut self, id: ProductId) -> Result<bool>;

    /// Ingredient links of a product in insertion order. `lock` applies to
    /// the referenced item rows.
    async fn ingredient_lines(
        &mut self,
        product_id: ProductId,
        lock: RowLock,
    ) -> Result<Vec<IngredientLine>>;

    async fn insert_ingredient_lines(
        &mut self,
        product_id: ProductId,
        lines: &[IngredientLine],
    ) -> Result<()>;

    async fn delete_ingredient_lines(&mut self, product_id: ProductId) -> Result<u64>;

    // -- orders --

    async fn get_order(&mut self, id: OrderId, lock: RowLock) -> Result<Option<OrderRecord>>;

    /// Lists orders in insertion order.
    async fn list_orders(&mut self, query: &OrderQuery) -> Result<Vec<OrderRecord>>;

    async fn insert_order(&mut self, order: &OrderRecord) -> Result<()>;

    /// Rewrites every mutable column of the root row.
    async fn update_order(&mut self, order: &OrderRecord) -> Result<()>;

    /// Deletes the root row. Fails with `ReferenceViolation` while line
    /// rows still exist.
    async fn delete_order(&mut self, id: OrderId) -> Result<bool>;

    async fn product_lines(&mut self, order_id: OrderId) -> Result<Vec<ProductLine>>;

    async fn drink_lines(&mut self, order_id: OrderId) -> Result<Vec<DrinkLine>>;

    async fn insert_product_lines(&mut self, order_id: OrderId, lines: &[ProductLine])
    -> Result<()>;

    async fn insert_drink_lines(&mut self, order_id: OrderId, lines: &[DrinkLine]) -> Result<()>;

    async fn delete_product_lines(&mut self, order_id: OrderId) -> Result<u64>;

    async fn delete_drink_lines(&mut self, order_id: OrderId) -> Result<u64>;

    // -- usage --

    /// Number of non-finalized orders with a product line for `product_id`.
    async fn count_active_orders_with_product(&mut self, product_id: ProductId) -> Result<u64>;

    /// Number of non-finalized orders with a drink line for `item_id`.
    async fn count_active_orders_with_drink(&mut self, item_id: ItemId) -> Result<u64>;

    /// Number of non-finalized orders with a product line whose product
    /// lists `item_id` as an ingredient.
    async fn count_active_orders_with_ingredient(&mut self, item_id: ItemId) -> Result<u64>;

    // -- lifecycle --

    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}

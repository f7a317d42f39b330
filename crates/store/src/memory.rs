use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use common::{ItemId, OrderId, ProductId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    DrinkLine, IngredientLine, Item, ItemQuery, OrderQuery, OrderRecord, Product, ProductLine,
    ProductQuery, Result, StoreError,
    store::{RowLock, Store, StoreTx},
};

#[derive(Debug, Clone, Default)]
struct Tables {
    items: BTreeMap<ItemId, Item>,
    products: BTreeMap<ProductId, Product>,
    ingredients: BTreeMap<ProductId, Vec<IngredientLine>>,
    orders: Vec<OrderRecord>,
    product_lines: HashMap<OrderId, Vec<ProductLine>>,
    drink_lines: HashMap<OrderId, Vec<DrinkLine>>,
}

impl Tables {
    fn order_is_active(&self, order_id: &OrderId) -> bool {
        self.orders
            .iter()
            .any(|o| &o.id == order_id && o.status.is_active())
    }

    fn product_has_ingredient(&self, product_id: &ProductId, item_id: ItemId) -> bool {
        self.ingredients
            .get(product_id)
            .is_some_and(|lines| lines.iter().any(|l| l.item_id == item_id))
    }
}

/// In-memory store implementation for testing and local runs.
///
/// A transaction holds the table lock for its whole lifetime and writes to a
/// private copy of the tables, so transactions are fully serialized and a
/// rolled-back transaction leaves no trace. Key and reference constraints
/// mirror the PostgreSQL schema.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of ingredient link rows across all products.
    pub async fn ingredient_link_count(&self) -> usize {
        self.tables
            .lock()
            .await
            .ingredients
            .values()
            .map(Vec::len)
            .sum()
    }

    /// Returns the number of product and drink line rows across all orders.
    pub async fn order_line_count(&self) -> usize {
        let tables = self.tables.lock().await;
        tables.product_lines.values().map(Vec::len).sum::<usize>()
            + tables.drink_lines.values().map(Vec::len).sum::<usize>()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx> {
        let guard = self.tables.clone().lock_owned().await;
        Ok(InMemoryTx { guard, draft: None })
    }
}

/// Transaction over an [`InMemoryStore`].
///
/// Reads go straight to the locked tables. The first write copies them
/// into a draft that later reads and writes see.
pub struct InMemoryTx {
    guard: OwnedMutexGuard<Tables>,
    draft: Option<Tables>,
}

impl InMemoryTx {
    fn tables(&self) -> &Tables {
        self.draft.as_ref().unwrap_or(&*self.guard)
    }

    fn tables_mut(&mut self) -> &mut Tables {
        let committed: &Tables = &self.guard;
        self.draft.get_or_insert_with(|| Tables::clone(committed))
    }
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn get_item(&mut self, id: ItemId, _lock: RowLock) -> Result<Option<Item>> {
        Ok(self.tables().items.get(&id).cloned())
    }

    async fn list_items(&mut self, query: &ItemQuery) -> Result<Vec<Item>> {
        Ok(self
            .tables()
            .items
            .values()
            .filter(|item| query.matches(item.kind))
            .cloned()
            .collect())
    }

    async fn insert_item(&mut self, item: &Item) -> Result<()> {
        let tables = self.tables_mut();
        if tables.items.contains_key(&item.id) {
            return Err(StoreError::Duplicate {
                entity: "item",
                key: item.id.to_string(),
            });
        }
        tables.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_item(&mut self, item: &Item) -> Result<()> {
        let tables = self.tables_mut();
        if let Some(stored) = tables.items.get_mut(&item.id) {
            stored.description = item.description.clone();
            stored.price = item.price;
            stored.extra = item.extra;
        }
        Ok(())
    }

    async fn delete_item(&mut self, id: ItemId) -> Result<bool> {
        let tables = self.tables_mut();
        let removed = tables.items.remove(&id).is_some();
        if removed {
            for lines in tables.ingredients.values_mut() {
                lines.retain(|l| l.item_id != id);
            }
            tables.ingredients.retain(|_, lines| !lines.is_empty());
        }
        Ok(removed)
    }

    async fn get_product(&mut self, id: ProductId, _lock: RowLock) -> Result<Option<Product>> {
        Ok(self.tables().products.get(&id).cloned())
    }

    async fn list_products(&mut self, query: &ProductQuery) -> Result<Vec<Product>> {
        Ok(self
            .tables()
            .products
            .values()
            .filter(|p| query.matches(&p.description))
            .cloned()
            .collect())
    }

    async fn insert_product(&mut self, product: &Product) -> Result<()> {
        let tables = self.tables_mut();
        if tables.products.contains_key(&product.id) {
            return Err(StoreError::Duplicate {
                entity: "product",
                key: product.id.to_string(),
            });
        }
        tables.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&mut self, product: &Product) -> Result<()> {
        let tables = self.tables_mut();
        if let Some(stored) = tables.products.get_mut(&product.id) {
            stored.description = product.description.clone();
            stored.price = product.price;
        }
        Ok(())
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<bool> {
        let tables = self.tables_mut();
        if tables.ingredients.contains_key(&id) {
            return Err(StoreError::ReferenceViolation {
                entity: "product",
                key: id.to_string(),
            });
        }
        Ok(tables.products.remove(&id).is_some())
    }

    async fn ingredient_lines(
        &mut self,
        product_id: ProductId,
        _lock: RowLock,
    ) -> Result<Vec<IngredientLine>> {
        Ok(self
            .tables()
            .ingredients
            .get(&product_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn insert_ingredient_lines(
        &mut self,
        product_id: ProductId,
        lines: &[IngredientLine],
    ) -> Result<()> {
        let tables = self.tables_mut();
        if !tables.products.contains_key(&product_id) {
            return Err(StoreError::ReferenceViolation {
                entity: "product_ingredient",
                key: format!("product {product_id}"),
            });
        }
        for line in lines {
            if !tables.items.contains_key(&line.item_id) {
                return Err(StoreError::ReferenceViolation {
                    entity: "product_ingredient",
                    key: format!("item {}", line.item_id),
                });
            }
            if tables.product_has_ingredient(&product_id, line.item_id) {
                return Err(StoreError::Duplicate {
                    entity: "product_ingredient",
                    key: format!("({product_id}, {})", line.item_id),
                });
            }
            tables
                .ingredients
                .entry(product_id)
                .or_default()
                .push(*line);
        }
        Ok(())
    }

    async fn delete_ingredient_lines(&mut self, product_id: ProductId) -> Result<u64> {
        let tables = self.tables_mut();
        Ok(tables
            .ingredients
            .remove(&product_id)
            .map_or(0, |lines| lines.len() as u64))
    }

    async fn get_order(&mut self, id: OrderId, _lock: RowLock) -> Result<Option<OrderRecord>> {
        Ok(self.tables().orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders(&mut self, query: &OrderQuery) -> Result<Vec<OrderRecord>> {
        Ok(self
            .tables()
            .orders
            .iter()
            .filter(|o| !query.unfinished_only || o.status.is_active())
            .cloned()
            .collect())
    }

    async fn insert_order(&mut self, order: &OrderRecord) -> Result<()> {
        let tables = self.tables_mut();
        if tables.orders.iter().any(|o| o.id == order.id) {
            return Err(StoreError::Duplicate {
                entity: "order",
                key: order.id.to_string(),
            });
        }
        tables.orders.push(order.clone());
        Ok(())
    }

    async fn update_order(&mut self, order: &OrderRecord) -> Result<()> {
        let tables = self.tables_mut();
        if let Some(stored) = tables.orders.iter_mut().find(|o| o.id == order.id) {
            let created_at = stored.created_at;
            *stored = order.clone();
            stored.created_at = created_at;
        }
        Ok(())
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<bool> {
        let tables = self.tables_mut();
        if tables.product_lines.contains_key(&id) || tables.drink_lines.contains_key(&id) {
            return Err(StoreError::ReferenceViolation {
                entity: "order",
                key: id.to_string(),
            });
        }
        let before = tables.orders.len();
        tables.orders.retain(|o| o.id != id);
        Ok(tables.orders.len() != before)
    }

    async fn product_lines(&mut self, order_id: OrderId) -> Result<Vec<ProductLine>> {
        Ok(self
            .tables()
            .product_lines
            .get(&order_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn drink_lines(&mut self, order_id: OrderId) -> Result<Vec<DrinkLine>> {
        Ok(self
            .tables()
            .drink_lines
            .get(&order_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn insert_product_lines(
        &mut self,
        order_id: OrderId,
        lines: &[ProductLine],
    ) -> Result<()> {
        let tables = self.tables_mut();
        if !tables.orders.iter().any(|o| o.id == order_id) {
            return Err(StoreError::ReferenceViolation {
                entity: "order_product",
                key: format!("order {order_id}"),
            });
        }
        for line in lines {
            let stored = tables.product_lines.entry(order_id).or_default();
            if stored.iter().any(|l| l.product_id == line.product_id) {
                return Err(StoreError::Duplicate {
                    entity: "order_product",
                    key: format!("({order_id}, {})", line.product_id),
                });
            }
            stored.push(*line);
        }
        Ok(())
    }

    async fn insert_drink_lines(&mut self, order_id: OrderId, lines: &[DrinkLine]) -> Result<()> {
        let tables = self.tables_mut();
        if !tables.orders.iter().any(|o| o.id == order_id) {
            return Err(StoreError::ReferenceViolation {
                entity: "order_drink",
                key: format!("order {order_id}"),
            });
        }
        for line in lines {
            let stored = tables.drink_lines.entry(order_id).or_default();
            if stored.iter().any(|l| l.item_id == line.item_id) {
                return Err(StoreError::Duplicate {
                    entity: "order_drink",
                    key: format!("({order_id}, {})", line.item_id),
                });
            }
            stored.push(*line);
        }
        Ok(())
    }

    async fn delete_product_lines(&mut self, order_id: OrderId) -> Result<u64> {
        let tables = self.tables_mut();
        Ok(tables
            .product_lines
            .remove(&order_id)
            .map_or(0, |lines| lines.len() as u64))
    }

    async fn delete_drink_lines(&mut self, order_id: OrderId) -> Result<u64> {
        let tables = self.tables_mut();
        Ok(tables
            .drink_lines
            .remove(&order_id)
            .map_or(0, |lines| lines.len() as u64))
    }

    async fn count_active_orders_with_product(&mut self, product_id: ProductId) -> Result<u64> {
        let tables = self.tables();
        let count = tables
            .product_lines
            .iter()
            .filter(|(order_id, lines)| {
                tables.order_is_active(order_id) && lines.iter().any(|l| l.product_id == product_id)
            })
            .count();
        Ok(count as u64)
    }

    async fn count_active_orders_with_drink(&mut self, item_id: ItemId) -> Result<u64> {
        let tables = self.tables();
        let count = tables
            .drink_lines
            .iter()
            .filter(|(order_id, lines)| {
                tables.order_is_active(order_id) && lines.iter().any(|l| l.item_id == item_id)
            })
            .count();
        Ok(count as u64)
    }

    async fn count_active_orders_with_ingredient(&mut self, item_id: ItemId) -> Result<u64> {
        let tables = self.tables();
        let count = tables
            .product_lines
            .iter()
            .filter(|(order_id, lines)| {
                tables.order_is_active(order_id)
                    && lines
                        .iter()
                        .any(|l| tables.product_has_ingredient(&l.product_id, item_id))
            })
            .count();
        Ok(count as u64)
    }

    async fn commit(self) -> Result<()> {
        let InMemoryTx { mut guard, draft } = self;
        if let Some(draft) = draft {
            *guard = draft;
        }
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

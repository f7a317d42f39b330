//! Order ledger service.
//!
//! Each operation runs in one store transaction. Catalog rows an order
//! points at are share-locked while the order is written, which is what
//! keeps the usage guard's in-transaction check exact.

use chrono::Utc;
use common::{ItemKind, Money, OrderId, OrderStatus, ProductId};
use store::{DrinkLine, OrderQuery, OrderRecord, ProductLine, RowLock, Store, StoreTx};

use crate::error::{DomainError, Result};
use crate::rules;

use super::{
    CreateOrder, DrinkLineView, DrinkRequest, OrderView, Phone, ProductLineView, ProductRequest,
    StatusPolicy, UpdateOrder,
};

/// Lines ready to be written, with their contribution to the total.
struct Priced<L> {
    lines: Vec<L>,
    subtotal: Money,
}

/// Adds `price × quantity` to a running total.
fn accumulate(total: Money, price: Money, quantity: u32) -> Result<Money> {
    price
        .checked_mul(quantity)
        .and_then(|line| total.checked_add(line))
        .ok_or_else(|| DomainError::invalid("order total out of range"))
}

/// Share-locks a product and the ingredient items it is built from, and
/// returns its current price.
async fn lock_product<T: StoreTx>(tx: &mut T, product_id: ProductId) -> Result<Money> {
    let product = tx
        .get_product(product_id, RowLock::Share)
        .await?
        .ok_or_else(|| DomainError::not_found("product", product_id))?;
    tx.ingredient_lines(product_id, RowLock::Share).await?;
    Ok(product.price)
}

async fn price_products<T: StoreTx>(
    tx: &mut T,
    requested: &[ProductRequest],
) -> Result<Priced<ProductLine>> {
    rules::require_distinct("product", requested.iter().map(|r| r.product_id))?;

    let mut priced = Priced {
        lines: Vec::with_capacity(requested.len()),
        subtotal: Money::zero(),
    };
    for request in requested {
        rules::require_quantity("product", request.product_id, request.quantity)?;
        let price = lock_product(tx, request.product_id).await?;
        priced.subtotal = accumulate(priced.subtotal, price, request.quantity)?;
        priced.lines.push(ProductLine {
            product_id: request.product_id,
            quantity: request.quantity,
        });
    }
    Ok(priced)
}

async fn price_drinks<T: StoreTx>(
    tx: &mut T,
    requested: &[DrinkRequest],
) -> Result<Priced<DrinkLine>> {
    rules::require_distinct("drink", requested.iter().map(|r| r.item_id))?;

    let mut priced = Priced {
        lines: Vec::with_capacity(requested.len()),
        subtotal: Money::zero(),
    };
    for request in requested {
        rules::require_quantity("drink", request.item_id, request.quantity)?;
        let item = tx
            .get_item(request.item_id, RowLock::Share)
            .await?
            .ok_or_else(|| DomainError::not_found("drink", request.item_id))?;
        match item.kind {
            ItemKind::Drink => {}
            ItemKind::Ingredient => {
                return Err(DomainError::invalid(format!(
                    "item {} is not a drink",
                    item.id
                )));
            }
        }
        priced.subtotal = accumulate(priced.subtotal, item.price, request.quantity)?;
        priced.lines.push(DrinkLine {
            item_id: item.id,
            quantity: request.quantity,
        });
    }
    Ok(priced)
}

/// Prices the stored product lines of an order at current catalog prices.
async fn reprice_stored_products<T: StoreTx>(tx: &mut T, order_id: OrderId) -> Result<Money> {
    let mut subtotal = Money::zero();
    for line in tx.product_lines(order_id).await? {
        let price = lock_product(tx, line.product_id).await?;
        subtotal = accumulate(subtotal, price, line.quantity)?;
    }
    Ok(subtotal)
}

async fn reprice_stored_drinks<T: StoreTx>(tx: &mut T, order_id: OrderId) -> Result<Money> {
    let mut subtotal = Money::zero();
    for line in tx.drink_lines(order_id).await? {
        let item = tx
            .get_item(line.item_id, RowLock::Share)
            .await?
            .ok_or_else(|| DomainError::not_found("drink", line.item_id))?;
        subtotal = accumulate(subtotal, item.price, line.quantity)?;
    }
    Ok(subtotal)
}

async fn load_view<T: StoreTx>(tx: &mut T, order: OrderRecord) -> Result<OrderView> {
    let mut products = Vec::new();
    for line in tx.product_lines(order.id).await? {
        products.push(ProductLineView {
            product_id: line.product_id,
            quantity: line.quantity,
            product: tx.get_product(line.product_id, RowLock::None).await?,
        });
    }

    let mut drinks = Vec::new();
    for line in tx.drink_lines(order.id).await? {
        drinks.push(DrinkLineView {
            item_id: line.item_id,
            quantity: line.quantity,
            drink: tx.get_item(line.item_id, RowLock::None).await?,
        });
    }

    Ok(OrderView {
        order,
        products,
        drinks,
    })
}

/// Re-reads an order written earlier in the same transaction so the view
/// reflects what storage holds.
async fn reload<T: StoreTx>(tx: &mut T, id: OrderId) -> Result<OrderView> {
    let order = tx
        .get_order(id, RowLock::None)
        .await?
        .ok_or_else(|| DomainError::not_found("order", id))?;
    load_view(tx, order).await
}

/// Service for managing orders.
#[derive(Clone)]
pub struct OrderLedger<S: Store> {
    store: S,
    policy: StatusPolicy,
}

impl<S: Store> OrderLedger<S> {
    /// Creates a ledger that allows any status change.
    pub fn new(store: S) -> Self {
        Self::with_policy(store, StatusPolicy::default())
    }

    pub fn with_policy(store: S, policy: StatusPolicy) -> Self {
        Self { store, policy }
    }

    /// Places a new order in status STARTED with its total computed from
    /// current catalog prices.
    #[tracing::instrument(
        skip(self, cmd),
        fields(products = cmd.products.len(), drinks = cmd.drinks.len())
    )]
    pub async fn create(&self, cmd: CreateOrder) -> Result<OrderView> {
        rules::require_text("description", &cmd.description)?;
        rules::require_text("customer name", &cmd.customer_name)?;
        rules::require_text("address", &cmd.address)?;
        let phone = Phone::parse(&cmd.phone)?;
        if cmd.products.is_empty() {
            return Err(DomainError::invalid("an order needs at least one product"));
        }

        let mut tx = self.store.begin().await?;
        let products = price_products(&mut tx, &cmd.products).await?;
        let drinks = price_drinks(&mut tx, &cmd.drinks).await?;
        let total = accumulate(products.subtotal, drinks.subtotal, 1)?;

        let record = OrderRecord {
            id: OrderId::new(),
            created_at: Utc::now(),
            description: cmd.description,
            status: OrderStatus::Started,
            customer_name: cmd.customer_name,
            address: cmd.address,
            phone: phone.into_inner(),
            notes: cmd.notes,
            total,
        };
        tx.insert_order(&record).await?;
        tx.insert_product_lines(record.id, &products.lines).await?;
        tx.insert_drink_lines(record.id, &drinks.lines).await?;
        let view = reload(&mut tx, record.id).await?;
        tx.commit().await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %record.id, total = %record.total, "order created");
        Ok(view)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: OrderId) -> Result<OrderView> {
        let mut tx = self.store.begin().await?;
        let order = tx
            .get_order(id, RowLock::None)
            .await?
            .ok_or_else(|| DomainError::not_found("order", id))?;
        let view = load_view(&mut tx, order).await?;
        tx.commit().await?;
        Ok(view)
    }

    /// Lists orders in creation order.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, query: OrderQuery) -> Result<Vec<OrderView>> {
        let mut tx = self.store.begin().await?;
        let orders = tx.list_orders(&query).await?;
        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            views.push(load_view(&mut tx, order).await?);
        }
        tx.commit().await?;
        Ok(views)
    }

    /// Lists orders that are not finalized.
    pub async fn list_unfinished(&self) -> Result<Vec<OrderView>> {
        self.list(OrderQuery::unfinished()).await
    }

    /// Applies a partial update and recomputes the total from the resulting
    /// mix of replaced and preserved lines.
    #[tracing::instrument(
        skip(self, cmd),
        fields(products = cmd.products.len(), drinks = cmd.drinks.len())
    )]
    pub async fn update(&self, id: OrderId, cmd: UpdateOrder) -> Result<OrderView> {
        let mut tx = self.store.begin().await?;
        let mut record = tx
            .get_order(id, RowLock::Exclusive)
            .await?
            .ok_or_else(|| DomainError::not_found("order", id))?;

        if let Some(description) = rules::replacement(cmd.description) {
            record.description = description;
        }
        if let Some(name) = rules::replacement(cmd.customer_name) {
            record.customer_name = name;
        }
        if let Some(address) = rules::replacement(cmd.address) {
            record.address = address;
        }
        if let Some(phone) = rules::replacement(cmd.phone) {
            record.phone = Phone::parse(&phone)?.into_inner();
        }
        if let Some(notes) = rules::replacement(cmd.notes) {
            record.notes = notes;
        }
        if let Some(status) = cmd.status {
            self.policy.check(record.status, status)?;
            record.status = status;
        }

        let product_total = if cmd.products.is_empty() {
            reprice_stored_products(&mut tx, id).await?
        } else {
            let priced = price_products(&mut tx, &cmd.products).await?;
            tx.delete_product_lines(id).await?;
            tx.insert_product_lines(id, &priced.lines).await?;
            priced.subtotal
        };
        let drink_total = if cmd.drinks.is_empty() {
            reprice_stored_drinks(&mut tx, id).await?
        } else {
            let priced = price_drinks(&mut tx, &cmd.drinks).await?;
            tx.delete_drink_lines(id).await?;
            tx.insert_drink_lines(id, &priced.lines).await?;
            priced.subtotal
        };
        record.total = accumulate(product_total, drink_total, 1)?;

        tx.update_order(&record).await?;
        let view = reload(&mut tx, id).await?;
        tx.commit().await?;

        metrics::counter!("orders_updated_total").increment(1);
        tracing::info!(order_id = %id, status = %record.status, total = %record.total, "order updated");
        Ok(view)
    }

    /// Deletes an order with all of its lines.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: OrderId) -> Result<()> {
        let mut tx = self.store.begin().await?;
        if tx.get_order(id, RowLock::Exclusive).await?.is_none() {
            return Err(DomainError::not_found("order", id));
        }
        tx.delete_product_lines(id).await?;
        tx.delete_drink_lines(id).await?;
        tx.delete_order(id).await?;
        tx.commit().await?;

        metrics::counter!("orders_deleted_total").increment(1);
        tracing::info!(order_id = %id, "order deleted");
        Ok(())
    }
}

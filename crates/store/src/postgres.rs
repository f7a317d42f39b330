use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ItemId, ItemKind, Money, OrderId, OrderStatus, ProductId};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgPoolOptions, postgres::PgRow};
use uuid::Uuid;

use crate::{
    DrinkLine, IngredientLine, Item, ItemQuery, OrderQuery, OrderRecord, Product, ProductLine,
    ProductQuery, Result, StoreError,
    store::{RowLock, Store, StoreTx},
};

const ITEM_COLUMNS: &str = "id, kind, description, price_cents, extra";
const PRODUCT_COLUMNS: &str = "id, description, price_cents";
const ORDER_COLUMNS: &str =
    "id, created_at, description, status, customer_name, address, phone, notes, total_cents";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    type Tx = PostgresTx;

    async fn begin(&self) -> Result<PostgresTx> {
        let tx = self.pool.begin().await?;
        Ok(PostgresTx { tx })
    }
}

/// Transaction over a [`PostgresStore`]. Rolled back on drop unless committed.
pub struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

fn lock_clause(lock: RowLock) -> &'static str {
    match lock {
        RowLock::None => "",
        RowLock::Share => " FOR SHARE",
        RowLock::Exclusive => " FOR UPDATE",
    }
}

fn map_write_error(err: sqlx::Error, entity: &'static str, key: impl FnOnce() -> String) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate { entity, key: key() };
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::ReferenceViolation { entity, key: key() };
        }
    }
    StoreError::Database(err)
}

fn decode_quantity(table: &'static str, raw: i64) -> Result<u32> {
    u32::try_from(raw).map_err(|_| StoreError::Decode {
        table,
        reason: format!("quantity {raw} out of range"),
    })
}

fn row_to_item(row: PgRow) -> Result<Item> {
    let kind: String = row.try_get("kind")?;
    let kind = kind.parse::<ItemKind>().map_err(|e| StoreError::Decode {
        table: "items",
        reason: e.to_string(),
    })?;

    Ok(Item {
        id: ItemId::new(row.try_get("id")?),
        kind,
        description: row.try_get("description")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        extra: row.try_get("extra")?,
    })
}

fn row_to_product(row: PgRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::new(row.try_get("id")?),
        description: row.try_get("description")?,
        price: Money::from_cents(row.try_get("price_cents")?),
    })
}

fn row_to_order(row: PgRow) -> Result<OrderRecord> {
    let status: String = row.try_get("status")?;
    let status = status.parse::<OrderStatus>().map_err(|e| StoreError::Decode {
        table: "orders",
        reason: e.to_string(),
    })?;

    Ok(OrderRecord {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        description: row.try_get("description")?,
        status,
        customer_name: row.try_get("customer_name")?,
        address: row.try_get("address")?,
        phone: row.try_get("phone")?,
        notes: row.try_get("notes")?,
        total: Money::from_cents(row.try_get("total_cents")?),
    })
}

#[async_trait]
impl StoreTx for PostgresTx {
    async fn get_item(&mut self, id: ItemId, lock: RowLock) -> Result<Option<Item>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1{}",
            lock_clause(lock)
        );
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(row_to_item).transpose()
    }

    async fn list_items(&mut self, query: &ItemQuery) -> Result<Vec<Item>> {
        let rows = match query.kind {
            Some(kind) => {
                sqlx::query(&format!(
                    "SELECT {ITEM_COLUMNS} FROM items WHERE kind = $1 ORDER BY id ASC"
                ))
                .bind(kind.as_str())
                .fetch_all(&mut *self.tx)
                .await?
            }
            None => {
                sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id ASC"))
                    .fetch_all(&mut *self.tx)
                    .await?
            }
        };

        rows.into_iter().map(row_to_item).collect()
    }

    async fn insert_item(&mut self, item: &Item) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO items (id, kind, description, price_cents, extra)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(item.id.as_i64())
        .bind(item.kind.as_str())
        .bind(&item.description)
        .bind(item.price.cents())
        .bind(item.extra)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "item", || item.id.to_string()))?;

        Ok(())
    }

    async fn update_item(&mut self, item: &Item) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE items SET description = $2, price_cents = $3, extra = $4
            WHERE id = $1
            "#,
        )
        .bind(item.id.as_i64())
        .bind(&item.description)
        .bind(item.price.cents())
        .bind(item.extra)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn delete_item(&mut self, id: ItemId) -> Result<bool> {
        // product_ingredients.item_id cascades
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id.as_i64())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_write_error(e, "item", || id.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_product(&mut self, id: ProductId, lock: RowLock) -> Result<Option<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1{}",
            lock_clause(lock)
        );
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(row_to_product).transpose()
    }

    async fn list_products(&mut self, query: &ProductQuery) -> Result<Vec<Product>> {
        let rows = match &query.description_contains {
            Some(term) => {
                sqlx::query(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products \
                     WHERE POSITION(LOWER($1) IN LOWER(description)) > 0 ORDER BY id ASC"
                ))
                .bind(term)
                .fetch_all(&mut *self.tx)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id ASC"
                ))
                .fetch_all(&mut *self.tx)
                .await?
            }
        };

        rows.into_iter().map(row_to_product).collect()
    }

    async fn insert_product(&mut self, product: &Product) -> Result<()> {
        sqlx::query("INSERT INTO products (id, description, price_cents) VALUES ($1, $2, $3)")
            .bind(product.id.as_i64())
            .bind(&product.description)
            .bind(product.price.cents())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_write_error(e, "product", || product.id.to_string()))?;

        Ok(())
    }

    async fn update_product(&mut self, product: &Product) -> Result<()> {
        sqlx::query("UPDATE products SET description = $2, price_cents = $3 WHERE id = $1")
            .bind(product.id.as_i64())
            .bind(&product.description)
            .bind(product.price.cents())
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i64())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_write_error(e, "product", || id.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn ingredient_lines(
        &mut self,
        product_id: ProductId,
        lock: RowLock,
    ) -> Result<Vec<IngredientLine>> {
        let lock = match lock {
            RowLock::None => "",
            RowLock::Share => " FOR SHARE OF i",
            RowLock::Exclusive => " FOR UPDATE OF i",
        };
        let sql = format!(
            r#"
            SELECT pi.item_id, pi.quantity
            FROM product_ingredients pi
            JOIN items i ON i.id = pi.item_id
            WHERE pi.product_id = $1
            ORDER BY pi.position ASC{lock}
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(product_id.as_i64())
            .fetch_all(&mut *self.tx)
            .await?;

        rows.into_iter()
            .map(|row| -> Result<IngredientLine> {
                Ok(IngredientLine {
                    item_id: ItemId::new(row.try_get("item_id")?),
                    quantity: decode_quantity("product_ingredients", row.try_get("quantity")?)?,
                })
            })
            .collect()
    }

    async fn insert_ingredient_lines(
        &mut self,
        product_id: ProductId,
        lines: &[IngredientLine],
    ) -> Result<()> {
        for (position, line) in lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO product_ingredients (product_id, item_id, quantity, position)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(product_id.as_i64())
            .bind(line.item_id.as_i64())
            .bind(i64::from(line.quantity))
            .bind(position as i64)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                map_write_error(e, "product_ingredient", || {
                    format!("({product_id}, {})", line.item_id)
                })
            })?;
        }

        Ok(())
    }

    async fn delete_ingredient_lines(&mut self, product_id: ProductId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM product_ingredients WHERE product_id = $1")
            .bind(product_id.as_i64())
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn get_order(&mut self, id: OrderId, lock: RowLock) -> Result<Option<OrderRecord>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1{}",
            lock_clause(lock)
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(row_to_order).transpose()
    }

    async fn list_orders(&mut self, query: &OrderQuery) -> Result<Vec<OrderRecord>> {
        let filter = if query.unfinished_only {
            " WHERE status <> 'FINALIZED'"
        } else {
            ""
        };
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders{filter} ORDER BY seq ASC"
        ))
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(row_to_order).collect()
    }

    async fn insert_order(&mut self, order: &OrderRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, created_at, description, status, customer_name, address, phone, notes, total_cents)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.created_at)
        .bind(&order.description)
        .bind(order.status.as_str())
        .bind(&order.customer_name)
        .bind(&order.address)
        .bind(&order.phone)
        .bind(&order.notes)
        .bind(order.total.cents())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "order", || order.id.to_string()))?;

        Ok(())
    }

    async fn update_order(&mut self, order: &OrderRecord) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE orders SET
                description = $2,
                status = $3,
                customer_name = $4,
                address = $5,
                phone = $6,
                notes = $7,
                total_cents = $8
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.description)
        .bind(order.status.as_str())
        .bind(&order.customer_name)
        .bind(&order.address)
        .bind(&order.phone)
        .bind(&order.notes)
        .bind(order.total.cents())
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_write_error(e, "order", || id.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn product_lines(&mut self, order_id: OrderId) -> Result<Vec<ProductLine>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, quantity FROM order_products
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<ProductLine> {
                Ok(ProductLine {
                    product_id: ProductId::new(row.try_get("product_id")?),
                    quantity: decode_quantity("order_products", row.try_get("quantity")?)?,
                })
            })
            .collect()
    }

    async fn drink_lines(&mut self, order_id: OrderId) -> Result<Vec<DrinkLine>> {
        let rows = sqlx::query(
            r#"
            SELECT item_id, quantity FROM order_drinks
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<DrinkLine> {
                Ok(DrinkLine {
                    item_id: ItemId::new(row.try_get("item_id")?),
                    quantity: decode_quantity("order_drinks", row.try_get("quantity")?)?,
                })
            })
            .collect()
    }

    async fn insert_product_lines(
        &mut self,
        order_id: OrderId,
        lines: &[ProductLine],
    ) -> Result<()> {
        for (position, line) in lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_products (order_id, product_id, quantity, position)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order_id.as_uuid())
            .bind(line.product_id.as_i64())
            .bind(i64::from(line.quantity))
            .bind(position as i64)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                map_write_error(e, "order_product", || {
                    format!("({order_id}, {})", line.product_id)
                })
            })?;
        }

        Ok(())
    }

    async fn insert_drink_lines(&mut self, order_id: OrderId, lines: &[DrinkLine]) -> Result<()> {
        for (position, line) in lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_drinks (order_id, item_id, quantity, position)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order_id.as_uuid())
            .bind(line.item_id.as_i64())
            .bind(i64::from(line.quantity))
            .bind(position as i64)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                map_write_error(e, "order_drink", || format!("({order_id}, {})", line.item_id))
            })?;
        }

        Ok(())
    }

    async fn delete_product_lines(&mut self, order_id: OrderId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM order_products WHERE order_id = $1")
            .bind(order_id.as_uuid())
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_drink_lines(&mut self, order_id: OrderId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM order_drinks WHERE order_id = $1")
            .bind(order_id.as_uuid())
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count_active_orders_with_product(&mut self, product_id: ProductId) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT o.id)
            FROM order_products op
            JOIN orders o ON o.id = op.order_id
            WHERE op.product_id = $1 AND o.status <> 'FINALIZED'
            "#,
        )
        .bind(product_id.as_i64())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count as u64)
    }

    async fn count_active_orders_with_drink(&mut self, item_id: ItemId) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT o.id)
            FROM order_drinks od
            JOIN orders o ON o.id = od.order_id
            WHERE od.item_id = $1 AND o.status <> 'FINALIZED'
            "#,
        )
        .bind(item_id.as_i64())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count as u64)
    }

    async fn count_active_orders_with_ingredient(&mut self, item_id: ItemId) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT o.id)
            FROM product_ingredients pi
            JOIN order_products op ON op.product_id = pi.product_id
            JOIN orders o ON o.id = op.order_id
            WHERE pi.item_id = $1 AND o.status <> 'FINALIZED'
            "#,
        )
        .bind(item_id.as_i64())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count as u64)
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

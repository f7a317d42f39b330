//! Row shapes persisted by every store backend.

use chrono::{DateTime, Utc};
use common::{ItemId, ItemKind, Money, OrderId, OrderStatus, ProductId};
use serde::{Deserialize, Serialize};

/// A catalog entry: a drink or an ingredient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    pub description: String,
    pub price: Money,
    /// Addable flag ("with sugar" for drinks, "extra" for ingredients).
    pub extra: bool,
}

/// A composite catalog entry (burger). Its price is set by hand and is
/// independent of the ingredient prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub description: String,
    pub price: Money,
}

/// Link between a product and one of its ingredient items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientLine {
    pub item_id: ItemId,
    pub quantity: u32,
}

/// Root row of an order, without its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub description: String,
    pub status: OrderStatus,
    pub customer_name: String,
    pub address: String,
    pub phone: String,
    pub notes: String,
    pub total: Money,
}

/// Product line of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Drink line of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrinkLine {
    pub item_id: ItemId,
    pub quantity: u32,
}

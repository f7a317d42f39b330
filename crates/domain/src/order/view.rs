//! Read-side shapes of an order.

use common::{ItemId, ProductId};
use serde::Serialize;
use store::{Item, OrderRecord, Product};

/// A product line with the product's current catalog data.
///
/// `product` is `None` when the product was deleted after every order using
/// it was finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductLineView {
    pub product_id: ProductId,
    pub quantity: u32,
    pub product: Option<Product>,
}

/// A drink line with the drink's current catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrinkLineView {
    pub item_id: ItemId,
    pub quantity: u32,
    pub drink: Option<Item>,
}

/// An order with its resolved lines, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: OrderRecord,
    pub products: Vec<ProductLineView>,
    pub drinks: Vec<DrinkLineView>,
}

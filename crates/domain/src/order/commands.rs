//! Order commands.

use common::{ItemId, OrderStatus, ProductId};

/// One requested product line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl ProductRequest {
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// One requested drink line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrinkRequest {
    pub item_id: ItemId,
    pub quantity: u32,
}

impl DrinkRequest {
    pub fn new(item_id: impl Into<ItemId>, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
        }
    }
}

/// Command to place a new order.
#[derive(Debug, Clone, Default)]
pub struct CreateOrder {
    pub description: String,
    pub customer_name: String,
    pub address: String,
    pub phone: String,
    pub notes: String,

    /// At least one product line is required.
    pub products: Vec<ProductRequest>,

    /// May be empty.
    pub drinks: Vec<DrinkRequest>,
}

impl CreateOrder {
    /// Creates a command with the required customer fields and no lines.
    pub fn new(
        description: impl Into<String>,
        customer_name: impl Into<String>,
        address: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            customer_name: customer_name.into(),
            address: address.into(),
            phone: phone.into(),
            ..Self::default()
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_product(mut self, product_id: impl Into<ProductId>, quantity: u32) -> Self {
        self.products.push(ProductRequest::new(product_id, quantity));
        self
    }

    pub fn with_drink(mut self, item_id: impl Into<ItemId>, quantity: u32) -> Self {
        self.drinks.push(DrinkRequest::new(item_id, quantity));
        self
    }
}

/// Command to change an existing order.
///
/// Text fields that are `None` or blank are left unchanged. An empty line
/// list keeps the stored lines of that category; a non-empty one replaces
/// them entirely.
#[derive(Debug, Clone, Default)]
pub struct UpdateOrder {
    pub description: Option<String>,
    pub status: Option<OrderStatus>,
    pub customer_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub products: Vec<ProductRequest>,
    pub drinks: Vec<DrinkRequest>,
}

impl UpdateOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_product(mut self, product_id: impl Into<ProductId>, quantity: u32) -> Self {
        self.products.push(ProductRequest::new(product_id, quantity));
        self
    }

    pub fn with_drink(mut self, item_id: impl Into<ItemId>, quantity: u32) -> Self {
        self.drinks.push(DrinkRequest::new(item_id, quantity));
        self
    }
}

//! Consistency engine for the order backend.
//!
//! This crate provides:
//! - `Catalog` for drinks and ingredients
//! - `ProductService` for burgers built from ingredients
//! - `UsageGuard` checks that freeze catalog entries used by unfinished orders
//! - `OrderLedger` for orders, their lines and their totals
//!
//! Every operation runs in a single store transaction and either commits as
//! a whole or leaves the store untouched.

pub mod catalog;
pub mod error;
pub mod guard;
pub mod order;
pub mod product;
mod rules;

pub use catalog::{Catalog, CreateItem, ItemUpdate};
pub use error::{DomainError, Result};
pub use guard::UsageGuard;
pub use order::{
    CreateOrder, DrinkLineView, DrinkRequest, OrderLedger, OrderView, Phone, ProductLineView,
    ProductRequest, StatusPolicy, UpdateOrder,
};
pub use product::{IngredientRequest, IngredientView, ProductDraft, ProductService, ProductView};

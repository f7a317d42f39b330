//! Shared types for the order backend.
//!
//! Identifiers, money and the two closed enums (item kind, order status)
//! that every other crate in the workspace speaks.

pub mod kinds;
pub mod money;
pub mod types;

pub use kinds::{ItemKind, OrderStatus, ParseKindError};
pub use money::Money;
pub use types::{ItemId, OrderId, ProductId};

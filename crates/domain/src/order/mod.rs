//! Order ledger: orders as atomic sets of product and drink lines.

mod commands;
mod service;
mod state;
mod value_objects;
mod view;

pub use commands::{CreateOrder, DrinkRequest, ProductRequest, UpdateOrder};
pub use service::OrderLedger;
pub use state::StatusPolicy;
pub use value_objects::Phone;
pub use view::{DrinkLineView, OrderView, ProductLineView};

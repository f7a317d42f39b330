//! HTTP handlers, one module per resource.

pub mod health;
pub mod items;
pub mod metrics;
pub mod orders;
pub mod products;

use serde::Deserialize;

use crate::error::ApiError;

/// A `{ "id": .., "quantity": .. }` pair used for ingredient and order lines.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LineBody {
    pub id: i64,
    pub quantity: u32,
}

fn parse_numeric_id(what: &str, raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {what} id: {raw}")))
}

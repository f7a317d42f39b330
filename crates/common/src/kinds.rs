//! Closed enums shared by the store and the domain.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a textual kind or status is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {what} '{value}'")]
pub struct ParseKindError {
    pub what: &'static str,
    pub value: String,
}

/// Kind of a catalog item. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    Drink,
    Ingredient,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Drink => "DRINK",
            ItemKind::Ingredient => "INGREDIENT",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRINK" => Ok(ItemKind::Drink),
            "INGREDIENT" => Ok(ItemKind::Ingredient),
            other => Err(ParseKindError {
                what: "item kind",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle status of an order.
///
/// ```text
/// Started ──► Delivery ──► Finalized
/// ```
///
/// Only `Finalized` releases the catalog entries an order references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Started,
    Delivery,
    Finalized,
}

impl OrderStatus {
    /// Returns true while the order still holds its catalog references.
    pub fn is_active(&self) -> bool {
        !matches!(self, OrderStatus::Finalized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Started => "STARTED",
            OrderStatus::Delivery => "DELIVERY",
            OrderStatus::Finalized => "FINALIZED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STARTED" => Ok(OrderStatus::Started),
            "DELIVERY" => Ok(OrderStatus::Delivery),
            "FINALIZED" => Ok(OrderStatus::Finalized),
            other => Err(ParseKindError {
                what: "order status",
                value: other.to_string(),
            }),
        }
    }
}

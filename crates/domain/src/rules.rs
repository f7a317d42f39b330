//! Field rules shared by the catalog, product and order services.

use std::collections::HashSet;
use std::hash::Hash;

use common::Money;

use crate::error::{DomainError, Result};

pub(crate) fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DomainError::invalid(format!("{field} must not be blank")));
    }
    Ok(())
}

pub(crate) fn require_price(price: Money) -> Result<()> {
    if !price.is_positive() {
        return Err(DomainError::invalid(format!(
            "price must be greater than zero, got {price}"
        )));
    }
    Ok(())
}

pub(crate) fn require_quantity(what: &str, id: impl std::fmt::Display, quantity: u32) -> Result<()> {
    if quantity == 0 {
        return Err(DomainError::invalid(format!(
            "quantity of {what} {id} must be at least 1"
        )));
    }
    Ok(())
}

/// Rejects a request that names the same reference twice.
pub(crate) fn require_distinct<K>(what: &str, keys: impl IntoIterator<Item = K>) -> Result<()>
where
    K: Eq + Hash + std::fmt::Display,
{
    let mut seen = HashSet::new();
    for key in keys {
        if seen.contains(&key) {
            return Err(DomainError::invalid(format!("{what} {key} listed more than once")));
        }
        seen.insert(key);
    }
    Ok(())
}

/// Non-blank replacement text, or `None` when the field is left unchanged.
pub(crate) fn replacement(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

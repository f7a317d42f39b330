use common::ItemKind;

/// Filter for listing catalog items.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemQuery {
    /// Only items of this kind.
    pub kind: Option<ItemKind>,
}

impl ItemQuery {
    /// Creates a query matching every item.
    pub fn all() -> Self {
        Self::default()
    }

    /// Creates a query for items of a single kind.
    pub fn of_kind(kind: ItemKind) -> Self {
        Self { kind: Some(kind) }
    }

    /// Returns true if the item kind passes the filter.
    pub fn matches(&self, kind: ItemKind) -> bool {
        self.kind.is_none_or(|k| k == kind)
    }
}

/// Filter for listing products.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Case-insensitive substring of the description.
    pub description_contains: Option<String>,
}

impl ProductQuery {
    /// Creates a query matching every product.
    pub fn all() -> Self {
        Self::default()
    }

    /// Creates a query for products whose description contains `term`.
    pub fn description_contains(term: impl Into<String>) -> Self {
        Self {
            description_contains: Some(term.into()),
        }
    }

    /// Returns true if the description passes the filter.
    pub fn matches(&self, description: &str) -> bool {
        match &self.description_contains {
            Some(term) => description
                .to_lowercase()
                .contains(&term.to_lowercase()),
            None => true,
        }
    }
}

/// Filter for listing orders.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderQuery {
    /// Only orders whose status is not FINALIZED.
    pub unfinished_only: bool,
}

impl OrderQuery {
    /// Creates a query matching every order.
    pub fn all() -> Self {
        Self::default()
    }

    /// Creates a query for orders that are not finalized.
    pub fn unfinished() -> Self {
        Self {
            unfinished_only: true,
        }
    }
}

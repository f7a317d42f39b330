//! Domain error types.

use store::StoreError;
use thiserror::Error;

/// Errors that can occur during domain operations.
///
/// Every variant aborts the unit of work it was raised in; nothing is
/// partially committed.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Duplicate identifier, or the entity is in use by an unfinished order.
    #[error("{0}")]
    Conflict(String),

    /// A field or collection breaks a business rule.
    #[error("{0}")]
    Invalid(String),

    /// Storage failure unrelated to business rules. The source is kept for
    /// logging and never rendered to callers.
    #[error("internal storage error")]
    Internal(#[source] StoreError),
}

impl DomainError {
    pub(crate) fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        DomainError::Invalid(message.into())
    }

    pub(crate) fn conflict(message: impl Into<String>) -> Self {
        DomainError::Conflict(message.into())
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate { entity, key } => {
                DomainError::Conflict(format!("{entity} {key} already exists"))
            }
            StoreError::ReferenceViolation { entity, key } => {
                DomainError::Conflict(format!("{entity} {key} is still referenced"))
            }
            other => DomainError::Internal(other),
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_maps_to_conflict() {
        let err: DomainError = StoreError::Duplicate {
            entity: "item",
            key: "5".to_string(),
        }
        .into();
        assert!(matches!(err, DomainError::Conflict(ref m) if m == "item 5 already exists"));
    }

    #[test]
    fn internal_hides_store_detail() {
        let err: DomainError = StoreError::Decode {
            table: "items",
            reason: "bad kind".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "internal storage error");
        assert!(std::error::Error::source(&err).is_some());
    }
}

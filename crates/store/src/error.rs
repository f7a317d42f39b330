use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row with the same key already exists.
    #[error("Duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    /// A write would leave a link row pointing at a missing row,
    /// or remove a row that link rows still point at.
    #[error("Reference violation on {entity}: {key}")]
    ReferenceViolation { entity: &'static str, key: String },

    /// A stored value could not be mapped back to its domain type.
    #[error("Corrupt row in {table}: {reason}")]
    Decode { table: &'static str, reason: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

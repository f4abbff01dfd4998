use thiserror::Error;

/// Unified error type for storage operations that application code can handle
#[derive(Error, Debug)]
pub enum StoreError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation on an id or username
    #[error("Unique constraint violation on {field} '{value}'")]
    UniqueViolation { field: String, value: String },

    /// Catch-all for non-recoverable errors (backend unavailable, poisoned state, ...)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

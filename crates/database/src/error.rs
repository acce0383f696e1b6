//! Document store error types.

use thiserror::Error;

/// Errors that can occur during document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Stored data could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A path or path segment is malformed
    #[error("invalid document path: {0}")]
    InvalidPath(String),

    /// The stored value at a path is not a JSON object
    #[error("document at {path} is not an object")]
    NotAnObject { path: String },

    /// The store refused the operation (unreachable, injected fault, ...)
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

//! Cache error types.

use database::StoreError;
use horoscope_core::ParseError;
use thiserror::Error;

/// Errors surfaced by [`HoroscopeCache`](crate::HoroscopeCache).
#[derive(Debug, Error)]
pub enum CacheError {
    /// The underlying document store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A document could not be encoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// A key or identifier read from the store is malformed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

//! Error types for batch generation.

use horoscope_cache::CacheError;
use horoscope_core::{GenerationError, ParseError};
use thiserror::Error;

/// Errors that escape the per-unit boundaries of a batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Cache read or write failed.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Content generation failed.
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Invalid input (date, locale, mode, ...).
    #[error("invalid input: {0}")]
    Parse(#[from] ParseError),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Configuration(String),
}

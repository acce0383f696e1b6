//! Error types for generation and parsing.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while generating horoscope content.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The generator is temporarily unavailable.
    #[error("generator unavailable: {0}")]
    Unavailable(String),

    /// The generator is misconfigured (missing key, bad URL, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport-level failure talking to the generation service.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered but generation failed.
    #[error("generation failed: {0}")]
    ProcessingFailed(String),

    /// The service answered with empty or malformed content.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The call did not complete in time.
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors produced when parsing the string form of a core type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown zodiac sign: {0}")]
    UnknownSign(String),

    #[error("unknown locale: {0}")]
    UnknownLocale(String),

    #[error("unknown horoscope period: {0}")]
    UnknownPeriod(String),

    #[error("invalid {period} bucket key: {key}")]
    InvalidBucketKey { period: &'static str, key: String },

    #[error("invalid date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),
}

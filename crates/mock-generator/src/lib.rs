//! Mock content generators for horoscope batch generation.
//!
//! This crate provides mock implementations of the `ContentGenerator` trait
//! for tests and offline runs:
//! - `StaticGenerator` - Deterministic text derived from the request, counts calls
//! - `FlakyGenerator` - Wraps another generator and fails for chosen signs
//! - `DelayedGenerator` - Wraps another generator with artificial latency
//!
//! For production content, use the `gemini-generator` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_generator::{ContentGenerator, GenerationRequest, Locale, StaticGenerator, ZodiacSign};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_generator::GenerationError> {
//!     let generator = StaticGenerator::new();
//!
//!     let request = GenerationRequest::new(ZodiacSign::Leo, Locale::En);
//!     let set = generator.generate(request).await?;
//!     println!("Daily: {}", set.daily.main);
//!     assert_eq!(generator.call_count(), 1);
//!     Ok(())
//! }
//! ```

mod delayed;
mod flaky;
mod static_gen;

// Re-export core types for convenience
pub use horoscope_core::{
    async_trait, ContentGenerator, GenerationError, GenerationRequest, HoroscopeDetail,
    HoroscopeSet, Locale, ZodiacSign,
};

pub use delayed::DelayedGenerator;
pub use flaky::FlakyGenerator;
pub use static_gen::StaticGenerator;

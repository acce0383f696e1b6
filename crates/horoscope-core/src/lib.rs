//! Core types and trait for horoscope content generation.
//!
//! This crate provides the shared vocabulary for every other crate in the
//! workspace. It defines:
//!
//! - [`ZodiacSign`] / [`Locale`] / [`HoroscopePeriod`] - The three partition axes
//! - [`TimeBucketKey`] - The string identity of a period's time window
//! - [`HoroscopeDetail`] / [`HoroscopeSet`] - Generated content
//! - [`ContentGenerator`] - The trait every generation backend implements
//! - [`GenerationError`] - Error types for generation
//! - [`Clock`] - Injectable wall clock
//!
//! # Example
//!
//! ```rust
//! use horoscope_core::{
//!     async_trait, ContentGenerator, GenerationError, GenerationRequest, HoroscopeDetail,
//!     HoroscopeSet,
//! };
//!
//! struct FixedGenerator;
//!
//! #[async_trait]
//! impl ContentGenerator for FixedGenerator {
//!     async fn generate(&self, request: GenerationRequest) -> Result<HoroscopeSet, GenerationError> {
//!         let detail = HoroscopeDetail::new(
//!             format!("{} shines", request.sign),
//!             "love",
//!             "money",
//!             "health",
//!         );
//!         Ok(HoroscopeSet::uniform(detail))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "FixedGenerator"
//!     }
//! }
//! ```

mod clock;
mod error;
mod horoscope;
mod period;
mod prompt;
mod trait_def;
mod zodiac;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{GenerationError, ParseError};
pub use horoscope::{
    GenerationRequest, HoroscopeDetail, HoroscopeSet, PersonalizationProfile, SignMap,
};
pub use period::{HoroscopePeriod, TimeBucketKey};
pub use prompt::hash_prompt;
pub use trait_def::ContentGenerator;
pub use zodiac::{Locale, ZodiacSign};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

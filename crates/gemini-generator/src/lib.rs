//! Gemini-backed horoscope content generator.
//!
//! Talks to Gemini through its OpenAI-compatible chat completions endpoint.
//! Each [`ContentGenerator::generate`] call sends three prompts (daily,
//! weekly, monthly) concurrently and expects a JSON object with `main`,
//! `love`, `money` and `health` back from each.
//!
//! Daily prompts are anchored on a theme chosen deterministically from the
//! date and sign (see [`daily_theme`]), so regenerating the same day keeps
//! the same tone.
//!
//! # Usage
//!
//! ```rust,no_run
//! use gemini_generator::GeminiGenerator;
//! use horoscope_core::{ContentGenerator, GenerationRequest, Locale, ZodiacSign};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let generator = GeminiGenerator::from_env()?;
//!     let set = generator
//!         .generate(GenerationRequest::new(ZodiacSign::Leo, Locale::Es))
//!         .await?;
//!     println!("{}", set.daily.main);
//!     Ok(())
//! }
//! ```

mod api_types;
mod config;
mod generator;
mod prompt;
mod response;

pub use config::{GeminiConfig, GeminiConfigBuilder, DEFAULT_API_URL, DEFAULT_MODEL};
pub use generator::GeminiGenerator;
pub use prompt::{daily_theme, date_descriptor, DAILY_THEMES};
pub use response::parse_detail;

// Re-export core types for convenience
pub use horoscope_core::{ContentGenerator, GenerationError};

//! The ContentGenerator trait definition.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::GenerationError;
use crate::horoscope::{GenerationRequest, HoroscopeSet};

/// A backend that turns a (sign, locale, date, profile) request into
/// horoscope text for all three periods at once.
///
/// Implementations can range from deterministic mocks to full AI backends.
/// This trait is object-safe and can be used with `Arc<dyn ContentGenerator>`.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate daily, weekly and monthly content for one sign.
    async fn generate(&self, request: GenerationRequest) -> Result<HoroscopeSet, GenerationError>;

    /// Get a human-readable name for this generator.
    fn name(&self) -> &str;

    /// Check if the generator is ready to serve requests.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }
}

#[async_trait]
impl<G: ContentGenerator + ?Sized> ContentGenerator for Arc<G> {
    async fn generate(&self, request: GenerationRequest) -> Result<HoroscopeSet, GenerationError> {
        (**self).generate(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    async fn is_ready(&self) -> bool {
        (**self).is_ready().await
    }
}

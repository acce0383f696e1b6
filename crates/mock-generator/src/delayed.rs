//! Delayed generator - wraps another generator with artificial latency.

use std::collections::HashSet;
use std::time::Duration;

use horoscope_core::{
    async_trait, ContentGenerator, GenerationError, GenerationRequest, HoroscopeSet, ZodiacSign,
};
use tokio::time::sleep;

/// A generator that sleeps before delegating to another generator.
///
/// Useful for testing timeout handling and simulating AI latency. The delay
/// can be restricted to a subset of signs to simulate a single stuck call.
pub struct DelayedGenerator<G: ContentGenerator> {
    inner: G,
    delay: Duration,
    only_for: Option<HashSet<ZodiacSign>>,
}

impl<G: ContentGenerator> DelayedGenerator<G> {
    /// Delay every call by `delay`.
    pub fn new(inner: G, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            only_for: None,
        }
    }

    /// Create a generator with a delay in milliseconds.
    pub fn with_millis(inner: G, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }

    /// Create a generator with a delay in seconds.
    pub fn with_secs(inner: G, secs: u64) -> Self {
        Self::new(inner, Duration::from_secs(secs))
    }

    /// Only delay calls for the given signs.
    pub fn only_for(mut self, signs: impl IntoIterator<Item = ZodiacSign>) -> Self {
        self.only_for = Some(signs.into_iter().collect());
        self
    }

    /// Access the wrapped generator.
    pub fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: ContentGenerator> ContentGenerator for DelayedGenerator<G> {
    async fn generate(&self, request: GenerationRequest) -> Result<HoroscopeSet, GenerationError> {
        let delayed = self
            .only_for
            .as_ref()
            .map(|signs| signs.contains(&request.sign))
            .unwrap_or(true);
        if delayed {
            sleep(self.delay).await;
        }
        self.inner.generate(request).await
    }

    fn name(&self) -> &str {
        "DelayedGenerator"
    }

    async fn is_ready(&self) -> bool {
        self.inner.is_ready().await
    }
}

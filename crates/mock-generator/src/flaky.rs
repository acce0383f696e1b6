//! Flaky generator - wraps another generator and fails for chosen signs.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use horoscope_core::{
    async_trait, ContentGenerator, GenerationError, GenerationRequest, HoroscopeDetail,
    HoroscopeSet, ZodiacSign,
};

#[derive(Debug, Clone)]
enum Failure {
    Error,
    EmptyContent,
}

/// A generator that fails for a configured set of signs.
///
/// Useful for exercising per-sign failure isolation.
pub struct FlakyGenerator<G: ContentGenerator> {
    inner: G,
    failing: HashSet<ZodiacSign>,
    fail_all: bool,
    failure: Failure,
    failures: AtomicUsize,
}

impl<G: ContentGenerator> FlakyGenerator<G> {
    /// Fail with an error for every sign in `signs`.
    pub fn failing_for(inner: G, signs: impl IntoIterator<Item = ZodiacSign>) -> Self {
        Self {
            inner,
            failing: signs.into_iter().collect(),
            fail_all: false,
            failure: Failure::Error,
            failures: AtomicUsize::new(0),
        }
    }

    /// Fail for every sign.
    pub fn always_failing(inner: G) -> Self {
        Self {
            fail_all: true,
            ..Self::failing_for(inner, std::iter::empty())
        }
    }

    /// Answer successfully but with blank content instead of an error.
    pub fn with_empty_content(mut self) -> Self {
        self.failure = Failure::EmptyContent;
        self
    }

    /// Number of injected failures so far.
    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    /// Access the wrapped generator.
    pub fn inner(&self) -> &G {
        &self.inner
    }

    fn should_fail(&self, sign: ZodiacSign) -> bool {
        self.fail_all || self.failing.contains(&sign)
    }
}

#[async_trait]
impl<G: ContentGenerator> ContentGenerator for FlakyGenerator<G> {
    async fn generate(&self, request: GenerationRequest) -> Result<HoroscopeSet, GenerationError> {
        if !self.should_fail(request.sign) {
            return self.inner.generate(request).await;
        }

        self.failures.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Failure::Error => Err(GenerationError::Unavailable(format!(
                "injected failure for {}",
                request.sign
            ))),
            Failure::EmptyContent => Ok(HoroscopeSet::uniform(HoroscopeDetail::new("", "", "", ""))),
        }
    }

    fn name(&self) -> &str {
        "FlakyGenerator"
    }

    async fn is_ready(&self) -> bool {
        self.inner.is_ready().await
    }
}

//! Static generator - deterministic content without AI.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use horoscope_core::{
    async_trait, ContentGenerator, GenerationError, GenerationRequest, HoroscopeDetail,
    HoroscopePeriod, HoroscopeSet,
};

/// A generator that builds content from the request fields.
///
/// Every call is counted and recorded so tests can assert exactly which
/// requests reached the generation service.
#[derive(Debug, Default)]
pub struct StaticGenerator {
    prefix: String,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl StaticGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix every generated text, to tell runs apart.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Number of `generate` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn detail(&self, request: &GenerationRequest, period: HoroscopePeriod) -> HoroscopeDetail {
        let date = request
            .target_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "today".to_string());
        let who = request
            .active_profile()
            .and_then(|p| p.name.clone())
            .map(|name| format!(" for {}", name))
            .unwrap_or_default();
        let base = format!(
            "{}{} {} {} {}{}",
            self.prefix, request.sign, period, request.locale, date, who
        );

        HoroscopeDetail::new(
            format!("{} main", base),
            format!("{} love", base),
            format!("{} money", base),
            format!("{} health", base),
        )
    }
}

#[async_trait]
impl ContentGenerator for StaticGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<HoroscopeSet, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let set = HoroscopeSet {
            daily: self.detail(&request, HoroscopePeriod::Daily),
            weekly: self.detail(&request, HoroscopePeriod::Weekly),
            monthly: self.detail(&request, HoroscopePeriod::Monthly),
        };

        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        Ok(set)
    }

    fn name(&self) -> &str {
        "StaticGenerator"
    }
}

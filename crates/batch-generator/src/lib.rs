//! Batch horoscope generation.
//!
//! [`BatchGenerator`] fills the cache with content for every sign, locale
//! and period of a date range. Each (locale, period, key) unit is skipped
//! when already cached, guarded by a lease against concurrent runs, and
//! generated sign by sign with per-sign failure isolation. Generator calls
//! are paced by an injected [`RateLimiter`] and bounded by a timeout.
//!
//! [`HoroscopeService`] is the read-through counterpart for a single sign.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use batch_generator::{BatchConfig, BatchGenerator};
//! use horoscope_cache::HoroscopeCache;
//! # use horoscope_core::ContentGenerator;
//! # fn backends() -> (Arc<dyn ContentGenerator>, HoroscopeCache) { unimplemented!() }
//!
//! # async fn run() {
//! let (generator, cache) = backends();
//! let config = BatchConfig::default();
//! let locales = config.locales.clone();
//! let batch = BatchGenerator::new(generator, cache, config);
//!
//! let report = batch.generate_for_next_days(7, &locales).await;
//! println!("{:?}", report.summary());
//! # }
//! ```

mod config;
mod error;
mod generator;
mod rate_limit;
mod report;
mod service;

pub use config::{
    BatchConfig, BatchConfigBuilder, GenerationMode, DEFAULT_LEASE_TTL, DEFAULT_PACING,
    DEFAULT_SIGN_TIMEOUT,
};
pub use error::BatchError;
pub use generator::{historical_and_upcoming_dates, BatchGenerator, HISTORY_DAYS, UPCOMING_DAYS};
pub use rate_limit::{RateLimiter, TokenBucket, Unlimited};
pub use report::{CompleteReport, PeriodReport, RunReport, RunSummary, UnitOutcome, UnitReport};
pub use service::HoroscopeService;

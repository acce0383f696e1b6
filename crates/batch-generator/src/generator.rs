//! The batch orchestrator.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate};
use horoscope_cache::{CleanupReport, HoroscopeCache};
use horoscope_core::{
    Clock, ContentGenerator, GenerationError, GenerationRequest, HoroscopeDetail,
    HoroscopePeriod, HoroscopeSet, Locale, ParseError, SignMap, SystemClock, TimeBucketKey,
    ZodiacSign,
};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{BatchConfig, GenerationMode};
use crate::error::BatchError;
use crate::rate_limit::{RateLimiter, TokenBucket, Unlimited};
use crate::report::{CompleteReport, PeriodReport, RunReport, UnitOutcome, UnitReport};

/// Days of history regenerated by [`BatchGenerator::generate_historical_and_upcoming`].
pub const HISTORY_DAYS: u64 = 7;

/// Days ahead generated by [`BatchGenerator::generate_historical_and_upcoming`].
pub const UPCOMING_DAYS: u64 = 3;

/// Call `generator` with a deadline. A timeout becomes [`GenerationError::Timeout`].
pub(crate) async fn generate_with_timeout(
    generator: &dyn ContentGenerator,
    request: GenerationRequest,
    limit: Duration,
) -> Result<HoroscopeSet, GenerationError> {
    match timeout(limit, generator.generate(request)).await {
        Ok(result) => result,
        Err(_elapsed) => Err(GenerationError::Timeout(limit)),
    }
}

/// Dates covered by a historical-and-upcoming run, oldest first.
pub fn historical_and_upcoming_dates(today: NaiveDate) -> Vec<NaiveDate> {
    let past = (1..=HISTORY_DAYS)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)));
    let upcoming = (1..=UPCOMING_DAYS).filter_map(|offset| today.checked_add_days(Days::new(offset)));
    past.chain(std::iter::once(today)).chain(upcoming).collect()
}

/// Coordinates full-matrix generation: every sign, for every locale, for
/// each period of a date.
///
/// Per unit (locale, period, key) the generator:
/// - skips the unit when the cache already has it (see [`GenerationMode`])
/// - claims the unit's lease, so a concurrent run backs off
/// - generates the signs one at a time, paced by the rate limiter and
///   bounded by the per-sign timeout; a failed sign is logged and left out
/// - saves whatever succeeded in one merge write
///
/// Failures never escape a unit; they are reported in [`UnitReport`].
pub struct BatchGenerator {
    generator: Arc<dyn ContentGenerator>,
    cache: HoroscopeCache,
    limiter: Arc<dyn RateLimiter>,
    clock: Arc<dyn Clock>,
    config: BatchConfig,
    holder: String,
}

impl BatchGenerator {
    /// Create a batch generator.
    ///
    /// Pacing comes from `config.pacing`: a one-token bucket refilled every
    /// `pacing`, or no limiter when it is zero.
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        cache: HoroscopeCache,
        config: BatchConfig,
    ) -> Self {
        let limiter: Arc<dyn RateLimiter> = if config.pacing.is_zero() {
            Arc::new(Unlimited)
        } else {
            Arc::new(TokenBucket::per_interval(config.pacing))
        };
        let holder = format!("batch-{}", Uuid::new_v4());

        info!(
            "BatchGenerator initialized with generator: {}, mode: {}, holder: {}",
            generator.name(),
            config.mode,
            holder
        );

        Self {
            generator,
            cache,
            limiter,
            clock: Arc::new(SystemClock),
            config,
            holder,
        }
    }

    /// Replace the rate limiter. Share one limiter between generators to
    /// hold a global call rate.
    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the identity written into lease claims.
    pub fn with_holder(mut self, holder: impl Into<String>) -> Self {
        self.holder = holder.into();
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn cache(&self) -> &HoroscopeCache {
        &self.cache
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Lease lifetime for a unit of `signs` generator calls.
    ///
    /// Never shorter than the worst case of every call hitting the timeout
    /// after waiting out the pacing, so the claim cannot lapse mid-unit.
    pub(crate) fn lease_ttl(&self, signs: usize) -> chrono::Duration {
        let per_sign = self.config.sign_timeout.saturating_add(self.config.pacing);
        let worst_case = u32::try_from(signs)
            .ok()
            .and_then(|signs| per_sign.checked_mul(signs))
            .unwrap_or(Duration::MAX);
        let ttl = self.config.lease_ttl.max(worst_case);
        chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX)
    }

    /// A claim identity unique to one unit attempt, so two runs sharing
    /// this generator still exclude each other.
    fn claim_token(&self) -> String {
        format!("{}-{}", self.holder, Uuid::new_v4())
    }

    /// Generate one period for `date` across `locales`, one locale at a time.
    pub async fn generate_for_period(
        &self,
        period: HoroscopePeriod,
        date: NaiveDate,
        locales: &[Locale],
    ) -> PeriodReport {
        let key = TimeBucketKey::derive(date, period);
        info!(
            "Generating {} horoscopes for {} ({} locales, mode: {})",
            period,
            key,
            locales.len(),
            self.config.mode
        );

        let mut units = Vec::with_capacity(locales.len());
        for &locale in locales {
            units.push(self.run_unit(period, &key, date, locale).await);
        }

        PeriodReport { period, key, units }
    }

    /// Generate daily, weekly and monthly content for `date` concurrently.
    pub async fn generate_complete(&self, date: NaiveDate, locales: &[Locale]) -> CompleteReport {
        info!("Generating complete horoscopes for {}", date);

        let (daily, weekly, monthly) = tokio::join!(
            self.generate_for_period(HoroscopePeriod::Daily, date, locales),
            self.generate_for_period(HoroscopePeriod::Weekly, date, locales),
            self.generate_for_period(HoroscopePeriod::Monthly, date, locales),
        );

        CompleteReport {
            date,
            daily,
            weekly,
            monthly,
        }
    }

    /// Generate complete content for today and the following `days - 1` days.
    pub async fn generate_for_next_days(&self, days: u32, locales: &[Locale]) -> RunReport {
        let today = self.clock.today();
        let dates = (0..u64::from(days)).filter_map(|offset| today.checked_add_days(Days::new(offset)));
        self.generate_dates(dates, locales).await
    }

    /// Generate complete content for the last week, today and the next three days.
    pub async fn generate_historical_and_upcoming(&self, locales: &[Locale]) -> RunReport {
        let dates = historical_and_upcoming_dates(self.clock.today());
        self.generate_dates(dates, locales).await
    }

    /// Generate complete content for tomorrow. The scheduled entry point.
    pub async fn generate_tomorrow(&self, locales: &[Locale]) -> CompleteReport {
        let today = self.clock.today();
        let tomorrow = today.succ_opt().unwrap_or(today);
        self.generate_complete(tomorrow, locales).await
    }

    /// Generate daily content for a `YYYY-MM-DD` date.
    pub async fn generate_daily_for(
        &self,
        date: &str,
        locales: &[Locale],
    ) -> Result<PeriodReport, BatchError> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| ParseError::InvalidDate(date.to_string()))?;
        Ok(self
            .generate_for_period(HoroscopePeriod::Daily, date, locales)
            .await)
    }

    /// Delete daily content older than the configured retention.
    pub async fn clean_old_daily(&self) -> Result<CleanupReport, BatchError> {
        let report = self
            .cache
            .clean_old_daily(self.clock.today(), self.config.retention_days)
            .await?;
        Ok(report)
    }

    async fn generate_dates(
        &self,
        dates: impl IntoIterator<Item = NaiveDate>,
        locales: &[Locale],
    ) -> RunReport {
        let mut report = RunReport::default();
        for date in dates {
            let day = self.generate_complete(date, locales).await;
            let summary = day.summary();
            info!(
                "Finished {}: {} persisted, {} skipped, {} busy, {} discarded, {} failed",
                date, summary.persisted, summary.skipped, summary.busy, summary.discarded, summary.failed
            );
            report.days.push(day);
        }
        report
    }

    /// Signs this unit still needs, or `None` when it should be skipped.
    async fn pending_signs(
        &self,
        period: HoroscopePeriod,
        key: &TimeBucketKey,
        locale: Locale,
    ) -> Result<Option<Vec<ZodiacSign>>, BatchError> {
        let signs = match self.config.mode {
            GenerationMode::SkipExisting => {
                if self.cache.exists(period, key, locale).await? {
                    return Ok(None);
                }
                ZodiacSign::ALL.to_vec()
            }
            GenerationMode::FillMissing => self.cache.missing_signs(period, key, locale).await?,
            GenerationMode::ForceRegenerate => ZodiacSign::ALL.to_vec(),
        };
        Ok(Some(signs).filter(|signs| !signs.is_empty()))
    }

    async fn run_unit(
        &self,
        period: HoroscopePeriod,
        key: &TimeBucketKey,
        date: NaiveDate,
        locale: Locale,
    ) -> UnitReport {
        let report = UnitReport::new(locale, period, key.clone());

        let pending = match self.pending_signs(period, key, locale).await {
            Ok(Some(signs)) => signs.len(),
            Ok(None) => {
                info!("{} {} [{}] already cached, skipping", period, key, locale);
                return report.finish(UnitOutcome::Skipped);
            }
            Err(e) => {
                error!("Cache check failed for {} {} [{}]: {}", period, key, locale, e);
                return report.finish(UnitOutcome::Failed(format!("cache check failed: {}", e)));
            }
        };

        let token = self.claim_token();
        let lease = match self
            .cache
            .try_claim(period, key, locale, &token, self.lease_ttl(pending), self.clock.now())
            .await
        {
            Ok(Some(lease)) => lease,
            Ok(None) => {
                info!("{} {} [{}] is being generated elsewhere", period, key, locale);
                return report.finish(UnitOutcome::Busy);
            }
            Err(e) => {
                error!("Lease claim failed for {} {} [{}]: {}", period, key, locale, e);
                return report.finish(UnitOutcome::Failed(format!("lease claim failed: {}", e)));
            }
        };

        // Re-check under the lease: the previous holder may have just saved this unit.
        let report = match self.pending_signs(period, key, locale).await {
            Ok(Some(signs)) => self.generate_unit(report, date, signs).await,
            Ok(None) => report.finish(UnitOutcome::Skipped),
            Err(e) => {
                error!("Cache check failed for {} {} [{}]: {}", period, key, locale, e);
                report.finish(UnitOutcome::Failed(format!("cache check failed: {}", e)))
            }
        };

        if let Err(e) = self.cache.release(&lease).await {
            warn!("Failed to release lease for {} {} [{}]: {}", period, key, locale, e);
        }

        report
    }

    async fn generate_unit(
        &self,
        mut report: UnitReport,
        date: NaiveDate,
        signs: Vec<ZodiacSign>,
    ) -> UnitReport {
        let (period, locale) = (report.period, report.locale);
        let mut results = SignMap::new();

        for sign in signs {
            match self.generate_sign(sign, locale, period, date).await {
                Ok(detail) => {
                    debug!("Generated {} {} [{}]", period, sign, locale);
                    results.insert(sign, detail);
                    report.succeeded.push(sign);
                }
                Err(e) => {
                    warn!("Generation failed for {} {} [{}]: {}", period, sign, locale, e);
                    report.failed.push(sign);
                }
            }
        }

        if results.is_empty() {
            warn!(
                "All signs failed for {} {} [{}], nothing saved",
                period, report.key, locale
            );
            return report.finish(UnitOutcome::Discarded);
        }

        let key = report.key.clone();
        match self.cache.save_batch(period, &key, locale, &results).await {
            Ok(()) => {
                info!(
                    "Saved {} {} [{}]: {} signs ({} failed)",
                    period,
                    key,
                    locale,
                    results.len(),
                    report.failed.len()
                );
                report.finish(UnitOutcome::Persisted {
                    signs: results.len(),
                })
            }
            Err(e) => {
                error!("Failed to save {} {} [{}]: {}", period, key, locale, e);
                report.finish(UnitOutcome::Failed(format!("save failed: {}", e)))
            }
        }
    }

    async fn generate_sign(
        &self,
        sign: ZodiacSign,
        locale: Locale,
        period: HoroscopePeriod,
        date: NaiveDate,
    ) -> Result<HoroscopeDetail, GenerationError> {
        self.limiter.acquire().await;

        let request = GenerationRequest::new(sign, locale).for_date(date);
        let set = generate_with_timeout(self.generator.as_ref(), request, self.config.sign_timeout)
            .await?;

        let detail = set.into_period(period);
        if !detail.is_complete() {
            return Err(GenerationError::InvalidResponse(format!(
                "empty {} content",
                period
            )));
        }
        Ok(detail)
    }
}

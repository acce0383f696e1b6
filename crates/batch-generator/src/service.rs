//! Read-through lookups for a single sign.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use horoscope_cache::HoroscopeCache;
use horoscope_core::{
    Clock, ContentGenerator, GenerationRequest, HoroscopeDetail,
    HoroscopePeriod, HoroscopeSet, Locale, PersonalizationProfile, SignMap, SystemClock,
    TimeBucketKey, ZodiacSign,
};
use tracing::{debug, error, info, warn};

use crate::config::DEFAULT_SIGN_TIMEOUT;
use crate::error::BatchError;
use crate::generator::generate_with_timeout;

/// Serves one sign's horoscopes from the cache, generating and saving
/// whatever is missing.
#[derive(Clone)]
pub struct HoroscopeService {
    generator: Arc<dyn ContentGenerator>,
    cache: HoroscopeCache,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl HoroscopeService {
    pub fn new(generator: Arc<dyn ContentGenerator>, cache: HoroscopeCache) -> Self {
        Self {
            generator,
            cache,
            clock: Arc::new(SystemClock),
            timeout: DEFAULT_SIGN_TIMEOUT,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Deadline for a generator call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Daily, weekly and monthly content for `sign` on `date` (today when `None`).
    ///
    /// When all three are cached no generator call is made. Otherwise the
    /// generator runs once and only the missing periods are saved; save
    /// failures are logged and do not fail the lookup.
    pub async fn get_horoscope(
        &self,
        sign: ZodiacSign,
        locale: Locale,
        date: Option<NaiveDate>,
    ) -> Result<HoroscopeSet, BatchError> {
        let date = date.unwrap_or_else(|| self.clock.today());
        let keys = HoroscopePeriod::ALL.map(|period| (period, TimeBucketKey::derive(date, period)));
        let [(_, daily_key), (_, weekly_key), (_, monthly_key)] = &keys;

        let cached = tokio::try_join!(
            self.cache.load_for_sign(HoroscopePeriod::Daily, daily_key, locale, sign),
            self.cache.load_for_sign(HoroscopePeriod::Weekly, weekly_key, locale, sign),
            self.cache.load_for_sign(HoroscopePeriod::Monthly, monthly_key, locale, sign),
        )?;

        let missing: Vec<HoroscopePeriod> = match cached {
            (Some(daily), Some(weekly), Some(monthly)) => {
                debug!("Serving cached horoscopes for {} [{}] on {}", sign, locale, date);
                return Ok(HoroscopeSet {
                    daily,
                    weekly,
                    monthly,
                });
            }
            (daily, weekly, monthly) => [daily.is_none(), weekly.is_none(), monthly.is_none()]
                .into_iter()
                .zip(HoroscopePeriod::ALL)
                .filter_map(|(is_missing, period)| is_missing.then_some(period))
                .collect(),
        };

        info!(
            "Generating horoscopes for {} [{}] on {} (missing: {:?})",
            sign, locale, date, missing
        );
        let request = GenerationRequest::new(sign, locale).for_date(date);
        let generated = generate_with_timeout(self.generator.as_ref(), request, self.timeout).await?;

        let saves = keys
            .iter()
            .filter(|(period, _)| missing.contains(period))
            .map(|(period, key)| self.save_one(*period, key, locale, sign, generated.get(*period)));
        futures::future::join_all(saves).await;

        Ok(generated)
    }

    /// The user's personalized daily content for `sign`, generating it on a miss.
    pub async fn get_personalized(
        &self,
        user_id: &str,
        sign: ZodiacSign,
        locale: Locale,
        date: Option<NaiveDate>,
        profile: &PersonalizationProfile,
    ) -> Result<HoroscopeDetail, BatchError> {
        let date = date.unwrap_or_else(|| self.clock.today());
        let key = TimeBucketKey::daily(date);

        if let Some(detail) = self
            .cache
            .load_personalized_for_sign(user_id, HoroscopePeriod::Daily, &key, sign)
            .await?
        {
            debug!("Serving cached personalized horoscope for {} ({})", user_id, sign);
            return Ok(detail);
        }

        info!("Generating personalized horoscope for {} ({}) on {}", user_id, sign, date);
        let request = GenerationRequest::new(sign, locale)
            .for_date(date)
            .personalized(profile.clone());
        let daily = generate_with_timeout(self.generator.as_ref(), request, self.timeout)
            .await?
            .into_period(HoroscopePeriod::Daily);

        if daily.is_complete() {
            let signs = SignMap::from([(sign, daily.clone())]);
            if let Err(e) = self
                .cache
                .save_personalized(user_id, HoroscopePeriod::Daily, &key, &signs, profile)
                .await
            {
                error!("Failed to save personalized horoscope for {}: {}", user_id, e);
            }
        }

        Ok(daily)
    }

    async fn save_one(
        &self,
        period: HoroscopePeriod,
        key: &TimeBucketKey,
        locale: Locale,
        sign: ZodiacSign,
        detail: &HoroscopeDetail,
    ) {
        if !detail.is_complete() {
            warn!(
                "Not saving incomplete {} horoscope for {} [{}]",
                period, sign, locale
            );
            return;
        }

        let signs = SignMap::from([(sign, detail.clone())]);
        if let Err(e) = self.cache.save_batch(period, key, locale, &signs).await {
            error!("Failed to save {} {} [{}]: {}", period, key, locale, e);
        }
    }
}

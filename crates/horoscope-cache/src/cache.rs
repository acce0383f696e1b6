//! The cache service.

use std::sync::Arc;

use chrono::{DateTime, Days, Duration, NaiveDate, Utc};
use database::{DocPath, Document, DocumentStore};
use horoscope_core::{
    Clock, HoroscopeDetail, HoroscopePeriod, Locale, PersonalizationProfile, SignMap,
    SystemClock, TimeBucketKey, ZodiacSign,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cleanup::CleanupReport;
use crate::document::{self, PersonalizedEntry, StoredEntry};
use crate::error::Result;
use crate::lease::{Lease, LeaseRecord};
use crate::paths;

/// Default number of days of daily content kept by [`HoroscopeCache::clean_old_daily`].
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

/// Persistence boundary for generated horoscope content.
///
/// Store errors are returned to the caller unchanged, except during
/// [`delete_older_than`](Self::delete_older_than) where per-document failures
/// are collected into the report.
#[derive(Clone)]
pub struct HoroscopeCache {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl HoroscopeCache {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use `clock` for `generatedAt` timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Whether a document exists for the unit. Read-only.
    pub async fn exists(
        &self,
        period: HoroscopePeriod,
        key: &TimeBucketKey,
        locale: Locale,
    ) -> Result<bool> {
        let path = paths::unit(period, key, locale)?;
        Ok(self.store.exists(&path).await?)
    }

    /// Merge `signs` into the unit document.
    ///
    /// Signs not in `signs` keep their stored entries; signs in `signs`
    /// replace them. An empty map writes nothing.
    pub async fn save_batch(
        &self,
        period: HoroscopePeriod,
        key: &TimeBucketKey,
        locale: Locale,
        signs: &SignMap,
    ) -> Result<()> {
        if signs.is_empty() {
            debug!(%period, %key, %locale, "Empty batch, nothing to save");
            return Ok(());
        }

        let path = paths::unit(period, key, locale)?;
        let generated_at = self.clock.now();
        let doc = document::encode(signs.iter().map(|(sign, detail)| {
            (*sign, StoredEntry::new(*sign, detail.clone(), generated_at))
        }))?;

        self.store.merge(&path, doc).await?;
        info!(path = %path, signs = signs.len(), "Saved horoscope batch");
        Ok(())
    }

    /// Read the unit's sign map, or `None` when no document exists.
    pub async fn load(
        &self,
        period: HoroscopePeriod,
        key: &TimeBucketKey,
        locale: Locale,
    ) -> Result<Option<SignMap>> {
        let path = paths::unit(period, key, locale)?;
        let doc = self.store.get(&path).await?;
        Ok(doc.map(|doc| document::decode_sign_map(&path, doc)))
    }

    pub async fn load_for_sign(
        &self,
        period: HoroscopePeriod,
        key: &TimeBucketKey,
        locale: Locale,
        sign: ZodiacSign,
    ) -> Result<Option<HoroscopeDetail>> {
        let map = self.load(period, key, locale).await?;
        Ok(map.and_then(|mut map| map.remove(&sign)))
    }

    /// Signs with no stored entry for the unit, in sign order.
    pub async fn missing_signs(
        &self,
        period: HoroscopePeriod,
        key: &TimeBucketKey,
        locale: Locale,
    ) -> Result<Vec<ZodiacSign>> {
        let stored = self.load(period, key, locale).await?.unwrap_or_default();
        Ok(ZodiacSign::ALL
            .into_iter()
            .filter(|sign| !stored.contains_key(sign))
            .collect())
    }

    /// Merge personalized entries into a user's document for (period, key).
    pub async fn save_personalized(
        &self,
        user_id: &str,
        period: HoroscopePeriod,
        key: &TimeBucketKey,
        signs: &SignMap,
        profile: &PersonalizationProfile,
    ) -> Result<()> {
        if signs.is_empty() {
            return Ok(());
        }

        let path = paths::personalized(user_id, period, key)?;
        let generated_at = self.clock.now();
        let doc = document::encode(signs.iter().map(|(sign, detail)| {
            let entry = PersonalizedEntry {
                entry: StoredEntry::new(*sign, detail.clone(), generated_at),
                user_id: user_id.to_string(),
                personalization_data: profile.clone(),
                period,
            };
            (*sign, entry)
        }))?;

        self.store.merge(&path, doc).await?;
        info!(path = %path, signs = signs.len(), "Saved personalized horoscope");
        Ok(())
    }

    pub async fn load_personalized(
        &self,
        user_id: &str,
        period: HoroscopePeriod,
        key: &TimeBucketKey,
    ) -> Result<Option<SignMap>> {
        let path = paths::personalized(user_id, period, key)?;
        let doc = self.store.get(&path).await?;
        Ok(doc.map(|doc| document::decode_personalized_map(&path, doc)))
    }

    pub async fn load_personalized_for_sign(
        &self,
        user_id: &str,
        period: HoroscopePeriod,
        key: &TimeBucketKey,
        sign: ZodiacSign,
    ) -> Result<Option<HoroscopeDetail>> {
        let map = self.load_personalized(user_id, period, key).await?;
        Ok(map.and_then(|mut map| map.remove(&sign)))
    }

    /// Delete every locale document of `period` whose key sorts before `cutoff`.
    ///
    /// Failing to list the period's keys is an error. Anything after that is
    /// recorded in the report and the sweep moves on.
    /// Segments that are not valid keys for `period` are left alone.
    pub async fn delete_older_than(
        &self,
        period: HoroscopePeriod,
        cutoff: &TimeBucketKey,
    ) -> Result<CleanupReport> {
        let root = paths::period_root(period)?;
        let keys = self.store.list_children(&root).await?;

        let mut report = CleanupReport::default();
        for key in keys {
            let key = match TimeBucketKey::parse(period, &key) {
                Ok(key) => key,
                Err(e) => {
                    warn!(path = %root, "Ignoring unexpected key segment: {}", e);
                    continue;
                }
            };
            if key >= *cutoff {
                continue;
            }

            let key_root = match root.child(key.as_str()) {
                Ok(path) => path,
                Err(e) => {
                    report.record_failure(format!("{}/{}", root, key), e);
                    continue;
                }
            };

            let locales = match self.store.list_children(&key_root).await {
                Ok(locales) => locales,
                Err(e) => {
                    warn!(path = %key_root, "Failed to list documents: {}", e);
                    report.record_failure(key_root.to_string(), e);
                    continue;
                }
            };

            for locale in locales {
                self.delete_one(&key_root, &locale, &mut report).await;
            }
        }

        info!(
            %period,
            %cutoff,
            cleaned = report.cleaned,
            errors = report.errors.len(),
            "Cleanup sweep finished"
        );
        Ok(report)
    }

    async fn delete_one(&self, key_root: &DocPath, segment: &str, report: &mut CleanupReport) {
        let path = match key_root.child(segment) {
            Ok(path) => path,
            Err(e) => {
                report.record_failure(format!("{}/{}", key_root, segment), e);
                return;
            }
        };

        match self.store.delete(&path).await {
            Ok(true) => {
                debug!(path = %path, "Deleted old horoscope document");
                report.cleaned += 1;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(path = %path, "Failed to delete document: {}", e);
                report.record_failure(path.to_string(), e);
            }
        }
    }

    /// Drop daily content older than `retention_days` before `today`.
    ///
    /// A retention reaching past the earliest representable date keeps everything.
    pub async fn clean_old_daily(&self, today: NaiveDate, retention_days: u32) -> Result<CleanupReport> {
        let cutoff_date = today
            .checked_sub_days(Days::new(u64::from(retention_days)))
            .unwrap_or(NaiveDate::MIN);
        let cutoff = TimeBucketKey::daily(cutoff_date);
        self.delete_older_than(HoroscopePeriod::Daily, &cutoff).await
    }

    /// Claim the unit for `holder` until `now + ttl`.
    ///
    /// Returns `None` when a different holder owns a live claim. An expired
    /// or unreadable claim is taken over; a holder may renew its own claim.
    pub async fn try_claim(
        &self,
        period: HoroscopePeriod,
        key: &TimeBucketKey,
        locale: Locale,
        holder: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<Lease>> {
        let path = paths::lease(period, key, locale)?;
        let record = LeaseRecord {
            holder: holder.to_string(),
            claimed_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        let claim = to_document(&record)?;

        let claimed = match self.store.get(&path).await? {
            None => self.store.compare_and_set(&path, None, claim).await?,
            Some(existing) => {
                match serde_json::from_value::<LeaseRecord>(existing.clone().into()) {
                    Ok(held) if held.is_live(now) && held.holder != holder => {
                        debug!(path = %path, holder = %held.holder, "Unit is claimed elsewhere");
                        return Ok(None);
                    }
                    Ok(_) => {}
                    Err(e) => warn!(path = %path, "Replacing unreadable lease: {}", e),
                }
                self.store
                    .compare_and_set(&path, Some(&existing), claim)
                    .await?
            }
        };

        if !claimed {
            debug!(path = %path, "Lost lease race");
            return Ok(None);
        }

        Ok(Some(Lease {
            period,
            key: key.clone(),
            locale,
            record,
        }))
    }

    /// Give up a claim. Only deletes it while `lease`'s holder still owns it.
    pub async fn release(&self, lease: &Lease) -> Result<bool> {
        let path = paths::lease(lease.period, &lease.key, lease.locale)?;
        let Some(existing) = self.store.get(&path).await? else {
            return Ok(false);
        };

        match serde_json::from_value::<LeaseRecord>(existing.into()) {
            Ok(held) if held.holder == lease.holder() => Ok(self.store.delete(&path).await?),
            Ok(held) => {
                debug!(path = %path, holder = %held.holder, "Lease now owned by another holder");
                Ok(false)
            }
            Err(e) => {
                warn!(path = %path, "Leaving unreadable lease in place: {}", e);
                Ok(false)
            }
        }
    }
}

fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    Ok(serde_json::from_value(serde_json::to_value(value)?)?)
}

//! Short-lived claims that keep concurrent runs off the same unit.

use chrono::{DateTime, Utc};
use horoscope_core::{HoroscopePeriod, Locale, TimeBucketKey};
use serde::{Deserialize, Serialize};

/// Stored form of a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseRecord {
    pub holder: String,
    pub claimed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl LeaseRecord {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// A claim held on one (period, key, locale) unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    pub period: HoroscopePeriod,
    pub key: TimeBucketKey,
    pub locale: Locale,
    pub record: LeaseRecord,
}

impl Lease {
    pub fn holder(&self) -> &str {
        &self.record.holder
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.record.expires_at
    }
}

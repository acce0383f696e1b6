//! Document path layout.
//!
//! ```text
//! horoscopes/{period}/{key}/{locale}
//! horoscopes/personalized/{userId}/{period}/{key}
//! horoscopes/leases/{period}/{key}/{locale}
//! ```

use database::DocPath;
use horoscope_core::{HoroscopePeriod, Locale, TimeBucketKey};

use crate::error::Result;

pub const ROOT: &str = "horoscopes";
pub const PERSONALIZED: &str = "personalized";
pub const LEASES: &str = "leases";

/// `horoscopes/{period}`, the parent of every key for a period.
pub fn period_root(period: HoroscopePeriod) -> Result<DocPath> {
    Ok(DocPath::new([ROOT, period.as_str()])?)
}

/// `horoscopes/{period}/{key}`, the parent of every locale document of a key.
pub fn key_root(period: HoroscopePeriod, key: &TimeBucketKey) -> Result<DocPath> {
    Ok(period_root(period)?.child(key.as_str())?)
}

/// Shared document for one (period, key, locale) unit.
pub fn unit(period: HoroscopePeriod, key: &TimeBucketKey, locale: Locale) -> Result<DocPath> {
    Ok(key_root(period, key)?.child(locale.code())?)
}

/// A user's personalized document for one (period, key).
///
/// Fails when `user_id` is not a valid path segment.
pub fn personalized(user_id: &str, period: HoroscopePeriod, key: &TimeBucketKey) -> Result<DocPath> {
    Ok(DocPath::new([
        ROOT,
        PERSONALIZED,
        user_id,
        period.as_str(),
        key.as_str(),
    ])?)
}

/// Lease claim document guarding one unit.
pub fn lease(period: HoroscopePeriod, key: &TimeBucketKey, locale: Locale) -> Result<DocPath> {
    Ok(DocPath::new([
        ROOT,
        LEASES,
        period.as_str(),
        key.as_str(),
        locale.code(),
    ])?)
}

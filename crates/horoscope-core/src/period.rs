//! Horoscope periods and time-bucket keys.
//!
//! A [`TimeBucketKey`] names the time window a period covers:
//!
//! | Period    | Shape        | Example      |
//! |-----------|--------------|--------------|
//! | `daily`   | `YYYY-MM-DD` | `2024-03-15` |
//! | `weekly`  | `YYYY-WW`    | `2024-11`    |
//! | `monthly` | `YYYY-MM`    | `2024-03`    |
//!
//! Weekly keys use the ISO-8601 week-based year, so Dec 31 and Jan 1 can
//! share a key. Daily keys sort lexicographically by date.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Temporal granularity of a horoscope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoroscopePeriod {
    Daily,
    Weekly,
    Monthly,
}

impl HoroscopePeriod {
    pub const ALL: [HoroscopePeriod; 3] = [
        HoroscopePeriod::Daily,
        HoroscopePeriod::Weekly,
        HoroscopePeriod::Monthly,
    ];

    /// Path segment and serialized name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HoroscopePeriod::Daily => "daily",
            HoroscopePeriod::Weekly => "weekly",
            HoroscopePeriod::Monthly => "monthly",
        }
    }
}

impl fmt::Display for HoroscopePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HoroscopePeriod {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(HoroscopePeriod::Daily),
            "weekly" => Ok(HoroscopePeriod::Weekly),
            "monthly" => Ok(HoroscopePeriod::Monthly),
            _ => Err(ParseError::UnknownPeriod(s.to_string())),
        }
    }
}

/// String identity of a period's time window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeBucketKey(String);

impl TimeBucketKey {
    /// Derive the key of `date` for `period`. Pure.
    pub fn derive(date: NaiveDate, period: HoroscopePeriod) -> Self {
        match period {
            HoroscopePeriod::Daily => Self::daily(date),
            HoroscopePeriod::Weekly => Self::weekly(date),
            HoroscopePeriod::Monthly => Self::monthly(date),
        }
    }

    /// `YYYY-MM-DD`.
    pub fn daily(date: NaiveDate) -> Self {
        Self(date.format("%Y-%m-%d").to_string())
    }

    /// `YYYY-WW`, ISO week-based year and zero-padded ISO week.
    pub fn weekly(date: NaiveDate) -> Self {
        let week = date.iso_week();
        Self(format!("{:04}-{:02}", week.year(), week.week()))
    }

    /// `YYYY-MM`.
    pub fn monthly(date: NaiveDate) -> Self {
        Self(format!("{:04}-{:02}", date.year(), date.month()))
    }

    /// Parse and validate an existing key for `period`.
    pub fn parse(period: HoroscopePeriod, key: &str) -> Result<Self, ParseError> {
        let invalid = || ParseError::InvalidBucketKey {
            period: period.as_str(),
            key: key.to_string(),
        };

        let valid = match period {
            HoroscopePeriod::Daily => NaiveDate::parse_from_str(key, "%Y-%m-%d")
                .map(|date| Self::daily(date).0 == key)
                .unwrap_or(false),
            HoroscopePeriod::Weekly => split_year_number(key)
                .map(|(year, week)| {
                    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).is_some()
                })
                .unwrap_or(false),
            HoroscopePeriod::Monthly => split_year_number(key)
                .map(|(_, month)| (1..=12).contains(&month))
                .unwrap_or(false),
        };

        if valid {
            Ok(Self(key.to_string()))
        } else {
            Err(invalid())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimeBucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TimeBucketKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Split `YYYY-NN` into its numeric parts.
fn split_year_number(key: &str) -> Option<(i32, u32)> {
    let (year, number) = key.split_once('-')?;
    if year.len() != 4 || number.len() != 2 {
        return None;
    }
    if !year.bytes().chain(number.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((year.parse().ok()?, number.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_keys_for_reference_date() {
        let d = date(2024, 3, 15);
        assert_eq!(TimeBucketKey::derive(d, HoroscopePeriod::Daily).as_str(), "2024-03-15");
        assert_eq!(TimeBucketKey::derive(d, HoroscopePeriod::Weekly).as_str(), "2024-11");
        assert_eq!(TimeBucketKey::derive(d, HoroscopePeriod::Monthly).as_str(), "2024-03");
    }

    #[test]
    fn test_weekly_key_stable_within_iso_week() {
        // Monday 2024-03-11 through Sunday 2024-03-17 is ISO week 11.
        let keys: Vec<_> = (11..=17)
            .map(|d| TimeBucketKey::weekly(date(2024, 3, d)))
            .collect();
        assert!(keys.iter().all(|k| k.as_str() == "2024-11"));

        assert_eq!(TimeBucketKey::weekly(date(2024, 3, 18)).as_str(), "2024-12");
        assert_eq!(TimeBucketKey::weekly(date(2024, 3, 10)).as_str(), "2024-10");
    }

    #[test]
    fn test_weekly_key_year_boundaries() {
        // 2024-12-31 and 2025-01-01 both fall in ISO week 1 of 2025.
        assert_eq!(TimeBucketKey::weekly(date(2024, 12, 31)).as_str(), "2025-01");
        assert_eq!(TimeBucketKey::weekly(date(2025, 1, 1)).as_str(), "2025-01");
        assert_eq!(TimeBucketKey::weekly(date(2024, 12, 29)).as_str(), "2024-52");

        // 2021-01-03 still belongs to 2020's week 53.
        assert_eq!(TimeBucketKey::weekly(date(2020, 12, 31)).as_str(), "2020-53");
        assert_eq!(TimeBucketKey::weekly(date(2021, 1, 3)).as_str(), "2020-53");
        assert_eq!(TimeBucketKey::weekly(date(2021, 1, 4)).as_str(), "2021-01");
    }

    #[test]
    fn test_daily_keys_sort_by_date() {
        let earlier = TimeBucketKey::daily(date(2024, 9, 30));
        let later = TimeBucketKey::daily(date(2024, 10, 1));
        assert!(earlier < later);
        assert!(earlier.as_str() < later.as_str());
    }

    #[test]
    fn test_parse_validates_shape() {
        assert!(TimeBucketKey::parse(HoroscopePeriod::Daily, "2024-02-29").is_ok());
        assert!(TimeBucketKey::parse(HoroscopePeriod::Daily, "2023-02-29").is_err());
        assert!(TimeBucketKey::parse(HoroscopePeriod::Daily, "2024-3-1").is_err());

        assert!(TimeBucketKey::parse(HoroscopePeriod::Weekly, "2020-53").is_ok());
        assert!(TimeBucketKey::parse(HoroscopePeriod::Weekly, "2021-53").is_err());
        assert!(TimeBucketKey::parse(HoroscopePeriod::Weekly, "2024-00").is_err());

        assert!(TimeBucketKey::parse(HoroscopePeriod::Monthly, "2024-12").is_ok());
        assert!(TimeBucketKey::parse(HoroscopePeriod::Monthly, "2024-13").is_err());
        assert!(TimeBucketKey::parse(HoroscopePeriod::Monthly, "24-01").is_err());
    }

    #[test]
    fn test_period_round_trip_names() {
        for period in HoroscopePeriod::ALL {
            assert_eq!(period.as_str().parse::<HoroscopePeriod>().unwrap(), period);
        }
        assert!("yearly".parse::<HoroscopePeriod>().is_err());
    }
}

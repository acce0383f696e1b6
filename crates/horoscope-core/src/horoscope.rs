//! Generated content types and generation requests.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::period::HoroscopePeriod;
use crate::zodiac::{Locale, ZodiacSign};

/// Per-sign content for one (period, key, locale) unit, in sign order.
pub type SignMap = BTreeMap<ZodiacSign, HoroscopeDetail>;

/// Generated content for one sign and one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoroscopeDetail {
    pub main: String,
    pub love: String,
    pub money: String,
    pub health: String,
}

impl HoroscopeDetail {
    pub fn new(
        main: impl Into<String>,
        love: impl Into<String>,
        money: impl Into<String>,
        health: impl Into<String>,
    ) -> Self {
        Self {
            main: main.into(),
            love: love.into(),
            money: money.into(),
            health: health.into(),
        }
    }

    /// True when every section carries non-blank text.
    pub fn is_complete(&self) -> bool {
        [&self.main, &self.love, &self.money, &self.health]
            .iter()
            .all(|text| !text.trim().is_empty())
    }
}

/// The three periods a single generation call produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoroscopeSet {
    pub daily: HoroscopeDetail,
    pub weekly: HoroscopeDetail,
    pub monthly: HoroscopeDetail,
}

impl HoroscopeSet {
    /// A set with the same detail for every period.
    pub fn uniform(detail: HoroscopeDetail) -> Self {
        Self {
            daily: detail.clone(),
            weekly: detail.clone(),
            monthly: detail,
        }
    }

    /// The detail for `period`.
    pub fn get(&self, period: HoroscopePeriod) -> &HoroscopeDetail {
        match period {
            HoroscopePeriod::Daily => &self.daily,
            HoroscopePeriod::Weekly => &self.weekly,
            HoroscopePeriod::Monthly => &self.monthly,
        }
    }

    /// Take the detail for `period`, dropping the others.
    pub fn into_period(self, period: HoroscopePeriod) -> HoroscopeDetail {
        match period {
            HoroscopePeriod::Daily => self.daily,
            HoroscopePeriod::Weekly => self.weekly,
            HoroscopePeriod::Monthly => self.monthly,
        }
    }
}

/// Optional user attributes used to personalize generated content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizationProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employment_status: Option<String>,
}

impl PersonalizationProfile {
    /// A profile only personalizes content when it carries a name.
    pub fn is_personalized(&self) -> bool {
        self.name
            .as_deref()
            .map(|name| !name.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Input to a [`ContentGenerator`](crate::ContentGenerator) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub sign: ZodiacSign,
    pub locale: Locale,
    /// Date the content is for; generators default to today when absent.
    pub target_date: Option<NaiveDate>,
    pub personalization: Option<PersonalizationProfile>,
}

impl GenerationRequest {
    /// A general (non-personalized) request without a target date.
    pub fn new(sign: ZodiacSign, locale: Locale) -> Self {
        Self {
            sign,
            locale,
            target_date: None,
            personalization: None,
        }
    }

    pub fn for_date(mut self, date: NaiveDate) -> Self {
        self.target_date = Some(date);
        self
    }

    pub fn personalized(mut self, profile: PersonalizationProfile) -> Self {
        self.personalization = Some(profile);
        self
    }

    /// The profile, if it actually personalizes the request.
    pub fn active_profile(&self) -> Option<&PersonalizationProfile> {
        self.personalization
            .as_ref()
            .filter(|profile| profile.is_personalized())
    }
}

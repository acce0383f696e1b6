//! Stored document shapes.
//!
//! A unit document maps lowercase sign keys to entries:
//!
//! ```json
//! {
//!   "aries": {
//!     "main": "...", "love": "...", "money": "...", "health": "...",
//!     "generatedAt": "2024-03-15T06:00:00Z",
//!     "sign": "Aries"
//!   }
//! }
//! ```
//!
//! Personalized entries additionally carry `userId`, `personalizationData`
//! and `period`.

use chrono::{DateTime, Utc};
use database::{DocPath, Document};
use horoscope_core::{
    HoroscopeDetail, HoroscopePeriod, PersonalizationProfile, SignMap, ZodiacSign,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::Result;

/// One sign's entry in a shared unit document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEntry {
    #[serde(flatten)]
    pub detail: HoroscopeDetail,
    pub generated_at: DateTime<Utc>,
    pub sign: ZodiacSign,
}

/// One sign's entry in a user's personalized document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizedEntry {
    #[serde(flatten)]
    pub entry: StoredEntry,
    pub user_id: String,
    pub personalization_data: PersonalizationProfile,
    pub period: HoroscopePeriod,
}

impl StoredEntry {
    pub fn new(sign: ZodiacSign, detail: HoroscopeDetail, generated_at: DateTime<Utc>) -> Self {
        Self {
            detail,
            generated_at,
            sign,
        }
    }
}

/// Encode per-sign entries into a document keyed by [`ZodiacSign::key`].
pub fn encode<T: Serialize>(entries: impl IntoIterator<Item = (ZodiacSign, T)>) -> Result<Document> {
    let mut doc = Document::new();
    for (sign, entry) in entries {
        doc.insert(sign.key().to_string(), serde_json::to_value(entry)?);
    }
    Ok(doc)
}

/// Decode per-sign entries, skipping keys or entries that do not decode.
pub fn decode<T: DeserializeOwned>(path: &DocPath, doc: Document) -> BTreeMap<ZodiacSign, T> {
    let mut entries = BTreeMap::new();
    for (key, value) in doc {
        let sign = match key.parse::<ZodiacSign>() {
            Ok(sign) => sign,
            Err(e) => {
                warn!(path = %path, key = %key, "Skipping unknown sign entry: {}", e);
                continue;
            }
        };
        match serde_json::from_value::<T>(value) {
            Ok(entry) => {
                entries.insert(sign, entry);
            }
            Err(e) => {
                warn!(path = %path, sign = %sign, "Skipping undecodable entry: {}", e);
            }
        }
    }
    entries
}

/// Decode a unit document into its sign map.
pub fn decode_sign_map(path: &DocPath, doc: Document) -> SignMap {
    decode::<StoredEntry>(path, doc)
        .into_iter()
        .map(|(sign, entry)| (sign, entry.detail))
        .collect()
}

/// Decode a personalized document into its sign map.
pub fn decode_personalized_map(path: &DocPath, doc: Document) -> SignMap {
    decode::<PersonalizedEntry>(path, doc)
        .into_iter()
        .map(|(sign, entry)| (sign, entry.entry.detail))
        .collect()
}

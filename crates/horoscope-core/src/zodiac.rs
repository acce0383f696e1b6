//! Zodiac signs and supported locales.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// One of the twelve western zodiac signs.
///
/// The declaration order is the generation order used by the batch
/// generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    /// All signs in generation order.
    pub const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    /// Display name, e.g. `"Aries"`.
    pub fn name(&self) -> &'static str {
        match self {
            ZodiacSign::Aries => "Aries",
            ZodiacSign::Taurus => "Taurus",
            ZodiacSign::Gemini => "Gemini",
            ZodiacSign::Cancer => "Cancer",
            ZodiacSign::Leo => "Leo",
            ZodiacSign::Virgo => "Virgo",
            ZodiacSign::Libra => "Libra",
            ZodiacSign::Scorpio => "Scorpio",
            ZodiacSign::Sagittarius => "Sagittarius",
            ZodiacSign::Capricorn => "Capricorn",
            ZodiacSign::Aquarius => "Aquarius",
            ZodiacSign::Pisces => "Pisces",
        }
    }

    /// Lowercase storage key used inside persisted documents, e.g. `"aries"`.
    pub fn key(&self) -> &'static str {
        match self {
            ZodiacSign::Aries => "aries",
            ZodiacSign::Taurus => "taurus",
            ZodiacSign::Gemini => "gemini",
            ZodiacSign::Cancer => "cancer",
            ZodiacSign::Leo => "leo",
            ZodiacSign::Virgo => "virgo",
            ZodiacSign::Libra => "libra",
            ZodiacSign::Scorpio => "scorpio",
            ZodiacSign::Sagittarius => "sagittarius",
            ZodiacSign::Capricorn => "capricorn",
            ZodiacSign::Aquarius => "aquarius",
            ZodiacSign::Pisces => "pisces",
        }
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ZodiacSign {
    type Err = ParseError;

    /// Case-insensitive: `"aries"`, `"Aries"` and `"ARIES"` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        ZodiacSign::ALL
            .into_iter()
            .find(|sign| sign.key().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseError::UnknownSign(s.to_string()))
    }
}

/// A supported output language.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Es,
    En,
    De,
    Fr,
}

impl Locale {
    /// All supported locales, default first.
    pub const ALL: [Locale; 4] = [Locale::Es, Locale::En, Locale::De, Locale::Fr];

    /// Two-letter language code.
    pub fn code(&self) -> &'static str {
        match self {
            Locale::Es => "es",
            Locale::En => "en",
            Locale::De => "de",
            Locale::Fr => "fr",
        }
    }

    /// English name of the language, used in prompts.
    pub fn language_name(&self) -> &'static str {
        match self {
            Locale::Es => "Spanish",
            Locale::En => "English",
            Locale::De => "German",
            Locale::Fr => "French",
        }
    }

    /// Parse a comma-separated locale list such as `"es,en"`.
    ///
    /// Empty entries are ignored; an empty input yields an empty list.
    pub fn parse_list(input: &str) -> Result<Vec<Locale>, ParseError> {
        let mut locales = Vec::new();
        for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let locale = part.parse()?;
            if !locales.contains(&locale) {
                locales.push(locale);
            }
        }
        Ok(locales)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "es" => Ok(Locale::Es),
            "en" => Ok(Locale::En),
            "de" => Ok(Locale::De),
            "fr" => Ok(Locale::Fr),
            _ => Err(ParseError::UnknownLocale(s.to_string())),
        }
    }
}

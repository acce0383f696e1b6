//! Prompt construction.

use chrono::{Duration, NaiveDate};
use horoscope_core::{HoroscopePeriod, Locale, PersonalizationProfile, ZodiacSign};

/// System prompt shared by every period.
pub const SYSTEM_PROMPT: &str = "You are an expert, empathetic and insightful astrologer. \
You always answer with a single valid JSON object with exactly the keys \"main\", \"love\", \
\"money\" and \"health\". Every value is a complete prediction of at least 30 words. \
Never use markdown and never add other keys.";

/// Themes that anchor daily predictions, picked per (date, sign).
pub const DAILY_THEMES: [&str; 15] = [
    "a burst of creative energy and self-expression",
    "an unexpected communication challenge that calls for patience",
    "a chance for deep introspection and much-needed rest",
    "a surprising social encounter that could open new doors",
    "a renewed focus on finances and material security",
    "a need to set clear boundaries in personal relationships",
    "a moment of clarity about an old doubt or lingering problem",
    "an ideal day for adventure, spontaneity and breaking routine",
    "a deep emotional connection with someone close",
    "a professional obstacle that rewards strategy over impulse",
    "a revelation about health and physical and mental well-being",
    "an invitation to learn something new or follow an intellectual interest",
    "a day of harmony at home and in family relationships",
    "a conflict between responsibility and the wish for freedom",
    "unexpected news that could change your plans",
];

/// Theme for `sign` on `date`.
///
/// Uses the 31-multiplier string hash over UTF-16 code units of
/// `"{YYYY-MM-DD}-{Sign}"`, so the same pair always gets the same theme.
pub fn daily_theme(date: NaiveDate, sign: ZodiacSign) -> &'static str {
    let seed = format!("{}-{}", date.format("%Y-%m-%d"), sign.name());
    let hash = seed.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    });
    DAILY_THEMES[hash.unsigned_abs() as usize % DAILY_THEMES.len()]
}

/// How the target date is referred to in the daily prompt.
pub fn date_descriptor(target: NaiveDate, today: NaiveDate) -> String {
    if target == today {
        "today".to_string()
    } else if target == today - Duration::days(1) {
        "yesterday".to_string()
    } else {
        format!("on {}", target.format("%Y-%m-%d"))
    }
}

/// Everything a prompt is built from.
#[derive(Debug, Clone)]
pub struct PromptContext<'a> {
    pub sign: ZodiacSign,
    pub locale: Locale,
    pub target_date: NaiveDate,
    pub today: NaiveDate,
    pub profile: Option<&'a PersonalizationProfile>,
}

impl PromptContext<'_> {
    /// The user prompt for `period`.
    pub fn build(&self, period: HoroscopePeriod) -> String {
        let sign = self.sign.name();
        let language = format!("{} ({})", self.locale.language_name(), self.locale.code());

        let mut prompt = match period {
            HoroscopePeriod::Daily => format!(
                "Write the DAILY horoscope for {sign} {date}. Answer only in {language}.\n\
                 Base the whole prediction on today's central astrological theme: \"{theme}\". \
                 Explain how it shapes the main outlook, love, money and health for {sign}.\n",
                date = date_descriptor(self.target_date, self.today),
                theme = daily_theme(self.target_date, self.sign),
            ),
            HoroscopePeriod::Weekly => format!(
                "Write the WEEKLY horoscope for {sign} for the current week. Answer only in {language}.\n\
                 Open 'main' with the overall theme of the week, possibly naming a key planetary transit. \
                 Give developed advice for love, money and health across the whole week.\n"
            ),
            HoroscopePeriod::Monthly => format!(
                "Write the MONTHLY horoscope for {sign} for the current month. Answer only in {language}.\n\
                 Refer to the period as \"this month\" and never use placeholders. \
                 Give developed advice for love, money and health across the whole month.\n"
            ),
        };

        match self.profile.filter(|profile| profile.is_personalized()) {
            Some(profile) => {
                let name = profile.name.as_deref().unwrap_or_default();
                prompt.push_str(&format!(
                    "This is a PERSONALIZED horoscope for {name}. Greet {name} warmly at the start of 'main'.\n"
                ));
                if let Some(gender) = &profile.gender {
                    prompt.push_str(&format!("Gender: {gender}.\n"));
                }
                if let Some(status) = &profile.relationship_status {
                    prompt.push_str(&format!(
                        "Relationship status: {status}. Let it subtly inform 'love'.\n"
                    ));
                }
                if let Some(status) = &profile.employment_status {
                    prompt.push_str(&format!(
                        "Employment status: {status}. Let it subtly inform 'money'.\n"
                    ));
                }
            }
            None => {
                prompt.push_str(&format!(
                    "This is a GENERAL horoscope for everyone born under {sign}.\n"
                ));
            }
        }

        prompt.push_str("Respond with the JSON object only.");
        prompt
    }
}

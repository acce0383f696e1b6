//! Outcome reports for batch runs.

use chrono::NaiveDate;
use horoscope_core::{HoroscopePeriod, Locale, TimeBucketKey, ZodiacSign};

/// Terminal state of one (locale, period, key) unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    /// Content already existed; nothing was generated.
    Skipped,
    /// Another run holds the unit's lease.
    Busy,
    /// Generated signs were saved.
    Persisted { signs: usize },
    /// Every sign failed; nothing was written.
    Discarded,
    /// The unit was aborted by a cache, lease or save error.
    Failed(String),
}

/// Report for one (locale, period, key) unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    pub locale: Locale,
    pub period: HoroscopePeriod,
    pub key: TimeBucketKey,
    pub outcome: UnitOutcome,
    /// Signs generated successfully, in generation order.
    pub succeeded: Vec<ZodiacSign>,
    /// Signs whose generation failed, in generation order.
    pub failed: Vec<ZodiacSign>,
}

impl UnitReport {
    pub(crate) fn new(locale: Locale, period: HoroscopePeriod, key: TimeBucketKey) -> Self {
        Self {
            locale,
            period,
            key,
            outcome: UnitOutcome::Skipped,
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub(crate) fn finish(mut self, outcome: UnitOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Generator calls made for this unit.
    pub fn generation_calls(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self.outcome, UnitOutcome::Persisted { .. })
    }
}

/// Report for one period across locales.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodReport {
    pub period: HoroscopePeriod,
    pub key: TimeBucketKey,
    pub units: Vec<UnitReport>,
}

impl PeriodReport {
    /// The unit for `locale`, if it was part of the run.
    pub fn unit(&self, locale: Locale) -> Option<&UnitReport> {
        self.units.iter().find(|unit| unit.locale == locale)
    }

    pub fn generation_calls(&self) -> usize {
        self.units.iter().map(UnitReport::generation_calls).sum()
    }

    pub fn count(&self, predicate: impl Fn(&UnitOutcome) -> bool) -> usize {
        self.units.iter().filter(|unit| predicate(&unit.outcome)).count()
    }
}

/// Report for all three periods of one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteReport {
    pub date: NaiveDate,
    pub daily: PeriodReport,
    pub weekly: PeriodReport,
    pub monthly: PeriodReport,
}

impl CompleteReport {
    pub fn periods(&self) -> [&PeriodReport; 3] {
        [&self.daily, &self.weekly, &self.monthly]
    }

    pub fn units(&self) -> impl Iterator<Item = &UnitReport> {
        self.periods().into_iter().flat_map(|period| period.units.iter())
    }

    pub fn generation_calls(&self) -> usize {
        self.periods().iter().map(|period| period.generation_calls()).sum()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::of(self.units())
    }
}

/// Report for a multi-day run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub days: Vec<CompleteReport>,
}

impl RunReport {
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.days.iter().map(|day| day.date).collect()
    }

    pub fn units(&self) -> impl Iterator<Item = &UnitReport> {
        self.days.iter().flat_map(|day| day.units())
    }

    pub fn generation_calls(&self) -> usize {
        self.days.iter().map(CompleteReport::generation_calls).sum()
    }

    /// Unit counts per outcome.
    pub fn summary(&self) -> RunSummary {
        RunSummary::of(self.units())
    }
}

/// Per-outcome unit counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub persisted: usize,
    pub skipped: usize,
    pub busy: usize,
    pub discarded: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn of<'a>(units: impl IntoIterator<Item = &'a UnitReport>) -> Self {
        let mut summary = Self::default();
        for unit in units {
            match unit.outcome {
                UnitOutcome::Persisted { .. } => summary.persisted += 1,
                UnitOutcome::Skipped => summary.skipped += 1,
                UnitOutcome::Busy => summary.busy += 1,
                UnitOutcome::Discarded => summary.discarded += 1,
                UnitOutcome::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }
}

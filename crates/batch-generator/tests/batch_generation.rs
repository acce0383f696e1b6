//! Integration tests for the batch orchestrator against in-memory and SQLite stores.

use std::sync::Arc;
use std::time::Duration;

use batch_generator::{
    BatchConfig, BatchError, BatchGenerator, GenerationMode, RateLimiter, TokenBucket, UnitOutcome,
};
use chrono::NaiveDate;
use database::{Database, DocPath, DocumentStore, MemoryStore, StoreOp};
use horoscope_cache::HoroscopeCache;
use horoscope_core::{
    Clock, ContentGenerator, FixedClock, HoroscopeDetail, HoroscopePeriod, Locale, ParseError, SignMap,
    TimeBucketKey, ZodiacSign,
};
use mock_generator::{DelayedGenerator, FlakyGenerator, StaticGenerator};
use tokio::time::Instant;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn today() -> NaiveDate {
    date("2024-03-15")
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::at_date(today()))
}

fn unpaced(mode: GenerationMode) -> BatchConfig {
    BatchConfig::builder()
        .locales([Locale::Es])
        .mode(mode)
        .pacing(Duration::ZERO)
        .build()
}

struct Harness {
    store: Arc<MemoryStore>,
    cache: HoroscopeCache,
    clock: Arc<FixedClock>,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = clock();
        let cache = HoroscopeCache::new(store.clone()).with_clock(clock.clone());
        Self {
            store,
            cache,
            clock,
        }
    }

    fn batch(&self, generator: Arc<dyn ContentGenerator>, config: BatchConfig) -> BatchGenerator {
        BatchGenerator::new(generator, self.cache.clone(), config).with_clock(self.clock.clone())
    }
}

fn daily_key() -> TimeBucketKey {
    TimeBucketKey::daily(today())
}

#[tokio::test]
async fn test_complete_run_then_rerun_is_free() {
    let h = Harness::new();
    let generator = Arc::new(StaticGenerator::new());
    let batch = h.batch(generator.clone(), unpaced(GenerationMode::SkipExisting));

    let report = batch.generate_complete(today(), &[Locale::Es]).await;

    assert_eq!(generator.call_count(), 36);
    assert_eq!(report.daily.key.as_str(), "2024-03-15");
    assert_eq!(report.weekly.key.as_str(), "2024-11");
    assert_eq!(report.monthly.key.as_str(), "2024-03");
    assert_eq!(report.summary().persisted, 3);

    let paths = h.store.paths().await;
    assert_eq!(
        paths,
        vec![
            "horoscopes/daily/2024-03-15/es",
            "horoscopes/monthly/2024-03/es",
            "horoscopes/weekly/2024-11/es",
        ]
    );

    let daily = h
        .cache
        .load(HoroscopePeriod::Daily, &daily_key(), Locale::Es)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(daily.len(), 12);
    assert_eq!(daily[&ZodiacSign::Aries].main, "Aries daily es 2024-03-15 main");

    // Second run finds every unit cached.
    let rerun = batch.generate_complete(today(), &[Locale::Es]).await;
    assert_eq!(generator.call_count(), 36);
    assert_eq!(rerun.generation_calls(), 0);
    assert_eq!(rerun.summary().skipped, 3);
}

#[tokio::test]
async fn test_existing_unit_is_skipped_without_calls() {
    let h = Harness::new();
    let existing = SignMap::from([(ZodiacSign::Aries, HoroscopeDetail::new("a", "b", "c", "d"))]);
    h.cache
        .save_batch(HoroscopePeriod::Daily, &daily_key(), Locale::Es, &existing)
        .await
        .unwrap();
    let writes = h.store.write_count();

    let generator = Arc::new(StaticGenerator::new());
    let batch = h.batch(generator.clone(), unpaced(GenerationMode::SkipExisting));
    let report = batch
        .generate_for_period(HoroscopePeriod::Daily, today(), &[Locale::Es])
        .await;

    assert_eq!(generator.call_count(), 0);
    assert_eq!(report.unit(Locale::Es).unwrap().outcome, UnitOutcome::Skipped);
    assert_eq!(h.store.write_count(), writes);
}

#[tokio::test]
async fn test_failed_sign_is_isolated() {
    let h = Harness::new();
    let generator = Arc::new(FlakyGenerator::failing_for(
        StaticGenerator::new(),
        [ZodiacSign::Leo],
    ));
    let batch = h.batch(generator.clone(), unpaced(GenerationMode::SkipExisting));

    let report = batch
        .generate_for_period(HoroscopePeriod::Daily, today(), &[Locale::Es])
        .await;
    let unit = report.unit(Locale::Es).unwrap();

    assert_eq!(unit.outcome, UnitOutcome::Persisted { signs: 11 });
    assert_eq!(unit.failed, vec![ZodiacSign::Leo]);
    assert_eq!(unit.succeeded.len(), 11);
    assert_eq!(generator.failure_count(), 1);

    let stored = h
        .cache
        .load(HoroscopePeriod::Daily, &daily_key(), Locale::Es)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.len(), 11);
    assert!(!stored.contains_key(&ZodiacSign::Leo));
}

#[tokio::test]
async fn test_all_signs_failing_writes_nothing() {
    let h = Harness::new();
    let generator = Arc::new(FlakyGenerator::always_failing(StaticGenerator::new()));
    let batch = h.batch(generator.clone(), unpaced(GenerationMode::SkipExisting));

    let report = batch
        .generate_for_period(HoroscopePeriod::Daily, today(), &[Locale::Es])
        .await;
    let unit = report.unit(Locale::Es).unwrap();

    assert_eq!(unit.outcome, UnitOutcome::Discarded);
    assert_eq!(unit.failed.len(), 12);
    // The unit stays absent and the lease was released.
    assert!(h.store.is_empty().await);
    assert!(!h
        .cache
        .exists(HoroscopePeriod::Daily, &daily_key(), Locale::Es)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_blank_content_counts_as_failure() {
    let h = Harness::new();
    let generator = Arc::new(
        FlakyGenerator::failing_for(StaticGenerator::new(), [ZodiacSign::Pisces])
            .with_empty_content(),
    );
    let batch = h.batch(generator, unpaced(GenerationMode::SkipExisting));

    let report = batch
        .generate_for_period(HoroscopePeriod::Daily, today(), &[Locale::Es])
        .await;
    let unit = report.unit(Locale::Es).unwrap();

    assert_eq!(unit.outcome, UnitOutcome::Persisted { signs: 11 });
    assert_eq!(unit.failed, vec![ZodiacSign::Pisces]);
}

#[tokio::test]
async fn test_period_failure_does_not_affect_siblings() {
    let h = Harness::new();
    h.store.fail_on(StoreOp::Write, "horoscopes/weekly").await;
    let batch = h.batch(
        Arc::new(StaticGenerator::new()),
        unpaced(GenerationMode::SkipExisting),
    );

    let report = batch.generate_complete(today(), &[Locale::Es]).await;

    assert!(report.daily.unit(Locale::Es).unwrap().is_persisted());
    assert!(report.monthly.unit(Locale::Es).unwrap().is_persisted());
    assert!(matches!(
        report.weekly.unit(Locale::Es).unwrap().outcome,
        UnitOutcome::Failed(_)
    ));

    let summary = report.summary();
    assert_eq!(summary.persisted, 2);
    assert_eq!(summary.failed, 1);
    assert!(!h
        .cache
        .exists(
            HoroscopePeriod::Weekly,
            &TimeBucketKey::weekly(today()),
            Locale::Es
        )
        .await
        .unwrap());
}

#[tokio::test]
async fn test_cache_read_failure_fails_unit_without_calls() {
    let h = Harness::new();
    h.store.fail_on(StoreOp::Read, "horoscopes/daily").await;
    let generator = Arc::new(StaticGenerator::new());
    let batch = h.batch(generator.clone(), unpaced(GenerationMode::SkipExisting));

    let report = batch
        .generate_for_period(HoroscopePeriod::Daily, today(), &[Locale::Es, Locale::En])
        .await;

    assert_eq!(generator.call_count(), 0);
    assert_eq!(report.count(|o| matches!(o, UnitOutcome::Failed(_))), 2);
}

#[tokio::test]
async fn test_fill_missing_only_generates_absent_signs() {
    let h = Harness::new();
    let existing: SignMap = ZodiacSign::ALL[..10]
        .iter()
        .map(|sign| (*sign, HoroscopeDetail::new("old", "old", "old", "old")))
        .collect();
    h.cache
        .save_batch(HoroscopePeriod::Daily, &daily_key(), Locale::Es, &existing)
        .await
        .unwrap();

    let generator = Arc::new(StaticGenerator::new());
    let batch = h.batch(generator.clone(), unpaced(GenerationMode::FillMissing));
    let report = batch
        .generate_for_period(HoroscopePeriod::Daily, today(), &[Locale::Es])
        .await;

    assert_eq!(generator.call_count(), 2);
    assert_eq!(
        report.unit(Locale::Es).unwrap().succeeded,
        vec![ZodiacSign::Aquarius, ZodiacSign::Pisces]
    );

    let stored = h
        .cache
        .load(HoroscopePeriod::Daily, &daily_key(), Locale::Es)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.len(), 12);
    assert_eq!(stored[&ZodiacSign::Aries].main, "old");

    // Nothing left to fill.
    let rerun = batch
        .generate_for_period(HoroscopePeriod::Daily, today(), &[Locale::Es])
        .await;
    assert_eq!(rerun.unit(Locale::Es).unwrap().outcome, UnitOutcome::Skipped);
    assert_eq!(generator.call_count(), 2);
}

#[tokio::test]
async fn test_force_regenerates_everything() {
    let h = Harness::new();
    let skip = h.batch(
        Arc::new(StaticGenerator::with_prefix("v1 ")),
        unpaced(GenerationMode::SkipExisting),
    );
    skip.generate_for_period(HoroscopePeriod::Daily, today(), &[Locale::Es])
        .await;

    let generator = Arc::new(StaticGenerator::with_prefix("v2 "));
    let force = h.batch(generator.clone(), unpaced(GenerationMode::ForceRegenerate));
    let report = force
        .generate_for_period(HoroscopePeriod::Daily, today(), &[Locale::Es])
        .await;

    assert_eq!(generator.call_count(), 12);
    assert!(report.unit(Locale::Es).unwrap().is_persisted());
    let stored = h
        .cache
        .load(HoroscopePeriod::Daily, &daily_key(), Locale::Es)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.values().all(|detail| detail.main.starts_with("v2 ")));
}

#[tokio::test(start_paused = true)]
async fn test_stuck_sign_times_out() {
    let h = Harness::new();
    let generator = Arc::new(
        DelayedGenerator::with_secs(StaticGenerator::new(), 30).only_for([ZodiacSign::Leo]),
    );
    let config = BatchConfig::builder()
        .locales([Locale::Es])
        .pacing(Duration::ZERO)
        .sign_timeout(Duration::from_secs(5))
        .build();
    let batch = h.batch(generator, config);

    let start = Instant::now();
    let report = batch
        .generate_for_period(HoroscopePeriod::Daily, today(), &[Locale::Es])
        .await;
    let unit = report.unit(Locale::Es).unwrap();

    assert_eq!(unit.outcome, UnitOutcome::Persisted { signs: 11 });
    assert_eq!(unit.failed, vec![ZodiacSign::Leo]);
    assert!(start.elapsed() < Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn test_calls_are_paced() {
    let h = Harness::new();
    let config = BatchConfig::builder()
        .locales([Locale::Es])
        .pacing(Duration::from_secs(1))
        .build();
    let batch = h.batch(Arc::new(StaticGenerator::new()), config);

    let start = Instant::now();
    batch
        .generate_for_period(HoroscopePeriod::Daily, today(), &[Locale::Es])
        .await;

    assert!(start.elapsed() >= Duration::from_secs(11));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_periods_share_the_limiter() {
    let h = Harness::new();
    let limiter: Arc<dyn RateLimiter> =
        Arc::new(TokenBucket::per_interval(Duration::from_secs(1)));
    let generator = Arc::new(StaticGenerator::new());
    let batch = h
        .batch(generator.clone(), unpaced(GenerationMode::SkipExisting))
        .with_rate_limiter(limiter);

    let start = Instant::now();
    let report = batch.generate_complete(today(), &[Locale::Es]).await;

    assert_eq!(report.summary().persisted, 3);
    assert_eq!(generator.call_count(), 36);
    assert!(start.elapsed() >= Duration::from_secs(35));
}

#[tokio::test]
async fn test_unit_claimed_elsewhere_is_busy() {
    let h = Harness::new();
    let other = h
        .cache
        .try_claim(
            HoroscopePeriod::Daily,
            &daily_key(),
            Locale::Es,
            "other-run",
            chrono::Duration::minutes(10),
            h.clock.now(),
        )
        .await
        .unwrap();
    assert!(other.is_some());

    let generator = Arc::new(StaticGenerator::new());
    let batch = h.batch(generator.clone(), unpaced(GenerationMode::SkipExisting));
    let report = batch
        .generate_for_period(HoroscopePeriod::Daily, today(), &[Locale::Es])
        .await;

    assert_eq!(report.unit(Locale::Es).unwrap().outcome, UnitOutcome::Busy);
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_expired_claim_is_taken_over() {
    let h = Harness::new();
    h.cache
        .try_claim(
            HoroscopePeriod::Daily,
            &daily_key(),
            Locale::Es,
            "crashed-run",
            chrono::Duration::minutes(10),
            h.clock.now() - chrono::Duration::hours(1),
        )
        .await
        .unwrap()
        .unwrap();

    let generator = Arc::new(StaticGenerator::new());
    let batch = h.batch(generator.clone(), unpaced(GenerationMode::SkipExisting));
    let report = batch
        .generate_for_period(HoroscopePeriod::Daily, today(), &[Locale::Es])
        .await;

    assert!(report.unit(Locale::Es).unwrap().is_persisted());
    assert_eq!(generator.call_count(), 12);
    // Our own claim was released afterwards.
    let lease = DocPath::parse("horoscopes/leases/daily/2024-03-15/es").unwrap();
    assert!(!h.store.exists(&lease).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_runs_generate_once() {
    let h = Harness::new();
    let generator = Arc::new(DelayedGenerator::with_millis(StaticGenerator::new(), 100));
    let first = h
        .batch(generator.clone(), unpaced(GenerationMode::SkipExisting))
        .with_holder("run-a");
    let second = h
        .batch(generator.clone(), unpaced(GenerationMode::SkipExisting))
        .with_holder("run-b");

    let (a, b) = tokio::join!(
        first.generate_for_period(HoroscopePeriod::Daily, today(), &[Locale::Es]),
        second.generate_for_period(HoroscopePeriod::Daily, today(), &[Locale::Es]),
    );

    let outcomes = [
        a.unit(Locale::Es).unwrap().outcome.clone(),
        b.unit(Locale::Es).unwrap().outcome.clone(),
    ];
    assert!(outcomes.contains(&UnitOutcome::Persisted { signs: 12 }));
    assert!(outcomes.contains(&UnitOutcome::Busy));
    assert_eq!(generator.inner().call_count(), 12);
}

#[tokio::test(start_paused = true)]
async fn test_shared_generator_runs_exclude_each_other() {
    let h = Harness::new();
    let generator = Arc::new(DelayedGenerator::with_millis(StaticGenerator::new(), 100));
    let batch = Arc::new(h.batch(generator.clone(), unpaced(GenerationMode::SkipExisting)));

    let (a, b) = tokio::join!(
        batch.generate_for_period(HoroscopePeriod::Daily, today(), &[Locale::Es]),
        batch.generate_for_period(HoroscopePeriod::Daily, today(), &[Locale::Es]),
    );

    let outcomes = [
        a.unit(Locale::Es).unwrap().outcome.clone(),
        b.unit(Locale::Es).unwrap().outcome.clone(),
    ];
    assert!(outcomes.contains(&UnitOutcome::Persisted { signs: 12 }));
    assert!(outcomes.contains(&UnitOutcome::Busy));
    assert_eq!(generator.inner().call_count(), 12);

    let lease = DocPath::parse("horoscopes/leases/daily/2024-03-15/es").unwrap();
    assert!(!h.store.exists(&lease).await.unwrap());
}

#[tokio::test]
async fn test_lease_record_is_written_while_generating() {
    let h = Harness::new();
    let batch = h.batch(
        Arc::new(FlakyGenerator::always_failing(StaticGenerator::new())),
        unpaced(GenerationMode::SkipExisting),
    );
    batch
        .generate_for_period(HoroscopePeriod::Daily, today(), &[Locale::Es])
        .await;

    // One claim written, then deleted on release.
    assert_eq!(h.store.write_count(), 1);
    let lease = DocPath::parse("horoscopes/leases/daily/2024-03-15/es").unwrap();
    assert!(h.store.get(&lease).await.unwrap().is_none());
}

#[tokio::test]
async fn test_next_days_skips_shared_weekly_and_monthly() {
    let h = Harness::new();
    let generator = Arc::new(StaticGenerator::new());
    let batch = h.batch(generator.clone(), unpaced(GenerationMode::SkipExisting));

    let report = batch.generate_for_next_days(3, &[Locale::Es]).await;

    assert_eq!(
        report.dates(),
        vec![date("2024-03-15"), date("2024-03-16"), date("2024-03-17")]
    );
    // Three daily units plus one weekly (ISO week 11) and one monthly unit.
    assert_eq!(generator.call_count(), 60);
    let summary = report.summary();
    assert_eq!(summary.persisted, 5);
    assert_eq!(summary.skipped, 4);
}

#[tokio::test]
async fn test_historical_and_upcoming_run() {
    let h = Harness::new();
    let generator = Arc::new(StaticGenerator::new());
    let batch = h.batch(generator.clone(), unpaced(GenerationMode::SkipExisting));

    let report = batch.generate_historical_and_upcoming(&[Locale::Es]).await;

    assert_eq!(report.days.len(), 11);
    assert_eq!(report.dates()[0], date("2024-03-08"));
    assert_eq!(report.dates()[10], date("2024-03-18"));
    // 11 daily units, ISO weeks 10-12 and March.
    assert_eq!(report.summary().persisted, 15);
    assert_eq!(generator.call_count(), 15 * 12);
}

#[tokio::test]
async fn test_generate_tomorrow() {
    let h = Harness::new();
    let generator = Arc::new(StaticGenerator::new());
    let batch = h.batch(generator.clone(), unpaced(GenerationMode::SkipExisting));

    let report = batch.generate_tomorrow(&[Locale::Es]).await;

    assert_eq!(report.date, date("2024-03-16"));
    assert_eq!(report.daily.key.as_str(), "2024-03-16");
    assert!(generator
        .requests()
        .iter()
        .all(|request| request.target_date == Some(date("2024-03-16"))));
}

#[tokio::test]
async fn test_generate_daily_for_parses_date() {
    let h = Harness::new();
    let generator = Arc::new(StaticGenerator::new());
    let batch = h.batch(generator.clone(), unpaced(GenerationMode::SkipExisting));

    let report = batch
        .generate_daily_for("2024-02-29", &[Locale::De])
        .await
        .unwrap();
    assert_eq!(report.key.as_str(), "2024-02-29");
    assert!(report.unit(Locale::De).unwrap().is_persisted());

    let invalid = batch.generate_daily_for("2024-02-30", &[Locale::De]).await;
    assert!(matches!(
        invalid,
        Err(BatchError::Parse(ParseError::InvalidDate(_)))
    ));
    assert_eq!(generator.call_count(), 12);
}

#[tokio::test]
async fn test_clean_old_daily() {
    let h = Harness::new();
    let entry = SignMap::from([(ZodiacSign::Aries, HoroscopeDetail::new("a", "b", "c", "d"))]);
    for day in ["2024-03-01", "2024-03-07", "2024-03-08", "2024-03-15"] {
        for locale in [Locale::Es, Locale::En] {
            h.cache
                .save_batch(HoroscopePeriod::Daily, &TimeBucketKey::daily(date(day)), locale, &entry)
                .await
                .unwrap();
        }
    }
    h.cache
        .save_batch(HoroscopePeriod::Weekly, &TimeBucketKey::weekly(date("2024-01-01")), Locale::Es, &entry)
        .await
        .unwrap();

    let batch = h.batch(
        Arc::new(StaticGenerator::new()),
        unpaced(GenerationMode::SkipExisting),
    );
    let report = batch.clean_old_daily().await.unwrap();

    // Cutoff is 2024-03-08: the two older days are gone in both locales.
    assert_eq!(report.cleaned, 4);
    assert!(report.is_clean());
    assert_eq!(
        h.store.paths().await,
        vec![
            "horoscopes/daily/2024-03-08/en",
            "horoscopes/daily/2024-03-08/es",
            "horoscopes/daily/2024-03-15/en",
            "horoscopes/daily/2024-03-15/es",
            "horoscopes/weekly/2024-01/es",
        ]
    );
}

#[tokio::test]
async fn test_end_to_end_with_sqlite() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    let store: Arc<dyn DocumentStore> = Arc::new(db);
    let clock = clock();
    let cache = HoroscopeCache::new(store).with_clock(clock.clone());

    let generator = Arc::new(FlakyGenerator::failing_for(
        StaticGenerator::new(),
        [ZodiacSign::Cancer],
    ));
    let batch = BatchGenerator::new(
        generator,
        cache.clone(),
        unpaced(GenerationMode::FillMissing),
    )
    .with_clock(clock);

    let first = batch
        .generate_for_period(HoroscopePeriod::Monthly, today(), &[Locale::Fr])
        .await;
    assert_eq!(
        first.unit(Locale::Fr).unwrap().outcome,
        UnitOutcome::Persisted { signs: 11 }
    );

    let key = TimeBucketKey::monthly(today());
    assert_eq!(
        cache
            .missing_signs(HoroscopePeriod::Monthly, &key, Locale::Fr)
            .await
            .unwrap(),
        vec![ZodiacSign::Cancer]
    );

    // Retry only the failed sign; it fails again and the unit is discarded.
    let second = batch
        .generate_for_period(HoroscopePeriod::Monthly, today(), &[Locale::Fr])
        .await;
    let unit = second.unit(Locale::Fr).unwrap();
    assert_eq!(unit.outcome, UnitOutcome::Discarded);
    assert_eq!(unit.generation_calls(), 1);

    let stored = cache
        .load(HoroscopePeriod::Monthly, &key, Locale::Fr)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.len(), 11);
    assert_eq!(
        stored[&ZodiacSign::Virgo].health,
        "Virgo monthly fr 2024-03-15 health"
    );
}

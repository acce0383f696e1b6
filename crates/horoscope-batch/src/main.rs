mod config;

use std::sync::Arc;

use batch_generator::{BatchConfig, BatchGenerator, GenerationMode, RunSummary};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use database::{Database, DocumentStore};
use gemini_generator::GeminiGenerator;
use horoscope_cache::HoroscopeCache;
use horoscope_core::{ContentGenerator, Locale, ParseError};
use mock_generator::StaticGenerator;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "horoscope-batch")]
#[command(about = "Generate and maintain cached horoscopes for every sign and locale")]
struct Args {
    /// Content generator backend
    #[arg(long, value_enum, default_value_t = GeneratorKind::Gemini, global = true)]
    generator: GeneratorKind,

    /// Locale to generate (repeatable). Falls back to HOROSCOPE_LOCALES.
    #[arg(long = "locale", global = true)]
    locales: Vec<Locale>,

    /// skip-existing, fill-missing or force. Falls back to HOROSCOPE_MODE.
    #[arg(long, global = true)]
    mode: Option<GenerationMode>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GeneratorKind {
    /// Gemini chat-completions API (needs GEMINI_API_KEY)
    Gemini,
    /// Deterministic offline text
    Mock,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// The last week, today and the next three days
    Historical,
    /// Today and the following days
    Next {
        #[arg(default_value_t = 7)]
        days: u32,
    },
    /// Tomorrow's daily, weekly and monthly content
    Tomorrow,
    /// Daily content for one date
    Date {
        /// Date as YYYY-MM-DD
        date: String,
        /// Also generate the weekly and monthly content for the date
        #[arg(long)]
        complete: bool,
    },
    /// Delete daily content past the retention window
    Cleanup {
        #[arg(long)]
        retain_days: Option<u32>,
    },
}

impl Args {
    /// Merge flags over the environment configuration.
    fn batch_config(&self, mut config: BatchConfig) -> BatchConfig {
        if !self.locales.is_empty() {
            config.locales = self.locales.clone();
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(Command::Cleanup {
            retain_days: Some(days),
        }) = &self.command
        {
            config.retention_days = *days;
        }
        config
    }
}

fn build_generator(kind: GeneratorKind) -> Result<Arc<dyn ContentGenerator>, Box<dyn std::error::Error>> {
    match kind {
        GeneratorKind::Gemini => Ok(Arc::new(GeminiGenerator::from_env()?)),
        GeneratorKind::Mock => Ok(Arc::new(StaticGenerator::new())),
    }
}

fn log_summary(label: &str, summary: RunSummary) {
    info!(
        "{}: {} persisted, {} skipped, {} busy, {} discarded, {} failed",
        label,
        summary.persisted,
        summary.skipped,
        summary.busy,
        summary.discarded,
        summary.failed
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.batch_config(BatchConfig::from_env()?);
    let locales = config.locales.clone();

    let database_url = config::database_url();
    let db = Database::connect(&database_url).await?;
    db.migrate().await?;
    let store: Arc<dyn DocumentStore> = Arc::new(db.clone());
    let cache = HoroscopeCache::new(store);

    let generator = build_generator(args.generator)?;
    if !generator.is_ready().await {
        return Err(format!("generator {} is not ready", generator.name()).into());
    }
    let batch = BatchGenerator::new(generator, cache, config);

    match args.command.unwrap_or(Command::Historical) {
        Command::Historical => {
            let report = batch.generate_historical_and_upcoming(&locales).await;
            log_summary("Historical and upcoming run", report.summary());
        }
        Command::Next { days } => {
            let report = batch.generate_for_next_days(days, &locales).await;
            log_summary(&format!("Next {} days", days), report.summary());
        }
        Command::Tomorrow => {
            let report = batch.generate_tomorrow(&locales).await;
            log_summary(&format!("Tomorrow ({})", report.date), report.summary());
        }
        Command::Date { date, complete } => {
            if complete {
                let parsed = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
                    .map_err(|_| ParseError::InvalidDate(date.clone()))?;
                let report = batch.generate_complete(parsed, &locales).await;
                log_summary(&format!("Complete {}", parsed), report.summary());
            } else {
                let report = batch.generate_daily_for(&date, &locales).await?;
                log_summary(&format!("Daily {}", report.key), RunSummary::of(&report.units));
            }
        }
        Command::Cleanup { .. } => {
            let report = batch.clean_old_daily().await?;
            info!("Cleaned {} daily documents", report.cleaned);
            for failure in &report.errors {
                warn!("Cleanup failure: {}", failure);
            }
        }
    }

    db.close().await;
    Ok(())
}

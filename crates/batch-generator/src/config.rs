//! Configuration for batch runs.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use horoscope_core::Locale;

use crate::error::BatchError;

/// Default pause between generator calls (one call per second).
pub const DEFAULT_PACING: Duration = Duration::from_secs(1);

/// Default timeout for a single sign's generator call.
pub const DEFAULT_SIGN_TIMEOUT: Duration = Duration::from_secs(120);

/// Default lifetime of a unit lease.
pub const DEFAULT_LEASE_TTL: Duration = Duration::from_secs(10 * 60);

/// How existing content affects a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerationMode {
    /// Skip the unit when its document exists at all.
    #[default]
    SkipExisting,
    /// Generate only the signs missing from the document.
    FillMissing,
    /// Regenerate every sign regardless of stored content.
    ForceRegenerate,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::SkipExisting => "skip-existing",
            GenerationMode::FillMissing => "fill-missing",
            GenerationMode::ForceRegenerate => "force",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationMode {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip-existing" | "skip" => Ok(GenerationMode::SkipExisting),
            "fill-missing" | "fill" => Ok(GenerationMode::FillMissing),
            "force" | "force-regenerate" => Ok(GenerationMode::ForceRegenerate),
            other => Err(BatchError::Configuration(format!(
                "unknown generation mode: {}",
                other
            ))),
        }
    }
}

/// Configuration for [`BatchGenerator`](crate::BatchGenerator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Locales generated when a caller does not pass its own list.
    pub locales: Vec<Locale>,

    /// Behavior for units that already have content.
    pub mode: GenerationMode,

    /// Minimum spacing between generator calls. Zero disables pacing.
    pub pacing: Duration,

    /// Timeout for one sign's generator call.
    pub sign_timeout: Duration,

    /// Lifetime of the lease taken on a unit while generating it.
    pub lease_ttl: Duration,

    /// Days of daily content kept by the cleanup sweep.
    pub retention_days: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            locales: Locale::ALL.to_vec(),
            mode: GenerationMode::default(),
            pacing: DEFAULT_PACING,
            sign_timeout: DEFAULT_SIGN_TIMEOUT,
            lease_ttl: DEFAULT_LEASE_TTL,
            retention_days: horoscope_cache::DEFAULT_RETENTION_DAYS,
        }
    }
}

impl BatchConfig {
    /// Create configuration from environment variables.
    ///
    /// All variables are optional:
    /// - `HOROSCOPE_LOCALES` - Comma-separated locales (default: es,en,de,fr)
    /// - `HOROSCOPE_MODE` - skip-existing, fill-missing or force (default: skip-existing)
    /// - `HOROSCOPE_PACING_MS` - Milliseconds between generator calls (default: 1000)
    /// - `HOROSCOPE_SIGN_TIMEOUT_SECS` - Per-sign timeout (default: 120)
    /// - `HOROSCOPE_LEASE_TTL_SECS` - Unit lease lifetime (default: 600)
    /// - `HOROSCOPE_RETENTION_DAYS` - Daily content retention (default: 7)
    ///
    /// Malformed locales or modes are errors; malformed numbers fall back to
    /// their defaults.
    pub fn from_env() -> Result<Self, BatchError> {
        let defaults = Self::default();

        let locales = match env::var("HOROSCOPE_LOCALES") {
            Ok(value) if !value.trim().is_empty() => Locale::parse_list(&value)?,
            _ => defaults.locales,
        };

        let mode = match env::var("HOROSCOPE_MODE") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.mode,
        };

        let pacing = env::var("HOROSCOPE_PACING_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.pacing);

        let sign_timeout = env::var("HOROSCOPE_SIGN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.sign_timeout);

        let lease_ttl = env::var("HOROSCOPE_LEASE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.lease_ttl);

        let retention_days = env::var("HOROSCOPE_RETENTION_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.retention_days);

        Ok(Self {
            locales,
            mode,
            pacing,
            sign_timeout,
            lease_ttl,
            retention_days,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder::default()
    }
}

/// Builder for BatchConfig.
#[derive(Debug, Default)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    pub fn locales(mut self, locales: impl IntoIterator<Item = Locale>) -> Self {
        self.config.locales = locales.into_iter().collect();
        self
    }

    pub fn mode(mut self, mode: GenerationMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn pacing(mut self, pacing: Duration) -> Self {
        self.config.pacing = pacing;
        self
    }

    pub fn sign_timeout(mut self, timeout: Duration) -> Self {
        self.config.sign_timeout = timeout;
        self
    }

    pub fn lease_ttl(mut self, ttl: Duration) -> Self {
        self.config.lease_ttl = ttl;
        self
    }

    pub fn retention_days(mut self, days: u32) -> Self {
        self.config.retention_days = days;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> BatchConfig {
        self.config
    }
}

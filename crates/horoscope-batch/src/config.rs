//! Process-level settings loaded from environment variables.

use std::env;

/// Database URL used when neither variable is set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:horoscopes.db?mode=rwc";

/// Resolve the SQLite URL.
///
/// | Variable | Description | Default |
/// |----------|-------------|---------|
/// | `HOROSCOPE_DATABASE_URL` | SQLite database URL | - |
/// | `SQLITE_PATH` | Path or SQLite URL | `sqlite:horoscopes.db?mode=rwc` |
pub fn database_url() -> String {
    if let Ok(url) = env::var("HOROSCOPE_DATABASE_URL") {
        if !url.trim().is_empty() {
            return url;
        }
    }
    env::var("SQLITE_PATH")
        .map(|path| sqlite_url_from_path(&path))
        .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

fn sqlite_url_from_path(path: &str) -> String {
    if path.starts_with("sqlite:") {
        path.to_string()
    } else {
        format!("sqlite:{}?mode=rwc", path)
    }
}

//! Maintenance sweep results.

use std::fmt;

/// A single document the sweep could not remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    pub path: String,
    pub error: String,
}

impl fmt::Display for CleanupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.error)
    }
}

/// Outcome of [`HoroscopeCache::delete_older_than`](crate::HoroscopeCache::delete_older_than).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Documents deleted.
    pub cleaned: usize,
    /// Per-item failures; none of them stopped the sweep.
    pub errors: Vec<CleanupFailure>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn record_failure(&mut self, path: impl Into<String>, error: impl ToString) {
        self.errors.push(CleanupFailure {
            path: path.into(),
            error: error.to_string(),
        });
    }
}

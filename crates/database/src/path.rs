//! Hierarchical document paths.

use std::fmt;

use crate::error::{Result, StoreError};

/// Separator used in the string form of a path.
pub const SEPARATOR: char = '/';

/// Maximum length of a single path segment.
pub const MAX_SEGMENT_LENGTH: usize = 256;

/// A path-addressed document location, e.g. `horoscopes/daily/2024-03-15/es`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    segments: Vec<String>,
}

impl DocPath {
    /// Build a path from segments, validating each one.
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(StoreError::InvalidPath("path has no segments".to_string()));
        }
        for segment in &segments {
            validate_segment(segment)?;
        }
        Ok(Self { segments })
    }

    /// Parse the slash-joined form.
    pub fn parse(path: &str) -> Result<Self> {
        Self::new(path.split(SEPARATOR))
    }

    /// A new path one level below this one.
    pub fn child(&self, segment: impl Into<String>) -> Result<Self> {
        let segment = segment.into();
        validate_segment(&segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// The enclosing path, or `None` at the top level.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// String prefix shared by every descendant of this path.
    pub fn descendant_prefix(&self) -> String {
        format!("{}{}", self, SEPARATOR)
    }

    /// The segment directly below `self` on the way to `descendant`.
    pub fn child_segment_of<'a>(&self, descendant: &'a str) -> Option<&'a str> {
        let rest = descendant.strip_prefix(&self.descendant_prefix())?;
        rest.split(SEPARATOR).next().filter(|s| !s.is_empty())
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Validate a single path segment.
///
/// Segments must be non-empty, must not contain the separator, and must not
/// be `.` or `..`.
pub fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(StoreError::InvalidPath("empty path segment".to_string()));
    }
    if segment.len() > MAX_SEGMENT_LENGTH {
        return Err(StoreError::InvalidPath(format!(
            "segment too long ({} bytes, max {})",
            segment.len(),
            MAX_SEGMENT_LENGTH
        )));
    }
    if segment.contains(SEPARATOR) {
        return Err(StoreError::InvalidPath(format!(
            "segment contains '{}': {}",
            SEPARATOR, segment
        )));
    }
    if segment == "." || segment == ".." {
        return Err(StoreError::InvalidPath(format!("reserved segment: {}", segment)));
    }
    Ok(())
}

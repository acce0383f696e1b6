//! Persistence boundary for generated horoscope content.
//!
//! [`HoroscopeCache`] sits on top of any [`database::DocumentStore`] and
//! owns the document layout:
//!
//! ```text
//! horoscopes/{period}/{key}/{locale}               shared content, one entry per sign
//! horoscopes/personalized/{userId}/{period}/{key}  per-user content
//! horoscopes/leases/{period}/{key}/{locale}        generation claims
//! ```
//!
//! Batch writes merge, so saving a partial sign map never removes signs
//! saved earlier.

mod cache;
mod cleanup;
pub mod document;
mod error;
mod lease;
pub mod paths;

pub use cache::{HoroscopeCache, DEFAULT_RETENTION_DAYS};
pub use cleanup::{CleanupFailure, CleanupReport};
pub use error::{CacheError, Result};
pub use lease::{Lease, LeaseRecord};

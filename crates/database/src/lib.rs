//! Path-addressed document store for horoscope content.
//!
//! Documents are JSON objects addressed by a hierarchical [`DocPath`]. The
//! [`DocumentStore`] trait is implemented by:
//!
//! - [`MemoryStore`] - in-process store with optional fault injection, for tests
//! - [`Database`] - SQLite via SQLx, for production
//!
//! Merge writes follow JSON merge-patch semantics (see [`merge`]).
//!
//! # Example
//!
//! ```no_run
//! use database::{Database, DocPath, DocumentStore};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:horoscopes.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let path = DocPath::parse("horoscopes/daily/2024-03-15/es")?;
//!     let doc = json!({"aries": {"main": "..."}}).as_object().cloned().unwrap_or_default();
//!     db.merge(&path, doc).await?;
//!     assert!(db.exists(&path).await?);
//!
//!     Ok(())
//! }
//! ```

pub mod documents;
pub mod error;
pub mod memory;
pub mod merge;
pub mod path;

pub use error::{Result, StoreError};
pub use memory::{MemoryStore, StoreOp};
pub use path::DocPath;

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// A stored document: a JSON object.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Hierarchical, path-addressed document persistence.
///
/// This trait is object-safe and can be used with `Arc<dyn DocumentStore>`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the document at `path`.
    async fn get(&self, path: &DocPath) -> Result<Option<Document>>;

    /// Whether a document exists at exactly `path`.
    async fn exists(&self, path: &DocPath) -> Result<bool> {
        Ok(self.get(path).await?.is_some())
    }

    /// Replace the document at `path`.
    async fn set(&self, path: &DocPath, doc: Document) -> Result<()>;

    /// Merge `doc` into the document at `path`, creating it if absent.
    async fn merge(&self, path: &DocPath, doc: Document) -> Result<()>;

    /// Delete the document at `path`. Returns whether it existed.
    async fn delete(&self, path: &DocPath) -> Result<bool>;

    /// Distinct segments directly below `parent` that lead to stored
    /// documents, sorted ascending.
    async fn list_children(&self, parent: &DocPath) -> Result<Vec<String>>;

    /// Conditional write.
    ///
    /// With `expected == None` the write only happens when no document
    /// exists. With `Some(doc)` it only happens when the stored document
    /// equals `doc`. Returns whether the write happened.
    async fn compare_and_set(
        &self,
        path: &DocPath,
        expected: Option<&Document>,
        doc: Document,
    ) -> Result<bool>;

    /// Get a human-readable name for this store.
    fn name(&self) -> &str;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>> {
        (**self).get(path).await
    }

    async fn exists(&self, path: &DocPath) -> Result<bool> {
        (**self).exists(path).await
    }

    async fn set(&self, path: &DocPath, doc: Document) -> Result<()> {
        (**self).set(path, doc).await
    }

    async fn merge(&self, path: &DocPath, doc: Document) -> Result<()> {
        (**self).merge(path, doc).await
    }

    async fn delete(&self, path: &DocPath) -> Result<bool> {
        (**self).delete(path).await
    }

    async fn list_children(&self, parent: &DocPath) -> Result<Vec<String>> {
        (**self).list_children(parent).await
    }

    async fn compare_and_set(
        &self,
        path: &DocPath,
        expected: Option<&Document>,
        doc: Document,
    ) -> Result<bool> {
        (**self).compare_and_set(path, expected, doc).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// SQLite-backed document store.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 5;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/horoscopes.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    ///
    /// In-memory URLs are limited to a single connection, since every
    /// connection would otherwise see its own empty database.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool_size = if url.contains(":memory:") { 1 } else { pool_size };
        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl DocumentStore for Database {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>> {
        documents::get_document(&self.pool, path).await
    }

    async fn exists(&self, path: &DocPath) -> Result<bool> {
        documents::document_exists(&self.pool, path).await
    }

    async fn set(&self, path: &DocPath, doc: Document) -> Result<()> {
        documents::set_document(&self.pool, path, &doc).await
    }

    async fn merge(&self, path: &DocPath, doc: Document) -> Result<()> {
        documents::merge_document(&self.pool, path, &doc).await
    }

    async fn delete(&self, path: &DocPath) -> Result<bool> {
        documents::delete_document(&self.pool, path).await
    }

    async fn list_children(&self, parent: &DocPath) -> Result<Vec<String>> {
        documents::list_children(&self.pool, parent).await
    }

    async fn compare_and_set(
        &self,
        path: &DocPath,
        expected: Option<&Document>,
        doc: Document,
    ) -> Result<bool> {
        match expected {
            None => documents::insert_if_absent(&self.pool, path, &doc).await,
            Some(expected) => documents::replace_if_equal(&self.pool, path, expected, &doc).await,
        }
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_document_crud() {
        let db = test_db().await;
        let path = DocPath::parse("horoscopes/daily/2024-03-15/es").unwrap();

        // Absent
        assert!(!db.exists(&path).await.unwrap());
        assert!(db.get(&path).await.unwrap().is_none());

        // Set
        db.set(&path, doc(json!({"aries": {"main": "x"}}))).await.unwrap();
        assert!(db.exists(&path).await.unwrap());

        // Read
        let fetched = db.get(&path).await.unwrap().unwrap();
        assert_eq!(fetched["aries"]["main"], "x");

        // Delete
        assert!(db.delete(&path).await.unwrap());
        assert!(!db.delete(&path).await.unwrap());
        assert!(!db.exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_merge_keeps_existing_keys() {
        let db = test_db().await;
        let path = DocPath::parse("horoscopes/weekly/2024-11/en").unwrap();

        db.merge(&path, doc(json!({"aries": {"main": "x"}, "taurus": {"main": "y"}})))
            .await
            .unwrap();
        db.merge(&path, doc(json!({"taurus": {"main": "y2"}, "gemini": {"main": "z"}})))
            .await
            .unwrap();

        let fetched = db.get(&path).await.unwrap().unwrap();
        assert_eq!(fetched["aries"]["main"], "x");
        assert_eq!(fetched["taurus"]["main"], "y2");
        assert_eq!(fetched["gemini"]["main"], "z");
    }

    #[tokio::test]
    async fn test_list_children() {
        let db = test_db().await;
        for path in [
            "horoscopes/daily/2024-03-14/es",
            "horoscopes/daily/2024-03-15/es",
            "horoscopes/daily/2024-03-15/en",
            "horoscopes/weekly/2024-11/es",
        ] {
            db.set(&DocPath::parse(path).unwrap(), Document::new())
                .await
                .unwrap();
        }

        let daily = DocPath::parse("horoscopes/daily").unwrap();
        assert_eq!(
            db.list_children(&daily).await.unwrap(),
            vec!["2024-03-14", "2024-03-15"]
        );

        let day = DocPath::parse("horoscopes/daily/2024-03-15").unwrap();
        assert_eq!(db.list_children(&day).await.unwrap(), vec!["en", "es"]);

        let root = DocPath::parse("horoscopes").unwrap();
        assert_eq!(db.list_children(&root).await.unwrap(), vec!["daily", "weekly"]);
    }

    #[tokio::test]
    async fn test_compare_and_set() {
        let db = test_db().await;
        let path = DocPath::parse("horoscopes/leases/daily/2024-03-15/es").unwrap();
        let first = doc(json!({"holder": "a"}));
        let second = doc(json!({"holder": "b"}));

        // Create-if-absent succeeds once
        assert!(db.compare_and_set(&path, None, first.clone()).await.unwrap());
        assert!(!db.compare_and_set(&path, None, second.clone()).await.unwrap());

        // Swap only against the current value
        assert!(!db
            .compare_and_set(&path, Some(&second), first.clone())
            .await
            .unwrap());
        assert!(db
            .compare_and_set(&path, Some(&first), second.clone())
            .await
            .unwrap());
        assert_eq!(db.get(&path).await.unwrap().unwrap(), second);
    }
}

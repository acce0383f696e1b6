//! Document CRUD operations against SQLite.
//!
//! Documents live in a single `documents` table keyed by their slash-joined
//! path. Every write bumps `version`, which backs [`replace_if_equal`].

use std::collections::BTreeSet;

use sqlx::SqlitePool;

use crate::error::{Result, StoreError};
use crate::path::DocPath;
use crate::Document;

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    data: String,
    version: i64,
}

fn decode(path: &DocPath, data: &str) -> Result<Document> {
    match serde_json::from_str(data)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject {
            path: path.to_string(),
        }),
    }
}

async fn fetch_row(pool: &SqlitePool, path: &DocPath) -> Result<Option<DocumentRow>> {
    let row = sqlx::query_as::<_, DocumentRow>(
        r#"
        SELECT data, version
        FROM documents
        WHERE path = ?
        "#,
    )
    .bind(path.to_string())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Get the document at a path.
pub async fn get_document(pool: &SqlitePool, path: &DocPath) -> Result<Option<Document>> {
    match fetch_row(pool, path).await? {
        Some(row) => Ok(Some(decode(path, &row.data)?)),
        None => Ok(None),
    }
}

/// Check whether a document exists at a path.
pub async fn document_exists(pool: &SqlitePool, path: &DocPath) -> Result<bool> {
    let count: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM documents WHERE path = ?
        "#,
    )
    .bind(path.to_string())
    .fetch_one(pool)
    .await?;

    Ok(count.0 > 0)
}

/// Replace (or create) the document at a path.
pub async fn set_document(pool: &SqlitePool, path: &DocPath, doc: &Document) -> Result<()> {
    let data = serde_json::to_string(doc)?;

    sqlx::query(
        r#"
        INSERT INTO documents (path, data)
        VALUES (?1, ?2)
        ON CONFLICT(path) DO UPDATE SET
            data = excluded.data,
            version = documents.version + 1,
            updated_at = datetime('now')
        "#,
    )
    .bind(path.to_string())
    .bind(data)
    .execute(pool)
    .await?;

    Ok(())
}

/// Merge a patch into the document at a path, creating it if absent.
///
/// The merge runs inside SQLite with `json_patch`, so concurrent merges to
/// the same path never lose each other's keys.
pub async fn merge_document(pool: &SqlitePool, path: &DocPath, patch: &Document) -> Result<()> {
    let data = serde_json::to_string(patch)?;

    sqlx::query(
        r#"
        INSERT INTO documents (path, data)
        VALUES (?1, json_patch('{}', ?2))
        ON CONFLICT(path) DO UPDATE SET
            data = json_patch(documents.data, excluded.data),
            version = documents.version + 1,
            updated_at = datetime('now')
        "#,
    )
    .bind(path.to_string())
    .bind(data)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete the document at a path. Returns whether a row was removed.
pub async fn delete_document(pool: &SqlitePool, path: &DocPath) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM documents WHERE path = ?
        "#,
    )
    .bind(path.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// List the distinct segments directly below a parent path.
pub async fn list_children(pool: &SqlitePool, parent: &DocPath) -> Result<Vec<String>> {
    let prefix = parent.descendant_prefix();

    let paths: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT path
        FROM documents
        WHERE substr(path, 1, length(?1)) = ?1
        "#,
    )
    .bind(&prefix)
    .fetch_all(pool)
    .await?;

    let children: BTreeSet<String> = paths
        .iter()
        .filter_map(|(path,)| parent.child_segment_of(path))
        .map(str::to_string)
        .collect();

    Ok(children.into_iter().collect())
}

/// Create the document only if nothing exists at the path yet.
pub async fn insert_if_absent(pool: &SqlitePool, path: &DocPath, doc: &Document) -> Result<bool> {
    let data = serde_json::to_string(doc)?;

    let result = sqlx::query(
        r#"
        INSERT INTO documents (path, data)
        VALUES (?1, ?2)
        ON CONFLICT(path) DO NOTHING
        "#,
    )
    .bind(path.to_string())
    .bind(data)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Replace the document only if its stored content equals `expected`.
///
/// Content is compared as parsed JSON; the update itself is guarded by the
/// row version read alongside it, so an interleaved write makes it fail.
pub async fn replace_if_equal(
    pool: &SqlitePool,
    path: &DocPath,
    expected: &Document,
    doc: &Document,
) -> Result<bool> {
    let Some(row) = fetch_row(pool, path).await? else {
        return Ok(false);
    };
    if &decode(path, &row.data)? != expected {
        return Ok(false);
    }

    let data = serde_json::to_string(doc)?;
    let result = sqlx::query(
        r#"
        UPDATE documents
        SET data = ?1, version = version + 1, updated_at = datetime('now')
        WHERE path = ?2 AND version = ?3
        "#,
    )
    .bind(data)
    .bind(path.to_string())
    .bind(row.version)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

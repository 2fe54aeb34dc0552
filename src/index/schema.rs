//! # Index Schema Module
//!
//! This module creates the single `pages` table backing the page index.
//!
//! ## Schema Design
//!
//! One row per crawled page, keyed by the normalized URL. The `UNIQUE`
//! constraint on `url` is what makes concurrent inserts of the same page
//! safe: the storage layer rejects the second row, the application never
//! performs a check-then-insert.

use crate::index::error::DbError;
use libsql::{Connection, params};

/// Initialize the database schema
pub async fn initialize_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS pages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            crawled_at INTEGER NOT NULL
        )",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create pages table: {}", e)))?;

    // Title search scans this column with LIKE
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_pages_title ON pages(title)",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create index on pages title: {}", e)))?;

    Ok(())
}

//! Page index module
//!
//! This module owns the persistent record of every URL the crawler has
//! successfully fetched. It is the sole source of crawl-dedup truth across
//! runs: a URL present here is never fetched again.

mod database;
pub mod error;
mod schema;

pub use database::Store;
pub use error::DbError;

use serde::{Deserialize, Serialize};

/// Represents a crawled page in the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// ID of the page
    pub id: i64,

    /// Normalized URL of the page, unique across the index
    pub url: String,

    /// Title of the page
    pub title: String,

    /// Unix timestamp of the first successful fetch
    pub crawled_at: i64,
}

/// Outcome of a unique insert into the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new record was written
    Inserted,

    /// The URL was already indexed; the stored title is left untouched
    AlreadyExists,
}

//! # Keyword Search Module
//!
//! This module is the read-only face of the page index for reporting
//! consumers: substring search over page titles (and optionally URLs), plus
//! the page counter. It never writes to the index.
//!
//! ## Key Components
//!
//! - `SearchOptions`: Result limit and whether URLs are matched too
//! - `SearchResult`: A matching page's URL and title
//! - `search_pages`: Runs a query against a `Store`

mod error;

pub use error::SearchError;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::index::{PageRecord, Store};

/// Options for search queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Maximum number of results to return
    pub limit: usize,

    /// Also match the query against page URLs
    pub match_urls: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 15,
            match_urls: false,
        }
    }
}

/// Search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// URL of the page
    pub url: String,

    /// Title of the page
    pub title: String,
}

impl From<PageRecord> for SearchResult {
    fn from(record: PageRecord) -> Self {
        Self {
            url: record.url,
            title: record.title,
        }
    }
}

/// Find pages whose title (or URL, if enabled) contains `query`
///
/// The query is matched literally: `%` and `_` are not wildcards.
pub async fn search_pages(
    store: &Store,
    query: &str,
    options: SearchOptions,
) -> Result<Vec<SearchResult>, SearchError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(SearchError::InvalidParameters(
            "query must not be empty".to_string(),
        ));
    }
    if options.limit == 0 {
        return Err(SearchError::InvalidParameters(
            "limit must be at least 1".to_string(),
        ));
    }

    let pattern = format!("%{}%", escape_like(query));
    debug!("Searching pages with pattern {}", pattern);

    let pages = store
        .find_pages(&pattern, options.match_urls, options.limit)
        .await?;

    Ok(pages.into_iter().map(SearchResult::from).collect())
}

/// Number of indexed pages
pub async fn page_count(store: &Store) -> Result<i64, SearchError> {
    Ok(store.count().await?)
}

fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

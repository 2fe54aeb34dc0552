//! Error types for the crawler module

use crate::crawler::normalizer::NormalizeError;
use crate::error::Error as CrateError;
use crate::index::DbError;
use thiserror::Error;

/// Error type for crawler operations that abort a crawl invocation
#[derive(Debug, Error)]
pub enum CrawlError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTML parsing error
    #[error("HTML parsing error: {0}")]
    HtmlParse(String),

    /// The seed URL cannot be crawled
    #[error("Invalid seed URL: {0}")]
    InvalidSeed(#[from] NormalizeError),

    /// The index is unavailable, so dedup can no longer be guaranteed
    #[error("Index error: {0}")]
    Store(#[from] DbError),
}

impl From<CrawlError> for CrateError {
    fn from(err: CrawlError) -> Self {
        match err {
            CrawlError::Http(e) => CrateError::Http(e),
            CrawlError::Store(e) => e.into(),
            _ => CrateError::Crawl(err.to_string()),
        }
    }
}

/// Why a single page could not be fetched
///
/// Fetch failures are routine: the engine logs them and moves on to the next
/// frontier item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    /// Request timed out
    #[error("request timed out")]
    Timeout,

    /// Server answered with a non-success status
    #[error("HTTP {0}")]
    Status(u16),

    /// Could not connect (DNS, refused, unreachable)
    #[error("connection failed: {0}")]
    Connect(String),

    /// Redirect policy gave up (loop or too many hops)
    #[error("too many redirects")]
    Redirect,

    /// Response body could not be read
    #[error("failed to read body: {0}")]
    Body(String),

    /// Any other request error
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for FetchFailure {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchFailure::Timeout
        } else if error.is_redirect() {
            FetchFailure::Redirect
        } else if error.is_connect() {
            FetchFailure::Connect(error.to_string())
        } else if error.is_body() || error.is_decode() {
            FetchFailure::Body(error.to_string())
        } else if let Some(status) = error.status() {
            FetchFailure::Status(status.as_u16())
        } else {
            FetchFailure::Request(error.to_string())
        }
    }
}

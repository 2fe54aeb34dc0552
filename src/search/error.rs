//! # Search Error Types Module
//!
//! Errors raised while answering keyword queries against the page index.

use thiserror::Error;

use crate::error::Error as CrateError;
use crate::index::DbError;

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    /// Error occurred during database operations
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Invalid search parameters
    #[error("Invalid search parameters: {0}")]
    InvalidParameters(String),
}

impl From<SearchError> for CrateError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidParameters(msg) => CrateError::InvalidRequest(msg),
            SearchError::Database(e) => CrateError::Search(e.to_string()),
        }
    }
}

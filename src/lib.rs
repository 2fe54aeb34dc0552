//! # JASE - Just Another Search Engine
//!
//! This crate crawls the web breadth-first from seed URLs, records each page's
//! title in a persistent index, and answers keyword searches over that index.
//! URLs already in the index are never fetched again, across runs.
//!
//! ## Features
//!
//! - Depth-bounded breadth-first crawling with per-run and persistent dedup
//! - URL normalization (relative, protocol-relative and fragment links)
//! - Bounded per-request timeouts, a concurrency cap and a politeness delay
//! - Fetch failures are logged and skipped, never fatal
//! - Cancellation that stops the crawl cleanly
//! - A LibSQL-backed index with a unique constraint on the page URL
//! - Title/URL substring search for reporting consumers
//!
//! ## Example
//!
//! ```rust,no_run
//! use jase::crawler::{CrawlEngine, CrawlerConfig};
//! use jase::index::Store;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Store::open("websites.db").await?;
//!     let config = CrawlerConfig::builder().max_depth(1).build();
//!     let engine = CrawlEngine::new(store, config)?;
//!
//!     let report = engine.crawl("https://www.rust-lang.org").await?;
//!     println!("Stored {} new pages", report.pages_stored);
//!     Ok(())
//! }
//! ```

mod error;

pub mod crawler;
pub mod index;
pub mod search;

pub use error::{Error, Result};

/// Re-export of commonly used types
pub mod prelude {
    pub use crate::crawler::{CrawlEngine, CrawlReport, CrawlerConfig, SeedRequest};
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::index::Store;
}

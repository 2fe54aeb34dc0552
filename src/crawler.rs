//! # Breadth-First Crawler Module
//!
//! This module drives the crawl: it resolves and canonicalizes links, fetches
//! pages with a bounded timeout, and walks the link graph breadth-first from
//! a seed down to a fixed depth, persisting every fetched page to the index.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: Depth, politeness, timeout and concurrency settings
//! - `CrawlEngine`: The breadth-first traversal over a `Frontier`
//! - `Fetcher`: Retrieves a page body and title; `HttpFetcher` is the reqwest implementation
//! - `normalize`: Turns a raw `href` into a comparable absolute URL
//! - `PageParser`: Title and anchor extraction over a parsed document
//! - `SeedRequest`: A seed URL plus its depth, loaded from a JSON seed file
//!
//! ## Depth Semantics
//!
//! Depth is counted as *remaining* hops. The seed is queued with the full
//! depth, each child with one less, and a page fetched with zero remaining
//! depth is stored but its links are not followed. Depth 0 therefore fetches
//! the seed alone; depth 1 fetches the seed and the pages it links to.
//!
//! ## Known Limitation
//!
//! Normalization drops the query string and fragment, so pages addressed only
//! by their query string collapse into one crawl target.

mod config;
pub mod content_extraction;
mod engine;
mod error;
pub mod fetcher;
mod frontier;
pub mod normalizer;
pub mod seeds;

pub use config::{CrawlerConfig, CrawlerConfigBuilder};
pub use content_extraction::PageParser;
pub use engine::{CrawlEngine, CrawlReport};
pub use error::{CrawlError, FetchFailure};
pub use fetcher::{FetchedPage, Fetcher, HttpFetcher, RateLimitedFetcher};
pub use frontier::{Frontier, FrontierItem};
pub use normalizer::normalize;
pub use seeds::SeedRequest;

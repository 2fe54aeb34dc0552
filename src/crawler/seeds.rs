//! Seed configuration loading
//!
//! Seeds are read once at startup from a JSON array such as
//!
//! ```json
//! [
//!   { "url": "https://www.rust-lang.org", "depth": 2 },
//!   { "url": "https://docs.rs" }
//! ]
//! ```
//!
//! `depth` defaults to 1. Entries without a usable `url` are skipped.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// Depth applied to seeds that do not specify one
pub const DEFAULT_SEED_DEPTH: u32 = 1;

/// A seed URL and the depth to crawl it to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedRequest {
    pub url: String,
    pub depth: u32,
}

#[derive(Debug, Deserialize)]
struct SeedEntry {
    url: Option<String>,
    depth: Option<u32>,
}

/// Parse a JSON seed list, keeping file order
pub fn parse_seeds(json: &str) -> Result<Vec<SeedRequest>> {
    let entries: Vec<SeedEntry> = serde_json::from_str(json)?;

    let seeds = entries
        .into_iter()
        .enumerate()
        .filter_map(|(position, entry)| match entry.url {
            Some(url) if !url.trim().is_empty() => Some(SeedRequest {
                url: url.trim().to_string(),
                depth: entry.depth.unwrap_or(DEFAULT_SEED_DEPTH),
            }),
            _ => {
                warn!("Skipping seed entry {} without a url", position + 1);
                None
            }
        })
        .collect();

    Ok(seeds)
}

/// Read and parse a JSON seed file
pub async fn load_seeds(path: impl AsRef<Path>) -> Result<Vec<SeedRequest>> {
    let content = tokio::fs::read_to_string(path).await?;
    parse_seeds(&content)
}

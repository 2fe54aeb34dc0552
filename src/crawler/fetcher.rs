//! Page fetching for the crawler
//!
//! A fetch either yields the page body and title or a [`FetchFailure`]. It
//! never aborts the crawl: timeouts, unreachable hosts and error statuses are
//! ordinary values the engine logs and skips.

use std::future::Future;
use std::sync::Arc;

use governor::DefaultDirectRateLimiter;
use reqwest::Client;
use tracing::{Instrument, debug, debug_span};
use url::Url;

use crate::crawler::config::CrawlerConfig;
use crate::crawler::content_extraction::{self, PageParser};
use crate::crawler::error::{CrawlError, FetchFailure};

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Raw HTML body
    pub html: String,

    /// Text of the first `<title>`, or "No Title"
    pub title: String,
}

/// Something that can retrieve a page
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchedPage, FetchFailure>> + Send;
}

/// Fetcher backed by a reqwest client with a per-request timeout
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    parser: PageParser,
}

impl HttpFetcher {
    /// Create a fetcher using the timeout and user agent from `config`
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            parser: PageParser::new()?,
        })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchFailure> {
        debug!("Fetching {}", url);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        // Timeouts cover the body too, so a stalled body is a timeout
        let html = response.text().await?;
        let title = content_extraction::extract_title(&self.parser, &html);

        Ok(FetchedPage { html, title })
    }
}

/// Wraps a fetcher so request starts are spaced by a politeness interval
#[derive(Clone)]
pub struct RateLimitedFetcher<F> {
    inner: F,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl<F: Fetcher> RateLimitedFetcher<F> {
    /// Wrap `inner`; `None` passes requests straight through
    pub fn new(inner: F, limiter: Option<DefaultDirectRateLimiter>) -> Self {
        Self {
            inner,
            limiter: limiter.map(Arc::new),
        }
    }
}

impl<F: Fetcher> Fetcher for RateLimitedFetcher<F> {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchFailure> {
        if let Some(limiter) = &self.limiter {
            limiter
                .until_ready()
                .instrument(debug_span!("politeness"))
                .await;
        }
        self.inner.fetch(url).await
    }
}

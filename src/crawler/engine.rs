//! Breadth-first crawl engine
//!
//! One invocation walks the link graph from a single seed:
//!
//! 1. The seed is queued with the full depth and a fresh visited set.
//! 2. The frontier is drained one depth level at a time. Each URL is claimed
//!    in the visited set exactly once and skipped if the index already has it.
//! 3. Claimed URLs are fetched concurrently (bounded by the configured cap),
//!    but results are consumed in frontier order, so pages reach the index
//!    in breadth-first order.
//! 4. Fetch failures are logged and skipped. The page is stored otherwise,
//!    and, while depth remains, its links are normalized and queued one level
//!    down unless already visited or indexed.
//! 5. The invocation ends when the frontier is empty or cancellation is
//!    requested. Only an index failure aborts it.

use std::collections::HashSet;
use std::ops::AddAssign;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};
use url::Url;

use crate::crawler::config::CrawlerConfig;
use crate::crawler::content_extraction::{self, PageParser};
use crate::crawler::error::{CrawlError, FetchFailure};
use crate::crawler::fetcher::{FetchedPage, Fetcher, HttpFetcher, RateLimitedFetcher};
use crate::crawler::frontier::{Frontier, FrontierItem};
use crate::crawler::normalizer::{normalize, normalize_absolute};
use crate::crawler::seeds::SeedRequest;
use crate::index::{InsertOutcome, Store};

/// Counters describing what a crawl did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlReport {
    /// Pages fetched successfully
    pub fetched: usize,

    /// Pages newly written to the index
    pub pages_stored: usize,

    /// URLs skipped or not written because the index already had them
    pub already_stored: usize,

    /// URLs whose fetch failed
    pub fetch_failures: usize,

    /// Links dropped because they could not be normalized
    pub invalid_links: usize,

    /// Seeds skipped because they could not be normalized
    pub invalid_seeds: usize,

    /// Whether the crawl stopped early on cancellation
    pub cancelled: bool,
}

impl AddAssign for CrawlReport {
    fn add_assign(&mut self, other: Self) {
        self.fetched += other.fetched;
        self.pages_stored += other.pages_stored;
        self.already_stored += other.already_stored;
        self.fetch_failures += other.fetch_failures;
        self.invalid_links += other.invalid_links;
        self.invalid_seeds += other.invalid_seeds;
        self.cancelled |= other.cancelled;
    }
}

/// Drives breadth-first crawls into a [`Store`]
pub struct CrawlEngine<F> {
    fetcher: F,
    store: Store,
    parser: PageParser,
    config: CrawlerConfig,
}

impl CrawlEngine<RateLimitedFetcher<HttpFetcher>> {
    /// Create an engine with an HTTP fetcher spaced by the configured politeness delay
    pub fn new(store: Store, config: CrawlerConfig) -> Result<Self, CrawlError> {
        let fetcher = RateLimitedFetcher::new(HttpFetcher::new(&config)?, config.politeness_limiter());
        Self::with_fetcher(store, fetcher, config)
    }
}

impl<F: Fetcher> CrawlEngine<F> {
    /// Create an engine around any fetcher
    pub fn with_fetcher(store: Store, fetcher: F, config: CrawlerConfig) -> Result<Self, CrawlError> {
        Ok(Self {
            fetcher,
            store,
            parser: PageParser::new()?,
            config,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Crawl from `seed` to the configured depth and run until the frontier is empty
    pub async fn crawl(&self, seed: &str) -> Result<CrawlReport, CrawlError> {
        self.crawl_with_cancellation(seed, self.config.max_depth, &CancellationToken::new())
            .await
    }

    /// Crawl from `seed`, stopping early once `cancel` fires
    ///
    /// On cancellation no further frontier items are popped and fetches of
    /// the current level that have not completed are dropped. The partial
    /// report is returned with `cancelled` set.
    #[instrument(skip(self, cancel))]
    pub async fn crawl_with_cancellation(
        &self,
        seed: &str,
        max_depth: u32,
        cancel: &CancellationToken,
    ) -> Result<CrawlReport, CrawlError> {
        let seed = normalize_absolute(seed)?;
        info!("Starting crawl of {} to depth {}", seed, max_depth);

        let mut report = CrawlReport::default();
        let mut visited: HashSet<Url> = HashSet::new();
        let mut frontier = Frontier::new();
        frontier.push(FrontierItem::new(seed, max_depth));

        while !frontier.is_empty() {
            if cancel.is_cancelled() {
                break;
            }

            let mut claimed = Vec::new();
            for item in frontier.pop_level() {
                if !visited.insert(item.url.clone()) {
                    debug!("Already visited this run: {}", item.url);
                    continue;
                }
                if self.store.exists(item.url.as_str()).await? {
                    debug!("Already indexed: {}", item.url);
                    report.already_stored += 1;
                    continue;
                }
                claimed.push(item);
            }

            let fetcher = &self.fetcher;
            let mut fetches = std::pin::pin!(
                stream::iter(claimed)
                    .map(|item| async move {
                        let result = fetcher.fetch(&item.url).await;
                        (item, result)
                    })
                    .buffered(self.config.concurrency_limit().get())
            );

            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    next = fetches.next() => next,
                };
                let Some((item, result)) = next else {
                    break;
                };
                self.record_page(item, result, &visited, &mut frontier, &mut report)
                    .await?;
            }
        }

        if cancel.is_cancelled() {
            warn!("Crawl cancelled with {} URLs left in the frontier", frontier.len());
            report.cancelled = true;
        }

        info!(
            "Crawl finished: {} fetched, {} stored, {} failed",
            report.fetched, report.pages_stored, report.fetch_failures
        );
        Ok(report)
    }

    /// Crawl each seed in order as its own invocation and sum the reports
    ///
    /// Seeds that cannot be normalized are skipped with a warning.
    pub async fn crawl_seeds(
        &self,
        seeds: &[SeedRequest],
        cancel: &CancellationToken,
    ) -> Result<CrawlReport, CrawlError> {
        let mut total = CrawlReport::default();

        for seed in seeds {
            if cancel.is_cancelled() {
                total.cancelled = true;
                break;
            }

            match self
                .crawl_with_cancellation(&seed.url, seed.depth, cancel)
                .await
            {
                Ok(report) => total += report,
                Err(CrawlError::InvalidSeed(e)) => {
                    warn!("Skipping seed {}: {}", seed.url, e);
                    total.invalid_seeds += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(total)
    }

    /// Store a fetched page and queue its children
    async fn record_page(
        &self,
        item: FrontierItem,
        result: Result<FetchedPage, FetchFailure>,
        visited: &HashSet<Url>,
        frontier: &mut Frontier,
        report: &mut CrawlReport,
    ) -> Result<(), CrawlError> {
        let page = match result {
            Ok(page) => page,
            Err(failure) => {
                warn!(url = %item.url, reason = %failure, "Failed to fetch page");
                report.fetch_failures += 1;
                return Ok(());
            }
        };

        report.fetched += 1;
        info!(
            "Crawled {} ({} hops left): {}",
            item.url, item.depth_remaining, page.title
        );

        match self.store.insert(item.url.as_str(), &page.title).await? {
            InsertOutcome::Inserted => report.pages_stored += 1,
            InsertOutcome::AlreadyExists => report.already_stored += 1,
        }

        if item.depth_remaining == 0 {
            return Ok(());
        }

        let child_depth = item.depth_remaining - 1;
        for href in content_extraction::extract_links(&self.parser, &page.html) {
            let url = match normalize(&item.url, &href) {
                Ok(url) => url,
                Err(e) => {
                    trace!("Dropping link on {}: {}", item.url, e);
                    report.invalid_links += 1;
                    continue;
                }
            };

            if visited.contains(&url) || self.store.exists(url.as_str()).await? {
                continue;
            }
            frontier.push(FrontierItem::new(url, child_depth));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Mock, Server, ServerGuard};
    use std::io::Write;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};
    use tempfile::{TempDir, tempdir};

    async fn setup_engine(max_depth: u32) -> (CrawlEngine<HttpFetcher>, TempDir) {
        setup_engine_with_concurrency(max_depth, 4).await
    }

    async fn setup_engine_with_concurrency(
        max_depth: u32,
        concurrency: usize,
    ) -> (CrawlEngine<HttpFetcher>, TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir
            .path()
            .join("crawl.db")
            .to_string_lossy()
            .to_string();
        let store = Store::open(&db_path).await.unwrap();

        let config = CrawlerConfig::builder()
            .max_depth(max_depth)
            .rate_limit_ms(0)
            .timeout_secs(2)
            .concurrency(concurrency)
            .build();
        let fetcher = HttpFetcher::new(&config).unwrap();
        let engine = CrawlEngine::with_fetcher(store, fetcher, config).unwrap();

        (engine, temp_dir)
    }

    async fn page(server: &mut ServerGuard, path: &str, title: &str, links: &[&str], hits: usize) -> Mock {
        let anchors: String = links
            .iter()
            .map(|href| format!(r#"<a href="{}">link</a>"#, href))
            .collect();
        server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(format!(
                "<html><head><title>{}</title></head><body>{}</body></html>",
                title, anchors
            ))
            .expect(hits)
            .create_async()
            .await
    }

    async fn stored_urls(store: &Store) -> Vec<String> {
        let mut urls: Vec<String> = store
            .recent(100)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.url)
            .collect();
        urls.reverse();
        urls
    }

    #[tokio::test]
    async fn test_depth_one_stores_seed_and_children_only() {
        let mut server = Server::new_async().await;
        let base = server.url();
        let page2 = format!("{}/page2", base);

        let home = page(&mut server, "/", "Home", &[&page2, "page3"], 1).await;
        let p2 = page(&mut server, "/page2", "Page 2", &["/page4"], 1).await;
        let p3 = page(&mut server, "/page3", "Page 3", &["/page4"], 1).await;
        let p4 = page(&mut server, "/page4", "Page 4", &[], 0).await;

        let (engine, _temp_dir) = setup_engine(1).await;
        let report = engine.crawl(&base).await.unwrap();

        assert_eq!(
            stored_urls(engine.store()).await,
            vec![format!("{}/", base), page2, format!("{}/page3", base)]
        );
        assert_eq!(report.pages_stored, 3);
        assert_eq!(report.fetch_failures, 0);

        let titles = engine.store().find_pages("Page _", false, 10).await.unwrap();
        assert_eq!(titles.len(), 2);

        home.assert_async().await;
        p2.assert_async().await;
        p3.assert_async().await;
        p4.assert_async().await;
    }

    #[tokio::test]
    async fn test_depth_zero_fetches_seed_only() {
        let mut server = Server::new_async().await;
        let home = page(&mut server, "/", "Home", &["/child"], 1).await;
        let child = page(&mut server, "/child", "Child", &[], 0).await;

        let (engine, _temp_dir) = setup_engine(0).await;
        let report = engine.crawl(&server.url()).await.unwrap();

        assert_eq!(report.fetched, 1);
        assert_eq!(engine.store().count().await.unwrap(), 1);
        home.assert_async().await;
        child.assert_async().await;
    }

    #[tokio::test]
    async fn test_seed_already_indexed_performs_no_fetch() {
        let mut server = Server::new_async().await;
        let home = page(&mut server, "/", "Home", &["/child"], 0).await;

        let (engine, _temp_dir) = setup_engine(2).await;
        let seed = format!("{}/", server.url());
        engine.store().insert(&seed, "Earlier").await.unwrap();

        let report = engine.crawl(&seed).await.unwrap();

        assert_eq!(report.fetched, 0);
        assert_eq!(report.already_stored, 1);
        assert_eq!(engine.store().count().await.unwrap(), 1);
        home.assert_async().await;
    }

    #[tokio::test]
    async fn test_breadth_first_insert_order() {
        let mut server = Server::new_async().await;
        page(&mut server, "/", "Root", &["/a", "/b"], 1).await;
        page(&mut server, "/a", "A", &["/c"], 1).await;
        page(&mut server, "/b", "B", &["/d"], 1).await;
        page(&mut server, "/c", "C", &[], 1).await;
        page(&mut server, "/d", "D", &[], 1).await;

        let (engine, _temp_dir) = setup_engine(2).await;
        engine.crawl(&server.url()).await.unwrap();

        let base = server.url();
        let expected: Vec<String> = ["/", "/a", "/b", "/c", "/d"]
            .iter()
            .map(|p| format!("{}{}", base, p))
            .collect();
        assert_eq!(stored_urls(engine.store()).await, expected);
    }

    #[tokio::test]
    async fn test_shared_children_fetched_once() {
        let mut server = Server::new_async().await;
        page(&mut server, "/", "Root", &["/x", "/x?ref=1", "/y", "/x#top"], 1).await;
        page(&mut server, "/y", "Y", &["/x", "/"], 1).await;
        let x = page(&mut server, "/x", "X", &["/y"], 1).await;

        let (engine, _temp_dir) = setup_engine(3).await;
        let report = engine.crawl(&server.url()).await.unwrap();

        assert_eq!(report.fetched, 3);
        assert_eq!(engine.store().count().await.unwrap(), 3);
        x.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_host_does_not_stop_crawl() {
        let mut server = Server::new_async().await;
        page(
            &mut server,
            "/",
            "Root",
            &["http://127.0.0.1:1/dead", "/missing", "/alive"],
            1,
        )
        .await;
        server
            .mock("GET", "/missing")
            .with_status(500)
            .create_async()
            .await;
        let alive = page(&mut server, "/alive", "Alive", &[], 1).await;

        let (engine, _temp_dir) = setup_engine(1).await;
        let report = engine.crawl(&server.url()).await.unwrap();

        assert_eq!(report.fetch_failures, 2);
        assert_eq!(report.pages_stored, 2);
        assert!(
            engine
                .store()
                .exists(&format!("{}/alive", server.url()))
                .await
                .unwrap()
        );
        // Failed URLs stay eligible for later runs
        assert!(!engine.store().exists("http://127.0.0.1:1/dead").await.unwrap());
        alive.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_links_are_dropped() {
        let mut server = Server::new_async().await;
        page(
            &mut server,
            "/",
            "Root",
            &["mailto:someone@a.test", "javascript:void(0)", "/ok"],
            1,
        )
        .await;
        page(&mut server, "/ok", "Ok", &[], 1).await;

        let (engine, _temp_dir) = setup_engine(1).await;
        let report = engine.crawl(&server.url()).await.unwrap();

        assert_eq!(report.invalid_links, 2);
        assert_eq!(report.pages_stored, 2);
    }

    #[tokio::test]
    async fn test_invalid_seed_is_an_error() {
        let (engine, _temp_dir) = setup_engine(1).await;
        let result = engine.crawl("mailto:someone@a.test").await;
        assert!(matches!(result, Err(CrawlError::InvalidSeed(_))));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_fetches_nothing() {
        let mut server = Server::new_async().await;
        let home = page(&mut server, "/", "Home", &[], 0).await;

        let (engine, _temp_dir) = setup_engine(0).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = engine
            .crawl_with_cancellation(&server.url(), 1, &cancel)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.fetched, 0);
        home.assert_async().await;
    }

    #[tokio::test]
    async fn test_cancel_during_level_returns_partial_report() {
        let mut server = Server::new_async().await;
        page(&mut server, "/", "Home", &["/slow", "/fast"], 1).await;
        server
            .mock("GET", "/slow")
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_secs(5));
                w.write_all(b"<title>Slow</title>")
            })
            .create_async()
            .await;
        page(&mut server, "/fast", "Fast", &[], 1).await;

        let (engine, _temp_dir) = setup_engine(1).await;
        let cancel = CancellationToken::new();
        tokio::spawn({
            let cancel = cancel.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(300)).await;
                cancel.cancel();
            }
        });

        let start = Instant::now();
        let report = engine
            .crawl_with_cancellation(&server.url(), 1, &cancel)
            .await
            .unwrap();

        assert!(start.elapsed() < Duration::from_millis(1500));
        assert!(report.cancelled);
        assert_eq!(report.fetched, 1);
        assert_eq!(report.pages_stored, 1);
        assert_eq!(
            stored_urls(engine.store()).await,
            vec![format!("{}/", server.url())]
        );
    }

    #[tokio::test]
    async fn test_concurrency_one_fetches_serially() {
        let mut server = Server::new_async().await;
        page(&mut server, "/", "Root", &["/c0", "/c1", "/c2"], 1).await;

        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        for path in ["/c0", "/c1", "/c2"] {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            server
                .mock("GET", path)
                .with_status(200)
                .with_chunked_body(move |w| {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(100));
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    w.write_all(b"<title>Child</title>")
                })
                .expect(1)
                .create_async()
                .await;
        }

        let (engine, _temp_dir) = setup_engine_with_concurrency(1, 1).await;
        let report = engine.crawl(&server.url()).await.unwrap();

        assert_eq!(report.fetched, 4);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_crawl_seeds_sums_reports() {
        let mut server = Server::new_async().await;
        page(&mut server, "/s1", "Seed 1", &["/shared"], 1).await;
        page(&mut server, "/s2", "Seed 2", &["/shared"], 1).await;
        let shared = page(&mut server, "/shared", "Shared", &[], 1).await;

        let base = server.url();
        let seeds = vec![
            SeedRequest {
                url: format!("{}/s1", base),
                depth: 1,
            },
            SeedRequest {
                url: "not a url".to_string(),
                depth: 1,
            },
            SeedRequest {
                url: format!("{}/s2", base),
                depth: 1,
            },
            SeedRequest {
                url: format!("{}/s1", base),
                depth: 1,
            },
        ];

        let (engine, _temp_dir) = setup_engine(0).await;
        let report = engine
            .crawl_seeds(&seeds, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.fetched, 3);
        assert_eq!(report.pages_stored, 3);
        assert_eq!(report.invalid_seeds, 1);
        assert_eq!(engine.store().count().await.unwrap(), 3);
        shared.assert_async().await;
    }

    #[test]
    fn test_report_add_assign() {
        let mut total = CrawlReport {
            fetched: 1,
            pages_stored: 1,
            ..Default::default()
        };
        total += CrawlReport {
            fetched: 2,
            fetch_failures: 1,
            cancelled: true,
            ..Default::default()
        };

        assert_eq!(total.fetched, 3);
        assert_eq!(total.pages_stored, 1);
        assert_eq!(total.fetch_failures, 1);
        assert!(total.cancelled);
    }
}

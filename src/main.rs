//! # JASE CLI Application
//!
//! Command-line front end for the crawler and its page index.
//!
//! ## Subcommands
//!
//! - `crawl`: Crawl breadth-first from one URL
//! - `seeds`: Crawl every seed listed in a JSON seed file (or one picked seed)
//! - `search`: Keyword search over indexed page titles
//! - `count`: Number of indexed pages
//! - `list`: Most recently indexed pages
//!
//! Ctrl-C stops a running crawl cleanly; pages stored so far are kept.

mod telemetry;

use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use jase::crawler::{CrawlEngine, CrawlReport, CrawlerConfig, seeds};
use jase::index::Store;
use jase::search::{SearchOptions, page_count, search_pages};
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

#[derive(Parser)]
#[command(author, version, about = "Just Another Search Engine: crawl the web and search page titles", long_about = None)]
struct Cli {
    /// Database path
    #[arg(long, global = true, default_value = "websites.db")]
    database: PathBuf,

    /// Also write logs to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl breadth-first from a URL
    Crawl(CrawlArgs),

    /// Crawl the seeds listed in a JSON seed file
    Seeds(SeedsArgs),

    /// Search indexed page titles
    Search(SearchArgs),

    /// Show the number of indexed pages
    Count,

    /// List the most recently indexed pages
    List(ListArgs),
}

#[derive(Args, Debug)]
struct CrawlOptions {
    /// Politeness delay between requests in milliseconds
    #[arg(short, long, default_value = "100")]
    rate: u64,

    /// Per-request timeout in seconds
    #[arg(short, long, default_value = "5")]
    timeout: u64,

    /// Maximum concurrent fetches within one depth level
    #[arg(short, long, default_value = "8")]
    concurrency: usize,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// URL to crawl
    #[arg(required = true)]
    url: String,

    /// Crawl depth (0 fetches only the URL itself)
    #[arg(short, long, default_value = "2")]
    depth: u32,

    #[command(flatten)]
    options: CrawlOptions,
}

#[derive(Args, Debug)]
struct SeedsArgs {
    /// JSON seed file
    #[arg(default_value = "websites.json")]
    file: PathBuf,

    /// Print the numbered seeds and exit
    #[arg(short, long)]
    list: bool,

    /// Crawl only the seed with this number (as shown by --list)
    #[arg(short, long)]
    pick: Option<usize>,

    #[command(flatten)]
    options: CrawlOptions,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Search query
    #[arg(required = true)]
    query: String,

    /// Match URLs as well as titles
    #[arg(short, long)]
    urls: bool,

    /// Limit results
    #[arg(short, long, default_value = "15")]
    limit: usize,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Number of pages to show
    #[arg(short, long, default_value = "20")]
    limit: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing_subscriber(cli.log_dir.as_deref())?;

    let store = open_store(&cli.database).await?;

    match cli.command {
        Commands::Crawl(args) => crawl_command(store, args).await?,
        Commands::Seeds(args) => seeds_command(store, args).await?,
        Commands::Search(args) => search_command(store, args).await?,
        Commands::Count => {
            println!("{} pages indexed", page_count(&store).await?);
        }
        Commands::List(args) => list_command(store, args).await?,
    }

    Ok(())
}

async fn open_store(path: &std::path::Path) -> anyhow::Result<Store> {
    let path = path
        .to_str()
        .with_context(|| format!("database path is not valid UTF-8: {}", path.display()))?;
    Ok(Store::open(path).await?)
}

fn crawler_config(options: &CrawlOptions, depth: u32) -> CrawlerConfig {
    CrawlerConfig::builder()
        .max_depth(depth)
        .rate_limit_ms(options.rate)
        .timeout_secs(options.timeout)
        .concurrency(options.concurrency)
        .build()
}

/// Cancel the returned token when Ctrl-C is pressed
fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping crawl");
                cancel.cancel();
            }
        }
    });
    cancel
}

#[instrument(skip(store))]
async fn crawl_command(store: Store, args: CrawlArgs) -> anyhow::Result<()> {
    println!("Crawling {} to depth {}...", args.url, args.depth);

    let config = crawler_config(&args.options, args.depth);
    let engine = CrawlEngine::new(store, config)?;

    let cancel = cancel_on_interrupt();
    let report = engine
        .crawl_with_cancellation(&args.url, args.depth, &cancel)
        .await?;

    print_report(&report, &args.options.format, engine.store()).await
}

#[instrument(skip(store))]
async fn seeds_command(store: Store, args: SeedsArgs) -> anyhow::Result<()> {
    let seeds = seeds::load_seeds(&args.file)
        .await
        .with_context(|| format!("failed to load seeds from {}", args.file.display()))?;

    if args.list {
        for (i, seed) in seeds.iter().enumerate() {
            println!("{}. {} (Depth: {})", i + 1, seed.url, seed.depth);
        }
        return Ok(());
    }

    let selected = match args.pick {
        Some(n) if n >= 1 && n <= seeds.len() => vec![seeds[n - 1].clone()],
        Some(n) => bail!("no seed number {} (file has {} seeds)", n, seeds.len()),
        None => seeds,
    };

    println!("Crawling {} seed(s) from {}...", selected.len(), args.file.display());

    // Each seed carries its own depth
    let config = crawler_config(&args.options, seeds::DEFAULT_SEED_DEPTH);
    let engine = CrawlEngine::new(store, config)?;

    let cancel = cancel_on_interrupt();
    let report = engine.crawl_seeds(&selected, &cancel).await?;

    print_report(&report, &args.options.format, engine.store()).await
}

async fn print_report(report: &CrawlReport, format: &str, store: &Store) -> anyhow::Result<()> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        _ => {
            if report.cancelled {
                println!("Crawl cancelled");
            }
            println!(
                "Fetched {} pages: {} new, {} already indexed, {} failed",
                report.fetched, report.pages_stored, report.already_stored, report.fetch_failures
            );
            if report.invalid_links > 0 {
                println!("Dropped {} invalid links", report.invalid_links);
            }
            if report.invalid_seeds > 0 {
                println!("Skipped {} invalid seeds", report.invalid_seeds);
            }
            println!("{} pages indexed in total", store.count().await?);
        }
    }
    Ok(())
}

#[instrument(skip(store))]
async fn search_command(store: Store, args: SearchArgs) -> anyhow::Result<()> {
    let options = SearchOptions {
        limit: args.limit,
        match_urls: args.urls,
    };
    let results = search_pages(&store, &args.query, options).await?;

    match args.format.as_str() {
        "json" => {
            let json_response = serde_json::json!({
                "query": args.query,
                "results": results,
            });
            println!("{}", serde_json::to_string_pretty(&json_response)?);
        }
        _ => {
            println!("Found {} results for {:?}", results.len(), args.query);
            for (i, result) in results.iter().enumerate() {
                println!("{}. {}", i + 1, result.title);
                println!("   URL: {}", result.url);
            }
        }
    }

    Ok(())
}

#[instrument(skip(store))]
async fn list_command(store: Store, args: ListArgs) -> anyhow::Result<()> {
    let pages = store.recent(args.limit).await?;

    println!("Indexed pages: {}", store.count().await?);

    let format_timestamp = |ts: i64| -> String {
        DateTime::<Utc>::from_timestamp(ts, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| ts.to_string())
    };

    for page in pages {
        println!(
            "{} - {} (Crawled: {})",
            page.url,
            page.title,
            format_timestamp(page.crawled_at)
        );
    }

    Ok(())
}

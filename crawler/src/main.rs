use anyhow::{anyhow, Result};
use clap::Parser;
use minisearch_core::DocumentStore;
use minisearch_crawler::config::DEFAULT_USER_AGENT;
use minisearch_crawler::{CrawlConfig, Crawler, HtmlParser, HttpFetcher, HttpPolicyLoader};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "crawler")]
#[command(about = "Crawl the web into a document store, respecting robots.txt")]
struct Cli {
    /// Seed URL (repeatable)
    #[arg(long = "seed")]
    seeds: Vec<String>,
    /// Path to a file with seed URLs (one per line)
    #[arg(long)]
    seeds_file: Option<String>,
    /// Document store directory
    #[arg(long, default_value = "./search_engine.db")]
    db: String,
    /// Maximum number of documents to store
    #[arg(long, default_value_t = 50)]
    max_pages: usize,
    /// Delay before each request, in milliseconds
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,
    /// Request timeout seconds
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,
    /// User-Agent string to use for robots.txt and crawling
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
    /// Fetches in flight at once (never more than one per host)
    #[arg(long, default_value_t = 1)]
    concurrency: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Cli::parse();

    let mut seeds = args.seeds.clone();
    if let Some(path) = &args.seeds_file {
        for line in BufReader::new(File::open(path)?).lines() {
            let s = line?.trim().to_string();
            if s.is_empty() || s.starts_with('#') { continue; }
            seeds.push(s);
        }
    }
    if seeds.is_empty() {
        return Err(anyhow!("no seeds given; use --seed or --seeds-file"));
    }

    let config = CrawlConfig {
        delay: Duration::from_millis(args.delay_ms),
        timeout: Duration::from_secs(args.timeout_secs),
        user_agent: args.user_agent.clone(),
        concurrency: args.concurrency,
        ..CrawlConfig::default()
    };
    tracing::info!(
        seeds = seeds.len(),
        max_pages = args.max_pages,
        concurrency = config.concurrency,
        db = %args.db,
        "starting crawl"
    );

    let store = DocumentStore::open(&args.db)?;
    let fetcher = HttpFetcher::new(&config)?;
    let loader = HttpPolicyLoader::new(fetcher.client().clone());
    let mut crawler = Crawler::new(config, store, fetcher, HtmlParser::new(), loader);
    let stored = crawler.run(&seeds, args.max_pages).await?;

    let report = crawler.report();
    tracing::info!(
        stored,
        visited = report.visited,
        denied = report.denied,
        failed = report.failed,
        db = %args.db,
        "done"
    );
    Ok(())
}

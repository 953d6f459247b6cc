//! Breadth-first crawler: a frontier of pending URLs, a per-host robots.txt cache
//! and a coordinator that fetches, parses and stores pages until the frontier is
//! drained or the page cap is reached.

pub mod config;
pub mod coordinator;
pub mod fetch;
pub mod frontier;
pub mod parse;
pub mod policy;

pub use config::CrawlConfig;
pub use coordinator::{CrawlReport, Crawler, PageOutcome};
pub use fetch::{FetchError, FetchResponse, Fetcher, HttpFetcher};
pub use frontier::{normalize_url, Frontier};
pub use parse::{HtmlParser, PageParser, ParseError, ParsedPage};
pub use policy::{HttpPolicyLoader, Policy, PolicyCache, PolicyLoader, PolicyUnavailable};

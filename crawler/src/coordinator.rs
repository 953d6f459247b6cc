use crate::config::CrawlConfig;
use crate::fetch::{FetchError, Fetcher};
use crate::frontier::Frontier;
use crate::parse::{PageParser, ParseError, ParsedPage};
use crate::policy::{PolicyCache, PolicyLoader};
use anyhow::{Context, Result};
use minisearch_core::{DocId, DocumentStore, InsertOutcome};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::sleep;
use url::Url;

/// What happened to one dequeued URL.
#[derive(Debug)]
pub enum PageOutcome {
    Stored(DocId),
    AlreadyExists(DocId),
    Denied,
    FetchFailed(FetchError),
    ParseFailed(ParseError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrawlReport {
    pub stored: usize,
    pub duplicates: usize,
    pub denied: usize,
    pub failed: usize,
    pub visited: usize,
}

impl CrawlReport {
    fn record(&mut self, outcome: &PageOutcome) {
        match outcome {
            PageOutcome::Stored(_) => self.stored += 1,
            PageOutcome::AlreadyExists(_) => self.duplicates += 1,
            PageOutcome::Denied => self.denied += 1,
            PageOutcome::FetchFailed(_) | PageOutcome::ParseFailed(_) => self.failed += 1,
        }
    }
}

enum Fetched {
    Page { html: String, page: ParsedPage },
    FetchFailed(FetchError),
    ParseFailed(ParseError),
}

/// Owns one crawl session: frontier, visited set and robots cache all live here, so
/// independent crawlers never share state.
pub struct Crawler<F, P, L> {
    config: CrawlConfig,
    store: DocumentStore,
    fetcher: Arc<F>,
    parser: Arc<P>,
    policies: PolicyCache<L>,
    frontier: Frontier,
    report: CrawlReport,
}

impl<F: Fetcher, P: PageParser, L: PolicyLoader> Crawler<F, P, L> {
    pub fn new(config: CrawlConfig, store: DocumentStore, fetcher: F, parser: P, loader: L) -> Self {
        Self {
            config,
            store,
            fetcher: Arc::new(fetcher),
            parser: Arc::new(parser),
            policies: PolicyCache::new(loader),
            frontier: Frontier::new(),
            report: CrawlReport::default(),
        }
    }

    /// Crawl breadth-first from `seeds` until the frontier is empty or `max_pages`
    /// documents have been stored. Returns the number stored by this call.
    ///
    /// Per-URL failures are logged and skipped; only store errors abort the run.
    pub async fn run<I, S>(&mut self, seeds: I, max_pages: usize) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for seed in seeds {
            if !self.frontier.enqueue(seed.as_ref()) {
                tracing::warn!(seed = seed.as_ref(), "ignoring seed");
            }
        }
        let start = self.report.stored;
        let concurrency = self.config.concurrency.max(1);
        let mut inflight: JoinSet<(String, Url, Fetched)> = JoinSet::new();
        let mut busy_hosts: HashSet<String> = HashSet::new();
        // URLs pulled from the frontier while their host was busy, in discovery order
        let mut parked: BTreeMap<String, VecDeque<Url>> = BTreeMap::new();

        while self.report.stored - start < max_pages {
            // stored + in flight never exceeds the cap
            while inflight.len() < concurrency && self.report.stored - start + inflight.len() < max_pages {
                let Some(url) = next_candidate(&mut self.frontier, &mut parked, &busy_hosts) else { break };
                if self.frontier.is_visited(&url) {
                    tracing::debug!(%url, "already visited");
                    continue;
                }
                let host = host_key(&url);
                if busy_hosts.contains(&host) {
                    parked.entry(host).or_default().push_back(url);
                    continue;
                }
                let policy = self.policies.policy_for(&url).await;
                if !policy.allowed(&url) {
                    tracing::info!(%url, "disallowed by robots.txt");
                    self.report.record(&PageOutcome::Denied);
                    continue;
                }
                self.frontier.mark_visited(&url);
                let delay = policy.crawl_delay().map_or(self.config.delay, |d| d.max(self.config.delay));
                tracing::info!(
                    progress = self.report.stored - start + inflight.len() + 1,
                    max_pages,
                    %url,
                    "crawling"
                );
                busy_hosts.insert(host.clone());
                let fetcher = self.fetcher.clone();
                let parser = self.parser.clone();
                inflight.spawn(async move {
                    let fetched = crawl_page(fetcher.as_ref(), parser.as_ref(), &url, delay).await;
                    (host, url, fetched)
                });
            }

            let Some(joined) = inflight.join_next().await else { break };
            let (host, url, fetched) = joined.context("crawl worker panicked")?;
            busy_hosts.remove(&host);
            let outcome = self.complete(&url, fetched)?;
            self.report.record(&outcome);
        }

        self.report.visited = self.frontier.visited_count();
        self.store.flush()?;
        let stored = self.report.stored - start;
        tracing::info!(
            stored,
            duplicates = self.report.duplicates,
            denied = self.report.denied,
            failed = self.report.failed,
            pending = self.frontier.len() + parked.values().map(VecDeque::len).sum::<usize>(),
            "crawl finished"
        );
        Ok(stored)
    }

    fn complete(&mut self, url: &Url, fetched: Fetched) -> Result<PageOutcome> {
        let (html, page) = match fetched {
            Fetched::Page { html, page } => (html, page),
            Fetched::FetchFailed(e) => {
                tracing::warn!(%url, error = %e, "fetch failed");
                return Ok(PageOutcome::FetchFailed(e));
            }
            Fetched::ParseFailed(e) => {
                tracing::warn!(%url, error = %e, "parse failed");
                return Ok(PageOutcome::ParseFailed(e));
            }
        };
        let outcome = match self.store.insert(url.as_str(), &html, &page.text)? {
            InsertOutcome::Stored(id) => {
                tracing::info!(%url, doc_id = id, "stored");
                PageOutcome::Stored(id)
            }
            InsertOutcome::AlreadyExists(id) => {
                tracing::info!(%url, doc_id = id, "url already stored");
                PageOutcome::AlreadyExists(id)
            }
        };
        let mut discovered = 0usize;
        for link in &page.links {
            if self.frontier.enqueue(link) {
                discovered += 1;
            }
        }
        tracing::debug!(%url, links = page.links.len(), discovered, "links enqueued");
        Ok(outcome)
    }

    pub fn report(&self) -> CrawlReport { self.report }

    pub fn frontier(&self) -> &Frontier { &self.frontier }

    pub fn store(&self) -> &DocumentStore { &self.store }
}

async fn crawl_page<F: Fetcher, P: PageParser>(fetcher: &F, parser: &P, url: &Url, delay: Duration) -> Fetched {
    if !delay.is_zero() {
        sleep(delay).await;
    }
    let response = match fetcher.fetch(url).await {
        Ok(r) => r,
        Err(e) => return Fetched::FetchFailed(e),
    };
    if !response.is_success() {
        return Fetched::FetchFailed(FetchError::Status(response.status));
    }
    match parser.parse(&response.body, url) {
        Ok(page) => Fetched::Page { html: response.body, page },
        Err(e) => Fetched::ParseFailed(e),
    }
}

/// Next URL to consider: a parked URL whose host has become free, else the frontier
/// head. A URL is parked at most once, since it only leaves `parked` for a free host.
fn next_candidate(
    frontier: &mut Frontier,
    parked: &mut BTreeMap<String, VecDeque<Url>>,
    busy_hosts: &HashSet<String>,
) -> Option<Url> {
    let free = parked.keys().find(|h| !busy_hosts.contains(*h)).cloned();
    if let Some(host) = free {
        if let Some(queue) = parked.get_mut(&host) {
            let url = queue.pop_front();
            if queue.is_empty() {
                parked.remove(&host);
            }
            if url.is_some() {
                return url;
            }
        }
    }
    frontier.dequeue()
}

fn host_key(url: &Url) -> String {
    match (url.host_str(), url.port_or_known_default()) {
        (Some(h), Some(p)) => format!("{h}:{p}"),
        (Some(h), None) => h.to_string(),
        (None, _) => url.as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_host_urls_leave_the_frontier_once() {
        let mut frontier = Frontier::new();
        for i in 0..500 {
            frontier.enqueue(&format!("http://one.test/{i}"));
        }
        frontier.enqueue("http://two.test/");
        let mut parked = BTreeMap::new();
        let busy: HashSet<String> = ["one.test:80".to_string()].into_iter().collect();

        // drain the frontier the way the dispatcher does while one.test is busy
        let mut dispatched = Vec::new();
        while let Some(url) = next_candidate(&mut frontier, &mut parked, &busy) {
            let host = host_key(&url);
            if busy.contains(&host) {
                parked.entry(host).or_default().push_back(url);
            } else {
                dispatched.push(url);
            }
        }
        assert!(frontier.is_empty());
        assert_eq!(dispatched, vec![Url::parse("http://two.test/").unwrap()]);
        assert_eq!(parked["one.test:80"].len(), 500);

        // once the host frees up, its URLs come back in order without touching the frontier
        frontier.enqueue("http://three.test/");
        let idle = HashSet::new();
        assert_eq!(next_candidate(&mut frontier, &mut parked, &idle).unwrap().as_str(), "http://one.test/0");
        assert_eq!(next_candidate(&mut frontier, &mut parked, &idle).unwrap().as_str(), "http://one.test/1");
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn host_key_includes_port() {
        assert_eq!(host_key(&Url::parse("http://a.test/x").unwrap()), "a.test:80");
        assert_eq!(host_key(&Url::parse("https://a.test:8443/").unwrap()), "a.test:8443");
    }
}

use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "MiniSearchEngineBot/1.0";

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Wait inserted before every fetch.
    pub delay: Duration,
    /// Per-request bound enforced by the HTTP client.
    pub timeout: Duration,
    pub user_agent: String,
    /// Number of fetches allowed in flight, never more than one per host.
    pub concurrency: usize,
    pub max_body_bytes: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            timeout: Duration::from_secs(5),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            concurrency: 1,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

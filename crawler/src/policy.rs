//! robots.txt policies and the per-host cache the coordinator consults.
//!
//! Only the `User-agent: *` group is honoured. When a host's robots.txt cannot be
//! obtained the host is treated as fully disallowed for the rest of the run.

use parking_lot::RwLock;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Upper bound on a robots.txt `Crawl-delay`; larger values are clamped to it.
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum PolicyUnavailable {
    #[error("robots.txt request failed: {0}")]
    Fetch(String),

    #[error("robots.txt returned HTTP {0}")]
    Status(u16),

    #[error("cannot derive robots.txt location from {0}")]
    BadUrl(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Rules {
    AllowAll,
    DenyAll,
    Paths { allows: Vec<String>, disallows: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    rules: Rules,
    crawl_delay: Option<Duration>,
}

impl Policy {
    pub fn allow_all() -> Self { Self { rules: Rules::AllowAll, crawl_delay: None } }

    pub fn deny_all() -> Self { Self { rules: Rules::DenyAll, crawl_delay: None } }

    /// Parse robots.txt text, keeping the rules of the `*` group. Lines that don't
    /// look like `field: value` are ignored.
    pub fn parse(txt: &str) -> Self {
        let mut active = false;
        // consecutive User-agent lines share one group
        let mut in_agent_lines = false;
        let mut allows = Vec::new();
        let mut disallows = Vec::new();
        let mut crawl_delay = None;
        for line in txt.lines() {
            let l = line.split('#').next().unwrap_or("").trim();
            if l.is_empty() { continue; }
            let Some((k, v)) = l.split_once(':') else { continue };
            let key = k.trim().to_lowercase();
            let val = v.trim();
            if key == "user-agent" {
                if !in_agent_lines { active = false; }
                in_agent_lines = true;
                active |= val == "*";
                continue;
            }
            in_agent_lines = false;
            if !active { continue; }
            match key.as_str() {
                "allow" if !val.is_empty() => allows.push(encode_rule(val)),
                "disallow" if !val.is_empty() => disallows.push(encode_rule(val)),
                "crawl-delay" => {
                    if let Some(d) = val.parse::<f64>().ok().and_then(|n| Duration::try_from_secs_f64(n).ok()) {
                        crawl_delay = Some(d.min(MAX_CRAWL_DELAY));
                    }
                }
                _ => {}
            }
        }
        let rules = if allows.is_empty() && disallows.is_empty() {
            Rules::AllowAll
        } else {
            Rules::Paths { allows, disallows }
        };
        Self { rules, crawl_delay }
    }

    pub fn allowed(&self, url: &Url) -> bool {
        match &self.rules {
            Rules::AllowAll => true,
            Rules::DenyAll => false,
            Rules::Paths { allows, disallows } => {
                let mut target = url.path().to_string();
                if let Some(q) = url.query() {
                    target.push('?');
                    target.push_str(q);
                }
                path_allowed(&target, allows, disallows)
            }
        }
    }

    pub fn crawl_delay(&self) -> Option<Duration> { self.crawl_delay }
}

// Rules are compared against `Url::path()`, which is percent-encoded, so encode
// them the same way. Anything not path-shaped is kept verbatim.
fn encode_rule(rule: &str) -> String {
    if !rule.starts_with('/') {
        return rule.to_string();
    }
    let joined = Url::parse("http://robots.invalid/").and_then(|base| base.join(rule));
    match joined {
        Ok(u) => match u.query() {
            Some(q) => format!("{}?{}", u.path(), q),
            None => u.path().to_string(),
        },
        Err(_) => rule.to_string(),
    }
}

// Longest matching prefix wins; Allow wins ties.
fn path_allowed(path: &str, allows: &[String], disallows: &[String]) -> bool {
    let longest = |rules: &[String]| rules.iter().filter(|r| path.starts_with(r.as_str())).map(String::len).max();
    match (longest(allows), longest(disallows)) {
        (Some(a), Some(d)) => a >= d,
        (_, None) => true,
        (None, Some(_)) => false,
    }
}

/// Source of robots.txt policies, one call per host.
pub trait PolicyLoader: Send + Sync + 'static {
    /// Load the policy governing `url`'s host.
    fn load(&self, url: &Url) -> impl Future<Output = Result<Policy, PolicyUnavailable>> + Send;
}

pub struct HttpPolicyLoader {
    client: Client,
}

impl HttpPolicyLoader {
    pub fn new(client: Client) -> Self { Self { client } }
}

impl PolicyLoader for HttpPolicyLoader {
    async fn load(&self, url: &Url) -> Result<Policy, PolicyUnavailable> {
        let robots_url = url.join("/robots.txt").map_err(|_| PolicyUnavailable::BadUrl(url.to_string()))?;
        let resp = self
            .client
            .get(robots_url)
            .send()
            .await
            .map_err(|e| PolicyUnavailable::Fetch(e.to_string()))?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(Policy::deny_all());
        }
        if status.is_client_error() {
            // no robots.txt: no restrictions
            return Ok(Policy::allow_all());
        }
        if !status.is_success() {
            return Err(PolicyUnavailable::Status(status.as_u16()));
        }
        let txt = resp.text().await.map_err(|e| PolicyUnavailable::Fetch(e.to_string()))?;
        Ok(Policy::parse(&txt))
    }
}

/// Memoized policies keyed by origin (scheme + authority). Entries never expire.
pub struct PolicyCache<L> {
    loader: L,
    entries: RwLock<HashMap<String, Arc<Policy>>>,
}

impl<L: PolicyLoader> PolicyCache<L> {
    pub fn new(loader: L) -> Self {
        Self { loader, entries: RwLock::new(HashMap::new()) }
    }

    pub async fn allowed(&self, url: &Url) -> bool {
        self.policy_for(url).await.allowed(url)
    }

    pub async fn policy_for(&self, url: &Url) -> Arc<Policy> {
        let key = origin_key(url);
        let cached = self.entries.read().get(&key).cloned();
        if let Some(p) = cached {
            return p;
        }
        let policy = match self.loader.load(url).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(origin = %key, error = %e, "robots.txt unavailable, denying host");
                Policy::deny_all()
            }
        };
        let mut entries = self.entries.write();
        entries.entry(key).or_insert_with(|| Arc::new(policy)).clone()
    }

    pub fn len(&self) -> usize { self.entries.read().len() }

    pub fn is_empty(&self) -> bool { self.entries.read().is_empty() }
}

fn origin_key(url: &Url) -> String { url.origin().ascii_serialization() }

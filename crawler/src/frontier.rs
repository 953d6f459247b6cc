use std::collections::{HashSet, VecDeque};
use url::Url;

/// Parse `raw` as an absolute http(s) URL and drop its fragment.
pub fn normalize_url(raw: &str) -> Option<Url> {
    let mut url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// FIFO of URLs waiting to be crawled plus the set of URLs already claimed.
///
/// `enqueue` filters against both the queue and the visited set, but a URL can still
/// be dequeued after it was visited through another path; callers check
/// [`Frontier::is_visited`] again before processing.
#[derive(Default)]
pub struct Frontier {
    queue: VecDeque<Url>,
    queued: HashSet<String>,
    visited: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self { Self::default() }

    /// Append `raw` to the tail. Returns false when it was rejected: not http(s),
    /// unparseable, already queued or already visited.
    pub fn enqueue(&mut self, raw: &str) -> bool {
        let Some(url) = normalize_url(raw) else { return false };
        let key = url.as_str();
        if self.visited.contains(key) || self.queued.contains(key) {
            return false;
        }
        self.queued.insert(key.to_string());
        self.queue.push_back(url);
        true
    }

    pub fn dequeue(&mut self) -> Option<Url> {
        let url = self.queue.pop_front()?;
        self.queued.remove(url.as_str());
        Some(url)
    }

    /// Claim `url`. Returns false if it had already been claimed.
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(url.as_str().to_string())
    }

    pub fn is_visited(&self, url: &Url) -> bool { self.visited.contains(url.as_str()) }

    pub fn len(&self) -> usize { self.queue.len() }

    pub fn is_empty(&self) -> bool { self.queue.is_empty() }

    pub fn visited_count(&self) -> usize { self.visited.len() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_schemes() {
        let mut f = Frontier::new();
        assert!(!f.enqueue("mailto:someone@example.com"));
        assert!(!f.enqueue("ftp://example.com/file"));
        assert!(!f.enqueue("/relative/path"));
        assert!(f.enqueue("https://example.com/"));
        assert_eq!(f.len(), 1);
    }

    #[test]
    fn fifo_and_dedup() {
        let mut f = Frontier::new();
        assert!(f.enqueue("http://a.test/1"));
        assert!(f.enqueue("http://a.test/2"));
        assert!(!f.enqueue("http://a.test/1"));
        assert!(!f.enqueue("http://a.test/1#section"));
        assert_eq!(f.dequeue().unwrap().as_str(), "http://a.test/1");
        assert_eq!(f.dequeue().unwrap().as_str(), "http://a.test/2");
        assert!(f.dequeue().is_none());
    }

    #[test]
    fn visited_urls_are_not_requeued() {
        let mut f = Frontier::new();
        f.enqueue("http://a.test/");
        let url = f.dequeue().unwrap();
        assert!(f.mark_visited(&url));
        assert!(!f.mark_visited(&url));
        assert!(!f.enqueue("http://a.test/"));
        assert!(f.is_empty());
    }
}

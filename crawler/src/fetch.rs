use crate::config::CrawlConfig;
use reqwest::{header, Client};
use std::future::Future;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("not an HTML page ({0})")]
    NotHtml(String),

    #[error("body of {0} bytes exceeds the size limit")]
    TooLarge(usize),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() { FetchError::Timeout } else { FetchError::Transport(e.to_string()) }
    }
}

/// Network side of the crawler: GET a URL, return status and body.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchResponse, FetchError>> + Send;
}

pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &CrawlConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(config.timeout)
            .build()?;
        Ok(Self::with_client(client, config.max_body_bytes))
    }

    pub fn with_client(client: Client, max_body_bytes: usize) -> Self { Self { client, max_body_bytes } }

    /// The underlying client, for sharing connection pools with the robots loader.
    pub fn client(&self) -> &Client { &self.client }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            return Ok(FetchResponse { status, body: String::new() });
        }
        if let Some(ct) = resp.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
            if !(ct.starts_with("text/html") || ct.starts_with("application/xhtml+xml")) {
                return Err(FetchError::NotHtml(ct.to_string()));
            }
        }
        if let Some(len) = resp.content_length() {
            if len as usize > self.max_body_bytes {
                return Err(FetchError::TooLarge(len as usize));
            }
        }
        let bytes = resp.bytes().await?;
        if bytes.len() > self.max_body_bytes {
            return Err(FetchError::TooLarge(bytes.len()));
        }
        Ok(FetchResponse { status, body: String::from_utf8_lossy(&bytes).into_owned() })
    }
}

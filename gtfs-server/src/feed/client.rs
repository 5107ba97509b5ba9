//! HTTP client for the remote GTFS archive.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use super::FeedSource;
use super::error::FeedError;

/// Default feed URL: the ZET Zagreb scheduled GTFS archive.
pub const DEFAULT_FEED_URL: &str = "https://www.zet.hr/gtfs-scheduled/latest";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_USER_AGENT: &str = concat!("gtfs-server/", env!("CARGO_PKG_VERSION"));

/// Characters of an error body kept in [`FeedError::Status`].
const ERROR_BODY_CHARS: usize = 200;

/// Bytes of an error body read before giving up on the rest.
const ERROR_BODY_BYTES: usize = 1024;

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// URL of the GTFS ZIP archive
    pub source_url: String,
    /// Whole-request timeout, including the body download
    pub timeout: Duration,
    /// Value of the User-Agent header
    pub user_agent: String,
}

impl FeedConfig {
    /// Create a config for the given source URL with default timeout.
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom User-Agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_URL)
    }
}

/// Fetches the GTFS archive over HTTP.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    source_url: String,
}

impl FeedClient {
    /// Create a new feed client with the given configuration.
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let mut headers = HeaderMap::new();
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|_| FeedError::Config("invalid User-Agent".to_string()))?;
        headers.insert(USER_AGENT, user_agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            source_url: config.source_url,
        })
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Download the archive.
    pub async fn fetch(&self) -> Result<Bytes, FeedError> {
        let response = self.http.get(&self.source_url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                message: error_body(response).await,
            });
        }

        Ok(response.bytes().await?)
    }
}

/// Read the start of an error body, leaving the rest undownloaded.
async fn error_body(mut response: reqwest::Response) -> String {
    let mut body = Vec::new();
    while body.len() < ERROR_BODY_BYTES {
        match response.chunk().await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            _ => break,
        }
    }
    String::from_utf8_lossy(&body)
        .chars()
        .take(ERROR_BODY_CHARS)
        .collect()
}

impl FeedSource for FeedClient {
    async fn fetch(&self) -> Result<Bytes, FeedError> {
        FeedClient::fetch(self).await
    }
}

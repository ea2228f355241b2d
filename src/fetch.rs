//! HTTP fetch capability
//!
//! The crawl engine never talks to the network directly; it consumes the
//! [`Fetch`] trait, one implementation of which wraps a reqwest client. Tests
//! substitute in-memory fetchers.

use crate::config::TransportConfig;
use crate::TransportError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Performs one HTTP GET for the crawl engine.
///
/// Implementations must be cancel-safe: a task races the returned future
/// against its cancellation token and simply drops it when the task is
/// canceled, which aborts any in-flight request.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetches the document at `url`, returning its raw bytes
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, TransportError>;
}

/// Reqwest-backed [`Fetch`] implementation
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher from the transport configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Timeouts and user agent for the underlying client
    ///
    /// # Returns
    ///
    /// * `Ok(HttpFetcher)` - Successfully built fetcher
    /// * `Err(reqwest::Error)` - Failed to build the HTTP client
    pub fn new(config: &TransportConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| TransportError(describe_request_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError(format!("HTTP {}", status.as_u16())));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError(describe_request_error(&e)))?;

        Ok(body.to_vec())
    }
}

/// Maps a reqwest error onto a short human-readable reason
fn describe_request_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_transport() -> TransportConfig {
        TransportConfig {
            request_timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            user_agent: "TestScanner/1.0".to_string(),
        }
    }

    #[test]
    fn test_build_fetcher() {
        let fetcher = HttpFetcher::new(&test_transport());
        assert!(fetcher.is_ok());
    }

    #[tokio::test]
    async fn test_connect_error_is_transport_error() {
        // Nothing listens on this port; the connection must fail fast.
        let fetcher = HttpFetcher::new(&TransportConfig {
            request_timeout_ms: 2_000,
            connect_timeout_ms: 500,
            user_agent: "TestScanner/1.0".to_string(),
        })
        .unwrap();

        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let result = fetcher.fetch(&url).await;
        assert!(result.is_err());
    }
}

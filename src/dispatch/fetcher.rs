//! HTTP fetcher implementation
//!
//! This module handles the outbound HTTP calls made by every tool:
//! - Building the shared HTTP client
//! - GET requests with a per-call header set and timeout
//! - Error classification (timeout, connect, other)
//!
//! Non-2xx responses are returned as normal responses; what a status means
//! is up to the provider's predicate.

use crate::dispatch::identity::HeaderSet;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;

/// Transport-level failure of a single call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Request failed: {0}")]
    Other(String),
}

/// A completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,

    /// Final URL after redirects
    pub final_url: String,

    /// Response body as text
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound HTTP seam
///
/// Tools never talk to reqwest directly, so tests can substitute a stub.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// Issues a GET request
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL to fetch
    /// * `headers` - Header set to send with the request
    /// * `timeout` - Timeout for this call only
    async fn fetch(
        &self,
        url: &str,
        headers: &HeaderSet,
        timeout: Duration,
    ) -> Result<FetchResponse, TransportError>;
}

/// Builds the shared HTTP client
///
/// Headers are supplied per request from the identity pool, so the client
/// carries no default User-Agent.
pub fn build_http_client(connect_timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `HttpFetch` over a reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn fetch(
        &self,
        url: &str,
        headers: &HeaderSet,
        timeout: Duration,
    ) -> Result<FetchResponse, TransportError> {
        let mut request = self.client.get(url).timeout(timeout);
        for (name, value) in headers.iter() {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(classify_error)?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(FetchResponse {
            status,
            final_url,
            body,
        })
    }
}

/// Maps a reqwest error to a transport error
fn classify_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> ReqwestFetcher {
        ReqwestFetcher::new(build_http_client(Duration::from_secs(2)).unwrap())
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(Duration::from_secs(5)).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_sends_headers_and_reads_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/profile"))
            .and(header("User-Agent", "TestAgent/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let mut headers = HeaderSet::default();
        headers.insert("User-Agent", "TestAgent/1.0");

        let response = fetcher()
            .fetch(
                &format!("{}/profile", server.uri()),
                &headers,
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "hello");
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_non_success_status_is_a_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .mount(&server)
            .await;

        let response = fetcher()
            .fetch(&server.uri(), &HeaderSet::default(), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let result = fetcher()
            .fetch(
                &server.uri(),
                &HeaderSet::default(),
                Duration::from_millis(200),
            )
            .await;

        assert_eq!(result.unwrap_err(), TransportError::Timeout);
    }
}

//! HTTP fetching
//!
//! The [`Fetcher`] trait is the transport seam of the pipeline: the batch
//! orchestrator only ever sees `fetch(url, timeout) -> page | error`.
//! [`HttpFetcher`] is the bundled reqwest-backed implementation, sharing one
//! pooled client across every concurrent task. Callers with different
//! transport needs (caching, recording, custom status policies) implement
//! the trait themselves.

use crate::error::{Error, FetchError};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use url::Url;

/// Connect timeout for the bundled client; per-attempt budgets are
/// enforced per request, not here
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A fetched response body plus transport metadata
#[derive(Clone, Debug)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value, if present
    pub content_type: Option<String>,
    /// Response body
    pub body: String,
}

/// Abstract fetch operation
///
/// Implementations must be safely callable from many tasks concurrently and
/// must respect the timeout by failing rather than hanging; the admission
/// gate assumes a fetch call always terminates.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch one URL within the given per-attempt time budget
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError>;
}

/// reqwest-backed fetcher sharing one pooled client across all tasks
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher with a fresh pooled client
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fetchpool::fetch::HttpFetcher;
    ///
    /// let fetcher = HttpFetcher::new("my-crawler/1.0").unwrap();
    /// ```
    pub fn new(user_agent: &str) -> Result<Self, Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client (custom TLS, proxies, redirect policy)
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError> {
        // A URL that cannot parse will never fetch; skip the retry budget
        let parsed = Url::parse(url).map_err(|e| FetchError::NonRetryable {
            reason: format!("invalid URL: {e}"),
        })?;

        let response = self
            .client
            .get(parsed)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_transport_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Reading the body counts against the same per-attempt budget
        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(e, timeout))?;

        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

fn classify_transport_error(e: reqwest::Error, timeout: Duration) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout { timeout }
    } else {
        FetchError::Network(e)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    fn test_fetcher() -> HttpFetcher {
        HttpFetcher::new("fetchpool-tests/0.0").unwrap()
    }

    #[tokio::test]
    async fn fetches_body_and_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html><title>Hi</title></html>", "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;

        let page = test_fetcher()
            .fetch(&format!("{}/page", server.uri()), TEST_TIMEOUT)
            .await
            .unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(page.body, "<html><title>Hi</title></html>");
        assert_eq!(
            page.content_type.as_deref(),
            Some("text/html; charset=utf-8")
        );
        assert!(page.final_url.ends_with("/page"));
    }

    #[tokio::test]
    async fn non_success_status_becomes_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = test_fetcher()
            .fetch(&format!("{}/missing", server.uri()), TEST_TIMEOUT)
            .await
            .unwrap_err();

        match err {
            FetchError::Status { status } => assert_eq!(status, 404),
            other => panic!("expected Status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let err = test_fetcher()
            .fetch(
                &format!("{}/slow", server.uri()),
                Duration::from_millis(100),
            )
            .await
            .unwrap_err();

        assert!(
            matches!(err, FetchError::Timeout { .. }),
            "expected Timeout, got {err:?}"
        );
    }

    #[tokio::test]
    async fn invalid_url_is_non_retryable() {
        let err = test_fetcher()
            .fetch("not a url", TEST_TIMEOUT)
            .await
            .unwrap_err();

        assert!(
            matches!(err, FetchError::NonRetryable { .. }),
            "expected NonRetryable, got {err:?}"
        );
    }

    #[tokio::test]
    async fn connection_refused_is_a_network_error() {
        // Nothing listens on this port
        let err = test_fetcher()
            .fetch("http://127.0.0.1:1/", TEST_TIMEOUT)
            .await
            .unwrap_err();

        assert!(
            matches!(err, FetchError::Network(_)),
            "expected Network, got {err:?}"
        );
    }
}

//! HTTP client with tracing, retries, and domain allowlist.
//!
//! The client wraps `reqwest` and adds:
//! - Request/response tracing
//! - A domain allowlist for the feed host
//! - Retries on connection errors, timeouts, `429` and `5xx` responses

use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::FetchError;
use crate::retry::RetryStrategy;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for pricewise.
const USER_AGENT: &str = concat!("pricewise/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing, retries, and domain allowlist.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    timeout_secs: u64,
    retry_strategy: RetryStrategy,
    allowed_domains: Option<Vec<String>>,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the TLS backend cannot be initialised.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            inner: client,
            timeout_secs: timeout.as_secs(),
            retry_strategy: RetryStrategy::default(),
            allowed_domains: None,
        })
    }

    /// Sets the retry strategy for this client.
    pub fn with_retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = strategy;
        self
    }

    /// Restricts requests to the given domains and their subdomains.
    ///
    /// An empty list leaves the client unrestricted.
    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = if domains.is_empty() {
            None
        } else {
            Some(domains)
        };
        self
    }

    /// Returns the retry strategy in use.
    pub fn retry_strategy(&self) -> &RetryStrategy {
        &self.retry_strategy
    }

    /// Checks if a URL's domain is allowed.
    fn is_domain_allowed(&self, url: &str) -> Result<(), FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        let host = parsed
            .host_str()
            .ok_or_else(|| FetchError::InvalidUrl("No host in URL".to_string()))?;

        let Some(ref allowed) = self.allowed_domains else {
            return Ok(());
        };

        let allowed = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")));

        if allowed {
            Ok(())
        } else {
            Err(FetchError::DomainNotAllowed(host.to_string()))
        }
    }

    /// Performs a GET request, retrying transient failures.
    ///
    /// # Errors
    ///
    /// - [`FetchError::DomainNotAllowed`] / [`FetchError::InvalidUrl`] before
    ///   any request is sent.
    /// - [`FetchError::RateLimited`] if the host keeps answering `429`.
    /// - [`FetchError::Timeout`] if the last attempt timed out.
    /// - [`FetchError::InvalidResponse`] for any other non-success status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get(&self, url: &str) -> Result<Response, FetchError> {
        self.is_domain_allowed(url)?;

        let max_attempts = self.retry_strategy.max_attempts;
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(attempt = attempts, "GET request");

            match self.inner.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!(status = %status, "Response received");

                    if status.is_success() {
                        return Ok(response);
                    }

                    let retry_after = retry_after_secs(&response);
                    if attempts < max_attempts && self.retry_strategy.should_retry_status(status) {
                        let delay = self.retry_delay(attempts, retry_after);
                        warn!(
                            status = %status,
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            "Request rejected, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        return Err(FetchError::RateLimited { retry_after });
                    }

                    return Err(FetchError::InvalidResponse(format!(
                        "Unexpected status code: {status}"
                    )));
                }
                Err(e) => {
                    if attempts < max_attempts && self.retry_strategy.should_retry(&e) {
                        let delay = self.retry_strategy.delay_for_attempt(attempts);
                        warn!(
                            error = %e,
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            "Request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    if e.is_timeout() {
                        return Err(FetchError::Timeout(self.timeout_secs));
                    }
                    return Err(e.into());
                }
            }
        }
    }

    /// Performs a GET request and decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`HttpClient::get`], or [`FetchError::Json`] if
    /// the body does not decode into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self.get(url).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Reads the `Retry-After` header value in seconds.
impl HttpClient {
    /// Delay before the next attempt. A server-supplied `Retry-After` wins
    /// over the backoff schedule but never exceeds `max_delay`.
    fn retry_delay(&self, attempt: u32, retry_after: Option<u64>) -> Duration {
        retry_after
            .map_or_else(
                || self.retry_strategy.delay_for_attempt(attempt),
                Duration::from_secs,
            )
            .min(self.retry_strategy.max_delay)
    }
}

fn retry_after_secs(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

// ============================================================================
// Tests
// ============================================================================

//! Fetch error types.

use thiserror::Error;

/// Error type for feed retrieval.
///
/// Every variant is a feed fetch failure: the synchronizer aborts before
/// touching the catalog when it sees one.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limited by the feed host.
    #[error(
        "Rate limited{}",
        .retry_after.map_or_else(String::new, |secs| format!(", retry after {secs} seconds"))
    )]
    RateLimited {
        /// Seconds to wait before retrying, from the `Retry-After` header.
        retry_after: Option<u64>,
    },

    /// The feed host answered with something other than a feed.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The response body was not valid feed JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Domain not on the allowlist.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// The URL could not be parsed or has no host.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Returns true if retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_connect() || e.is_timeout(),
            Self::Timeout(_) | Self::RateLimited { .. } => true,
            Self::InvalidResponse(_)
            | Self::Json(_)
            | Self::DomainNotAllowed(_)
            | Self::InvalidUrl(_) => false,
        }
    }
}

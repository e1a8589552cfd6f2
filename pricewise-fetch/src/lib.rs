// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # pricewise Fetch
//!
//! Retrieval of the remote price feed.
//!
//! ## HTTP
//!
//! - [`client::HttpClient`] - `reqwest` wrapper with tracing, retries and a
//!   domain allowlist
//! - [`retry::RetryStrategy`] - Backoff policy for transient failures
//!
//! ## Feed
//!
//! - [`feed::PricingFeed`] - Wire format of the feed
//! - [`feed::to_catalog_entries`] - Flattens a feed into catalog entries
//! - [`feed::FeedSource`] - Trait for anything that yields remote entries
//! - [`feed::FeedClient`] - HTTP implementation of [`feed::FeedSource`]
//!
//! ## Example
//!
//! ```ignore
//! use pricewise_fetch::{FeedClient, FeedSource, HttpClient};
//!
//! let http = HttpClient::new()?.with_allowed_domains(vec!["models.dev".into()]);
//! let feed = FeedClient::new(http, "https://models.dev/api.json");
//! let entries = feed.fetch_entries().await?;
//! ```

pub mod client;
pub mod error;
pub mod feed;
pub mod retry;

// Errors
pub use error::FetchError;

// HTTP
pub use client::{HttpClient, DEFAULT_TIMEOUT_SECS};
pub use retry::RetryStrategy;

// Feed
pub use feed::{
    to_catalog_entries, FeedClient, FeedCost, FeedLimit, FeedModel, FeedProvider, FeedSource,
    PricingFeed, DEFAULT_FEED_URL,
};

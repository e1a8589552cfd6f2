//! Remote price feed: wire types, retrieval and conversion to catalog entries.
//!
//! The feed is one JSON document mapping provider ids to providers, each with
//! a map of model ids to models:
//!
//! ```json
//! {
//!   "openai": {
//!     "name": "OpenAI",
//!     "models": {
//!       "gpt-4o": {
//!         "name": "GPT-4o",
//!         "cost": { "input": 2.5, "output": 10, "cache_read": 1.25 },
//!         "limit": { "context": 128000, "output": 16384 }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Rates are USD per million tokens. Fields not listed here are ignored.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pricewise_core::{CatalogEntry, ModelLimits, PricingPolicy, TokenPricing, DEFAULT_CURRENCY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

use crate::client::HttpClient;
use crate::error::FetchError;

/// Default feed location.
pub const DEFAULT_FEED_URL: &str = "https://models.dev/api.json";

// ============================================================================
// Wire Types
// ============================================================================

/// The whole feed: provider id to provider.
pub type PricingFeed = BTreeMap<String, FeedProvider>;

/// One provider in the feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedProvider {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Model id to model.
    #[serde(default)]
    pub models: BTreeMap<String, FeedModel>,
}

/// One model in the feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedModel {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Per-million-token rates. Absent for free or unpriced models.
    #[serde(default)]
    pub cost: Option<FeedCost>,
    /// Token limits.
    #[serde(default)]
    pub limit: Option<FeedLimit>,
}

/// Per-million-token rates of a feed model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedCost {
    /// Input rate.
    #[serde(default)]
    pub input: f64,
    /// Output rate.
    #[serde(default)]
    pub output: f64,
    /// Reasoning rate.
    #[serde(default)]
    pub reasoning: Option<f64>,
    /// Cache read rate.
    #[serde(default)]
    pub cache_read: Option<f64>,
    /// Cache write rate.
    #[serde(default)]
    pub cache_write: Option<f64>,
}

/// Token limits of a feed model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedLimit {
    /// Context window.
    #[serde(default)]
    pub context: u64,
    /// Maximum output.
    #[serde(default)]
    pub output: u64,
}

// ============================================================================
// Conversion
// ============================================================================

impl FeedCost {
    /// Converts the rates into a token pricing policy.
    pub fn to_pricing(&self, currency: &str) -> TokenPricing {
        TokenPricing {
            input: self.input,
            output: self.output,
            reasoning: self.reasoning,
            cache_read: self.cache_read,
            cache_write: self.cache_write,
            currency: currency.to_string(),
        }
    }
}

/// Flattens a feed into catalog entries, ordered by provider then model id.
///
/// Models without a `cost` block are priced at zero; models without a
/// `limit` block get zero limits. Empty display names fall back to the id.
pub fn to_catalog_entries(
    feed: &PricingFeed,
    currency: &str,
    now: DateTime<Utc>,
) -> Vec<CatalogEntry> {
    let mut entries = Vec::new();

    for (provider_id, provider) in feed {
        let provider_name = display_name(&provider.name, provider_id);

        for (model_id, model) in &provider.models {
            let pricing = model.cost.as_ref().map_or_else(
                || TokenPricing {
                    currency: currency.to_string(),
                    ..TokenPricing::new(0.0, 0.0)
                },
                |cost| cost.to_pricing(currency),
            );
            let limits = model.limit.map_or_else(ModelLimits::default, |limit| ModelLimits {
                context: limit.context,
                output: limit.output,
            });

            entries.push(CatalogEntry {
                provider_id: provider_id.clone(),
                provider_name: provider_name.clone(),
                model_id: model_id.clone(),
                model_name: display_name(&model.name, model_id),
                pricing: PricingPolicy::Tokens(pricing),
                limits,
                last_updated: now,
            });
        }
    }

    entries
}

fn display_name(name: &str, id: &str) -> String {
    if name.trim().is_empty() {
        id.to_string()
    } else {
        name.to_string()
    }
}

// ============================================================================
// Feed Source
// ============================================================================

/// Something that can produce the current remote catalog.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Returns a human-readable name for logging.
    fn name(&self) -> &str;

    /// Retrieves the feed and converts it into catalog entries.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the feed is unreachable or malformed.
    async fn fetch_entries(&self) -> Result<Vec<CatalogEntry>, FetchError>;
}

/// Fetches the feed over HTTP.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: HttpClient,
    url: String,
    currency: String,
}

impl FeedClient {
    /// Creates a feed client for `url`.
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    /// Sets the currency stamped on converted pricing policies.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Returns the feed URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Retrieves and decodes the raw feed.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the request fails or the body is not a feed.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch(&self) -> Result<PricingFeed, FetchError> {
        let feed: PricingFeed = self.http.get_json(&self.url).await?;
        debug!(providers = feed.len(), "Feed decoded");
        Ok(feed)
    }
}

#[async_trait]
impl FeedSource for FeedClient {
    fn name(&self) -> &str {
        &self.url
    }

    async fn fetch_entries(&self) -> Result<Vec<CatalogEntry>, FetchError> {
        let feed = self.fetch().await?;
        let entries = to_catalog_entries(&feed, &self.currency, Utc::now());
        info!(
            providers = feed.len(),
            entries = entries.len(),
            "Fetched pricing feed"
        );
        Ok(entries)
    }
}

// ============================================================================
// Tests
// ============================================================================

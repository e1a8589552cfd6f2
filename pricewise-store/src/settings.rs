//! Settings store.
//!
//! Holds feed, catalog and markup configuration with persistence and change
//! notification. Settings are an explicit value handed to whoever needs
//! them; there is no process-wide copy.

use pricewise_core::{MarkupConfig, DEFAULT_CURRENCY};
use pricewise_fetch::{HttpClient, RetryStrategy, DEFAULT_FEED_URL, DEFAULT_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persistence::{
    default_catalog_path, default_markup_rules_path, default_settings_path, load_json, save_json,
};

// ============================================================================
// Settings Types
// ============================================================================

/// pricewise configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// URL of the remote price feed.
    pub feed_url: String,

    /// SQLite catalog database.
    pub catalog_path: PathBuf,

    /// Persisted markup rules file.
    pub markup_rules_path: PathBuf,

    /// Inline markup rules. Consulted after the persisted rule store.
    pub markup: MarkupConfig,

    /// Currency stamped on pricing imported from the feed.
    pub default_currency: String,

    /// Feed retrieval settings.
    pub sync: SyncSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            catalog_path: default_catalog_path(),
            markup_rules_path: default_markup_rules_path(),
            markup: MarkupConfig::default(),
            default_currency: DEFAULT_CURRENCY.to_string(),
            sync: SyncSettings::default(),
        }
    }
}

/// Feed retrieval settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Per-request timeout.
    pub timeout_secs: u64,

    /// Attempts per feed request, including the first.
    pub max_attempts: u32,

    /// Base backoff delay between attempts.
    pub base_delay_secs: u64,

    /// Hosts the feed may be fetched from (empty = unrestricted).
    pub allowed_domains: Vec<String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_attempts: 3,
            base_delay_secs: 1,
            allowed_domains: vec!["models.dev".to_string()],
        }
    }
}

impl SyncSettings {
    /// Returns the retry strategy these settings describe.
    pub fn retry_strategy(&self) -> RetryStrategy {
        RetryStrategy::new(self.max_attempts)
            .with_base_delay(Duration::from_secs(self.base_delay_secs))
    }

    /// Builds an HTTP client configured by these settings.
    ///
    /// # Errors
    ///
    /// Returns a fetch error if the client cannot be built.
    pub fn http_client(&self) -> Result<HttpClient, pricewise_fetch::FetchError> {
        Ok(HttpClient::with_timeout(Duration::from_secs(self.timeout_secs))?
            .with_retry_strategy(self.retry_strategy())
            .with_allowed_domains(self.allowed_domains.clone()))
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Persistent settings store with change notifications.
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
    notify: watch::Sender<u64>,
    version: Arc<RwLock<u64>>,
}

impl SettingsStore {
    /// Creates a settings store with default settings.
    pub fn new(path: PathBuf) -> Self {
        Self::with_settings(path, Settings::default())
    }

    fn with_settings(path: PathBuf, settings: Settings) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
            notify,
            version: Arc::new(RwLock::new(0)),
        }
    }

    /// Loads settings from the default path.
    pub async fn load_default() -> Self {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from a path.
    ///
    /// A missing or unreadable file yields defaults; the latter is logged.
    pub async fn load(path: PathBuf) -> Self {
        let settings = if path.exists() {
            info!(path = %path.display(), "Loading settings");
            load_json(&path).await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            })
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Settings::default()
        };

        Self::with_settings(path, settings)
    }

    /// Returns the settings file path.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Updates settings and notifies subscribers.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        {
            let mut settings = self.settings.write().await;
            f(&mut settings);
        }
        self.notify_change().await;
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// Subscribes to settings changes. The value is a change counter.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    /// Notifies subscribers of a change.
    async fn notify_change(&self) {
        let mut version = self.version.write().await;
        *version += 1;
        let _ = self.notify.send(*version);
    }
}

// ============================================================================
// Tests
// ============================================================================

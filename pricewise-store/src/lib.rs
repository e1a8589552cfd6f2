// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # pricewise Store
//!
//! State and persistence for pricewise.
//!
//! This crate provides:
//!
//! - **Catalog stores**: [`MemoryCatalogStore`] and [`SqliteCatalogStore`],
//!   both implementing [`pricewise_core::CatalogStore`]
//! - **MarkupRuleStore**: File-backed markup rules usable as a rule source
//! - **PricingSynchronizer**: Reconciles a catalog with the remote feed
//! - **SettingsStore**: Configuration with persistence and change notification
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use pricewise_fetch::FeedClient;
//! use pricewise_store::{PricingSynchronizer, SettingsStore, SqliteCatalogStore};
//!
//! let settings = SettingsStore::load_default().await.get().await;
//! let store = SqliteCatalogStore::open(&settings.catalog_path).await?;
//! let feed = FeedClient::new(settings.sync.http_client()?, &settings.feed_url)
//!     .with_currency(&settings.default_currency);
//!
//! let report = PricingSynchronizer::new(store).sync_from_feed(&feed).await?;
//! println!("{} inserted, {} updated, {} deleted",
//!     report.insert_count, report.update_count, report.delete_count);
//! ```

pub mod catalog;
pub mod error;
pub mod persistence;
pub mod rules;
pub mod settings;
pub mod sync;

pub use catalog::{MemoryCatalogStore, SqliteCatalogStore};
pub use error::{StoreError, SyncError};
pub use persistence::{
    default_catalog_path, default_config_dir, default_data_dir, default_markup_rules_path,
    default_settings_path, ensure_dir, load_json, load_json_or_default, save_json,
};
pub use rules::{MarkupRuleStore, RULE_STORE_SOURCE};
pub use settings::{Settings, SettingsStore, SyncSettings};
pub use sync::PricingSynchronizer;

//! Pricing synchronizer.
//!
//! Reconciles the catalog against a remote feed. A run reads the whole
//! catalog once, plans the inserts, updates and deletes with
//! [`plan_sync`], and hands the plan to [`CatalogStore::apply`] as one
//! batch. After a successful run the catalog key set equals the feed key set.

use chrono::{DateTime, Utc};
use pricewise_core::{plan_sync, CatalogEntry, CatalogStore, SyncPlan, SyncReport};
use pricewise_fetch::FeedSource;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::error::{StoreError, SyncError};

/// Keeps a catalog store in step with a remote feed.
#[derive(Debug, Clone)]
pub struct PricingSynchronizer<S> {
    store: S,
}

impl<S> PricingSynchronizer<S>
where
    S: CatalogStore<Error = StoreError>,
{
    /// Creates a synchronizer over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Computes the plan a sync would apply, without writing.
    ///
    /// # Errors
    ///
    /// Returns the store error if the catalog cannot be read.
    pub async fn preview(&self, remote: &[CatalogEntry]) -> Result<SyncPlan, StoreError> {
        let existing = self.store.list().await?;
        Ok(plan_sync(&existing, remote, Utc::now()))
    }

    /// Reconciles the catalog with `remote`, stamping changes with the
    /// current time.
    ///
    /// # Errors
    ///
    /// Returns the store error if the catalog cannot be read or the batch
    /// cannot be applied. A failed batch leaves the catalog unchanged.
    pub async fn sync(&self, remote: &[CatalogEntry]) -> Result<SyncReport, StoreError> {
        self.sync_at(remote, Utc::now()).await
    }

    /// Like [`PricingSynchronizer::sync`], with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// See [`PricingSynchronizer::sync`].
    #[instrument(skip(self, remote), fields(remote = remote.len()))]
    pub async fn sync_at(
        &self,
        remote: &[CatalogEntry],
        now: DateTime<Utc>,
    ) -> Result<SyncReport, StoreError> {
        let started = Instant::now();
        let existing = self.store.list().await?;
        let plan = plan_sync(&existing, remote, now);

        if plan.is_empty() {
            debug!(existing = existing.len(), "Catalog already matches feed");
            return Ok(plan.report);
        }

        let report = plan.report;
        if let Err(e) = self.store.apply(plan.changes).await {
            warn!(error = %e, "Catalog batch failed, no changes applied");
            return Err(e);
        }

        info!(
            inserted = report.insert_count,
            updated = report.update_count,
            deleted = report.delete_count,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Catalog synchronized"
        );
        Ok(report)
    }

    /// Fetches the feed from `source` and reconciles the catalog with it.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Fetch`] if the feed cannot be retrieved; nothing
    /// is written in that case. Returns [`SyncError::Store`] if the catalog
    /// cannot be read or updated.
    pub async fn sync_from_feed<F>(&self, source: &F) -> Result<SyncReport, SyncError>
    where
        F: FeedSource + ?Sized,
    {
        let remote = match source.fetch_entries().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(source = source.name(), error = %e, "Feed fetch failed, catalog untouched");
                return Err(e.into());
            }
        };

        Ok(self.sync(&remote).await?)
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Catalog reconciliation planning.
//!
//! [`plan_sync`] diffs a remote feed against the local catalog and produces a
//! [`SyncPlan`]: the exact inserts, updates and deletes that make the catalog
//! key set equal the feed key set. Planning is pure; applying the plan is the
//! store's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::models::{CatalogChange, CatalogEntry, CatalogKey};

/// Counts produced by one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Entries present in the feed but not in the catalog.
    pub insert_count: usize,
    /// Entries present in both whose tracked fields differed.
    pub update_count: usize,
    /// Entries present in the catalog but not in the feed.
    pub delete_count: usize,
}

impl SyncReport {
    /// Returns true if the run wrote nothing.
    pub fn is_noop(&self) -> bool {
        self.insert_count == 0 && self.update_count == 0 && self.delete_count == 0
    }

    /// Total number of writes.
    pub fn total_changes(&self) -> usize {
        self.insert_count + self.update_count + self.delete_count
    }
}

/// The writes needed to reconcile a catalog with a feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    /// Changes in application order: inserts and updates in feed order,
    /// then deletes in key order.
    pub changes: Vec<CatalogChange>,
    /// Counts matching `changes`.
    pub report: SyncReport,
}

impl SyncPlan {
    /// Returns true if the plan has no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Diffs `remote` against `existing`.
///
/// - A remote key absent locally is inserted with `last_updated = now`.
/// - A remote key present locally is updated only if a tracked field differs.
/// - A local key absent from the feed is deleted.
///
/// If the feed repeats a key, the last occurrence wins and the key is
/// counted once.
pub fn plan_sync(
    existing: &[CatalogEntry],
    remote: &[CatalogEntry],
    now: DateTime<Utc>,
) -> SyncPlan {
    let local: HashMap<CatalogKey, &CatalogEntry> =
        existing.iter().map(|entry| (entry.key(), entry)).collect();

    // Collapse duplicate feed keys, keeping first-seen order.
    let mut order: Vec<CatalogKey> = Vec::with_capacity(remote.len());
    let mut latest: HashMap<CatalogKey, &CatalogEntry> = HashMap::with_capacity(remote.len());
    for entry in remote {
        let key = entry.key();
        if latest.insert(key.clone(), entry).is_none() {
            order.push(key);
        }
    }

    let mut plan = SyncPlan::default();
    let mut seen: HashSet<&CatalogKey> = HashSet::with_capacity(order.len());

    for key in &order {
        seen.insert(key);
        let Some(incoming) = latest.get(key) else {
            continue;
        };

        match local.get(key) {
            None => {
                debug!(key = %key, "Catalog entry will be inserted");
                let mut entry = (*incoming).clone();
                entry.last_updated = now;
                plan.changes.push(CatalogChange::Insert(entry));
                plan.report.insert_count += 1;
            }
            Some(current) if current.differs_from(incoming) => {
                debug!(key = %key, "Catalog entry will be updated");
                plan.changes.push(CatalogChange::Update {
                    key: key.clone(),
                    patch: current.patch_towards(incoming, now),
                });
                plan.report.update_count += 1;
            }
            Some(_) => {}
        }
    }

    // Deterministic delete order regardless of the backend's list order.
    let mut stale: Vec<&CatalogKey> = local.keys().filter(|key| !seen.contains(*key)).collect();
    stale.sort();
    for key in stale {
        debug!(key = %key, "Catalog entry will be deleted");
        plan.changes.push(CatalogChange::Delete(key.clone()));
        plan.report.delete_count += 1;
    }

    plan
}

// ============================================================================
// Tests
// ============================================================================

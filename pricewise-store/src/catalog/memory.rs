//! In-memory catalog store.

use async_trait::async_trait;
use pricewise_core::{CatalogChange, CatalogEntry, CatalogKey, CatalogPatch, CatalogStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;

type EntryMap = HashMap<CatalogKey, CatalogEntry>;

/// Catalog held in process memory.
///
/// Cloning shares the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogStore {
    entries: Arc<RwLock<EntryMap>>,
}

impl MemoryCatalogStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `entries`. Later duplicates replace
    /// earlier ones.
    pub fn with_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let map = entries
            .into_iter()
            .map(|entry| (entry.key(), entry))
            .collect();
        Self {
            entries: Arc::new(RwLock::new(map)),
        }
    }

    /// Returns the number of entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

fn sorted(mut entries: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
    entries.sort_by(|a, b| {
        (&a.provider_id, &a.model_id).cmp(&(&b.provider_id, &b.model_id))
    });
    entries
}

fn insert_into(map: &mut EntryMap, entry: CatalogEntry) -> Result<(), StoreError> {
    let key = entry.key();
    if map.contains_key(&key) {
        return Err(StoreError::DuplicateKey(key.to_string()));
    }
    map.insert(key, entry);
    Ok(())
}

fn patch_in(map: &mut EntryMap, key: &CatalogKey, patch: &CatalogPatch) -> Result<(), StoreError> {
    let entry = map
        .get_mut(key)
        .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
    entry.apply_patch(patch);
    Ok(())
}

fn apply_to(map: &mut EntryMap, change: CatalogChange) -> Result<(), StoreError> {
    match change {
        CatalogChange::Insert(entry) => insert_into(map, entry),
        CatalogChange::Update { key, patch } => patch_in(map, &key, &patch),
        CatalogChange::Delete(key) => map
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.to_string())),
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    type Error = StoreError;

    async fn list(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        let entries = self.entries.read().await;
        Ok(sorted(entries.values().cloned().collect()))
    }

    async fn get(&self, key: &CatalogKey) -> Result<Option<CatalogEntry>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<CatalogEntry>, StoreError> {
        let entries = self.entries.read().await;
        Ok(sorted(
            entries
                .values()
                .filter(|entry| entry.provider_id == provider_id)
                .cloned()
                .collect(),
        ))
    }

    async fn insert(&self, entry: CatalogEntry) -> Result<(), StoreError> {
        insert_into(&mut *self.entries.write().await, entry)
    }

    async fn patch(&self, key: &CatalogKey, patch: CatalogPatch) -> Result<(), StoreError> {
        patch_in(&mut *self.entries.write().await, key, &patch)
    }

    async fn delete(&self, key: &CatalogKey) -> Result<bool, StoreError> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn apply(&self, changes: Vec<CatalogChange>) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;

        // Stage on a copy; the live map is replaced only if every change lands.
        let mut staged = entries.clone();
        let count = changes.len();
        for change in changes {
            apply_to(&mut staged, change)?;
        }
        *entries = staged;

        debug!(changes = count, "Applied catalog batch");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

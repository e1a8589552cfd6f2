//! Trait definitions for pricewise.
//!
//! Storage is an external collaborator. This module defines the contract a
//! pricing catalog backend must satisfy; implementations live in
//! `pricewise-store`.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::{CatalogChange, CatalogEntry, CatalogKey, CatalogPatch};

/// Keyed storage for pricing catalog entries.
///
/// Implementors must:
/// - hold at most one entry per [`CatalogKey`]
/// - make `insert`, `patch` and `delete` atomic per record
/// - make [`CatalogStore::apply`] all-or-nothing across the whole batch
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Error type of the backend.
    ///
    /// Must be able to carry a [`CoreError`] so lookups can report
    /// [`CoreError::PricingNotFound`].
    type Error: std::error::Error + From<CoreError> + Send + Sync + 'static;

    /// Returns every entry.
    async fn list(&self) -> Result<Vec<CatalogEntry>, Self::Error>;

    /// Returns the entry for `key`, if present.
    async fn get(&self, key: &CatalogKey) -> Result<Option<CatalogEntry>, Self::Error>;

    /// Returns every entry of one provider.
    async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<CatalogEntry>, Self::Error>;

    /// Inserts a new entry. Fails if the key already exists.
    async fn insert(&self, entry: CatalogEntry) -> Result<(), Self::Error>;

    /// Patches an existing entry. Fails if the key is absent.
    async fn patch(&self, key: &CatalogKey, patch: CatalogPatch) -> Result<(), Self::Error>;

    /// Deletes an entry. Returns false if it did not exist.
    async fn delete(&self, key: &CatalogKey) -> Result<bool, Self::Error>;

    /// Applies a batch of changes atomically: either every change lands or
    /// none does.
    async fn apply(&self, changes: Vec<CatalogChange>) -> Result<(), Self::Error>;
}

/// Looks up the catalog entry for a provider and model (or tool).
///
/// # Errors
///
/// Returns [`CoreError::PricingNotFound`] (converted into the store's error
/// type) when no entry exists, or the store's own error when the lookup fails.
pub async fn find_pricing<S: CatalogStore + ?Sized>(
    store: &S,
    provider_id: &str,
    model_id: &str,
) -> Result<CatalogEntry, S::Error> {
    let key = CatalogKey::new(provider_id, model_id);
    store.get(&key).await?.ok_or_else(|| {
        CoreError::PricingNotFound {
            provider_id: provider_id.to_string(),
            model_id: model_id.to_string(),
        }
        .into()
    })
}

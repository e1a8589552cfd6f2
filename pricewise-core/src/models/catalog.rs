//! Pricing catalog types.
//!
//! A [`CatalogEntry`] ties a [`PricingPolicy`] to one provider model or tool.
//! The catalog holds exactly one entry per [`CatalogKey`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::pricing::PricingPolicy;

// ============================================================================
// Catalog Key
// ============================================================================

/// Unique key of a catalog entry: provider plus model (or tool) identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogKey {
    /// Provider identifier.
    pub provider_id: String,
    /// Model or tool identifier.
    pub model_id: String,
}

impl CatalogKey {
    /// Creates a key.
    pub fn new(provider_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            model_id: model_id.into(),
        }
    }
}

impl fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider_id, self.model_id)
    }
}

// ============================================================================
// Limits
// ============================================================================

/// Context and output limits of a model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelLimits {
    /// Maximum context window, in tokens.
    #[serde(default)]
    pub context: u64,
    /// Maximum output, in tokens.
    #[serde(default)]
    pub output: u64,
}

// ============================================================================
// Catalog Entry
// ============================================================================

/// One priced model or tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Provider identifier.
    pub provider_id: String,
    /// Provider display name.
    pub provider_name: String,
    /// Model or tool identifier.
    pub model_id: String,
    /// Model or tool display name.
    pub model_name: String,
    /// How usage of this model is priced.
    pub pricing: PricingPolicy,
    /// Model limits.
    #[serde(default)]
    pub limits: ModelLimits,
    /// When the tracked fields last changed.
    pub last_updated: DateTime<Utc>,
}

impl CatalogEntry {
    /// Returns this entry's key.
    pub fn key(&self) -> CatalogKey {
        CatalogKey::new(&self.provider_id, &self.model_id)
    }

    /// Returns true if any tracked field (pricing, limits, display names)
    /// differs from `other`. Keys and timestamps are not compared.
    pub fn differs_from(&self, other: &CatalogEntry) -> bool {
        self.pricing != other.pricing
            || self.limits != other.limits
            || self.provider_name != other.provider_name
            || self.model_name != other.model_name
    }

    /// Builds the patch that brings this entry in line with `remote`.
    pub fn patch_towards(&self, remote: &CatalogEntry, now: DateTime<Utc>) -> CatalogPatch {
        CatalogPatch {
            provider_name: Some(remote.provider_name.clone()),
            model_name: Some(remote.model_name.clone()),
            pricing: Some(remote.pricing.clone()),
            limits: Some(remote.limits),
            last_updated: now,
        }
    }

    /// Applies a patch in place.
    pub fn apply_patch(&mut self, patch: &CatalogPatch) {
        if let Some(name) = &patch.provider_name {
            self.provider_name.clone_from(name);
        }
        if let Some(name) = &patch.model_name {
            self.model_name.clone_from(name);
        }
        if let Some(pricing) = &patch.pricing {
            self.pricing = pricing.clone();
        }
        if let Some(limits) = patch.limits {
            self.limits = limits;
        }
        self.last_updated = patch.last_updated;
    }
}

/// Partial update of a catalog entry. `None` fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPatch {
    /// New provider display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    /// New model display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// New pricing policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<PricingPolicy>,
    /// New limits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<ModelLimits>,
    /// Update timestamp.
    pub last_updated: DateTime<Utc>,
}

impl CatalogPatch {
    /// A patch that only bumps `last_updated`.
    pub fn touch(now: DateTime<Utc>) -> Self {
        Self {
            provider_name: None,
            model_name: None,
            pricing: None,
            limits: None,
            last_updated: now,
        }
    }
}

/// One write in a catalog batch.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogChange {
    /// Insert a new entry.
    Insert(CatalogEntry),
    /// Patch an existing entry.
    Update {
        /// Entry to patch.
        key: CatalogKey,
        /// Fields to replace.
        patch: CatalogPatch,
    },
    /// Delete an entry.
    Delete(CatalogKey),
}

impl CatalogChange {
    /// Returns the key this change touches.
    pub fn key(&self) -> CatalogKey {
        match self {
            Self::Insert(entry) => entry.key(),
            Self::Update { key, .. } | Self::Delete(key) => key.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

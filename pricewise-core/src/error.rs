//! Core error types for pricewise.

use thiserror::Error;

use crate::models::UsageKind;

/// Core error type for cost calculation and pricing lookups.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The usage record and pricing policy describe different kinds.
    #[error("Usage kind '{usage}' does not match pricing kind '{pricing}'")]
    KindMismatch {
        /// Kind of the usage record.
        usage: UsageKind,
        /// Kind of the pricing policy.
        pricing: UsageKind,
    },

    /// No catalog entry exists for the requested identifiers.
    #[error("No pricing found for {provider_id}/{model_id}")]
    PricingNotFound {
        /// Provider identifier.
        provider_id: String,
        /// Model or tool identifier.
        model_id: String,
    },

    /// Malformed usage or pricing payload.
    #[error("Validation failed: {0}")]
    Validation(String),
}

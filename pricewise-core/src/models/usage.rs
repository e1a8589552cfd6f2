//! Usage record types.
//!
//! A [`UsageRecord`] describes one unit of metered consumption. It is a
//! closed set of ten kinds, each carrying the quantities relevant to that
//! metering style:
//!
//! - [`UsageKind::Credits`] - credit count with optional credit type
//! - [`UsageKind::Tokens`] - prompt/completion/reasoning/cache token counts
//! - [`UsageKind::Requests`] - request count with optional request type
//! - [`UsageKind::Compute`] - duration in milliseconds
//! - [`UsageKind::Storage`] - bytes held for a duration
//! - [`UsageKind::Bandwidth`] - bytes in/out with optional region
//! - [`UsageKind::Units`] - generic unit count
//! - [`UsageKind::Tiered`] - a quantity priced by range
//! - [`UsageKind::Composite`] - named components priced separately
//! - [`UsageKind::Custom`] - opaque data priced by the caller

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

// ============================================================================
// Usage Kind
// ============================================================================

/// The tag shared by usage records, pricing policies and cost breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageKind {
    /// Prepaid or metered credits.
    Credits,
    /// LLM tokens.
    Tokens,
    /// API requests.
    Requests,
    /// Compute time.
    Compute,
    /// Stored bytes over time.
    Storage,
    /// Transferred bytes.
    Bandwidth,
    /// Generic units.
    Units,
    /// Range-priced quantity.
    Tiered,
    /// Multiple named components.
    Composite,
    /// Caller-priced opaque usage.
    Custom,
}

impl UsageKind {
    /// Returns the wire tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credits => "credits",
            Self::Tokens => "tokens",
            Self::Requests => "requests",
            Self::Compute => "compute",
            Self::Storage => "storage",
            Self::Bandwidth => "bandwidth",
            Self::Units => "units",
            Self::Tiered => "tiered",
            Self::Composite => "composite",
            Self::Custom => "custom",
        }
    }

    /// Returns all kinds.
    pub fn all() -> &'static [UsageKind] {
        &[
            Self::Credits,
            Self::Tokens,
            Self::Requests,
            Self::Compute,
            Self::Storage,
            Self::Bandwidth,
            Self::Units,
            Self::Tiered,
            Self::Composite,
            Self::Custom,
        ]
    }
}

impl fmt::Display for UsageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Usage Record
// ============================================================================

/// One metered usage event, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UsageRecord {
    /// Credit consumption.
    Credits(CreditsUsage),
    /// Token consumption.
    Tokens(TokenUsage),
    /// Request count.
    Requests(RequestUsage),
    /// Compute duration.
    Compute(ComputeUsage),
    /// Storage held over time.
    Storage(StorageUsage),
    /// Data transfer.
    Bandwidth(BandwidthUsage),
    /// Generic units.
    Units(UnitsUsage),
    /// Quantity priced by tier.
    Tiered(TieredUsage),
    /// Named components.
    Composite(CompositeUsage),
    /// Opaque caller data.
    Custom(CustomUsage),
}

impl UsageRecord {
    /// Returns the kind tag of this record.
    pub fn kind(&self) -> UsageKind {
        match self {
            Self::Credits(_) => UsageKind::Credits,
            Self::Tokens(_) => UsageKind::Tokens,
            Self::Requests(_) => UsageKind::Requests,
            Self::Compute(_) => UsageKind::Compute,
            Self::Storage(_) => UsageKind::Storage,
            Self::Bandwidth(_) => UsageKind::Bandwidth,
            Self::Units(_) => UsageKind::Units,
            Self::Tiered(_) => UsageKind::Tiered,
            Self::Composite(_) => UsageKind::Composite,
            Self::Custom(_) => UsageKind::Custom,
        }
    }

    /// Checks that every quantity is finite and non-negative.
    ///
    /// Token counts are unsigned and cannot be malformed, so only the
    /// floating-point quantities are inspected.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::Credits(u) => check_quantity("credits", u.credits),
            Self::Tokens(_) | Self::Requests(_) | Self::Bandwidth(_) | Self::Custom(_) => Ok(()),
            Self::Compute(u) => check_quantity("durationMs", u.duration_ms),
            Self::Storage(u) => {
                check_quantity("bytes", u.bytes)?;
                if let Some(secs) = u.duration_seconds {
                    check_quantity("durationSeconds", secs)?;
                }
                Ok(())
            }
            Self::Units(u) => check_quantity("units", u.units),
            Self::Tiered(u) => check_quantity("quantity", u.quantity),
            Self::Composite(u) => u
                .components
                .iter()
                .try_for_each(|c| check_quantity(&c.name, c.quantity)),
        }
    }
}

fn check_quantity(field: &str, value: f64) -> Result<(), CoreError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{field} must be a finite, non-negative number (got {value})"
        )))
    }
}

// ============================================================================
// Per-kind payloads
// ============================================================================

/// Credit consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditsUsage {
    /// Number of credits consumed.
    pub credits: f64,
    /// Optional credit type, used to select a type-specific rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_type: Option<String>,
}

/// Token consumption for a single model call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Input (prompt) tokens.
    #[serde(default)]
    pub prompt_tokens: u64,
    /// Output (completion) tokens.
    #[serde(default)]
    pub completion_tokens: u64,
    /// Reasoning tokens, billed separately from completion tokens.
    #[serde(default)]
    pub reasoning_tokens: u64,
    /// Tokens served from the prompt cache.
    #[serde(default)]
    pub cache_read_tokens: u64,
    /// Tokens written to the prompt cache.
    #[serde(default)]
    pub cache_write_tokens: u64,
}

impl TokenUsage {
    /// Creates a usage with only prompt and completion tokens.
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            ..Self::default()
        }
    }

    /// Total of all token counts, saturating at `u64::MAX`.
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens
            .saturating_add(self.completion_tokens)
            .saturating_add(self.reasoning_tokens)
            .saturating_add(self.cache_read_tokens)
            .saturating_add(self.cache_write_tokens)
    }
}

/// Request count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestUsage {
    /// Number of requests.
    pub requests: u64,
    /// Optional request type, used to select a type-specific rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_type: Option<String>,
}

/// Compute duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeUsage {
    /// Duration in milliseconds.
    pub duration_ms: f64,
    /// Optional compute type (e.g. "gpu"), used to select a type-specific rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_type: Option<String>,
    /// Optional tier name, used to look up a rate multiplier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

/// Bytes stored over a duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    /// Bytes stored.
    pub bytes: f64,
    /// How long the bytes were held, in seconds. Defaults to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    /// Optional storage class, used to select a class-specific rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
}

/// Data transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandwidthUsage {
    /// Bytes received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_in: Option<u64>,
    /// Bytes sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_out: Option<u64>,
    /// Optional region, used to look up a rate multiplier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Generic units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitsUsage {
    /// Number of units.
    pub units: f64,
    /// What a unit is (e.g. "image", "page").
    pub unit_type: String,
}

/// A quantity priced by tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TieredUsage {
    /// The metered quantity.
    pub quantity: f64,
    /// What the quantity counts.
    pub unit_type: String,
}

/// Usage made of several named components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeUsage {
    /// The components, matched to pricing components by name.
    pub components: Vec<UsageComponent>,
}

/// One named component of a composite usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageComponent {
    /// Component name.
    pub name: String,
    /// Quantity consumed.
    pub quantity: f64,
    /// What the quantity counts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_type: Option<String>,
}

/// Opaque usage priced outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomUsage {
    /// Arbitrary caller data, carried into the cost breakdown verbatim.
    #[serde(default)]
    pub data: serde_json::Value,
}

// ============================================================================
// Tests
// ============================================================================

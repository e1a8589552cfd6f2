//! Cost output types.
//!
//! - [`Cost`] - raw monetary cost of one usage record
//! - [`CostForUser`] - the marked-up, user-facing counterpart
//! - [`CostBreakdown`] - how a total was derived, tagged by usage kind
//!
//! Every monetary field is rounded to [`MONEY_DECIMALS`] places with [`round8`].

use serde::{Deserialize, Serialize};

use crate::models::usage::UsageKind;

/// Decimal places kept on every monetary value.
pub const MONEY_DECIMALS: i32 = 8;

const MONEY_SCALE: f64 = 100_000_000.0;

/// Rounds to 8 decimal places, halves away from zero.
///
/// Non-finite values are returned unchanged.
pub fn round8(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let rounded = (value * MONEY_SCALE).round() / MONEY_SCALE;
    // Normalize -0.0 so serialized output never shows a negative zero.
    if rounded == 0.0 { 0.0 } else { rounded }
}

// ============================================================================
// Cost
// ============================================================================

/// Raw cost of a usage record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cost {
    /// Total amount.
    pub amount: f64,
    /// Currency code, taken from the pricing policy.
    pub currency: String,
    /// How the amount was derived.
    pub breakdown: CostBreakdown,
}

/// User-facing cost after markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostForUser {
    /// Total amount charged to the user.
    pub amount: f64,
    /// Currency code.
    pub currency: String,
    /// Breakdown of the underlying raw cost.
    pub breakdown: CostBreakdown,
    /// Multiplier applied; absent when it was exactly 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup_multiplier: Option<f64>,
}

impl CostForUser {
    /// Returns true if a markup other than 1 was applied.
    pub fn is_marked_up(&self) -> bool {
        self.markup_multiplier.is_some()
    }
}

/// Result of a cost computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostResult {
    /// Raw cost.
    pub cost: Cost,
    /// Marked-up cost.
    pub cost_for_user: CostForUser,
}

// ============================================================================
// Breakdown
// ============================================================================

/// How a cost was derived. Mirrors the usage kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CostBreakdown {
    /// Credits times rate.
    #[serde(rename_all = "camelCase")]
    Credits {
        /// Credits consumed.
        credits: f64,
        /// Rate applied per credit.
        rate: f64,
        /// Resulting amount.
        amount: f64,
    },
    /// Per-token-class costs.
    #[serde(rename_all = "camelCase")]
    Tokens {
        /// Cost of prompt tokens.
        prompt_tokens_cost: f64,
        /// Cost of completion tokens.
        completion_tokens_cost: f64,
        /// Cost of reasoning tokens.
        reasoning_tokens_cost: f64,
        /// Cost of cache-read tokens.
        cache_read_tokens_cost: f64,
        /// Cost of cache-write tokens.
        cache_write_tokens_cost: f64,
        /// Sum of the above.
        total_cost: f64,
    },
    /// Requests times rate.
    #[serde(rename_all = "camelCase")]
    Requests {
        /// Requests made.
        requests: u64,
        /// Rate applied per request.
        rate: f64,
        /// Resulting amount.
        amount: f64,
    },
    /// Duration times effective rate.
    #[serde(rename_all = "camelCase")]
    Compute {
        /// Duration in milliseconds.
        duration_ms: f64,
        /// Effective rate per millisecond after type and tier adjustments.
        rate: f64,
        /// Resulting amount.
        amount: f64,
    },
    /// Bytes times duration times rate.
    #[serde(rename_all = "camelCase")]
    Storage {
        /// Bytes stored.
        bytes: f64,
        /// Seconds held.
        duration_seconds: f64,
        /// Rate per byte-second.
        rate: f64,
        /// Resulting amount.
        amount: f64,
    },
    /// Inbound and outbound transfer costs.
    #[serde(rename_all = "camelCase")]
    Bandwidth {
        /// Cost of inbound bytes.
        inbound_cost: f64,
        /// Cost of outbound bytes.
        outbound_cost: f64,
        /// Region multiplier applied to both.
        region_multiplier: f64,
        /// Sum of both components.
        amount: f64,
    },
    /// Units times rate.
    #[serde(rename_all = "camelCase")]
    Units {
        /// Units consumed.
        units: f64,
        /// Rate per unit.
        cost_per_unit: f64,
        /// Resulting amount.
        amount: f64,
    },
    /// Quantity times the rate of the matched tier.
    #[serde(rename_all = "camelCase")]
    Tiered {
        /// Quantity consumed.
        quantity: f64,
        /// Range of the applied tier, e.g. `"100-∞"`.
        tier_applied: String,
        /// Rate of the applied tier.
        effective_rate: f64,
        /// Resulting amount.
        amount: f64,
    },
    /// Per-component costs.
    #[serde(rename_all = "camelCase")]
    Composite {
        /// Cost of each usage component.
        components: Vec<ComponentCost>,
        /// Sum of component costs.
        amount: f64,
    },
    /// Opaque data; priced by the caller.
    #[serde(rename_all = "camelCase")]
    Custom {
        /// Usage data, carried verbatim.
        data: serde_json::Value,
        /// Always zero.
        amount: f64,
    },
}

impl CostBreakdown {
    /// Returns the kind tag of this breakdown.
    pub fn kind(&self) -> UsageKind {
        match self {
            Self::Credits { .. } => UsageKind::Credits,
            Self::Tokens { .. } => UsageKind::Tokens,
            Self::Requests { .. } => UsageKind::Requests,
            Self::Compute { .. } => UsageKind::Compute,
            Self::Storage { .. } => UsageKind::Storage,
            Self::Bandwidth { .. } => UsageKind::Bandwidth,
            Self::Units { .. } => UsageKind::Units,
            Self::Tiered { .. } => UsageKind::Tiered,
            Self::Composite { .. } => UsageKind::Composite,
            Self::Custom { .. } => UsageKind::Custom,
        }
    }

    /// Returns the total recorded in this breakdown.
    pub fn amount(&self) -> f64 {
        match self {
            Self::Tokens { total_cost, .. } => *total_cost,
            Self::Credits { amount, .. }
            | Self::Requests { amount, .. }
            | Self::Compute { amount, .. }
            | Self::Storage { amount, .. }
            | Self::Bandwidth { amount, .. }
            | Self::Units { amount, .. }
            | Self::Tiered { amount, .. }
            | Self::Composite { amount, .. }
            | Self::Custom { amount, .. } => *amount,
        }
    }
}

/// Cost of one composite component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentCost {
    /// Component name.
    pub name: String,
    /// Quantity consumed.
    pub quantity: f64,
    /// Rate applied; zero when no pricing component matched.
    pub cost_per_unit: f64,
    /// Resulting cost.
    pub cost: f64,
}

// ============================================================================
// Tests
// ============================================================================

//! Pricing policy types.
//!
//! A [`PricingPolicy`] mirrors the ten usage kinds. Every variant carries its
//! rate fields plus an ISO-4217-style currency code.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::CoreError;
use crate::models::usage::UsageKind;

/// Currency used when a payload does not name one.
pub const DEFAULT_CURRENCY: &str = "USD";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

// ============================================================================
// Pricing Policy
// ============================================================================

/// Rate configuration for one usage kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PricingPolicy {
    /// Per-credit pricing.
    Credits(CreditsPricing),
    /// Per-million-token pricing.
    Tokens(TokenPricing),
    /// Per-request pricing.
    Requests(RequestPricing),
    /// Per-millisecond compute pricing.
    Compute(ComputePricing),
    /// Per-byte-second storage pricing.
    Storage(StoragePricing),
    /// Per-byte transfer pricing.
    Bandwidth(BandwidthPricing),
    /// Per-unit pricing.
    Units(UnitsPricing),
    /// Range-based pricing.
    Tiered(TieredPricing),
    /// Per-component pricing.
    Composite(CompositePricing),
    /// Caller-defined pricing.
    Custom(CustomPricing),
}

impl PricingPolicy {
    /// Returns the kind tag of this policy.
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

    /// Returns the currency code of this policy.
    pub fn currency(&self) -> &str {
        match self {
            Self::Credits(p) => &p.currency,
            Self::Tokens(p) => &p.currency,
            Self::Requests(p) => &p.currency,
            Self::Compute(p) => &p.currency,
            Self::Storage(p) => &p.currency,
            Self::Bandwidth(p) => &p.currency,
            Self::Units(p) => &p.currency,
            Self::Tiered(p) => &p.currency,
            Self::Composite(p) => &p.currency,
            Self::Custom(p) => &p.currency,
        }
    }

    /// Checks that all rates are finite and non-negative, and that tier
    /// lists are well formed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] describing the first problem found.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::Credits(p) => {
                check_rate("perCredit", p.per_credit)?;
                check_rate_map("creditTypes", &p.credit_types)
            }
            Self::Tokens(p) => {
                check_rate("input", p.input)?;
                check_rate("output", p.output)?;
                for (field, rate) in [
                    ("reasoning", p.reasoning),
                    ("cacheRead", p.cache_read),
                    ("cacheWrite", p.cache_write),
                ] {
                    if let Some(rate) = rate {
                        check_rate(field, rate)?;
                    }
                }
                Ok(())
            }
            Self::Requests(p) => {
                check_rate("perRequest", p.per_request)?;
                check_rate_map("requestTypes", &p.request_types)
            }
            Self::Compute(p) => {
                check_rate("perMs", p.per_ms)?;
                check_rate_map("computeTypes", &p.compute_types)?;
                check_rate_map("tierMultipliers", &p.tier_multipliers)
            }
            Self::Storage(p) => {
                check_rate("perByteSecond", p.per_byte_second)?;
                check_rate_map("storageClasses", &p.storage_classes)
            }
            Self::Bandwidth(p) => {
                check_rate("inboundPerByte", p.inbound_per_byte)?;
                check_rate("outboundPerByte", p.outbound_per_byte)?;
                check_rate_map("regionMultipliers", &p.region_multipliers)
            }
            Self::Units(p) => check_rate("costPerUnit", p.cost_per_unit),
            Self::Tiered(p) => p.validate_tiers(),
            Self::Composite(p) => p.components.iter().try_for_each(|c| match c.cost_per_unit {
                Some(rate) => check_rate(&c.name, rate),
                None => Ok(()),
            }),
            Self::Custom(_) => Ok(()),
        }
    }
}

fn check_rate(field: &str, value: f64) -> Result<(), CoreError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "rate {field} must be a finite, non-negative number (got {value})"
        )))
    }
}

fn check_rate_map(field: &str, rates: &BTreeMap<String, f64>) -> Result<(), CoreError> {
    rates
        .iter()
        .try_for_each(|(name, rate)| check_rate(&format!("{field}.{name}"), *rate))
}

// ============================================================================
// Per-kind policies
// ============================================================================

/// Per-credit pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditsPricing {
    /// Flat rate per credit.
    pub per_credit: f64,
    /// Rates by credit type, overriding the flat rate.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub credit_types: BTreeMap<String, f64>,
    /// Currency code.
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Token pricing, all rates per million tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPricing {
    /// Rate per million prompt tokens.
    pub input: f64,
    /// Rate per million completion tokens.
    pub output: f64,
    /// Rate per million reasoning tokens. Falls back to `output`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<f64>,
    /// Rate per million cache-read tokens. Falls back to a quarter of `input`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read: Option<f64>,
    /// Rate per million cache-write tokens. Falls back to `output`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_write: Option<f64>,
    /// Currency code.
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl TokenPricing {
    /// Creates token pricing with only input and output rates.
    pub fn new(input: f64, output: f64) -> Self {
        Self {
            input,
            output,
            reasoning: None,
            cache_read: None,
            cache_write: None,
            currency: default_currency(),
        }
    }
}

/// Per-request pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPricing {
    /// Flat rate per request.
    pub per_request: f64,
    /// Rates by request type, overriding the flat rate.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub request_types: BTreeMap<String, f64>,
    /// Currency code.
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Compute pricing per millisecond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputePricing {
    /// Flat rate per millisecond.
    pub per_ms: f64,
    /// Rates by compute type, overriding the flat rate.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub compute_types: BTreeMap<String, f64>,
    /// Multipliers applied to the rate by tier name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tier_multipliers: BTreeMap<String, f64>,
    /// Currency code.
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Storage pricing per byte-second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoragePricing {
    /// Flat rate per byte-second.
    pub per_byte_second: f64,
    /// Rates by storage class, overriding the flat rate.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub storage_classes: BTreeMap<String, f64>,
    /// Currency code.
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Transfer pricing per byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandwidthPricing {
    /// Rate per inbound byte.
    pub inbound_per_byte: f64,
    /// Rate per outbound byte.
    pub outbound_per_byte: f64,
    /// Multipliers applied to both rates by region.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub region_multipliers: BTreeMap<String, f64>,
    /// Currency code.
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Per-unit pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitsPricing {
    /// Rate per unit.
    pub cost_per_unit: f64,
    /// What a unit is.
    pub unit_type: String,
    /// Currency code.
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Range-based pricing.
///
/// Tiers are evaluated in list order and the first tier whose half-open
/// range contains the quantity applies to the whole quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TieredPricing {
    /// Ordered tiers.
    pub tiers: Vec<PriceTier>,
    /// What the quantity counts.
    pub unit_type: String,
    /// Currency code.
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl TieredPricing {
    /// Checks that tiers are non-empty, sorted, non-overlapping, and that
    /// only the last tier may be unbounded.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] on the first malformed tier.
    pub fn validate_tiers(&self) -> Result<(), CoreError> {
        if self.tiers.is_empty() {
            return Err(CoreError::Validation("tier list is empty".to_string()));
        }

        let last = self.tiers.len() - 1;
        for (i, tier) in self.tiers.iter().enumerate() {
            if !tier.from.is_finite() || tier.from < 0.0 {
                return Err(CoreError::Validation(format!(
                    "tier {i} has invalid lower bound {}",
                    tier.from
                )));
            }
            check_rate(&format!("tiers[{i}].rate"), tier.rate)?;

            match tier.to {
                Some(to) if !(to > tier.from) => {
                    return Err(CoreError::Validation(format!(
                        "tier {i} has empty range {}",
                        tier.label()
                    )));
                }
                None if i != last => {
                    return Err(CoreError::Validation(format!(
                        "tier {i} is unbounded but is not the last tier"
                    )));
                }
                _ => {}
            }

            if let (Some(to), Some(next)) = (tier.to, self.tiers.get(i + 1)) {
                if next.from < to {
                    return Err(CoreError::Validation(format!(
                        "tier {} ({}) overlaps or precedes tier {i} ({})",
                        i + 1,
                        next.label(),
                        tier.label()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Returns the first tier whose range contains `quantity`.
    pub fn tier_for(&self, quantity: f64) -> Option<&PriceTier> {
        self.tiers.iter().find(|t| t.contains(quantity))
    }
}

/// One price tier covering `[from, to)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTier {
    /// Inclusive lower bound.
    pub from: f64,
    /// Exclusive upper bound; `None` means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<f64>,
    /// Rate per unit of quantity within this tier.
    pub rate: f64,
}

impl PriceTier {
    /// Returns true if `quantity` falls in `[from, to)`.
    pub fn contains(&self, quantity: f64) -> bool {
        quantity >= self.from && self.to.is_none_or(|to| quantity < to)
    }

    /// Human-readable range, e.g. `"0-100"` or `"100-∞"`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to {
            Some(to) => write!(f, "{}-{}", self.from, to),
            None => write!(f, "{}-∞", self.from),
        }
    }
}

/// Per-component pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositePricing {
    /// Priced components, matched to usage components by name.
    pub components: Vec<PricedComponent>,
    /// Currency code.
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// One priced component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedComponent {
    /// Component name.
    pub name: String,
    /// Rate per unit; absent means the component is free.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_unit: Option<f64>,
    /// What the quantity counts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_type: Option<String>,
}

/// Caller-defined pricing. Always computes to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPricing {
    /// Arbitrary caller configuration.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Currency code.
    #[serde(default = "default_currency")]
    pub currency: String,
}

// ============================================================================
// Tests
// ============================================================================

//! Cost calculation.
//!
//! Pure functions mapping a [`UsageRecord`] and a [`PricingPolicy`] of the
//! same kind to a [`Cost`], and a cost plus a markup multiplier to a
//! [`CostForUser`].
//!
//! Every monetary intermediate is passed through [`round8`] before it feeds
//! into a further sum, so totals are reproducible bit-for-bit.
//!
//! ```
//! use pricewise_core::{compute, PricingPolicy, TokenPricing, TokenUsage, UsageRecord};
//!
//! let usage = UsageRecord::Tokens(TokenUsage::new(1_000_000, 0));
//! let pricing = PricingPolicy::Tokens(TokenPricing::new(2.0, 0.0));
//!
//! let result = compute(&usage, &pricing, 1.0).unwrap();
//! assert_eq!(result.cost.amount, 2.0);
//! assert_eq!(result.cost_for_user.amount, 2.0);
//! ```

use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::models::{
    round8, BandwidthPricing, BandwidthUsage, ComponentCost, CompositePricing, CompositeUsage,
    ComputePricing, ComputeUsage, Cost, CostBreakdown, CostForUser, CostResult, CreditsPricing,
    CreditsUsage, PricingPolicy, RequestPricing, RequestUsage, StoragePricing, StorageUsage,
    TieredPricing, TieredUsage, TokenPricing, TokenUsage, UsageRecord,
};

/// Multiplier that leaves the cost unchanged.
pub const NO_MARKUP: f64 = 1.0;

const TOKENS_PER_MILLION: f64 = 1_000_000.0;

/// Cache reads are billed at this fraction of the input rate when the
/// pricing does not name a cache-read rate.
const CACHE_READ_INPUT_FRACTION: f64 = 0.25;

/// Computes the raw cost and the marked-up cost of one usage record.
///
/// # Errors
///
/// - [`CoreError::KindMismatch`] if the usage and pricing kinds differ.
/// - [`CoreError::Validation`] if a tiered policy has malformed tiers or
///   no tier covers the quantity.
pub fn compute(
    usage: &UsageRecord,
    pricing: &PricingPolicy,
    markup_multiplier: f64,
) -> Result<CostResult, CoreError> {
    let cost = compute_cost(usage, pricing)?;
    let cost_for_user = apply_markup(&cost, markup_multiplier);
    Ok(CostResult {
        cost,
        cost_for_user,
    })
}

/// Like [`compute`], but first validates both payloads.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] for negative or non-finite quantities
/// and rates, in addition to the errors of [`compute`].
pub fn compute_validated(
    usage: &UsageRecord,
    pricing: &PricingPolicy,
    markup_multiplier: f64,
) -> Result<CostResult, CoreError> {
    ensure_same_kind(usage, pricing)?;
    usage.validate()?;
    pricing.validate()?;
    if !markup_multiplier.is_finite() || markup_multiplier < 0.0 {
        return Err(CoreError::Validation(format!(
            "markup multiplier must be a finite, non-negative number (got {markup_multiplier})"
        )));
    }
    compute(usage, pricing, markup_multiplier)
}

/// Computes the raw cost of one usage record.
///
/// # Errors
///
/// See [`compute`].
pub fn compute_cost(usage: &UsageRecord, pricing: &PricingPolicy) -> Result<Cost, CoreError> {
    let breakdown = match (usage, pricing) {
        (UsageRecord::Credits(u), PricingPolicy::Credits(p)) => credits_cost(u, p),
        (UsageRecord::Tokens(u), PricingPolicy::Tokens(p)) => tokens_cost(u, p),
        (UsageRecord::Requests(u), PricingPolicy::Requests(p)) => requests_cost(u, p),
        (UsageRecord::Compute(u), PricingPolicy::Compute(p)) => compute_time_cost(u, p),
        (UsageRecord::Storage(u), PricingPolicy::Storage(p)) => storage_cost(u, p),
        (UsageRecord::Bandwidth(u), PricingPolicy::Bandwidth(p)) => bandwidth_cost(u, p),
        (UsageRecord::Units(u), PricingPolicy::Units(p)) => CostBreakdown::Units {
            units: u.units,
            cost_per_unit: p.cost_per_unit,
            amount: round8(u.units * p.cost_per_unit),
        },
        (UsageRecord::Tiered(u), PricingPolicy::Tiered(p)) => tiered_cost(u, p)?,
        (UsageRecord::Composite(u), PricingPolicy::Composite(p)) => composite_cost(u, p),
        (UsageRecord::Custom(u), PricingPolicy::Custom(_)) => CostBreakdown::Custom {
            data: u.data.clone(),
            amount: 0.0,
        },
        // Listed per variant so a new kind fails to compile until it is handled.
        (
            UsageRecord::Credits(_)
            | UsageRecord::Tokens(_)
            | UsageRecord::Requests(_)
            | UsageRecord::Compute(_)
            | UsageRecord::Storage(_)
            | UsageRecord::Bandwidth(_)
            | UsageRecord::Units(_)
            | UsageRecord::Tiered(_)
            | UsageRecord::Composite(_)
            | UsageRecord::Custom(_),
            _,
        ) => {
            return Err(CoreError::KindMismatch {
                usage: usage.kind(),
                pricing: pricing.kind(),
            });
        }
    };

    Ok(Cost {
        amount: breakdown.amount(),
        currency: pricing.currency().to_string(),
        breakdown,
    })
}

/// Applies a markup multiplier to a raw cost.
///
/// A multiplier of exactly 1 is a no-op and leaves `markup_multiplier`
/// unset on the result.
#[allow(clippy::float_cmp)]
pub fn apply_markup(cost: &Cost, markup_multiplier: f64) -> CostForUser {
    let (amount, recorded) = if markup_multiplier == NO_MARKUP {
        (cost.amount, None)
    } else {
        (round8(cost.amount * markup_multiplier), Some(markup_multiplier))
    };

    CostForUser {
        amount,
        currency: cost.currency.clone(),
        breakdown: cost.breakdown.clone(),
        markup_multiplier: recorded,
    }
}

fn ensure_same_kind(usage: &UsageRecord, pricing: &PricingPolicy) -> Result<(), CoreError> {
    if usage.kind() == pricing.kind() {
        Ok(())
    } else {
        Err(CoreError::KindMismatch {
            usage: usage.kind(),
            pricing: pricing.kind(),
        })
    }
}

/// Looks up a named rate, falling back to `default` when the name is absent
/// or unknown.
fn named_rate(rates: &BTreeMap<String, f64>, name: Option<&str>, default: f64) -> f64 {
    name.and_then(|n| rates.get(n)).copied().unwrap_or(default)
}

// ============================================================================
// Per-kind formulas
// ============================================================================

fn credits_cost(usage: &CreditsUsage, pricing: &CreditsPricing) -> CostBreakdown {
    let rate = named_rate(
        &pricing.credit_types,
        usage.credit_type.as_deref(),
        pricing.per_credit,
    );
    CostBreakdown::Credits {
        credits: usage.credits,
        rate,
        amount: round8(usage.credits * rate),
    }
}

#[allow(clippy::cast_precision_loss)]
fn per_million(tokens: u64, rate: f64) -> f64 {
    round8(tokens as f64 / TOKENS_PER_MILLION * rate)
}

fn tokens_cost(usage: &TokenUsage, pricing: &TokenPricing) -> CostBreakdown {
    let reasoning_rate = pricing.reasoning.unwrap_or(pricing.output);
    let cache_read_rate = pricing
        .cache_read
        .unwrap_or(pricing.input * CACHE_READ_INPUT_FRACTION);
    let cache_write_rate = pricing.cache_write.unwrap_or(pricing.output);

    let prompt = per_million(usage.prompt_tokens, pricing.input);
    let completion = per_million(usage.completion_tokens, pricing.output);
    let reasoning = per_million(usage.reasoning_tokens, reasoning_rate);
    let cache_read = per_million(usage.cache_read_tokens, cache_read_rate);
    let cache_write = per_million(usage.cache_write_tokens, cache_write_rate);

    CostBreakdown::Tokens {
        prompt_tokens_cost: prompt,
        completion_tokens_cost: completion,
        reasoning_tokens_cost: reasoning,
        cache_read_tokens_cost: cache_read,
        cache_write_tokens_cost: cache_write,
        total_cost: round8(prompt + completion + reasoning + cache_read + cache_write),
    }
}

#[allow(clippy::cast_precision_loss)]
fn requests_cost(usage: &RequestUsage, pricing: &RequestPricing) -> CostBreakdown {
    let rate = named_rate(
        &pricing.request_types,
        usage.request_type.as_deref(),
        pricing.per_request,
    );
    CostBreakdown::Requests {
        requests: usage.requests,
        rate,
        amount: round8(usage.requests as f64 * rate),
    }
}

fn compute_time_cost(usage: &ComputeUsage, pricing: &ComputePricing) -> CostBreakdown {
    let mut rate = named_rate(
        &pricing.compute_types,
        usage.compute_type.as_deref(),
        pricing.per_ms,
    );
    if let Some(multiplier) = usage
        .tier
        .as_deref()
        .and_then(|tier| pricing.tier_multipliers.get(tier))
    {
        rate *= multiplier;
    }

    CostBreakdown::Compute {
        duration_ms: usage.duration_ms,
        rate,
        amount: round8(usage.duration_ms * rate),
    }
}

fn storage_cost(usage: &StorageUsage, pricing: &StoragePricing) -> CostBreakdown {
    let duration_seconds = usage.duration_seconds.unwrap_or(1.0);
    let rate = named_rate(
        &pricing.storage_classes,
        usage.storage_class.as_deref(),
        pricing.per_byte_second,
    );
    CostBreakdown::Storage {
        bytes: usage.bytes,
        duration_seconds,
        rate,
        amount: round8(usage.bytes * duration_seconds * rate),
    }
}

#[allow(clippy::cast_precision_loss)]
fn bandwidth_cost(usage: &BandwidthUsage, pricing: &BandwidthPricing) -> CostBreakdown {
    let region_multiplier = named_rate(&pricing.region_multipliers, usage.region.as_deref(), 1.0);

    let inbound = usage.bytes_in.map_or(0.0, |bytes| {
        round8(bytes as f64 * pricing.inbound_per_byte * region_multiplier)
    });
    let outbound = usage.bytes_out.map_or(0.0, |bytes| {
        round8(bytes as f64 * pricing.outbound_per_byte * region_multiplier)
    });

    CostBreakdown::Bandwidth {
        inbound_cost: inbound,
        outbound_cost: outbound,
        region_multiplier,
        amount: round8(inbound + outbound),
    }
}

fn tiered_cost(usage: &TieredUsage, pricing: &TieredPricing) -> Result<CostBreakdown, CoreError> {
    pricing.validate_tiers()?;

    let tier = pricing.tier_for(usage.quantity).ok_or_else(|| {
        CoreError::Validation(format!(
            "quantity {} {} falls outside every tier",
            usage.quantity, usage.unit_type
        ))
    })?;

    Ok(CostBreakdown::Tiered {
        quantity: usage.quantity,
        tier_applied: tier.label(),
        effective_rate: tier.rate,
        amount: round8(usage.quantity * tier.rate),
    })
}

fn composite_cost(usage: &CompositeUsage, pricing: &CompositePricing) -> CostBreakdown {
    let components: Vec<ComponentCost> = usage
        .components
        .iter()
        .map(|component| {
            let cost_per_unit = pricing
                .components
                .iter()
                .find(|priced| priced.name == component.name)
                .and_then(|priced| priced.cost_per_unit)
                .unwrap_or(0.0);
            ComponentCost {
                name: component.name.clone(),
                quantity: component.quantity,
                cost_per_unit,
                cost: round8(component.quantity * cost_per_unit),
            }
        })
        .collect();

    let amount = round8(components.iter().map(|c| c.cost).sum());
    CostBreakdown::Composite { components, amount }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CustomPricing, CustomUsage, PriceTier, PricedComponent, UnitsPricing, UnitsUsage,
        UsageComponent, UsageKind,
    };
    use serde_json::json;

    fn usd() -> String {
        "USD".to_string()
    }

    fn token_pricing(input: f64, output: f64) -> PricingPolicy {
        PricingPolicy::Tokens(TokenPricing::new(input, output))
    }

    #[test]
    fn test_one_million_prompt_tokens() {
        let usage = UsageRecord::Tokens(TokenUsage::new(1_000_000, 0));
        let result = compute(&usage, &token_pricing(2.0, 0.0), 1.0).unwrap();

        match &result.cost.breakdown {
            CostBreakdown::Tokens {
                prompt_tokens_cost,
                total_cost,
                ..
            } => {
                assert_eq!(*prompt_tokens_cost, 2.0);
                assert_eq!(*total_cost, 2.0);
            }
            other => panic!("unexpected breakdown {other:?}"),
        }
        assert_eq!(result.cost.amount, 2.0);
        assert_eq!(result.cost.currency, "USD");
    }

    #[test]
    fn test_token_rate_fallbacks() {
        let usage = UsageRecord::Tokens(TokenUsage {
            prompt_tokens: 0,
            completion_tokens: 0,
            reasoning_tokens: 1_000_000,
            cache_read_tokens: 1_000_000,
            cache_write_tokens: 1_000_000,
        });
        let cost = compute_cost(&usage, &token_pricing(4.0, 12.0)).unwrap();

        let CostBreakdown::Tokens {
            reasoning_tokens_cost,
            cache_read_tokens_cost,
            cache_write_tokens_cost,
            total_cost,
            ..
        } = cost.breakdown
        else {
            panic!("expected token breakdown");
        };
        // reasoning -> output rate, cache read -> input * 0.25, cache write -> output rate
        assert_eq!(reasoning_tokens_cost, 12.0);
        assert_eq!(cache_read_tokens_cost, 1.0);
        assert_eq!(cache_write_tokens_cost, 12.0);
        assert_eq!(total_cost, 25.0);
    }

    #[test]
    fn test_explicit_token_rates_win() {
        let pricing = PricingPolicy::Tokens(TokenPricing {
            reasoning: Some(1.0),
            cache_read: Some(0.5),
            cache_write: Some(3.75),
            ..TokenPricing::new(3.0, 15.0)
        });
        let usage = UsageRecord::Tokens(TokenUsage {
            prompt_tokens: 1000,
            completion_tokens: 500,
            reasoning_tokens: 2_000_000,
            cache_read_tokens: 2_000_000,
            cache_write_tokens: 1_000_000,
        });
        let cost = compute_cost(&usage, &pricing).unwrap();
        // 0.003 + 0.0075 + 2.0 + 1.0 + 3.75
        assert_eq!(cost.amount, 6.7605);
    }

    #[test]
    fn test_token_subtotals_rounded() {
        // 1 token at $1/MTok = 0.000001; 7 tokens at $0.3/MTok = 0.0000021
        let usage = UsageRecord::Tokens(TokenUsage::new(1, 7));
        let cost = compute_cost(&usage, &token_pricing(1.0, 0.3)).unwrap();
        let CostBreakdown::Tokens {
            prompt_tokens_cost,
            completion_tokens_cost,
            ..
        } = cost.breakdown
        else {
            panic!("expected token breakdown");
        };
        assert_eq!(prompt_tokens_cost, 0.000_001);
        assert_eq!(completion_tokens_cost, 0.000_002_1);
        assert_eq!(cost.amount, 0.000_003_1);
    }

    #[test]
    fn test_credits_type_specific_rate() {
        let pricing = PricingPolicy::Credits(CreditsPricing {
            per_credit: 0.01,
            credit_types: BTreeMap::from([("premium".to_string(), 0.05)]),
            currency: usd(),
        });

        let typed = UsageRecord::Credits(CreditsUsage {
            credits: 10.0,
            credit_type: Some("premium".to_string()),
        });
        assert_eq!(compute_cost(&typed, &pricing).unwrap().amount, 0.5);

        let unknown = UsageRecord::Credits(CreditsUsage {
            credits: 10.0,
            credit_type: Some("basic".to_string()),
        });
        assert_eq!(compute_cost(&unknown, &pricing).unwrap().amount, 0.1);
    }

    #[test]
    fn test_requests_flat_and_typed() {
        let pricing = PricingPolicy::Requests(RequestPricing {
            per_request: 0.002,
            request_types: BTreeMap::from([("search".to_string(), 0.005)]),
            currency: usd(),
        });
        let flat = UsageRecord::Requests(RequestUsage {
            requests: 100,
            request_type: None,
        });
        let search = UsageRecord::Requests(RequestUsage {
            requests: 100,
            request_type: Some("search".to_string()),
        });
        assert_eq!(compute_cost(&flat, &pricing).unwrap().amount, 0.2);
        assert_eq!(compute_cost(&search, &pricing).unwrap().amount, 0.5);
    }

    #[test]
    fn test_compute_type_and_tier() {
        let pricing = PricingPolicy::Compute(ComputePricing {
            per_ms: 0.000_01,
            compute_types: BTreeMap::from([("gpu".to_string(), 0.000_1)]),
            tier_multipliers: BTreeMap::from([("priority".to_string(), 2.0)]),
            currency: usd(),
        });

        let gpu_priority = UsageRecord::Compute(ComputeUsage {
            duration_ms: 1000.0,
            compute_type: Some("gpu".to_string()),
            tier: Some("priority".to_string()),
        });
        let cost = compute_cost(&gpu_priority, &pricing).unwrap();
        assert_eq!(cost.amount, 0.2);

        let unknown_tier = UsageRecord::Compute(ComputeUsage {
            duration_ms: 1000.0,
            compute_type: None,
            tier: Some("spot".to_string()),
        });
        assert_eq!(compute_cost(&unknown_tier, &pricing).unwrap().amount, 0.01);
    }

    #[test]
    fn test_storage_defaults_duration() {
        let pricing = PricingPolicy::Storage(StoragePricing {
            per_byte_second: 0.000_000_1,
            storage_classes: BTreeMap::from([("cold".to_string(), 0.000_000_01)]),
            currency: usd(),
        });
        let usage = UsageRecord::Storage(StorageUsage {
            bytes: 1000.0,
            duration_seconds: None,
            storage_class: None,
        });
        let cost = compute_cost(&usage, &pricing).unwrap();
        assert_eq!(cost.amount, 0.000_1);
        if let CostBreakdown::Storage {
            duration_seconds, ..
        } = cost.breakdown
        {
            assert_eq!(duration_seconds, 1.0);
        } else {
            panic!("expected storage breakdown");
        }

        let cold = UsageRecord::Storage(StorageUsage {
            bytes: 1000.0,
            duration_seconds: Some(60.0),
            storage_class: Some("cold".to_string()),
        });
        assert_eq!(compute_cost(&cold, &pricing).unwrap().amount, 0.000_6);
    }

    #[test]
    fn test_bandwidth_region_and_optional_sides() {
        let pricing = PricingPolicy::Bandwidth(BandwidthPricing {
            inbound_per_byte: 0.000_001,
            outbound_per_byte: 0.000_002,
            region_multipliers: BTreeMap::from([("eu".to_string(), 1.5)]),
            currency: usd(),
        });

        let usage = UsageRecord::Bandwidth(BandwidthUsage {
            bytes_in: Some(1000),
            bytes_out: Some(1000),
            region: Some("eu".to_string()),
        });
        let cost = compute_cost(&usage, &pricing).unwrap();
        assert_eq!(cost.amount, 0.0045);

        let out_only = UsageRecord::Bandwidth(BandwidthUsage {
            bytes_in: None,
            bytes_out: Some(500),
            region: None,
        });
        let cost = compute_cost(&out_only, &pricing).unwrap();
        let CostBreakdown::Bandwidth {
            inbound_cost,
            outbound_cost,
            region_multiplier,
            ..
        } = cost.breakdown
        else {
            panic!("expected bandwidth breakdown");
        };
        assert_eq!(inbound_cost, 0.0);
        assert_eq!(outbound_cost, 0.001);
        assert_eq!(region_multiplier, 1.0);
    }

    #[test]
    fn test_units() {
        let pricing = PricingPolicy::Units(UnitsPricing {
            cost_per_unit: 0.04,
            unit_type: "image".to_string(),
            currency: usd(),
        });
        let usage = UsageRecord::Units(UnitsUsage {
            units: 3.0,
            unit_type: "image".to_string(),
        });
        assert_eq!(compute_cost(&usage, &pricing).unwrap().amount, 0.12);
    }

    fn two_tiers() -> PricingPolicy {
        PricingPolicy::Tiered(TieredPricing {
            tiers: vec![
                PriceTier {
                    from: 0.0,
                    to: Some(100.0),
                    rate: 1.0,
                },
                PriceTier {
                    from: 100.0,
                    to: None,
                    rate: 0.5,
                },
            ],
            unit_type: "call".to_string(),
            currency: usd(),
        })
    }

    fn tiered_usage(quantity: f64) -> UsageRecord {
        UsageRecord::Tiered(TieredUsage {
            quantity,
            unit_type: "call".to_string(),
        })
    }

    #[test]
    fn test_tiered_upper_tier() {
        let cost = compute_cost(&tiered_usage(150.0), &two_tiers()).unwrap();
        let CostBreakdown::Tiered {
            tier_applied,
            effective_rate,
            amount,
            ..
        } = cost.breakdown
        else {
            panic!("expected tiered breakdown");
        };
        assert_eq!(tier_applied, "100-∞");
        assert_eq!(effective_rate, 0.5);
        assert_eq!(amount, 75.0);
    }

    #[test]
    fn test_tiered_boundary_belongs_to_next_tier() {
        let cost = compute_cost(&tiered_usage(100.0), &two_tiers()).unwrap();
        assert_eq!(cost.amount, 50.0);

        let cost = compute_cost(&tiered_usage(99.0), &two_tiers()).unwrap();
        assert_eq!(cost.amount, 99.0);
    }

    #[test]
    fn test_tiered_rejects_overlap() {
        let pricing = PricingPolicy::Tiered(TieredPricing {
            tiers: vec![
                PriceTier {
                    from: 0.0,
                    to: Some(200.0),
                    rate: 1.0,
                },
                PriceTier {
                    from: 100.0,
                    to: None,
                    rate: 0.5,
                },
            ],
            unit_type: "call".to_string(),
            currency: usd(),
        });
        let err = compute_cost(&tiered_usage(150.0), &pricing).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_tiered_quantity_below_first_tier() {
        let pricing = PricingPolicy::Tiered(TieredPricing {
            tiers: vec![PriceTier {
                from: 10.0,
                to: None,
                rate: 1.0,
            }],
            unit_type: "call".to_string(),
            currency: usd(),
        });
        let err = compute_cost(&tiered_usage(5.0), &pricing).unwrap_err();
        assert!(err.to_string().contains("outside every tier"));
    }

    #[test]
    fn test_composite_unmatched_component_is_free() {
        let pricing = PricingPolicy::Composite(CompositePricing {
            components: vec![
                PricedComponent {
                    name: "ocr".to_string(),
                    cost_per_unit: Some(0.01),
                    unit_type: Some("page".to_string()),
                },
                PricedComponent {
                    name: "storage".to_string(),
                    cost_per_unit: None,
                    unit_type: None,
                },
            ],
            currency: usd(),
        });
        let usage = UsageRecord::Composite(CompositeUsage {
            components: vec![
                UsageComponent {
                    name: "ocr".to_string(),
                    quantity: 12.0,
                    unit_type: Some("page".to_string()),
                },
                UsageComponent {
                    name: "storage".to_string(),
                    quantity: 100.0,
                    unit_type: None,
                },
                UsageComponent {
                    name: "translation".to_string(),
                    quantity: 3.0,
                    unit_type: None,
                },
            ],
        });

        let cost = compute_cost(&usage, &pricing).unwrap();
        assert_eq!(cost.amount, 0.12);
        let CostBreakdown::Composite { components, .. } = cost.breakdown else {
            panic!("expected composite breakdown");
        };
        assert_eq!(components.len(), 3);
        assert_eq!(components[1].cost, 0.0);
        assert_eq!(components[2].cost_per_unit, 0.0);
    }

    #[test]
    fn test_custom_is_zero_and_carries_data() {
        let data = json!({"frames": 240, "codec": "av1"});
        let usage = UsageRecord::Custom(CustomUsage { data: data.clone() });
        let pricing = PricingPolicy::Custom(CustomPricing {
            data: json!({}),
            currency: usd(),
        });

        let result = compute(&usage, &pricing, 3.0).unwrap();
        assert_eq!(result.cost.amount, 0.0);
        assert_eq!(result.cost_for_user.amount, 0.0);
        assert_eq!(
            result.cost.breakdown,
            CostBreakdown::Custom { data, amount: 0.0 }
        );
    }

    #[test]
    fn test_kind_mismatch() {
        let usage = UsageRecord::Credits(CreditsUsage {
            credits: 1.0,
            credit_type: None,
        });
        let err = compute(&usage, &token_pricing(1.0, 1.0), 1.0).unwrap_err();
        match err {
            CoreError::KindMismatch { usage, pricing } => {
                assert_eq!(usage, UsageKind::Credits);
                assert_eq!(pricing, UsageKind::Tokens);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_kind_mismatch_message_names_both_kinds() {
        let usage = UsageRecord::Tokens(TokenUsage::new(1, 1));
        let pricing = PricingPolicy::Custom(CustomPricing {
            data: json!(null),
            currency: usd(),
        });
        let message = compute_cost(&usage, &pricing).unwrap_err().to_string();
        assert!(message.contains("tokens"));
        assert!(message.contains("custom"));
    }

    #[test]
    fn test_markup_of_one_is_noop() {
        let usage = UsageRecord::Tokens(TokenUsage::new(1_234_567, 89));
        let result = compute(&usage, &token_pricing(3.0, 15.0), 1.0).unwrap();
        assert_eq!(result.cost_for_user.amount, result.cost.amount);
        assert!(result.cost_for_user.markup_multiplier.is_none());
        assert!(!result.cost_for_user.is_marked_up());
    }

    #[test]
    fn test_markup_applied_and_rounded() {
        let usage = UsageRecord::Tokens(TokenUsage::new(1_000_000, 0));
        let result = compute(&usage, &token_pricing(1.0 / 3.0, 0.0), 1.1).unwrap();
        assert_eq!(result.cost.amount, 0.333_333_33);
        assert_eq!(
            result.cost_for_user.amount,
            round8(0.333_333_33 * 1.1)
        );
        assert_eq!(result.cost_for_user.markup_multiplier, Some(1.1));
    }

    #[test]
    fn test_zero_markup_zeroes_user_cost() {
        let usage = UsageRecord::Tokens(TokenUsage::new(1_000_000, 0));
        let result = compute(&usage, &token_pricing(2.0, 0.0), 0.0).unwrap();
        assert_eq!(result.cost.amount, 2.0);
        assert_eq!(result.cost_for_user.amount, 0.0);
        assert_eq!(result.cost_for_user.markup_multiplier, Some(0.0));
    }

    #[test]
    fn test_compute_validated_rejects_bad_input() {
        let usage = UsageRecord::Units(UnitsUsage {
            units: -3.0,
            unit_type: "image".to_string(),
        });
        let pricing = PricingPolicy::Units(UnitsPricing {
            cost_per_unit: 0.04,
            unit_type: "image".to_string(),
            currency: usd(),
        });
        assert!(matches!(
            compute_validated(&usage, &pricing, 1.0),
            Err(CoreError::Validation(_))
        ));

        let ok = UsageRecord::Units(UnitsUsage {
            units: 3.0,
            unit_type: "image".to_string(),
        });
        assert!(compute_validated(&ok, &pricing, f64::NAN).is_err());
        assert!(compute_validated(&ok, &pricing, 1.2).is_ok());
    }

    #[test]
    fn test_compute_validated_reports_mismatch_first() {
        let usage = UsageRecord::Units(UnitsUsage {
            units: -3.0,
            unit_type: "image".to_string(),
        });
        let err = compute_validated(&usage, &token_pricing(1.0, 1.0), 1.0).unwrap_err();
        assert!(matches!(err, CoreError::KindMismatch { .. }));
    }
}

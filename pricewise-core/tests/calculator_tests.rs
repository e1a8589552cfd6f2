//! Integration tests for the calculator and markup resolver public API.

use std::collections::BTreeMap;

use pricewise_core::{
    compute, round8, BandwidthPricing, BandwidthUsage, CompositePricing, CompositeUsage,
    ComputePricing, ComputeUsage, CoreError, CreditsPricing, CreditsUsage, CustomPricing,
    CustomUsage, MarkupConfig, MarkupResolver, MarkupRule, PriceTier, PricedComponent,
    PricingPolicy, RequestPricing, RequestUsage, StoragePricing, StorageUsage, TieredPricing,
    TieredUsage, TokenPricing, TokenUsage, UnitsPricing, UnitsUsage, UsageComponent, UsageKind,
    UsageRecord,
};
use serde_json::json;

/// One matching (usage, pricing) pair per kind, in `UsageKind::all()` order.
fn samples() -> Vec<(UsageRecord, PricingPolicy)> {
    let usd = || "USD".to_string();
    vec![
        (
            UsageRecord::Credits(CreditsUsage {
                credits: 12.5,
                credit_type: None,
            }),
            PricingPolicy::Credits(CreditsPricing {
                per_credit: 0.013,
                credit_types: BTreeMap::new(),
                currency: usd(),
            }),
        ),
        (
            UsageRecord::Tokens(TokenUsage {
                prompt_tokens: 12_345,
                completion_tokens: 678,
                reasoning_tokens: 90,
                cache_read_tokens: 1_000,
                cache_write_tokens: 500,
            }),
            PricingPolicy::Tokens(TokenPricing::new(3.0, 15.0)),
        ),
        (
            UsageRecord::Requests(RequestUsage {
                requests: 42,
                request_type: None,
            }),
            PricingPolicy::Requests(RequestPricing {
                per_request: 0.0007,
                request_types: BTreeMap::new(),
                currency: usd(),
            }),
        ),
        (
            UsageRecord::Compute(ComputeUsage {
                duration_ms: 3_333.0,
                compute_type: None,
                tier: None,
            }),
            PricingPolicy::Compute(ComputePricing {
                per_ms: 0.000_003,
                compute_types: BTreeMap::new(),
                tier_multipliers: BTreeMap::new(),
                currency: usd(),
            }),
        ),
        (
            UsageRecord::Storage(StorageUsage {
                bytes: 2_048.0,
                duration_seconds: Some(3_600.0),
                storage_class: None,
            }),
            PricingPolicy::Storage(StoragePricing {
                per_byte_second: 0.000_000_000_01,
                storage_classes: BTreeMap::new(),
                currency: usd(),
            }),
        ),
        (
            UsageRecord::Bandwidth(BandwidthUsage {
                bytes_in: Some(10_000),
                bytes_out: Some(20_000),
                region: None,
            }),
            PricingPolicy::Bandwidth(BandwidthPricing {
                inbound_per_byte: 0.000_000_01,
                outbound_per_byte: 0.000_000_09,
                region_multipliers: BTreeMap::new(),
                currency: usd(),
            }),
        ),
        (
            UsageRecord::Units(UnitsUsage {
                units: 7.0,
                unit_type: "image".to_string(),
            }),
            PricingPolicy::Units(UnitsPricing {
                cost_per_unit: 0.04,
                unit_type: "image".to_string(),
                currency: usd(),
            }),
        ),
        (
            UsageRecord::Tiered(TieredUsage {
                quantity: 150.0,
                unit_type: "call".to_string(),
            }),
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
            }),
        ),
        (
            UsageRecord::Composite(CompositeUsage {
                components: vec![UsageComponent {
                    name: "ocr".to_string(),
                    quantity: 3.0,
                    unit_type: None,
                }],
            }),
            PricingPolicy::Composite(CompositePricing {
                components: vec![PricedComponent {
                    name: "ocr".to_string(),
                    cost_per_unit: Some(0.015),
                    unit_type: None,
                }],
                currency: usd(),
            }),
        ),
        (
            UsageRecord::Custom(CustomUsage {
                data: json!({"seconds": 12}),
            }),
            PricingPolicy::Custom(CustomPricing {
                data: json!({}),
                currency: usd(),
            }),
        ),
    ]
}

#[test]
fn test_breakdown_kind_matches_usage_kind() {
    for ((usage, pricing), kind) in samples().iter().zip(UsageKind::all()) {
        let result = compute(usage, pricing, 1.0).unwrap();
        assert_eq!(result.cost.breakdown.kind(), *kind);
        assert!(result.cost.amount >= 0.0, "negative cost for {kind}");
        assert_eq!(result.cost.amount, round8(result.cost.amount));
    }
}

#[test]
fn test_markup_property_for_every_kind() {
    for multiplier in [0.0, 0.5, 1.0, 1.1, 2.0, 3.333] {
        for (usage, pricing) in samples() {
            let result = compute(&usage, &pricing, multiplier).unwrap();
            if multiplier == 1.0 {
                assert_eq!(result.cost_for_user.amount, result.cost.amount);
                assert!(result.cost_for_user.markup_multiplier.is_none());
            } else {
                assert_eq!(
                    result.cost_for_user.amount,
                    round8(result.cost.amount * multiplier)
                );
                assert_eq!(result.cost_for_user.markup_multiplier, Some(multiplier));
            }
            assert_eq!(result.cost_for_user.breakdown, result.cost.breakdown);
        }
    }
}

#[test]
fn test_every_mismatched_pair_fails() {
    let all = samples();
    for (i, (usage, _)) in all.iter().enumerate() {
        for (j, (_, pricing)) in all.iter().enumerate() {
            let result = compute(usage, pricing, 1.0);
            if i == j {
                assert!(result.is_ok());
            } else {
                assert!(matches!(result, Err(CoreError::KindMismatch { .. })));
            }
        }
    }
}

#[test]
fn test_repeated_computation_is_bit_identical() {
    for (usage, pricing) in samples() {
        let a = compute(&usage, &pricing, 1.37).unwrap();
        let b = compute(&usage, &pricing, 1.37).unwrap();
        assert_eq!(a.cost.amount.to_bits(), b.cost.amount.to_bits());
        assert_eq!(
            a.cost_for_user.amount.to_bits(),
            b.cost_for_user.amount.to_bits()
        );
    }
}

#[test]
fn test_resolved_markup_feeds_calculator() {
    let config = MarkupConfig::new(vec![
        MarkupRule::provider("openai", 1.1),
        MarkupRule::model("openai", "gpt-4o", 2.0),
    ]);
    let resolver = MarkupResolver::new(vec![&config]);
    let multiplier = resolver.resolve("openai", Some("gpt-4o"), None);
    assert_eq!(multiplier, 2.0);

    let usage = UsageRecord::Tokens(TokenUsage::new(1_000_000, 0));
    let pricing = PricingPolicy::Tokens(TokenPricing::new(2.0, 0.0));
    let result = compute(&usage, &pricing, multiplier).unwrap();
    assert_eq!(result.cost.amount, 2.0);
    assert_eq!(result.cost_for_user.amount, 4.0);
}

#[test]
fn test_usage_json_to_cost() {
    let usage: UsageRecord = serde_json::from_value(json!({
        "type": "tokens",
        "promptTokens": 1_000_000,
        "completionTokens": 0
    }))
    .unwrap();
    let pricing: PricingPolicy =
        serde_json::from_value(json!({"type": "tokens", "input": 2, "output": 0})).unwrap();

    let result = compute(&usage, &pricing, 1.0).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["cost"]["breakdown"]["promptTokensCost"], 2.0);
    assert_eq!(json["cost"]["breakdown"]["totalCost"], 2.0);
    assert_eq!(json["costForUser"]["amount"], 2.0);
}

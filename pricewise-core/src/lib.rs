// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # pricewise Core
//!
//! Usage metering, cost calculation and markup resolution.
//!
//! This crate provides the foundational pieces used by the other pricewise
//! crates:
//!
//! - Domain models (usage records, pricing policies, costs, catalog entries)
//! - The cost calculator
//! - Markup rules and the markup resolver
//! - Catalog reconciliation planning
//! - The catalog storage contract
//!
//! ## Key Types
//!
//! ### Usage & Pricing
//! - [`UsageRecord`] - One metered event, tagged by [`UsageKind`]
//! - [`PricingPolicy`] - Rates for one kind, with a currency
//!
//! ### Cost
//! - [`Cost`] / [`CostForUser`] - Raw and marked-up cost
//! - [`CostBreakdown`] - How a cost was derived
//! - [`compute`] - Usage + pricing + markup to costs
//!
//! ### Markup
//! - [`MarkupRule`] / [`MarkupConfig`] - Rules and the in-process rule list
//! - [`RuleSource`] - Keyed rule lookup
//! - [`MarkupResolver`] - Priority cascade over rule sources
//!
//! ### Catalog
//! - [`CatalogEntry`] / [`CatalogKey`] - Priced models and tools
//! - [`CatalogStore`] - Storage contract
//! - [`plan_sync`] - Diff a remote feed against the catalog

pub mod calculator;
pub mod error;
pub mod markup;
pub mod models;
pub mod reconcile;
pub mod traits;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Usage types
    BandwidthUsage,
    CompositeUsage,
    ComputeUsage,
    CreditsUsage,
    CustomUsage,
    RequestUsage,
    StorageUsage,
    TieredUsage,
    TokenUsage,
    UnitsUsage,
    UsageComponent,
    UsageKind,
    UsageRecord,
    // Pricing types
    BandwidthPricing,
    CompositePricing,
    ComputePricing,
    CreditsPricing,
    CustomPricing,
    PriceTier,
    PricedComponent,
    PricingPolicy,
    RequestPricing,
    StoragePricing,
    TieredPricing,
    TokenPricing,
    UnitsPricing,
    DEFAULT_CURRENCY,
    // Cost types
    round8,
    ComponentCost,
    Cost,
    CostBreakdown,
    CostForUser,
    CostResult,
    MONEY_DECIMALS,
    // Catalog types
    CatalogChange,
    CatalogEntry,
    CatalogKey,
    CatalogPatch,
    ModelLimits,
};

// Re-export calculator, markup and reconciliation
pub use calculator::{apply_markup, compute, compute_cost, compute_validated, NO_MARKUP};
pub use markup::{
    resolve_markup, MarkupConfig, MarkupResolution, MarkupResolver, MarkupRule, MarkupScope,
    MatchedRule, RuleKey, RuleSource, DEFAULT_MARKUP_MULTIPLIER,
};
pub use reconcile::{plan_sync, SyncPlan, SyncReport};

// Re-export traits
pub use traits::{find_pricing, CatalogStore};

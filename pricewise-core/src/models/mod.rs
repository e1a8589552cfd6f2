//! Domain models for pricewise.
//!
//! ## Submodules
//!
//! - [`usage`] - Usage records (UsageRecord, UsageKind and per-kind payloads)
//! - [`pricing`] - Pricing policies mirroring the usage kinds
//! - [`cost`] - Cost outputs and rounding
//! - [`catalog`] - Pricing catalog entries, keys and patches

mod catalog;
mod cost;
mod pricing;
mod usage;

pub use catalog::{CatalogChange, CatalogEntry, CatalogKey, CatalogPatch, ModelLimits};
pub use cost::{
    round8, ComponentCost, Cost, CostBreakdown, CostForUser, CostResult, MONEY_DECIMALS,
};
pub use pricing::{
    BandwidthPricing, CompositePricing, ComputePricing, CreditsPricing, CustomPricing,
    PriceTier, PricedComponent, PricingPolicy, RequestPricing, StoragePricing, TieredPricing,
    TokenPricing, UnitsPricing, DEFAULT_CURRENCY,
};
pub use usage::{
    BandwidthUsage, CompositeUsage, ComputeUsage, CreditsUsage, CustomUsage, RequestUsage,
    StorageUsage, TieredUsage, TokenUsage, UnitsUsage, UsageComponent, UsageKind, UsageRecord,
};

//! Markup rules and multiplier resolution.
//!
//! A markup multiplier turns a raw cost into the user-facing charge. Rules
//! come from any number of [`RuleSource`]s: the in-process [`MarkupConfig`],
//! a persisted rule store, or anything else that can answer a keyed lookup.
//!
//! ## Precedence
//!
//! 1. An explicit per-call override, if given.
//! 2. Sources in the order they were added to the [`MarkupResolver`]. The
//!    first source holding any matching rule wins.
//! 3. Within a source, the most specific scope wins:
//!    model `(provider, model)`, then tool `(provider, tool)`, then provider.
//! 4. [`DEFAULT_MARKUP_MULTIPLIER`] when nothing matches.
//!
//! Resolution is read-only; rules are looked up on every call, never cached.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Multiplier returned when no rule matches.
///
/// Zero means an unconfigured provider bills the user nothing.
pub const DEFAULT_MARKUP_MULTIPLIER: f64 = 0.0;

// ============================================================================
// Rules
// ============================================================================

/// What a markup rule is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupScope {
    /// Every model and tool of a provider.
    Provider,
    /// One model of a provider.
    Model,
    /// One tool of a provider.
    Tool,
}

impl fmt::Display for MarkupScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkupScope::Provider => write!(f, "provider"),
            MarkupScope::Model => write!(f, "model"),
            MarkupScope::Tool => write!(f, "tool"),
        }
    }
}

fn default_active() -> bool {
    true
}

/// A markup rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkupRule {
    /// Scope of the rule.
    pub scope: MarkupScope,
    /// Provider identifier.
    pub provider_id: String,
    /// Model identifier; required for model scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    /// Tool identifier; required for tool scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<String>,
    /// Multiplier applied to the raw cost.
    pub multiplier: f64,
    /// Inactive rules never match.
    #[serde(default = "default_active")]
    pub active: bool,
}

impl MarkupRule {
    /// Creates a provider-scoped rule.
    pub fn provider(provider_id: impl Into<String>, multiplier: f64) -> Self {
        Self {
            scope: MarkupScope::Provider,
            provider_id: provider_id.into(),
            model_id: None,
            tool_id: None,
            multiplier,
            active: true,
        }
    }

    /// Creates a model-scoped rule.
    pub fn model(
        provider_id: impl Into<String>,
        model_id: impl Into<String>,
        multiplier: f64,
    ) -> Self {
        Self {
            scope: MarkupScope::Model,
            model_id: Some(model_id.into()),
            ..Self::provider(provider_id, multiplier)
        }
    }

    /// Creates a tool-scoped rule.
    pub fn tool(
        provider_id: impl Into<String>,
        tool_id: impl Into<String>,
        multiplier: f64,
    ) -> Self {
        Self {
            scope: MarkupScope::Tool,
            tool_id: Some(tool_id.into()),
            ..Self::provider(provider_id, multiplier)
        }
    }

    /// Marks the rule inactive.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Returns the lookup key this rule answers, or `None` if the scope's
    /// identifier is missing.
    pub fn key(&self) -> Option<RuleKey> {
        match self.scope {
            MarkupScope::Provider => Some(RuleKey::Provider {
                provider_id: self.provider_id.clone(),
            }),
            MarkupScope::Model => self.model_id.as_ref().map(|model_id| RuleKey::Model {
                provider_id: self.provider_id.clone(),
                model_id: model_id.clone(),
            }),
            MarkupScope::Tool => self.tool_id.as_ref().map(|tool_id| RuleKey::Tool {
                provider_id: self.provider_id.clone(),
                tool_id: tool_id.clone(),
            }),
        }
    }

    /// Returns true if this rule is active and answers `key`.
    pub fn matches(&self, key: &RuleKey) -> bool {
        self.active && self.key().as_ref() == Some(key)
    }
}

/// Identifying tuple of a rule lookup, one per scope.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleKey {
    /// Provider scope.
    Provider {
        /// Provider identifier.
        provider_id: String,
    },
    /// Model scope.
    Model {
        /// Provider identifier.
        provider_id: String,
        /// Model identifier.
        model_id: String,
    },
    /// Tool scope.
    Tool {
        /// Provider identifier.
        provider_id: String,
        /// Tool identifier.
        tool_id: String,
    },
}

impl RuleKey {
    /// Returns the scope of this key.
    pub fn scope(&self) -> MarkupScope {
        match self {
            RuleKey::Provider { .. } => MarkupScope::Provider,
            RuleKey::Model { .. } => MarkupScope::Model,
            RuleKey::Tool { .. } => MarkupScope::Tool,
        }
    }

    /// Builds the lookup cascade for a request, most specific first.
    pub fn cascade(provider_id: &str, model_id: Option<&str>, tool_id: Option<&str>) -> Vec<Self> {
        let mut keys = Vec::with_capacity(3);
        if let Some(model_id) = model_id {
            keys.push(RuleKey::Model {
                provider_id: provider_id.to_string(),
                model_id: model_id.to_string(),
            });
        }
        if let Some(tool_id) = tool_id {
            keys.push(RuleKey::Tool {
                provider_id: provider_id.to_string(),
                tool_id: tool_id.to_string(),
            });
        }
        keys.push(RuleKey::Provider {
            provider_id: provider_id.to_string(),
        });
        keys
    }
}

// ============================================================================
// Rule Sources
// ============================================================================

/// Anything that can answer a keyed markup-rule lookup.
pub trait RuleSource: Send + Sync {
    /// Name used in logs and resolution details.
    fn source_name(&self) -> &str;

    /// Returns the active rule for `key`, if any. At most one rule answers
    /// a key.
    fn find_rule(&self, key: &RuleKey) -> Option<MarkupRule>;
}

/// In-process markup configuration.
///
/// Passed explicitly to whoever resolves markups; there is no global copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// Rules, searched in order.
    pub rules: Vec<MarkupRule>,
}

impl MarkupConfig {
    /// Creates a config from a list of rules.
    pub fn new(rules: Vec<MarkupRule>) -> Self {
        Self { rules }
    }
}

impl RuleSource for MarkupConfig {
    fn source_name(&self) -> &str {
        "config"
    }

    fn find_rule(&self, key: &RuleKey) -> Option<MarkupRule> {
        self.rules.iter().find(|rule| rule.matches(key)).cloned()
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Which rule produced a resolved multiplier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRule {
    /// Name of the source that held the rule.
    pub source: String,
    /// Scope of the rule.
    pub scope: MarkupScope,
}

/// Outcome of a markup resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupResolution {
    /// The multiplier to apply.
    pub multiplier: f64,
    /// The rule that matched, if any.
    pub matched: Option<MatchedRule>,
    /// True if an explicit override supplied the multiplier.
    pub overridden: bool,
}

/// Resolves markup multipliers over an ordered list of rule sources.
#[derive(Default)]
pub struct MarkupResolver<'a> {
    sources: Vec<&'a dyn RuleSource>,
}

impl<'a> MarkupResolver<'a> {
    /// Creates a resolver over the given sources, highest priority first.
    pub fn new(sources: Vec<&'a dyn RuleSource>) -> Self {
        Self { sources }
    }

    /// Appends a lower-priority source.
    #[must_use]
    pub fn with_source(mut self, source: &'a dyn RuleSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Returns the number of sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Resolves the multiplier for a provider and optional model/tool.
    pub fn resolve(&self, provider_id: &str, model_id: Option<&str>, tool_id: Option<&str>) -> f64 {
        self.resolve_detailed(provider_id, model_id, tool_id, None)
            .multiplier
    }

    /// Resolves the multiplier and reports which rule, if any, produced it.
    ///
    /// An `override_multiplier` wins over every source.
    pub fn resolve_detailed(
        &self,
        provider_id: &str,
        model_id: Option<&str>,
        tool_id: Option<&str>,
        override_multiplier: Option<f64>,
    ) -> MarkupResolution {
        if let Some(multiplier) = override_multiplier {
            debug!(provider_id, multiplier, "Markup override applied");
            return MarkupResolution {
                multiplier,
                matched: None,
                overridden: true,
            };
        }

        let cascade = RuleKey::cascade(provider_id, model_id, tool_id);
        for source in &self.sources {
            for key in &cascade {
                if let Some(rule) = source.find_rule(key) {
                    debug!(
                        provider_id,
                        model_id = ?model_id,
                        tool_id = ?tool_id,
                        source = source.source_name(),
                        scope = %rule.scope,
                        multiplier = rule.multiplier,
                        "Markup rule matched"
                    );
                    return MarkupResolution {
                        multiplier: rule.multiplier,
                        matched: Some(MatchedRule {
                            source: source.source_name().to_string(),
                            scope: rule.scope,
                        }),
                        overridden: false,
                    };
                }
            }
        }

        debug!(
            provider_id,
            model_id = ?model_id,
            tool_id = ?tool_id,
            multiplier = DEFAULT_MARKUP_MULTIPLIER,
            "No markup rule matched, using default"
        );
        MarkupResolution {
            multiplier: DEFAULT_MARKUP_MULTIPLIER,
            matched: None,
            overridden: false,
        }
    }
}

/// Resolves a multiplier over `sources` in priority order.
pub fn resolve_markup(
    provider_id: &str,
    model_id: Option<&str>,
    tool_id: Option<&str>,
    sources: &[&dyn RuleSource],
) -> f64 {
    MarkupResolver::new(sources.to_vec()).resolve(provider_id, model_id, tool_id)
}

// ============================================================================
// Tests
// ============================================================================

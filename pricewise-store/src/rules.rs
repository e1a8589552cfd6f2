//! Persisted markup rules.
//!
//! [`MarkupRuleStore`] keeps at most one rule per scope key and answers
//! [`RuleSource`] lookups from memory. The file is plain JSON in the same
//! shape as [`MarkupConfig`], so rules can be moved between the two.

use pricewise_core::{CoreError, MarkupConfig, MarkupRule, RuleKey, RuleSource};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persistence::{default_markup_rules_path, load_json_or_default, save_json};

/// Source name reported by [`MarkupRuleStore`].
pub const RULE_STORE_SOURCE: &str = "rule-store";

/// File-backed markup rule store.
#[derive(Debug)]
pub struct MarkupRuleStore {
    path: PathBuf,
    rules: RwLock<BTreeMap<RuleKey, MarkupRule>>,
}

impl MarkupRuleStore {
    /// Creates an empty store that will save to `path`.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            rules: RwLock::new(BTreeMap::new()),
        }
    }

    /// Loads rules from the default path.
    pub async fn load_default() -> Self {
        Self::load(default_markup_rules_path()).await
    }

    /// Loads rules from `path`. A missing or unreadable file yields an empty
    /// store. Rules that [`MarkupRuleStore::upsert`] would reject are skipped;
    /// for repeated keys the last rule wins.
    pub async fn load(path: PathBuf) -> Self {
        let config: MarkupConfig = load_json_or_default(&path).await;
        let mut rules = BTreeMap::new();
        for rule in config.rules {
            match validate_rule(&rule) {
                Ok(key) => {
                    rules.insert(key, rule);
                }
                Err(e) => {
                    warn!(provider_id = %rule.provider_id, scope = %rule.scope, error = %e, "Skipping invalid markup rule");
                }
            }
        }

        info!(path = %path.display(), rules = rules.len(), "Loaded markup rules");
        Self {
            path,
            rules: RwLock::new(rules),
        }
    }

    /// Returns the rules file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inserts or replaces the rule for its scope key. Returns the replaced
    /// rule, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the rule lacks the identifier its
    /// scope needs, or if the multiplier is negative or not finite.
    pub fn upsert(&self, rule: MarkupRule) -> Result<Option<MarkupRule>, StoreError> {
        let key = validate_rule(&rule)?;

        debug!(?key, multiplier = rule.multiplier, "Upserting markup rule");
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        Ok(rules.insert(key, rule))
    }

    /// Removes the rule for `key`.
    pub fn remove(&self, key: &RuleKey) -> Option<MarkupRule> {
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        rules.remove(key)
    }

    /// Returns every rule, ordered by key.
    pub fn list(&self) -> Vec<MarkupRule> {
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
        rules.values().cloned().collect()
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.rules.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if the store holds no rules.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes the rules to disk.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] or [`StoreError::Serialization`].
    pub async fn save(&self) -> Result<(), StoreError> {
        let snapshot = MarkupConfig::new(self.list());
        save_json(&self.path, &snapshot).await?;
        info!(path = %self.path.display(), rules = snapshot.rules.len(), "Markup rules saved");
        Ok(())
    }
}

fn validate_rule(rule: &MarkupRule) -> Result<RuleKey, CoreError> {
    let key = rule.key().ok_or_else(|| {
        CoreError::Validation(format!("{} rule needs a {} identifier", rule.scope, rule.scope))
    })?;
    if !rule.multiplier.is_finite() || rule.multiplier < 0.0 {
        return Err(CoreError::Validation(format!(
            "markup multiplier must be finite and non-negative, got {}",
            rule.multiplier
        )));
    }
    Ok(key)
}

impl RuleSource for MarkupRuleStore {
    fn source_name(&self) -> &str {
        RULE_STORE_SOURCE
    }

    fn find_rule(&self, key: &RuleKey) -> Option<MarkupRule> {
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
        rules.get(key).filter(|rule| rule.active).cloned()
    }
}

// ============================================================================
// Tests
// ============================================================================

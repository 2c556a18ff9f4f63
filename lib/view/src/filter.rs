//! Service-provider filtering of identity providers.
//!
//! A service provider may restrict which identity providers its users are
//! offered by declaring a `discopower.filter` rule in its metadata. Rules
//! are checked in a fixed precedence, first match wins:
//!
//! 1. entity ID in `entities.include` keeps the entity
//! 2. entity ID in `entities.exclude` drops it
//! 3. any tag in `tags.include` keeps it
//! 4. any tag in `tags.exclude` drops it
//! 5. otherwise the default policy applies
//!
//! Declaring any include list turns the default policy into deny.

use crate::error::ViewError;
use discopower_core::EntityRecord;
use rootcause::Report;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// SP metadata attribute holding the filter rule.
pub const FILTER_ATTRIBUTE: &str = "discopower.filter";

/// One service provider's filter policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRule {
    /// Entity IDs that are always kept.
    #[serde(rename = "entities.include")]
    pub entities_include: HashSet<String>,
    /// Entity IDs that are dropped unless explicitly included.
    #[serde(rename = "entities.exclude")]
    pub entities_exclude: HashSet<String>,
    /// Tags whose entities are kept.
    #[serde(rename = "tags.include")]
    pub tags_include: HashSet<String>,
    /// Tags whose entities are dropped.
    #[serde(rename = "tags.exclude")]
    pub tags_exclude: HashSet<String>,
}

impl FilterRule {
    /// Creates an empty rule, which keeps everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds entity IDs to the include list.
    #[must_use]
    pub fn include_entities<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entities_include.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Adds entity IDs to the exclude list.
    #[must_use]
    pub fn exclude_entities<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entities_exclude.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Adds tags to the include list.
    #[must_use]
    pub fn include_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags_include.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Adds tags to the exclude list.
    #[must_use]
    pub fn exclude_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags_exclude.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Reads the rule declared in a service provider's metadata.
    ///
    /// Returns `None` if the SP declares no rule.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the declared rule is malformed.
    pub fn from_entity(sp: &EntityRecord) -> Result<Option<Self>, Report<ViewError>> {
        let Some(value) = sp.attribute(FILTER_ATTRIBUTE) else {
            return Ok(None);
        };

        let rule = serde_json::from_value(value.clone()).map_err(|e| ViewError::InvalidInput {
            details: format!("malformed filter rule for SP '{}': {e}", sp.entity_id()),
        })?;
        Ok(Some(rule))
    }

    /// Returns the outcome for entities no rule matches.
    ///
    /// An explicit allow-list implies deny-by-default.
    #[must_use]
    pub fn default_policy(&self) -> bool {
        self.entities_include.is_empty() && self.tags_include.is_empty()
    }

    /// Decides whether an entity is kept.
    #[must_use]
    pub fn keep(&self, record: &EntityRecord, default_policy: bool) -> bool {
        let entity_id = record.entity_id().as_str();
        if self.entities_include.contains(entity_id) {
            return true;
        }
        if self.entities_exclude.contains(entity_id) {
            return false;
        }
        if record.tags().iter().any(|t| self.tags_include.contains(t)) {
            return true;
        }
        if record.tags().iter().any(|t| self.tags_exclude.contains(t)) {
            return false;
        }
        default_policy
    }

    /// Keeps the entities this rule allows, preserving input order.
    #[must_use]
    pub fn filter_list(&self, records: Vec<EntityRecord>) -> Vec<EntityRecord> {
        let default_policy = self.default_policy();
        let before = records.len();
        let kept: Vec<_> = records
            .into_iter()
            .filter(|r| self.keep(r, default_policy))
            .collect();
        debug!(before, after = kept.len(), default_policy, "applied SP filter");
        kept
    }
}

/// Applies an optional rule; without a rule every entity is kept.
#[must_use]
pub fn apply_filter(rule: Option<&FilterRule>, records: Vec<EntityRecord>) -> Vec<EntityRecord> {
    match rule {
        Some(rule) => rule.filter_list(records),
        None => records,
    }
}

//! Structuring identity providers into tag-keyed tabs.
//!
//! Every entity is placed in one tab per enabled tag (untagged entities go
//! to the `misc` tab). Tabs named in the configured order come first, even
//! when they end up empty; the remaining tabs follow in the order their tag
//! was first seen. Each tab is sorted with [`compare`](crate::compare) and
//! then handed to a [`SortHook`] for optional re-ranking.

use crate::compare::compare;
use crate::error::ViewError;
use discopower_core::{EntityId, EntityRecord};
use rootcause::Report;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Re-ranking step applied to every tab after sorting.
pub trait SortHook {
    /// Reorders the already sorted entries of one tab.
    fn reorder(&self, tab: &str, entries: &mut [EntityRecord]);
}

/// Sort hook that keeps the comparator order.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityHook;

impl SortHook for IdentityHook {
    fn reorder(&self, _tab: &str, _entries: &mut [EntityRecord]) {}
}

impl<F> SortHook for F
where
    F: Fn(&str, &mut [EntityRecord]),
{
    fn reorder(&self, tab: &str, entries: &mut [EntityRecord]) {
        self(tab, entries);
    }
}

/// One tab of the discovery page.
#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    name: String,
    entries: Vec<EntityRecord>,
}

impl Tab {
    fn new(name: String) -> Self {
        Self {
            name,
            entries: Vec::new(),
        }
    }

    /// Returns the tab name (the tag).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the entries in display order.
    #[must_use]
    pub fn entries(&self) -> &[EntityRecord] {
        &self.entries
    }

    /// Returns the entry with the given entity ID.
    #[must_use]
    pub fn get(&self, entity_id: &EntityId) -> Option<&EntityRecord> {
        self.entries.iter().find(|e| e.entity_id() == entity_id)
    }

    /// Returns true if the tab holds the given entity.
    #[must_use]
    pub fn contains(&self, entity_id: &EntityId) -> bool {
        self.get(entity_id).is_some()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the tab has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered set of tabs produced by [`TabLayout::structure`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TabbedView {
    tabs: Vec<Tab>,
}

impl TabbedView {
    /// Returns the tabs in display order.
    #[must_use]
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    /// Returns the tab with the given name.
    #[must_use]
    pub fn tab(&self, name: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.name == name)
    }

    /// Returns the tab names in display order.
    #[must_use]
    pub fn tab_names(&self) -> Vec<&str> {
        self.tabs.iter().map(Tab::name).collect()
    }

    /// Returns the entry for an entity from the first tab that holds it.
    #[must_use]
    pub fn find_entry(&self, entity_id: &EntityId) -> Option<&EntityRecord> {
        self.tabs.iter().find_map(|t| t.get(entity_id))
    }

    /// Returns true if there are no tabs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

/// Tab configuration: explicit order, enabled tabs and default weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabLayout {
    tab_order: Vec<String>,
    enabled_tabs: HashSet<String>,
    default_weight: i64,
}

impl TabLayout {
    /// Creates a layout.
    ///
    /// An empty `enabled_tabs` enables every tag.
    #[must_use]
    pub fn new<I, S>(tab_order: Vec<String>, enabled_tabs: I, default_weight: i64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tab_order,
            enabled_tabs: enabled_tabs.into_iter().map(Into::into).collect(),
            default_weight,
        }
    }

    /// Returns the configured default weight.
    #[must_use]
    pub fn default_weight(&self) -> i64 {
        self.default_weight
    }

    /// Returns true if entities tagged `tag` get a tab.
    #[must_use]
    pub fn is_enabled(&self, tag: &str) -> bool {
        self.enabled_tabs.is_empty() || self.enabled_tabs.contains(tag)
    }

    /// Structures records into tabs using comparator order only.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a record carries an empty tag.
    pub fn structure(&self, records: &[EntityRecord]) -> Result<TabbedView, Report<ViewError>> {
        self.structure_with_hook(records, &IdentityHook)
    }

    /// Structures records into tabs, re-ranking each tab with `hook`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a record carries an empty tag.
    pub fn structure_with_hook(
        &self,
        records: &[EntityRecord],
        hook: &dyn SortHook,
    ) -> Result<TabbedView, Report<ViewError>> {
        let mut tabs: Vec<Tab> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut placed: HashSet<(usize, &EntityId)> = HashSet::new();

        for name in &self.tab_order {
            if !positions.contains_key(name) {
                positions.insert(name.clone(), tabs.len());
                tabs.push(Tab::new(name.clone()));
            }
        }

        for record in records {
            for tag in record.effective_tags() {
                if tag.is_empty() {
                    return Err(ViewError::InvalidInput {
                        details: format!("entity '{}' has an empty tag", record.entity_id()),
                    }
                    .into());
                }
                if !self.is_enabled(tag) {
                    continue;
                }

                let position = match positions.get(tag) {
                    Some(position) => *position,
                    None => {
                        positions.insert(tag.to_string(), tabs.len());
                        tabs.push(Tab::new(tag.to_string()));
                        tabs.len() - 1
                    }
                };

                if placed.insert((position, record.entity_id())) {
                    tabs[position].entries.push(record.clone());
                }
            }
        }

        for tab in &mut tabs {
            tab.entries
                .sort_by(|a, b| compare(a, b, self.default_weight));
            hook.reorder(&tab.name, &mut tab.entries);
        }

        debug!(
            tabs = tabs.len(),
            entities = records.len(),
            "structured entities into tabs"
        );

        Ok(TabbedView { tabs })
    }
}

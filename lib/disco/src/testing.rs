//! In-memory collaborators for orchestrator tests.

use crate::collaborator::{AuthStateStore, CookieSink, MetadataSource, SessionStore};
use crate::error::CollaboratorError;
use discopower_cdc::CookieOptions;
use discopower_core::{EntityId, EntityRecord};
use rootcause::Report;
use serde_json::Value as JsonValue;
use std::cell::RefCell;
use std::collections::HashMap;

/// Metadata sets held in memory.
#[derive(Debug, Default)]
pub struct MemoryMetadata {
    sets: HashMap<String, Vec<EntityRecord>>,
    failing: bool,
}

impl MemoryMetadata {
    pub fn with_set(mut self, set: &str, records: Vec<EntityRecord>) -> Self {
        self.sets.insert(set.to_string(), records);
        self
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), Report<CollaboratorError>> {
        if self.failing {
            return Err(CollaboratorError::unavailable("metadata", "source offline").into());
        }
        Ok(())
    }
}

impl MetadataSource for MemoryMetadata {
    fn get_list(&self, set: &str) -> Result<Vec<EntityRecord>, Report<CollaboratorError>> {
        self.check()?;
        Ok(self.sets.get(set).cloned().unwrap_or_default())
    }

    fn get_entry(
        &self,
        entity_id: &EntityId,
        set: &str,
    ) -> Result<Option<EntityRecord>, Report<CollaboratorError>> {
        self.check()?;
        Ok(self
            .sets
            .get(set)
            .and_then(|records| records.iter().find(|r| r.entity_id() == entity_id))
            .cloned())
    }
}

/// Session values held in memory.
#[derive(Debug, Default)]
pub struct MemorySession {
    values: RefCell<HashMap<(String, String), JsonValue>>,
}

impl MemorySession {
    pub fn value(&self, namespace: &str, key: &str) -> Option<JsonValue> {
        self.values
            .borrow()
            .get(&(namespace.to_string(), key.to_string()))
            .cloned()
    }
}

impl SessionStore for MemorySession {
    fn get(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<Option<JsonValue>, Report<CollaboratorError>> {
        Ok(self.value(namespace, key))
    }

    fn set(
        &self,
        namespace: &str,
        key: &str,
        value: JsonValue,
    ) -> Result<(), Report<CollaboratorError>> {
        self.values
            .borrow_mut()
            .insert((namespace.to_string(), key.to_string()), value);
        Ok(())
    }
}

/// Request cookies plus the cookies written in response.
#[derive(Debug, Default)]
pub struct MemoryCookies {
    request: HashMap<String, String>,
    written: RefCell<Vec<(String, String, CookieOptions)>>,
}

impl MemoryCookies {
    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.request.insert(name.to_string(), value.to_string());
        self
    }

    pub fn written(&self, name: &str) -> Option<(String, CookieOptions)> {
        self.written
            .borrow()
            .iter()
            .rev()
            .find(|(n, _, _)| n == name)
            .map(|(_, value, options)| (value.clone(), options.clone()))
    }
}

impl CookieSink for MemoryCookies {
    fn get_cookie(&self, name: &str) -> Option<String> {
        self.request.get(name).cloned()
    }

    fn set_cookie(
        &self,
        name: &str,
        value: &str,
        options: &CookieOptions,
    ) -> Result<(), Report<CollaboratorError>> {
        self.written
            .borrow_mut()
            .push((name.to_string(), value.to_string(), options.clone()));
        Ok(())
    }
}

/// Saved authentication states held in memory.
#[derive(Debug, Default)]
pub struct MemoryAuthState {
    states: HashMap<(String, String), JsonValue>,
    failing: bool,
}

impl MemoryAuthState {
    pub fn with_state(mut self, auth_id: &str, stage: &str, state: JsonValue) -> Self {
        self.states
            .insert((auth_id.to_string(), stage.to_string()), state);
        self
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }
}

impl AuthStateStore for MemoryAuthState {
    fn load_state(
        &self,
        auth_id: &str,
        stage: &str,
    ) -> Result<Option<JsonValue>, Report<CollaboratorError>> {
        if self.failing {
            return Err(CollaboratorError::unavailable("auth state", "store offline").into());
        }
        Ok(self
            .states
            .get(&(auth_id.to_string(), stage.to_string()))
            .cloned())
    }
}

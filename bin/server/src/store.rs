//! In-memory collaborators for the reference host.
//!
//! Metadata is loaded once from a JSON file. Sessions and saved
//! authentication states live in process memory behind `RwLock`s and are
//! shared across requests.

use crate::error::StoreError;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use discopower_core::{EntityId, EntityRecord};
use discopower_disco::{AuthStateStore, CollaboratorError, MetadataSource, SessionStore};
use rootcause::Report;
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::RwLock;

/// Metadata sets loaded from a JSON file.
///
/// The file maps set names to lists of entries, each with an `entityid`.
#[derive(Debug, Default)]
pub struct MetadataStore {
    sets: HashMap<String, Vec<EntityRecord>>,
}

impl MetadataStore {
    /// Loads metadata sets from `path`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read and `InvalidMetadata` if an
    /// entry is malformed or an entity ID repeats within a set.
    pub fn load(path: &Path) -> Result<Self, Report<StoreError>> {
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|e| StoreError::Io {
            path: display.clone(),
            details: e.to_string(),
        })?;
        let raw: HashMap<String, Vec<JsonValue>> =
            serde_json::from_str(&contents).map_err(|e| StoreError::InvalidMetadata {
                path: display.clone(),
                details: e.to_string(),
            })?;

        let mut sets = HashMap::with_capacity(raw.len());
        for (set, entries) in raw {
            let mut seen = HashSet::new();
            let mut records = Vec::with_capacity(entries.len());
            for entry in &entries {
                let record = EntityRecord::from_metadata_entry(entry).map_err(|e| {
                    StoreError::InvalidMetadata {
                        path: display.clone(),
                        details: format!("set '{set}': {e}"),
                    }
                })?;
                if !seen.insert(record.entity_id().clone()) {
                    return Err(StoreError::InvalidMetadata {
                        path: display.clone(),
                        details: format!("set '{set}': duplicate entity '{}'", record.entity_id()),
                    }
                    .into());
                }
                records.push(record);
            }
            tracing::info!(set = %set, entities = records.len(), "loaded metadata set");
            sets.insert(set, records);
        }

        Ok(Self { sets })
    }

    /// Creates a store from already built sets.
    #[must_use]
    pub fn from_sets(sets: HashMap<String, Vec<EntityRecord>>) -> Self {
        Self { sets }
    }
}

impl MetadataSource for MetadataStore {
    fn get_list(&self, set: &str) -> Result<Vec<EntityRecord>, Report<CollaboratorError>> {
        Ok(self.sets.get(set).cloned().unwrap_or_default())
    }

    fn get_entry(
        &self,
        entity_id: &EntityId,
        set: &str,
    ) -> Result<Option<EntityRecord>, Report<CollaboratorError>> {
        Ok(self
            .sets
            .get(set)
            .and_then(|records| records.iter().find(|r| r.entity_id() == entity_id))
            .cloned())
    }
}

/// Generates a new session ID.
#[must_use]
pub fn generate_session_id() -> String {
    ulid::Ulid::new().to_string()
}

#[derive(Debug)]
struct SessionData {
    expires_at: DateTime<Utc>,
    values: HashMap<(String, String), JsonValue>,
}

/// Sessions held in process memory.
#[derive(Debug)]
pub struct MemorySessions {
    sessions: RwLock<HashMap<String, SessionData>>,
    duration: ChronoDuration,
}

fn poisoned(what: &str) -> Report<CollaboratorError> {
    CollaboratorError::unavailable(what, "lock poisoned").into()
}

impl MemorySessions {
    /// Creates an empty session store whose sessions last `duration_minutes`
    /// after their last write.
    #[must_use]
    pub fn new(duration_minutes: i64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            duration: ChronoDuration::minutes(duration_minutes),
        }
    }

    /// Returns true if `session_id` names a live session.
    #[must_use]
    pub fn is_active(&self, session_id: &str) -> bool {
        self.sessions
            .read()
            .map(|sessions| {
                sessions
                    .get(session_id)
                    .is_some_and(|s| s.expires_at > Utc::now())
            })
            .unwrap_or(false)
    }

    /// Returns the session store view of one session.
    #[must_use]
    pub fn session(&self, session_id: impl Into<String>) -> SessionHandle<'_> {
        SessionHandle {
            store: self,
            session_id: session_id.into(),
        }
    }

    /// Removes expired sessions, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the session lock is poisoned.
    pub fn delete_expired(&self) -> Result<usize, Report<CollaboratorError>> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| poisoned("session store"))?;
        let before = sessions.len();
        let now = Utc::now();
        sessions.retain(|_, s| s.expires_at > now);
        Ok(before - sessions.len())
    }
}

/// One client's session.
#[derive(Debug)]
pub struct SessionHandle<'a> {
    store: &'a MemorySessions,
    session_id: String,
}

impl SessionStore for SessionHandle<'_> {
    fn get(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<Option<JsonValue>, Report<CollaboratorError>> {
        let sessions = self
            .store
            .sessions
            .read()
            .map_err(|_| poisoned("session store"))?;
        Ok(sessions
            .get(&self.session_id)
            .filter(|s| s.expires_at > Utc::now())
            .and_then(|s| s.values.get(&(namespace.to_string(), key.to_string())))
            .cloned())
    }

    fn set(
        &self,
        namespace: &str,
        key: &str,
        value: JsonValue,
    ) -> Result<(), Report<CollaboratorError>> {
        let mut sessions = self
            .store
            .sessions
            .write()
            .map_err(|_| poisoned("session store"))?;
        let now = Utc::now();
        let session = sessions
            .entry(self.session_id.clone())
            .or_insert_with(|| SessionData {
                expires_at: now,
                values: HashMap::new(),
            });
        if session.expires_at <= now {
            session.values.clear();
        }
        session.expires_at = now + self.store.duration;
        session
            .values
            .insert((namespace.to_string(), key.to_string()), value);
        Ok(())
    }
}

/// Saved authentication states held in process memory.
///
/// The host has no login flow of its own, so states only exist here when
/// an embedding login stage calls [`MemoryAuthStates::save`]. Until then the
/// unsafe-return lookup finds nothing and unknown SPs get no filter.
#[derive(Debug, Default)]
pub struct MemoryAuthStates {
    states: RwLock<HashMap<(String, String), JsonValue>>,
}

impl MemoryAuthStates {
    /// Saves the state of an in-flight login.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the state lock is poisoned.
    pub fn save(
        &self,
        auth_id: impl Into<String>,
        stage: impl Into<String>,
        state: JsonValue,
    ) -> Result<(), Report<CollaboratorError>> {
        self.states
            .write()
            .map_err(|_| poisoned("auth state store"))?
            .insert((auth_id.into(), stage.into()), state);
        Ok(())
    }
}

impl AuthStateStore for MemoryAuthStates {
    fn load_state(
        &self,
        auth_id: &str,
        stage: &str,
    ) -> Result<Option<JsonValue>, Report<CollaboratorError>> {
        let states = self
            .states
            .read()
            .map_err(|_| poisoned("auth state store"))?;
        Ok(states
            .get(&(auth_id.to_string(), stage.to_string()))
            .cloned())
    }
}

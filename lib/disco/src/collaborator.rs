//! Interfaces the host provides to the orchestrator.
//!
//! The orchestrator is synchronous and borrows its collaborators for the
//! duration of one request.

use crate::error::CollaboratorError;
use discopower_cdc::CookieOptions;
use discopower_core::{EntityId, EntityRecord};
use rootcause::Report;
use serde_json::Value as JsonValue;

/// Read access to entity metadata sets.
pub trait MetadataSource {
    /// Returns every entity in a metadata set.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the set cannot be read.
    fn get_list(&self, set: &str) -> Result<Vec<EntityRecord>, Report<CollaboratorError>>;

    /// Looks up one entity in a metadata set.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the set cannot be read.
    fn get_entry(
        &self,
        entity_id: &EntityId,
        set: &str,
    ) -> Result<Option<EntityRecord>, Report<CollaboratorError>>;
}

/// Per-client session storage, keyed by namespace and key.
pub trait SessionStore {
    /// Reads a session value.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the session cannot be read.
    fn get(&self, namespace: &str, key: &str)
    -> Result<Option<JsonValue>, Report<CollaboratorError>>;

    /// Writes a session value.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the session cannot be written.
    fn set(
        &self,
        namespace: &str,
        key: &str,
        value: JsonValue,
    ) -> Result<(), Report<CollaboratorError>>;
}

/// Request cookies and response cookie writes.
pub trait CookieSink {
    /// Returns the value of a request cookie.
    fn get_cookie(&self, name: &str) -> Option<String>;

    /// Queues a cookie on the response.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the cookie cannot be set.
    fn set_cookie(
        &self,
        name: &str,
        value: &str,
        options: &CookieOptions,
    ) -> Result<(), Report<CollaboratorError>>;
}

/// Saved authentication state of in-flight logins.
pub trait AuthStateStore {
    /// Loads the state saved under `auth_id` at `stage`.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the state store cannot be read.
    fn load_state(
        &self,
        auth_id: &str,
        stage: &str,
    ) -> Result<Option<JsonValue>, Report<CollaboratorError>>;
}

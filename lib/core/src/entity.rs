//! Identity provider metadata records.
//!
//! An [`EntityRecord`] is the view of one metadata entry that discovery
//! needs: its entity ID, English display name, tags and sort weight. Every
//! other metadata attribute is carried along untouched so later stages can
//! read icons, UI info or SP filter rules without the model interpreting them.

use crate::error::EntityError;
use rootcause::Report;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// Tag assigned to entities that declare no tags.
pub const MISC_TAG: &str = "misc";

/// Metadata key holding the entity ID.
const ENTITY_ID_KEY: &str = "entityid";

/// Metadata key holding the (possibly localized) display name.
const NAME_KEY: &str = "name";

/// Metadata key holding the tag list.
const TAGS_KEY: &str = "tags";

/// Metadata key holding the sort weight.
const WEIGHT_KEY: &str = "discopower.weight";

/// Language used when picking a name out of a localized name map.
const DISPLAY_LANGUAGE: &str = "en";

/// Unique identifier of a SAML entity (usually a URI).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Creates a new entity ID from a string.
    #[must_use]
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Returns the entity ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One identity provider (or service provider) metadata entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    /// Unique entity ID.
    entity_id: EntityId,
    /// English display name, if the entity has one.
    display_name: Option<String>,
    /// Declared tags, in metadata order.
    tags: Vec<String>,
    /// Explicit sort weight.
    weight: Option<i64>,
    /// All metadata attributes, untouched.
    attributes: Map<String, JsonValue>,
}

impl EntityRecord {
    /// Creates a record with no name, tags, weight or attributes.
    #[must_use]
    pub fn new(entity_id: impl Into<EntityId>) -> Self {
        Self {
            entity_id: entity_id.into(),
            display_name: None,
            tags: Vec::new(),
            weight: None,
            attributes: Map::new(),
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Sets the tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the sort weight.
    #[must_use]
    pub fn with_weight(mut self, weight: i64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Adds an opaque metadata attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Builds a record from raw metadata for the given entity ID.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the entity ID is empty, the metadata is not
    /// an object, an embedded `entityid` disagrees with `entity_id`, or
    /// `tags` is not a list of non-empty strings.
    pub fn from_metadata(
        entity_id: impl Into<String>,
        metadata: &JsonValue,
    ) -> Result<Self, Report<EntityError>> {
        let entity_id = entity_id.into();
        let invalid = |details: &str| EntityError::InvalidInput {
            entity_id: entity_id.clone(),
            details: details.to_string(),
        };

        if entity_id.is_empty() {
            return Err(invalid("entity ID must not be empty").into());
        }

        let object = metadata
            .as_object()
            .ok_or_else(|| invalid("metadata must be an object"))?;

        if let Some(embedded) = object.get(ENTITY_ID_KEY) {
            if embedded.as_str() != Some(entity_id.as_str()) {
                return Err(invalid("embedded entityid does not match").into());
            }
        }

        let display_name = match object.get(NAME_KEY) {
            Some(JsonValue::String(name)) => Some(name.clone()),
            Some(JsonValue::Object(localized)) => localized
                .get(DISPLAY_LANGUAGE)
                .and_then(JsonValue::as_str)
                .map(str::to_string),
            _ => None,
        };

        let tags = match object.get(TAGS_KEY) {
            None | Some(JsonValue::Null) => Vec::new(),
            Some(JsonValue::Array(values)) => {
                let mut tags = Vec::with_capacity(values.len());
                for value in values {
                    match value.as_str() {
                        Some(tag) if !tag.is_empty() => tags.push(tag.to_string()),
                        _ => return Err(invalid("tags must be non-empty strings").into()),
                    }
                }
                tags
            }
            Some(_) => return Err(invalid("tags must be a list").into()),
        };

        // Non-integral weights fall back to the configured default.
        let weight = object.get(WEIGHT_KEY).and_then(JsonValue::as_i64);

        let mut attributes = object.clone();
        attributes.remove(ENTITY_ID_KEY);

        Ok(Self {
            entity_id: EntityId::new(entity_id),
            display_name,
            tags,
            weight,
            attributes,
        })
    }

    /// Builds a record from a metadata object carrying its own `entityid`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `entityid` is missing or not a string, or
    /// for any reason [`EntityRecord::from_metadata`] rejects the entry.
    pub fn from_metadata_entry(metadata: &JsonValue) -> Result<Self, Report<EntityError>> {
        let entity_id = metadata
            .get(ENTITY_ID_KEY)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| EntityError::InvalidInput {
                entity_id: String::new(),
                details: "metadata entry has no entityid".to_string(),
            })?;
        Self::from_metadata(entity_id, metadata)
    }

    /// Returns the entity ID.
    #[must_use]
    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    /// Returns the English display name, if any.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the declared tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the explicit sort weight, if any.
    #[must_use]
    pub fn weight(&self) -> Option<i64> {
        self.weight
    }

    /// Returns an opaque metadata attribute.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&JsonValue> {
        self.attributes.get(key)
    }

    /// Returns all metadata attributes.
    #[must_use]
    pub fn attributes(&self) -> &Map<String, JsonValue> {
        &self.attributes
    }

    /// Returns the weight used for sorting.
    #[must_use]
    pub fn effective_weight(&self, default_weight: i64) -> i64 {
        self.weight.unwrap_or(default_weight)
    }

    /// Returns the tags used for tab placement.
    ///
    /// Entities without tags land in the [`MISC_TAG`] tab.
    #[must_use]
    pub fn effective_tags(&self) -> Vec<&str> {
        if self.tags.is_empty() {
            vec![MISC_TAG]
        } else {
            self.tags.iter().map(String::as_str).collect()
        }
    }
}

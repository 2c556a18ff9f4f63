//! Presentation data for the discovery page.
//!
//! Converts a [`TabbedView`] into tabs of [`DisplayEntry`] values carrying
//! everything a page needs to render an entity: a pre-built action URL, a
//! resolved icon URL and search keywords.

use crate::error::ViewError;
use crate::tabs::TabbedView;
use discopower_core::EntityRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use rootcause::Report;
use serde::Serialize;
use serde_json::Value as JsonValue;
use url::Url;

/// Allowed tab names: lowercase alphanumerics, hyphens and underscores,
/// starting with a letter or underscore, at least two characters.
static TAB_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_-]+$").expect("valid tab name regex"));

/// Query parameter carrying the chosen IdP in action URLs.
pub const CHOICE_PARAM: &str = "idpentityid";

/// Checks that a tab name is safe to use as an identifier on the page.
///
/// # Errors
///
/// Returns `Configuration` if the name does not match the allowed pattern.
pub fn validate_tab_name(name: &str) -> Result<(), Report<ViewError>> {
    if TAB_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(ViewError::Configuration {
            details: format!(
                "tab '{name}' is invalid: tags can contain lowercase alphanumeric characters, \
                 hyphens and underscores, and must start with a letter or an underscore"
            ),
        }
        .into())
    }
}

/// Request context used to build per-entry links.
#[derive(Debug, Clone)]
pub struct DisplayRequest {
    /// The requesting SP's entity ID.
    pub sp_entity_id: String,
    /// Where the choice is sent back to.
    pub return_url: String,
    /// Name of the return parameter carrying the chosen IdP.
    pub return_id_param: String,
    /// Base URL used to resolve relative icon URLs.
    pub base_url: Option<Url>,
}

impl DisplayRequest {
    /// Returns the relative URL that submits `entity` as the choice.
    #[must_use]
    pub fn action_url(&self, entity: &EntityRecord) -> String {
        format!(
            "?entityID={}&return={}&returnIDParam={}&{CHOICE_PARAM}={}",
            urlencoding::encode(&self.sp_entity_id),
            urlencoding::encode(&self.return_url),
            urlencoding::encode(&self.return_id_param),
            urlencoding::encode(entity.entity_id().as_str()),
        )
    }

    /// Resolves an icon reference against the base URL.
    #[must_use]
    pub fn resolve_icon(&self, icon: &str) -> String {
        if Url::parse(icon).is_ok() {
            return icon.to_string();
        }
        self.base_url
            .as_ref()
            .and_then(|base| base.join(icon).ok())
            .map_or_else(|| icon.to_string(), |url| url.to_string())
    }

    /// Builds the display entry for one entity.
    #[must_use]
    pub fn entry(&self, entity: &EntityRecord, default_weight: i64) -> DisplayEntry {
        let icon_url = entity
            .attribute("icon")
            .and_then(JsonValue::as_str)
            .map(|icon| self.resolve_icon(icon));

        DisplayEntry {
            entity_id: entity.entity_id().to_string(),
            name: entity.display_name().map(str::to_string),
            tags: entity.tags().to_vec(),
            weight: entity.effective_weight(default_weight),
            action_url: self.action_url(entity),
            icon_url,
            keywords: keywords(entity),
        }
    }
}

/// Joins the English `UIInfo` keywords of an entity.
fn keywords(entity: &EntityRecord) -> String {
    entity
        .attribute("UIInfo")
        .and_then(|ui| ui.get("Keywords"))
        .and_then(|k| k.get("en"))
        .and_then(JsonValue::as_array)
        .map(|words| {
            words
                .iter()
                .filter_map(JsonValue::as_str)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// One entity as shown on the discovery page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayEntry {
    pub entity_id: String,
    pub name: Option<String>,
    pub tags: Vec<String>,
    pub weight: i64,
    pub action_url: String,
    pub icon_url: Option<String>,
    pub keywords: String,
}

/// One tab as shown on the discovery page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayTab {
    pub name: String,
    pub entries: Vec<DisplayEntry>,
}

/// Converts structured tabs into display tabs.
///
/// # Errors
///
/// Returns `Configuration` if any tab name is invalid; no tabs are returned
/// in that case.
pub fn build_display_tabs(
    view: &TabbedView,
    request: &DisplayRequest,
    default_weight: i64,
) -> Result<Vec<DisplayTab>, Report<ViewError>> {
    for tab in view.tabs() {
        validate_tab_name(tab.name())?;
    }

    Ok(view
        .tabs()
        .iter()
        .map(|tab| DisplayTab {
            name: tab.name().to_string(),
            entries: tab
                .entries()
                .iter()
                .map(|e| request.entry(e, default_weight))
                .collect(),
        })
        .collect())
}

//! The tab list kept in the session for the discovery page scripts.
//!
//! The page fetches this document to restore the tab layout of the last
//! render without inline scripts. Requests with a `callback` get JSONP.

use crate::collaborator::SessionStore;
use crate::error::{CollaboratorError, DiscoError};
use once_cell::sync::Lazy;
use regex::Regex;
use rootcause::Report;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Session namespace the tab list is stored under.
pub const TAB_LIST_NAMESPACE: &str = "discopower:tabList";

const FAVENTRY_KEY: &str = "faventry";
const TABS_KEY: &str = "tabs";
const DEFAULT_TAB_KEY: &str = "defaulttab";

static CALLBACK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z0-9_]+$").expect("valid callback regex"));

/// Tab layout of the last rendered discovery page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabList {
    /// Entity ID of the favoured IdP, if one was shown.
    pub faventry: Option<String>,
    /// The default tab.
    pub default: JsonValue,
    /// Tab names in display order.
    pub tabs: Vec<String>,
}

fn session_failure(report: &impl std::fmt::Display) -> DiscoError {
    DiscoError::MissingTabList {
        details: report.to_string(),
    }
}

impl TabList {
    /// Loads the tab list from the session.
    ///
    /// # Errors
    ///
    /// Returns `MissingTabList` if the session has no list of tabs or cannot
    /// be read.
    pub fn load(session: &dyn SessionStore) -> Result<Self, Report<DiscoError>> {
        let tabs = session
            .get(TAB_LIST_NAMESPACE, TABS_KEY)
            .map_err(|e| session_failure(&e))?;
        let tabs = match tabs {
            Some(JsonValue::Array(tabs)) => tabs
                .into_iter()
                .map(|tab| match tab {
                    JsonValue::String(tab) => Ok(tab),
                    other => Err(DiscoError::MissingTabList {
                        details: format!("tab name {other} is not a string"),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => {
                return Err(DiscoError::MissingTabList {
                    details: "no tabs stored".to_string(),
                }
                .into());
            }
        };

        let faventry = session
            .get(TAB_LIST_NAMESPACE, FAVENTRY_KEY)
            .map_err(|e| session_failure(&e))?
            .and_then(|v| v.as_str().map(str::to_string));
        let default = session
            .get(TAB_LIST_NAMESPACE, DEFAULT_TAB_KEY)
            .map_err(|e| session_failure(&e))?
            .unwrap_or(JsonValue::Null);

        Ok(Self {
            faventry,
            default,
            tabs,
        })
    }

    /// Stores the tab list in the session.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the session cannot be written.
    pub fn store(
        &self,
        session: &dyn SessionStore,
    ) -> Result<(), Report<CollaboratorError>> {
        let faventry = self
            .faventry
            .clone()
            .map_or(JsonValue::Null, JsonValue::String);
        let tabs = JsonValue::Array(self.tabs.iter().cloned().map(JsonValue::String).collect());

        session.set(TAB_LIST_NAMESPACE, FAVENTRY_KEY, faventry)?;
        session.set(TAB_LIST_NAMESPACE, TABS_KEY, tabs)?;
        session.set(TAB_LIST_NAMESPACE, DEFAULT_TAB_KEY, self.default.clone())?;
        Ok(())
    }
}

/// A rendered tab list document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabListResponse {
    pub content_type: &'static str,
    pub body: String,
}

/// Escapes characters that could end a script context.
fn escape_for_script(json: &str) -> String {
    let mut escaped = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => escaped.push_str("\\u003C"),
            '>' => escaped.push_str("\\u003E"),
            '&' => escaped.push_str("\\u0026"),
            '\'' => escaped.push_str("\\u0027"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Builds the tab list response, wrapped as JSONP when `callback` is given.
///
/// # Errors
///
/// Returns `MissingTabList` if the session holds no tab list and
/// `UnsafeCallback` if the callback name is not a plain identifier.
pub fn tab_list_response(
    session: &dyn SessionStore,
    callback: Option<&str>,
) -> Result<TabListResponse, Report<DiscoError>> {
    let tab_list = TabList::load(session)?;
    let json = serde_json::to_string(&tab_list).map_err(|e| DiscoError::MissingTabList {
        details: format!("could not encode tab list: {e}"),
    })?;
    let json = escape_for_script(&json);

    match callback {
        Some(callback) if CALLBACK_REGEX.is_match(callback) => Ok(TabListResponse {
            content_type: "text/javascript",
            body: format!("/**/{callback}({json});"),
        }),
        Some(callback) => Err(DiscoError::UnsafeCallback {
            callback: callback.to_string(),
        }
        .into()),
        None => Ok(TabListResponse {
            content_type: "application/json",
            body: json,
        }),
    }
}

//! Resolved configuration of one discovery service instance.

use discopower_cdc::CdcSettings;
use discopower_view::ViewError;
use rootcause::Report;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Search widget the discovery page uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMode {
    #[default]
    Quicksilver,
    Suggest,
}

impl ScoreMode {
    /// Returns the configuration name of this mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quicksilver => "quicksilver",
            Self::Suggest => "suggest",
        }
    }
}

impl fmt::Display for ScoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discovery service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoConfig {
    /// Instance name, used in logs and the last-IdP cookie name.
    #[serde(default = "default_instance")]
    pub instance: String,

    /// Index of the tab shown first.
    #[serde(default)]
    pub default_tab: usize,

    /// Tabs that always come first, in this order.
    #[serde(default)]
    pub tab_order: Vec<String>,

    /// Enabled tabs; empty enables every tag.
    #[serde(default)]
    pub tabs: Vec<String>,

    /// Sort weight of entities without `discopower.weight`.
    #[serde(default = "default_weight")]
    pub default_weight: i64,

    #[serde(default)]
    pub score: ScoreMode,

    /// Domain of the common domain cookie; CDC support is off without it.
    #[serde(default)]
    pub cdc_domain: Option<String>,

    /// CDC lifetime in seconds; unset keeps it for the browser session.
    #[serde(default)]
    pub cdc_lifetime: Option<u64>,

    /// Recover SP metadata from the authentication state when the SP is
    /// unknown. Only used to find the SP's filter rule.
    #[serde(default)]
    pub use_unsafe_return: bool,

    #[serde(default)]
    pub remember_enabled: bool,

    #[serde(default)]
    pub remember_checked: bool,

    /// Hosts return URLs may point to; empty allows any host.
    #[serde(default)]
    pub trusted_url_domains: Vec<String>,

    /// Metadata set holding identity providers.
    #[serde(default = "default_idp_set")]
    pub idp_set: String,

    /// Metadata set holding service providers.
    #[serde(default = "default_sp_set")]
    pub sp_set: String,

    /// Base URL relative icon URLs are resolved against.
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_instance() -> String {
    "poweridpdisco".to_string()
}

fn default_weight() -> i64 {
    100
}

fn default_idp_set() -> String {
    "saml20-idp-remote".to_string()
}

fn default_sp_set() -> String {
    "saml20-sp-remote".to_string()
}

impl Default for DiscoConfig {
    fn default() -> Self {
        Self {
            instance: default_instance(),
            default_tab: 0,
            tab_order: Vec::new(),
            tabs: Vec::new(),
            default_weight: default_weight(),
            score: ScoreMode::default(),
            cdc_domain: None,
            cdc_lifetime: None,
            use_unsafe_return: false,
            remember_enabled: false,
            remember_checked: false,
            trusted_url_domains: Vec::new(),
            idp_set: default_idp_set(),
            sp_set: default_sp_set(),
            base_url: None,
        }
    }
}

impl DiscoConfig {
    /// Returns the resolved common domain cookie settings.
    #[must_use]
    pub fn cdc_settings(&self) -> CdcSettings {
        CdcSettings::new(self.cdc_domain.clone(), self.cdc_lifetime)
    }

    /// Returns the name of the cookie remembering the last IdP when CDC
    /// support is off.
    #[must_use]
    pub fn last_idp_cookie_name(&self) -> String {
        format!("idpdisco_{}_lastidp", self.instance)
    }

    /// Parses the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the base URL is not an absolute URL.
    pub fn parsed_base_url(&self) -> Result<Option<Url>, Report<ViewError>> {
        let Some(base) = self.base_url.as_deref() else {
            return Ok(None);
        };
        let url = Url::parse(base).map_err(|e| ViewError::Configuration {
            details: format!("base URL '{base}' is invalid: {e}"),
        })?;
        Ok(Some(url))
    }
}

//! Handling of one discovery request.
//!
//! A request either carries the user's choice, which is remembered and sent
//! back to the SP, or asks for the discovery page. The page is the SP's
//! filtered view of the IdP list, structured into tabs, with the previously
//! used IdP offered as the favoured entry.

use crate::collaborator::{AuthStateStore, CookieSink, MetadataSource, SessionStore};
use crate::config::{DiscoConfig, ScoreMode};
use crate::error::DiscoError;
use crate::params::DiscoParams;
use crate::return_state::recover_sp_metadata;
use crate::tablist::TabList;
use discopower_cdc::{CDC_COOKIE_NAME, CdcHistory, CookieOptions};
use discopower_core::{EntityId, EntityRecord};
use discopower_view::{
    DisplayEntry, DisplayRequest, DisplayTab, FilterRule, IdentityHook, SortHook, TabLayout,
    apply_filter, build_display_tabs,
};
use rootcause::Report;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// Lifetime of the last-IdP cookie when CDC support is off.
pub const LAST_IDP_COOKIE_LIFETIME: u64 = 90 * 24 * 60 * 60;

/// Autofocus hint when a favoured entry is shown.
pub const FAVOURITE_AUTOFOCUS: &str = "favouritesubmit";

/// Everything the discovery page needs to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayView {
    pub sp_entity_id: String,
    pub return_url: String,
    pub return_id_param: String,
    pub default_tab: usize,
    pub score: ScoreMode,
    pub remember_enabled: bool,
    pub remember_checked: bool,
    pub preferred_idp: Option<String>,
    pub faventry: Option<DisplayEntry>,
    pub autofocus: Option<String>,
    pub url_pattern: Option<String>,
    pub tabs: Vec<DisplayTab>,
}

/// Result of handling a discovery request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoOutcome {
    /// Send the user back to the SP.
    Redirect(String),
    /// Show the discovery page.
    Render(Box<DisplayView>),
}

fn metadata_failure(report: &impl fmt::Display) -> DiscoError {
    DiscoError::Metadata {
        details: report.to_string(),
    }
}

/// The discovery service for one request.
pub struct PowerDisco<'a> {
    config: &'a DiscoConfig,
    metadata: &'a dyn MetadataSource,
    session: &'a dyn SessionStore,
    cookies: &'a dyn CookieSink,
    auth_state: Option<&'a dyn AuthStateStore>,
    sort_hook: &'a dyn SortHook,
    self_url: Option<String>,
}

impl fmt::Debug for PowerDisco<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PowerDisco")
            .field("instance", &self.config.instance)
            .field("self_url", &self.self_url)
            .finish_non_exhaustive()
    }
}

impl<'a> PowerDisco<'a> {
    /// Creates a discovery service over the host's collaborators.
    #[must_use]
    pub fn new(
        config: &'a DiscoConfig,
        metadata: &'a dyn MetadataSource,
        session: &'a dyn SessionStore,
        cookies: &'a dyn CookieSink,
    ) -> Self {
        Self {
            config,
            metadata,
            session,
            cookies,
            auth_state: None,
            sort_hook: &IdentityHook,
            self_url: None,
        }
    }

    /// Enables SP metadata recovery from saved authentication state.
    #[must_use]
    pub fn with_auth_state(mut self, auth_state: &'a dyn AuthStateStore) -> Self {
        self.auth_state = Some(auth_state);
        self
    }

    /// Re-ranks every tab with `hook` after sorting.
    #[must_use]
    pub fn with_sort_hook(mut self, hook: &'a dyn SortHook) -> Self {
        self.sort_hook = hook;
        self
    }

    /// Sets the URL of the discovery page itself, without query.
    #[must_use]
    pub fn with_self_url(mut self, url: impl Into<String>) -> Self {
        self.self_url = Some(url.into());
        self
    }

    /// Handles one discovery request.
    ///
    /// # Errors
    ///
    /// Returns `DiscoParams` for missing or malformed parameters and
    /// `Metadata` if the page cannot be built.
    #[instrument(skip_all, fields(instance = %self.config.instance))]
    pub fn handle(
        &self,
        query: &HashMap<String, String>,
    ) -> Result<DiscoOutcome, Report<DiscoError>> {
        let params = DiscoParams::from_query(query, &self.config.trusted_url_domains)?;

        if let Some(choice) = params.choice.as_deref() {
            if self.is_known_idp(choice) {
                self.remember_choice(choice)?;
                info!(instance = %self.config.instance, idp = choice, "choice made");
                return Ok(DiscoOutcome::Redirect(params.redirect_for(choice)));
            }
            info!(instance = %self.config.instance, idp = choice, "ignoring invalid choice");
        }

        let view = self.render(&params)?;
        Ok(DiscoOutcome::Render(Box::new(view)))
    }

    fn is_known_idp(&self, entity_id: &str) -> bool {
        match self
            .metadata
            .get_entry(&EntityId::from(entity_id), &self.config.idp_set)
        {
            Ok(entry) => entry.is_some(),
            Err(report) => {
                warn!(idp = entity_id, error = %report, "could not validate IdP");
                false
            }
        }
    }

    fn remember_choice(&self, idp: &str) -> Result<(), Report<DiscoError>> {
        let settings = self.config.cdc_settings();
        let written = if settings.is_enabled() {
            let mut history =
                CdcHistory::decode(self.cookies.get_cookie(CDC_COOKIE_NAME).as_deref());
            history.record_choice(idp);
            self.cookies
                .set_cookie(CDC_COOKIE_NAME, &history.encode(), &settings.cookie_options())
        } else {
            let options = CookieOptions {
                lifetime: Some(LAST_IDP_COOKIE_LIFETIME),
                ..CookieOptions::default()
            };
            self.cookies
                .set_cookie(&self.config.last_idp_cookie_name(), idp, &options)
        };
        written.map_err(|e| metadata_failure(&e))?;
        Ok(())
    }

    /// Returns the previously used IdP, if it is still in `known`.
    fn preferred_idp(&self, known: &HashSet<&str>) -> Option<String> {
        if self.config.cdc_settings().is_enabled() {
            let history = CdcHistory::decode(self.cookies.get_cookie(CDC_COOKIE_NAME).as_deref());
            return history
                .most_recent_valid(|id| known.contains(id))
                .map(str::to_string);
        }
        self.cookies
            .get_cookie(&self.config.last_idp_cookie_name())
            .filter(|id| known.contains(id.as_str()))
    }

    /// Resolves the requesting SP's filter rule.
    ///
    /// An unknown SP has no rule. A rule found through saved authentication
    /// state is only used if it is well-formed.
    fn resolve_filter(
        &self,
        params: &DiscoParams,
    ) -> Result<Option<FilterRule>, Report<DiscoError>> {
        let sp_id = EntityId::from(params.sp_entity_id.as_str());
        match self.metadata.get_entry(&sp_id, &self.config.sp_set) {
            Ok(Some(sp)) => {
                return FilterRule::from_entity(&sp).map_err(|e| metadata_failure(&e).into());
            }
            Ok(None) => debug!(sp = %sp_id, "SP not in metadata"),
            Err(report) => warn!(sp = %sp_id, error = %report, "could not look up SP"),
        }

        if !self.config.use_unsafe_return {
            return Ok(None);
        }
        let Some(store) = self.auth_state else {
            return Ok(None);
        };
        let Some(sp) = recover_sp_metadata(store, &params.return_target) else {
            return Ok(None);
        };

        info!(
            instance = %self.config.instance,
            from = %sp_id,
            to = %sp.entity_id(),
            "updated SP metadata from authentication state"
        );
        Ok(FilterRule::from_entity(&sp).unwrap_or_else(|report| {
            warn!(error = %report, "ignoring malformed filter from authentication state");
            None
        }))
    }

    fn render(&self, params: &DiscoParams) -> Result<DisplayView, Report<DiscoError>> {
        let idps = self
            .metadata
            .get_list(&self.config.idp_set)
            .map_err(|e| metadata_failure(&e))?;

        let preferred = {
            let known: HashSet<&str> = idps.iter().map(|r| r.entity_id().as_str()).collect();
            self.preferred_idp(&known)
        };

        let rule = self.resolve_filter(params)?;
        let idps: Vec<EntityRecord> = apply_filter(rule.as_ref(), idps);

        let layout = TabLayout::new(
            self.config.tab_order.clone(),
            self.config.tabs.iter().cloned(),
            self.config.default_weight,
        );
        let view = layout
            .structure_with_hook(&idps, self.sort_hook)
            .map_err(|e| metadata_failure(&e))?;

        let request = DisplayRequest {
            sp_entity_id: params.sp_entity_id.clone(),
            return_url: params.return_url.clone(),
            return_id_param: params.return_id_param.clone(),
            base_url: self
                .config
                .parsed_base_url()
                .map_err(|e| metadata_failure(&e))?,
        };
        let tabs = build_display_tabs(&view, &request, self.config.default_weight)
            .map_err(|e| metadata_failure(&e))?;

        let faventry = preferred.as_deref().and_then(|id| {
            tabs.iter()
                .find_map(|tab| tab.entries.iter().find(|e| e.entity_id == id))
                .cloned()
        });
        let autofocus = faventry.as_ref().map(|_| FAVOURITE_AUTOFOCUS.to_string());

        TabList {
            faventry: faventry.as_ref().map(|e| e.entity_id.clone()),
            default: JsonValue::from(self.config.default_tab),
            tabs: tabs.iter().map(|t| t.name.clone()).collect(),
        }
        .store(self.session)
        .map_err(|e| metadata_failure(&e))?;

        info!(
            instance = %self.config.instance,
            sp = %params.sp_entity_id,
            tabs = tabs.len(),
            preferred = preferred.as_deref().unwrap_or("none"),
            "showing discovery page"
        );

        Ok(DisplayView {
            sp_entity_id: params.sp_entity_id.clone(),
            return_url: params.return_url.clone(),
            return_id_param: params.return_id_param.clone(),
            default_tab: self.config.default_tab,
            score: self.config.score,
            remember_enabled: self.config.remember_enabled,
            remember_checked: self.config.remember_checked,
            preferred_idp: preferred,
            faventry,
            autofocus,
            url_pattern: self.self_url.clone(),
            tabs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tablist::TAB_LIST_NAMESPACE;
    use crate::testing::{MemoryAuthState, MemoryCookies, MemoryMetadata, MemorySession};
    use discopower_cdc::CdcSettings;
    use serde_json::json;

    const SP: &str = "https://sp01.example.net/sp";
    const RETURN: &str = "https://sp01.example.net/discoresp";

    fn idps() -> Vec<EntityRecord> {
        let entries = [
            json!({"entityid": "https://idp01.example.org", "name": {"en": "IdP 01"},
                   "discopower.weight": 1, "tags": ["tab_a"]}),
            json!({"entityid": "https://idp02.example.org", "name": {"en": "IdP 02"}, "tags": ["tab_a"]}),
            json!({"entityid": "https://idp03.example.org", "name": {"en": "IdP 03"},
                   "discopower.weight": 100, "tags": ["tab_a"]}),
            json!({"entityid": "https://idp04.example.org", "name": {"en": "IdP 04"},
                   "tags": ["tab_a", "tab_b"], "UIInfo": {"Keywords": {"en": ["aap", "noot", "mies"]}}}),
            json!({"entityid": "https://idp05.example.org", "tags": ["tab_b"]}),
            json!({"entityid": "https://idp06.example.org", "name": {"en": "IdP 06"}, "tags": ["tab_b"]}),
        ];
        entries
            .iter()
            .map(|e| EntityRecord::from_metadata_entry(e).expect("valid fixture"))
            .collect()
    }

    fn metadata(sps: Vec<EntityRecord>) -> MemoryMetadata {
        MemoryMetadata::default()
            .with_set("saml20-idp-remote", idps())
            .with_set("saml20-sp-remote", sps)
    }

    fn query(choice: Option<&str>) -> HashMap<String, String> {
        let mut query: HashMap<String, String> = [
            ("entityID", SP),
            ("return", RETURN),
            ("returnIDParam", "idpentityid"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        if let Some(choice) = choice {
            query.insert("idpentityid".to_string(), choice.to_string());
        }
        query
    }

    fn config() -> DiscoConfig {
        DiscoConfig {
            tab_order: vec!["tab_b".to_string(), "tab_a".to_string()],
            ..DiscoConfig::default()
        }
    }

    fn render(outcome: DiscoOutcome) -> DisplayView {
        match outcome {
            DiscoOutcome::Render(view) => *view,
            DiscoOutcome::Redirect(to) => panic!("unexpected redirect to {to}"),
        }
    }

    fn entity_ids(tab: &DisplayTab) -> Vec<&str> {
        tab.entries.iter().map(|e| e.entity_id.as_str()).collect()
    }

    #[test]
    fn renders_tabs_in_configured_order() {
        let config = config();
        let metadata = metadata(vec![]);
        let session = MemorySession::default();
        let cookies = MemoryCookies::default();
        let disco = PowerDisco::new(&config, &metadata, &session, &cookies);

        let view = render(disco.handle(&query(None)).expect("rendered"));
        let names: Vec<_> = view.tabs.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["tab_b", "tab_a"]);
        assert_eq!(
            entity_ids(&view.tabs[0]),
            vec![
                "https://idp04.example.org",
                "https://idp06.example.org",
                "https://idp05.example.org",
            ]
        );
        assert_eq!(
            entity_ids(&view.tabs[1]),
            vec![
                "https://idp02.example.org",
                "https://idp03.example.org",
                "https://idp04.example.org",
                "https://idp01.example.org",
            ]
        );
        assert!(view.faventry.is_none());
        assert!(view.autofocus.is_none());
    }

    #[test]
    fn render_persists_tab_list() {
        let config = DiscoConfig {
            default_tab: 1,
            ..config()
        };
        let metadata = metadata(vec![]);
        let session = MemorySession::default();
        let cookies = MemoryCookies::default();
        PowerDisco::new(&config, &metadata, &session, &cookies)
            .handle(&query(None))
            .expect("rendered");

        assert_eq!(
            session.value(TAB_LIST_NAMESPACE, "tabs"),
            Some(json!(["tab_b", "tab_a"]))
        );
        assert_eq!(session.value(TAB_LIST_NAMESPACE, "faventry"), Some(JsonValue::Null));
        assert_eq!(session.value(TAB_LIST_NAMESPACE, "defaulttab"), Some(json!(1)));
    }

    #[test]
    fn valid_choice_redirects_and_sets_last_idp_cookie() {
        let config = config();
        let metadata = metadata(vec![]);
        let session = MemorySession::default();
        let cookies = MemoryCookies::default();
        let disco = PowerDisco::new(&config, &metadata, &session, &cookies);

        let outcome = disco
            .handle(&query(Some("https://idp02.example.org")))
            .expect("handled");
        assert_eq!(
            outcome,
            DiscoOutcome::Redirect(format!(
                "{RETURN}?idpentityid=https%3A%2F%2Fidp02.example.org"
            ))
        );

        let (value, options) = cookies
            .written("idpdisco_poweridpdisco_lastidp")
            .expect("cookie written");
        assert_eq!(value, "https://idp02.example.org");
        assert_eq!(options.lifetime, Some(LAST_IDP_COOKIE_LIFETIME));
    }

    #[test]
    fn invalid_choice_is_ignored() {
        let config = config();
        let metadata = metadata(vec![]);
        let session = MemorySession::default();
        let cookies = MemoryCookies::default();
        let disco = PowerDisco::new(&config, &metadata, &session, &cookies);

        let view = render(
            disco
                .handle(&query(Some("https://unknown.example.org")))
                .expect("rendered"),
        );
        assert_eq!(view.tabs.len(), 2);
        assert!(cookies.written("idpdisco_poweridpdisco_lastidp").is_none());
    }

    #[test]
    fn choice_updates_cdc_history() {
        let config = DiscoConfig {
            cdc_domain: Some("example.org".to_string()),
            cdc_lifetime: Some(3600),
            ..config()
        };
        let mut existing = CdcHistory::new();
        existing.record_choice("https://idp02.example.org");
        existing.record_choice("https://idp01.example.org");

        let metadata = metadata(vec![]);
        let session = MemorySession::default();
        let cookies = MemoryCookies::default().with_cookie(CDC_COOKIE_NAME, &existing.encode());
        PowerDisco::new(&config, &metadata, &session, &cookies)
            .handle(&query(Some("https://idp02.example.org")))
            .expect("handled");

        let (value, options) = cookies.written(CDC_COOKIE_NAME).expect("cdc written");
        let history = CdcHistory::decode(Some(value.as_str()));
        assert_eq!(
            history.entries(),
            &[
                "https://idp01.example.org".to_string(),
                "https://idp02.example.org".to_string(),
            ]
        );
        assert_eq!(
            options,
            CdcSettings::new(Some("example.org".to_string()), Some(3600)).cookie_options()
        );
    }

    #[test]
    fn preferred_idp_from_last_idp_cookie() {
        let config = config();
        let metadata = metadata(vec![]);
        let session = MemorySession::default();
        let cookies = MemoryCookies::default()
            .with_cookie("idpdisco_poweridpdisco_lastidp", "https://idp04.example.org");

        let view = render(
            PowerDisco::new(&config, &metadata, &session, &cookies)
                .handle(&query(None))
                .expect("rendered"),
        );
        assert_eq!(view.preferred_idp.as_deref(), Some("https://idp04.example.org"));
        let faventry = view.faventry.expect("favoured entry");
        assert_eq!(faventry.entity_id, "https://idp04.example.org");
        assert_eq!(faventry.keywords, "aap noot mies");
        assert_eq!(view.autofocus.as_deref(), Some(FAVOURITE_AUTOFOCUS));
        assert_eq!(
            session.value(TAB_LIST_NAMESPACE, "faventry"),
            Some(json!("https://idp04.example.org"))
        );
    }

    #[test]
    fn unknown_last_idp_is_not_preferred() {
        let config = config();
        let metadata = metadata(vec![]);
        let session = MemorySession::default();
        let cookies = MemoryCookies::default()
            .with_cookie("idpdisco_poweridpdisco_lastidp", "https://gone.example.org");

        let view = render(
            PowerDisco::new(&config, &metadata, &session, &cookies)
                .handle(&query(None))
                .expect("rendered"),
        );
        assert!(view.preferred_idp.is_none());
        assert!(view.faventry.is_none());
    }

    #[test]
    fn preferred_idp_is_newest_known_cdc_entry() {
        let config = DiscoConfig {
            cdc_domain: Some("example.org".to_string()),
            ..config()
        };
        let mut history = CdcHistory::new();
        history.record_choice("https://idp05.example.org");
        history.record_choice("https://gone.example.org");

        let metadata = metadata(vec![]);
        let session = MemorySession::default();
        let cookies = MemoryCookies::default().with_cookie(CDC_COOKIE_NAME, &history.encode());
        let view = render(
            PowerDisco::new(&config, &metadata, &session, &cookies)
                .handle(&query(None))
                .expect("rendered"),
        );
        assert_eq!(view.preferred_idp.as_deref(), Some("https://idp05.example.org"));
    }

    #[test]
    fn sp_filter_restricts_idps() {
        let sp = EntityRecord::new(SP).with_attribute(
            "discopower.filter",
            json!({"tags.include": ["tab_b"], "entities.exclude": ["https://idp05.example.org"]}),
        );
        let config = config();
        let metadata = metadata(vec![sp]);
        let session = MemorySession::default();
        let cookies = MemoryCookies::default();

        let view = render(
            PowerDisco::new(&config, &metadata, &session, &cookies)
                .handle(&query(None))
                .expect("rendered"),
        );
        assert_eq!(
            entity_ids(&view.tabs[0]),
            vec!["https://idp04.example.org", "https://idp06.example.org"]
        );
        assert_eq!(entity_ids(&view.tabs[1]), vec!["https://idp04.example.org"]);
    }

    #[test]
    fn malformed_sp_filter_is_a_metadata_error() {
        let sp = EntityRecord::new(SP)
            .with_attribute("discopower.filter", json!({"tags.include": "tab_b"}));
        let config = config();
        let metadata = metadata(vec![sp]);
        let session = MemorySession::default();
        let cookies = MemoryCookies::default();

        let err = PowerDisco::new(&config, &metadata, &session, &cookies)
            .handle(&query(None))
            .expect_err("malformed filter");
        assert_eq!(err.current_context().code(), "METADATA");
    }

    #[test]
    fn unsafe_return_recovers_filter_from_state() {
        let config = DiscoConfig {
            use_unsafe_return: true,
            ..config()
        };
        let metadata = metadata(vec![]);
        let session = MemorySession::default();
        let cookies = MemoryCookies::default();
        let states = MemoryAuthState::default().with_state(
            "state-1",
            "saml:sp:sso",
            json!({"SPMetadata": {
                "entityid": "https://remote-sp.example.org",
                "discopower.filter": {"entities.include": ["https://idp01.example.org"]},
            }}),
        );
        let mut q = query(None);
        q.insert("return".to_string(), format!("{RETURN}?AuthID=state-1"));

        let view = render(
            PowerDisco::new(&config, &metadata, &session, &cookies)
                .with_auth_state(&states)
                .handle(&q)
                .expect("rendered"),
        );
        let names: Vec<_> = view.tabs.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["tab_b", "tab_a"]);
        assert!(view.tabs[0].entries.is_empty());
        assert_eq!(entity_ids(&view.tabs[1]), vec!["https://idp01.example.org"]);
    }

    #[test]
    fn unsafe_return_is_off_by_default() {
        let config = config();
        let metadata = metadata(vec![]);
        let session = MemorySession::default();
        let cookies = MemoryCookies::default();
        let states = MemoryAuthState::default().with_state(
            "state-1",
            "saml:sp:sso",
            json!({"SPMetadata": {
                "entityid": "https://remote-sp.example.org",
                "discopower.filter": {"entities.include": ["https://idp01.example.org"]},
            }}),
        );
        let mut q = query(None);
        q.insert("return".to_string(), format!("{RETURN}?AuthID=state-1"));

        let view = render(
            PowerDisco::new(&config, &metadata, &session, &cookies)
                .with_auth_state(&states)
                .handle(&q)
                .expect("rendered"),
        );
        assert_eq!(view.tabs[1].entries.len(), 4);
    }

    #[test]
    fn failing_state_store_means_no_filter() {
        let config = DiscoConfig {
            use_unsafe_return: true,
            ..config()
        };
        let metadata = metadata(vec![]);
        let session = MemorySession::default();
        let cookies = MemoryCookies::default();
        let states = MemoryAuthState::failing();
        let mut q = query(None);
        q.insert("return".to_string(), format!("{RETURN}?AuthID=state-1"));

        let view = render(
            PowerDisco::new(&config, &metadata, &session, &cookies)
                .with_auth_state(&states)
                .handle(&q)
                .expect("rendered"),
        );
        assert_eq!(view.tabs[1].entries.len(), 4);
    }

    #[test]
    fn invalid_tab_name_fails_request() {
        for name in ["B", "a"] {
            let config = DiscoConfig {
                tab_order: vec![name.to_string()],
                ..config()
            };
            let metadata = metadata(vec![]);
            let session = MemorySession::default();
            let cookies = MemoryCookies::default();

            let err = PowerDisco::new(&config, &metadata, &session, &cookies)
                .handle(&query(None))
                .expect_err("invalid tab");
            assert_eq!(err.current_context().code(), "METADATA");
            assert!(session.value(TAB_LIST_NAMESPACE, "tabs").is_none());
        }
    }

    #[test]
    fn metadata_outage_is_a_metadata_error() {
        let config = config();
        let metadata = MemoryMetadata::failing();
        let session = MemorySession::default();
        let cookies = MemoryCookies::default();

        let err = PowerDisco::new(&config, &metadata, &session, &cookies)
            .handle(&query(None))
            .expect_err("outage");
        assert_eq!(err.current_context().code(), "METADATA");
    }

    #[test]
    fn missing_parameters_are_disco_params_errors() {
        let config = config();
        let metadata = metadata(vec![]);
        let session = MemorySession::default();
        let cookies = MemoryCookies::default();

        let mut q = query(None);
        q.remove("entityID");
        let err = PowerDisco::new(&config, &metadata, &session, &cookies)
            .handle(&q)
            .expect_err("missing entityID");
        assert_eq!(err.current_context().code(), "DISCOPARAMS");
    }

    #[test]
    fn sort_hook_reorders_tabs() {
        let config = config();
        let metadata = metadata(vec![]);
        let session = MemorySession::default();
        let cookies = MemoryCookies::default();
        let reverse = |_tab: &str, entries: &mut [EntityRecord]| entries.reverse();

        let view = render(
            PowerDisco::new(&config, &metadata, &session, &cookies)
                .with_sort_hook(&reverse)
                .handle(&query(None))
                .expect("rendered"),
        );
        assert_eq!(
            entity_ids(&view.tabs[0]),
            vec![
                "https://idp05.example.org",
                "https://idp06.example.org",
                "https://idp04.example.org",
            ]
        );
    }

    #[test]
    fn action_urls_carry_request_parameters() {
        let config = config();
        let metadata = metadata(vec![]);
        let session = MemorySession::default();
        let cookies = MemoryCookies::default();

        let view = render(
            PowerDisco::new(&config, &metadata, &session, &cookies)
                .with_self_url("https://disco.example.org/disco")
                .handle(&query(None))
                .expect("rendered"),
        );
        assert_eq!(view.url_pattern.as_deref(), Some("https://disco.example.org/disco"));
        assert!(
            view.tabs[0].entries[0]
                .action_url
                .ends_with("&idpentityid=https%3A%2F%2Fidp04.example.org")
        );
    }
}

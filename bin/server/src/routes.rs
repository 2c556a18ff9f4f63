//! HTTP routes of the reference host.

use crate::config::{ServerConfig, SessionConfig};
use crate::cookies::RequestCookies;
use crate::error::AppError;
use crate::store::{MemoryAuthStates, MemorySessions, MetadataStore, generate_session_id};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, Uri, header},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use discopower_disco::{DiscoConfig, DiscoError, DiscoOutcome, PowerDisco, tab_list_response};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use time::Duration as TimeDuration;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    /// Discovery service configuration.
    pub disco: DiscoConfig,
    /// Session configuration.
    pub session_config: SessionConfig,
    /// Metadata sets.
    pub metadata: MetadataStore,
    /// Client sessions.
    pub sessions: MemorySessions,
    /// Saved authentication states.
    pub auth_states: MemoryAuthStates,
}

impl AppState {
    /// Creates a new application state.
    #[must_use]
    pub fn new(config: ServerConfig, metadata: MetadataStore) -> Self {
        Self {
            sessions: MemorySessions::new(config.session.duration_minutes),
            disco: config.disco,
            session_config: config.session,
            metadata,
            auth_states: MemoryAuthStates::default(),
        }
    }
}

/// Builds the router for all routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/disco", get(disco))
        .route("/tablist", get(tablist))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolves the client's session, starting a new one if needed.
///
/// The session cookie is refreshed on every response.
fn resolve_session(state: &AppState, jar: CookieJar) -> (String, CookieJar) {
    let config = &state.session_config;
    let session_id = jar
        .get(&config.cookie_name)
        .map(|c| c.value().to_string())
        .filter(|id| state.sessions.is_active(id))
        .unwrap_or_else(generate_session_id);

    let cookie = Cookie::build((config.cookie_name.clone(), session_id.clone()))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(config.duration_minutes));

    (session_id, jar.add(cookie))
}

/// Shows the discovery page, or sends the user back with their choice.
pub async fn disco(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (session_id, jar) = resolve_session(&state, jar);
    let session = state.sessions.session(session_id);
    let cookies = RequestCookies::new(jar, &headers);

    let outcome = PowerDisco::new(&state.disco, &state.metadata, &session, &cookies)
        .with_auth_state(&state.auth_states)
        .with_self_url(uri.path())
        .handle(&query)?;

    let jar = cookies.into_jar().map_err(|e| DiscoError::Metadata {
        details: e.to_string(),
    })?;

    Ok(match outcome {
        DiscoOutcome::Redirect(to) => (jar, Redirect::to(&to)).into_response(),
        DiscoOutcome::Render(view) => (jar, Json(*view)).into_response(),
    })
}

/// Query parameters for the tab list.
#[derive(Debug, Deserialize)]
pub struct TabListQuery {
    callback: Option<String>,
}

/// Returns the tab layout of the client's last discovery page.
pub async fn tablist(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TabListQuery>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let session_id = jar
        .get(&state.session_config.cookie_name)
        .map(|c| c.value().to_string())
        .unwrap_or_default();
    let session = state.sessions.session(session_id);

    let response = tab_list_response(&session, query.callback.as_deref())?;
    Ok(([(header::CONTENT_TYPE, response.content_type)], response.body).into_response())
}

/// Liveness check.
pub async fn health() -> &'static str {
    "ok"
}

//! Discovery request orchestration for discopower.
//!
//! [`PowerDisco`] answers one discovery request over host-provided
//! collaborators: it remembers the user's IdP choice and redirects back to
//! the SP, or builds the SP's filtered, tabbed view of the IdP list.
//! [`tab_list_response`] serves the tab layout of the last render.

pub mod collaborator;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod params;
pub mod return_state;
pub mod tablist;

#[cfg(test)]
mod testing;

pub use collaborator::{AuthStateStore, CookieSink, MetadataSource, SessionStore};
pub use config::{DiscoConfig, ScoreMode};
pub use error::{CollaboratorError, DiscoError};
pub use orchestrator::{DiscoOutcome, DisplayView, PowerDisco};
pub use params::DiscoParams;
pub use tablist::{TabList, TabListResponse, tab_list_response};

//! Reference HTTP host for the discopower discovery service.
//!
//! Wires the discovery engine to axum with in-memory collaborators:
//! metadata loaded from a JSON file, process-local sessions and saved
//! authentication states, and request-scoped cookies.

pub mod config;
pub mod cookies;
pub mod error;
pub mod routes;
pub mod store;

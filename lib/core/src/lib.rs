//! Core domain types for the discopower discovery service.
//!
//! This crate provides the identity-provider metadata model shared by the
//! view, CDC and discovery crates, together with the rootcause-based
//! `Result` alias used throughout the workspace.

pub mod entity;
pub mod error;

pub use entity::{EntityId, EntityRecord, MISC_TAG};
pub use error::{EntityError, Result};

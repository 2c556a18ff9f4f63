//! Error handling foundation for discopower.
//!
//! This module provides the `Result` type alias using rootcause, plus the
//! error type for the metadata model. Each crate defines its own
//! domain-specific error types in its own error module, using rootcause's
//! `.context()` to add layer-appropriate context as errors propagate up the
//! stack.

use rootcause::Report;
use std::fmt;

/// A Result type alias using rootcause's Report for error handling.
///
/// Each layer adds its own context via `.context()` as errors propagate.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

/// Errors raised while building entity records from raw metadata.
///
/// Malformed metadata is rejected, never coerced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityError {
    /// The metadata violates the record contract.
    InvalidInput { entity_id: String, details: String },
}

impl fmt::Display for EntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { entity_id, details } => {
                write!(f, "invalid metadata for entity '{entity_id}': {details}")
            }
        }
    }
}

impl std::error::Error for EntityError {}

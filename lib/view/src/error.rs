//! Error types for the view crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `InvalidInput`: malformed records, tags or filter rules
//! - `Configuration`: configuration or data that cannot be displayed

use std::fmt;

/// Errors from structuring, filtering or displaying entities.
///
/// Any of these fails the whole view; partial views are never produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// A record, tag or rule violates its contract.
    InvalidInput { details: String },
    /// A tab name or other configured value cannot be used.
    Configuration { details: String },
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { details } => write!(f, "invalid input: {details}"),
            Self::Configuration { details } => write!(f, "configuration error: {details}"),
        }
    }
}

impl std::error::Error for ViewError {}

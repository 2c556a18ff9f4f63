//! Error types for discovery requests.
//!
//! Collaborator failures are reported as `CollaboratorError`. Everything the
//! orchestrator surfaces to its host is classified as a `DiscoError`, whose
//! [`code`](DiscoError::code) selects the response the host gives.

use std::fmt;

/// Failures reported by host collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    /// The collaborator could not serve the request.
    Unavailable {
        /// Which collaborator failed.
        collaborator: String,
        /// Error details.
        details: String,
    },
}

impl CollaboratorError {
    /// Creates an `Unavailable` error.
    pub fn unavailable(collaborator: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Unavailable {
            collaborator: collaborator.into(),
            details: details.into(),
        }
    }
}

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable {
                collaborator,
                details,
            } => write!(f, "{collaborator} unavailable: {details}"),
        }
    }
}

impl std::error::Error for CollaboratorError {}

/// Classified errors surfaced past the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoError {
    /// Required request parameters are missing or malformed.
    DiscoParams { details: String },
    /// The tabbed, filtered view could not be computed.
    Metadata { details: String },
    /// The JSONP callback name is not safe to emit.
    UnsafeCallback { callback: String },
    /// The session holds no tab list.
    MissingTabList { details: String },
}

impl DiscoError {
    /// Returns the classification code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::DiscoParams { .. } => "DISCOPARAMS",
            Self::Metadata { .. } => "METADATA",
            Self::UnsafeCallback { .. } | Self::MissingTabList { .. } => "TABLIST",
        }
    }
}

impl fmt::Display for DiscoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DiscoParams { details } => {
                write!(f, "invalid discovery parameters: {details}")
            }
            Self::Metadata { details } => {
                write!(f, "could not build discovery view: {details}")
            }
            Self::UnsafeCallback { callback } => {
                write!(f, "unsafe JSONP callback function name '{callback}'")
            }
            Self::MissingTabList { details } => {
                write!(f, "could not get tab list from session: {details}")
            }
        }
    }
}

impl std::error::Error for DiscoError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_classify_errors() {
        let params = DiscoError::DiscoParams {
            details: "missing entityID".to_string(),
        };
        let metadata = DiscoError::Metadata {
            details: "bad tab".to_string(),
        };
        let callback = DiscoError::UnsafeCallback {
            callback: "alert(1)".to_string(),
        };
        assert_eq!(params.code(), "DISCOPARAMS");
        assert_eq!(metadata.code(), "METADATA");
        assert_eq!(callback.code(), "TABLIST");
    }

    #[test]
    fn collaborator_error_display() {
        let err = CollaboratorError::unavailable("metadata", "file missing");
        assert_eq!(err.to_string(), "metadata unavailable: file missing");
    }
}

//! Error types for the reference host.
//!
//! Discovery errors reach clients as their classification code only; the
//! full report is logged.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use discopower_disco::DiscoError;
use rootcause::Report;
use std::fmt;

/// Errors loading the in-memory stores.
#[derive(Debug)]
pub enum StoreError {
    /// The metadata file could not be read.
    Io { path: String, details: String },
    /// The metadata file is not valid.
    InvalidMetadata { path: String, details: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, details } => {
                write!(f, "failed to read metadata file '{path}': {details}")
            }
            Self::InvalidMetadata { path, details } => {
                write!(f, "invalid metadata file '{path}': {details}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// A discovery error answered over HTTP.
#[derive(Debug)]
pub struct AppError(pub Report<DiscoError>);

impl From<Report<DiscoError>> for AppError {
    fn from(report: Report<DiscoError>) -> Self {
        Self(report)
    }
}

impl From<DiscoError> for AppError {
    fn from(error: DiscoError) -> Self {
        Self(error.into())
    }
}

/// Returns the HTTP status for a classification code.
fn status_for(code: &str) -> StatusCode {
    match code {
        "DISCOPARAMS" | "TABLIST" => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.0.current_context().code();
        let status = status_for(code);
        if status.is_server_error() {
            tracing::error!(code, error = %self.0, "discovery request failed");
        } else {
            tracing::info!(code, error = %self.0, "rejected discovery request");
        }

        (status, Json(serde_json::json!({ "error": code }))).into_response()
    }
}

// src/error.rs
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Failure modes of a single conversation turn. None of these are retried;
/// every one maps to a spoken apology.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("missing configuration: {0}")]
    Configuration(&'static str),

    #[error("conversation request timed out")]
    Timeout,

    #[error("could not reach the assistant: {0}")]
    Transport(String),

    #[error("assistant rejected the request with status {status}")]
    Upstream { status: u16, message: Option<String> },
}

impl RelayError {
    /// Stable key for failure counters.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Configuration(_) => "configuration",
            RelayError::Timeout => "timeout",
            RelayError::Transport(_) => "transport",
            RelayError::Upstream { .. } => "upstream",
        }
    }
}

/// Errors surfaced to the HTTP caller rather than spoken to the user.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
        }
    }
}

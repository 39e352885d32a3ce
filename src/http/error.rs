//! API error taxonomy and the single place failures become responses.
//!
//! # Design Decisions
//! - Client-facing bodies are always `{"error": "<message>"}`
//! - `Internal` keeps its cause for the log and answers with a fixed message
//! - Panics are caught by the outermost layer and answered the same way

use std::any::Any;
use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub const MSG_RATE_LIMITED: &str = "Too many requests. Please try again later.";
pub const MSG_ROUTE_NOT_FOUND: &str = "The requested URL was not found on the server.";
pub const MSG_UNEXPECTED: &str = "An unexpected error occurred. Please try again later.";
pub const MSG_NO_URL: &str = "No URL provided";
pub const MSG_NO_AUDIO_FORMATS: &str = "No audio formats available for this video";
pub const MSG_EXTRACTION_FAILED: &str = "Failed to process video. Please check the URL and try again.";
pub const MSG_FILE_NOT_FOUND: &str = "File not found";
pub const MSG_FILE_FAILED: &str = "Failed to download file";
pub const MSG_BODY_TOO_LARGE: &str = "Request body too large";

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors surfaced by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid input or a known, caller-caused failure (400).
    #[error("{0}")]
    BadRequest(String),

    /// Unknown route or missing file (404).
    #[error("{0}")]
    NotFound(String),

    /// Request body over the configured limit (413).
    #[error("request body too large")]
    PayloadTooLarge,

    /// Sliding-window quota exceeded (429).
    #[error("rate limited")]
    RateLimited,

    /// Anything unanticipated (500). Only `public` reaches the client.
    #[error("{public}")]
    Internal {
        public: &'static str,
        #[source]
        source: BoxError,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(public: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Internal {
            public,
            source: source.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Render an error and every `source()` below it on one line.
pub fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut out = error.to_string();
    let mut current = error.source();
    while let Some(cause) = current {
        out.push_str(" | caused by: ");
        out.push_str(&cause.to_string());
        current = cause.source();
    }
    out
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::BadRequest(message) | Self::NotFound(message) => message.as_str(),
            Self::PayloadTooLarge => MSG_BODY_TOO_LARGE,
            Self::RateLimited => MSG_RATE_LIMITED,
            Self::Internal { public, source } => {
                tracing::error!(
                    status = status.as_u16(),
                    error = %error_chain(&**source),
                    debug = ?source,
                    "{}",
                    public
                );
                *public
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Response for a panic caught by `CatchPanicLayer`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody { error: MSG_UNEXPECTED }),
    )
        .into_response()
}

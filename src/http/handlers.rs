//! Route handlers.
//!
//! Each handler delegates to its subsystem and lets [`ApiError`] turn
//! failures into responses.

use axum::{
    body::{Body, Bytes},
    extract::{
        rejection::{BytesRejection, PathRejection},
        MatchedPath, Path, State,
    },
    http::{Request, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::error::{ApiError, MSG_FILE_NOT_FOUND, MSG_NO_URL, MSG_ROUTE_NOT_FOUND};
use super::server::AppState;
use crate::extraction::AudioListing;
use crate::observability::metrics;

pub const SERVICE_MESSAGE: &str = "Welcome to YouTube MP3 Converter API";

#[derive(Debug, Serialize)]
pub struct ServiceDescriptor {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: Endpoints,
}

#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub convert: &'static str,
    pub download: &'static str,
    pub health: &'static str,
}

/// `GET /`
pub async fn index() -> Json<ServiceDescriptor> {
    Json(ServiceDescriptor {
        status: "ok",
        message: SERVICE_MESSAGE,
        version: env!("CARGO_PKG_VERSION"),
        endpoints: Endpoints {
            convert: "/api/download",
            download: "/download/<filename>",
            health: "/health",
        },
    })
}

#[derive(Debug, Deserialize)]
struct DownloadRequest {
    url: Option<String>,
}

/// `POST /api/download`
///
/// The body is read raw so that a missing, malformed or non-object body is
/// reported the same way as an absent `url`. The size cap comes from
/// `DefaultBodyLimit`.
pub async fn resolve_audio(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<AudioListing>, ApiError> {
    let body = match body {
        Ok(body) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            tracing::warn!("Request body over the size limit");
            return Err(ApiError::PayloadTooLarge);
        }
        Err(rejection) => {
            tracing::warn!(reason = %rejection.body_text(), "Unreadable request body");
            return Err(ApiError::bad_request(MSG_NO_URL));
        }
    };

    let url = serde_json::from_slice::<DownloadRequest>(&body)
        .ok()
        .and_then(|req| req.url);

    let listing = state.gateway.resolve_audio(url.as_deref()).await?;
    Ok(Json(listing))
}

/// `GET /download/{filename}`
pub async fn download_file(
    State(state): State<AppState>,
    filename: Result<Path<String>, PathRejection>,
    request: Request<Body>,
) -> Result<Response, ApiError> {
    // A name that does not decode to UTF-8 cannot exist under the root.
    let Path(filename) = filename.map_err(|rejection| {
        tracing::warn!(uri = %request.uri(), reason = %rejection.body_text(), "Rejected file request");
        ApiError::not_found(MSG_FILE_NOT_FOUND)
    })?;

    state.files.fetch(&filename, request).await
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Response {
    state.health.status().await.into_response()
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> ApiError {
    tracing::warn!(uri = %uri, "Page not found");
    ApiError::not_found(MSG_ROUTE_NOT_FOUND)
}

/// Fallback for known routes hit with the wrong method.
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(serde_json::json!({
            "error": "The method is not allowed for the requested URL."
        })),
    )
        .into_response()
}

/// Records request count and latency per matched route.
pub async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&method, &route, response.status().as_u16(), start);
    response
}

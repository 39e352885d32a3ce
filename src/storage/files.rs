//! Serving files out of the storage root.

use std::io;
use std::path::{Path, PathBuf};

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    response::Response,
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::http::error::{ApiError, MSG_FILE_FAILED, MSG_FILE_NOT_FOUND};
use crate::security::{resolve_within, PathError};

/// Streams files from a single root directory as attachments.
#[derive(Debug, Clone)]
pub struct FileServer {
    root: PathBuf,
}

impl FileServer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serve `filename` for `request`.
    ///
    /// Anything that does not resolve to a regular file inside the root,
    /// traversal attempts included, is answered as not found.
    pub async fn fetch(&self, filename: &str, request: Request<Body>) -> Result<Response, ApiError> {
        let path = match resolve_within(&self.root, filename).await {
            Ok(path) => path,
            Err(e @ (PathError::Rejected(_) | PathError::Escapes(_))) => {
                tracing::warn!(filename = %filename, reason = %e, "Rejected file request");
                return Err(ApiError::not_found(MSG_FILE_NOT_FOUND));
            }
            Err(PathError::Missing(_)) => {
                tracing::warn!(filename = %filename, "File not found");
                return Err(ApiError::not_found(MSG_FILE_NOT_FOUND));
            }
            Err(e @ PathError::Io { .. }) => {
                tracing::error!(filename = %filename, error = %e, "Error downloading file");
                return Err(ApiError::internal(MSG_FILE_FAILED, e));
            }
        };

        // ServeFile reports every open failure as an empty 404, so open
        // once here to tell a vanished file from an unreadable one.
        if let Err(e) = tokio::fs::File::open(&path).await {
            return Err(open_failure(filename, e));
        }

        tracing::info!(filename = %filename, "Downloading file");

        let response = match ServeFile::new(&path).oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        let mut response = response.map(Body::new);

        // ServeFile answers 404 itself if the file vanished after resolution.
        if response.status() == StatusCode::NOT_FOUND {
            tracing::warn!(filename = %filename, "File disappeared before it could be served");
            return Err(ApiError::not_found(MSG_FILE_NOT_FOUND));
        }
        if response.status().is_server_error() {
            return Err(ApiError::internal(
                MSG_FILE_FAILED,
                format!("serving {:?} returned {}", filename, response.status()),
            ));
        }

        if let Ok(value) = HeaderValue::from_str(&content_disposition(filename)) {
            response
                .headers_mut()
                .insert(header::CONTENT_DISPOSITION, value);
        }
        Ok(response)
    }
}

/// Only a missing file is "not found"; any other open error is a failure.
fn open_failure(filename: &str, error: io::Error) -> ApiError {
    if error.kind() == io::ErrorKind::NotFound {
        tracing::warn!(filename = %filename, "File not found");
        return ApiError::not_found(MSG_FILE_NOT_FOUND);
    }
    tracing::error!(filename = %filename, error = %error, "Error downloading file");
    ApiError::internal(MSG_FILE_FAILED, error)
}

/// `attachment` disposition with a quoted ASCII fallback and, for
/// non-ASCII names, an RFC 5987 `filename*`.
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => format!("\\{c}"),
            c if c.is_ascii() && !c.is_ascii_control() => c.to_string(),
            _ => "_".to_string(),
        })
        .collect();

    if filename.is_ascii() {
        format!("attachment; filename=\"{fallback}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            encode_ext_value(filename)
        )
    }
}

fn encode_ext_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'!' | b'#' | b'$' | b'&' | b'+' | b'-'
            | b'.' | b'^' | b'_' | b'`' | b'|' | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("audio-gateway-files-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_content_disposition() {
        assert_eq!(content_disposition("abc.m4a"), "attachment; filename=\"abc.m4a\"");
        assert_eq!(
            content_disposition("a\"b.mp3"),
            "attachment; filename=\"a\\\"b.mp3\""
        );
        assert_eq!(
            content_disposition("é.mp3"),
            "attachment; filename=\"_.mp3\"; filename*=UTF-8''%C3%A9.mp3"
        );
    }

    #[tokio::test]
    async fn test_serves_existing_file_as_attachment() {
        let root = temp_root();
        let bytes: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        std::fs::write(root.join("abc.m4a"), &bytes).unwrap();

        let server = FileServer::new(&root);
        let response = server.fetch("abc.m4a", get("/download/abc.m4a")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"abc.m4a\""
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), bytes.as_slice());

        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn test_missing_and_traversal_are_not_found() {
        let root = temp_root();
        let server = FileServer::new(&root);

        for name in ["nope.mp3", "../etc/passwd", "..", "sub/file.mp3", ""] {
            let err = server.fetch(name, get("/download/x")).await.unwrap_err();
            assert!(
                matches!(err, ApiError::NotFound(ref m) if m == MSG_FILE_NOT_FOUND),
                "{name:?} should be not found"
            );
        }

        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn test_open_failure_mapping() {
        let missing = open_failure("a.mp3", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(missing, ApiError::NotFound(ref m) if m == MSG_FILE_NOT_FOUND));

        let denied = open_failure("a.mp3", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(denied, ApiError::Internal { public, .. } if public == MSG_FILE_FAILED));
        assert_eq!(denied.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_file_is_internal_error() {
        use std::os::unix::fs::PermissionsExt;

        let root = temp_root();
        let file = root.join("locked.m4a");
        std::fs::write(&file, b"audio").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can read it anyway; nothing to observe then.
        if std::fs::File::open(&file).is_err() {
            let err = FileServer::new(&root)
                .fetch("locked.m4a", get("/download/locked.m4a"))
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::Internal { public, .. } if public == MSG_FILE_FAILED));
        }

        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o644)).unwrap();
        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn test_directory_is_not_served() {
        let root = temp_root();
        std::fs::create_dir_all(root.join("nested")).unwrap();

        let err = FileServer::new(&root)
            .fetch("nested", get("/download/nested"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        std::fs::remove_dir_all(root).ok();
    }
}

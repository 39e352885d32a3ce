//! Storage-root path confinement.
//!
//! # Responsibilities
//! - Accept a client-supplied filename only if it names a single entry
//! - Resolve it strictly inside the storage root
//! - Re-check containment after symlink resolution
//!
//! # Design Decisions
//! - Fail closed: anything that is not one plain path component is rejected
//! - Rejections carry a reason for the log, never for the client

use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Why a filename could not be resolved under the storage root.
#[derive(Debug, Error)]
pub enum PathError {
    /// The name is not a single plain component (traversal, separators, NUL...).
    #[error("rejected filename {0:?}")]
    Rejected(String),

    /// The name resolves outside the root after following links.
    #[error("{0:?} escapes the storage root")]
    Escapes(String),

    /// Nothing exists at the resolved path.
    #[error("{0:?} does not exist")]
    Missing(String),

    /// Filesystem error while resolving.
    #[error("failed to resolve {name:?}: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// Check that `name` is a single normal path component.
pub fn is_plain_filename(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Lexical check only: join `name` onto `root` if it is a plain filename.
pub fn join_within(root: &Path, name: &str) -> Result<PathBuf, PathError> {
    if !is_plain_filename(name) {
        return Err(PathError::Rejected(name.to_string()));
    }
    Ok(root.join(name))
}

/// Resolve `name` to an existing file strictly inside `root`.
pub async fn resolve_within(root: &Path, name: &str) -> Result<PathBuf, PathError> {
    let candidate = join_within(root, name)?;

    let canonical_root = tokio::fs::canonicalize(root)
        .await
        .map_err(|e| classify(name, e))?;
    let canonical = tokio::fs::canonicalize(&candidate)
        .await
        .map_err(|e| classify(name, e))?;

    if !canonical.starts_with(&canonical_root) || canonical == canonical_root {
        return Err(PathError::Escapes(name.to_string()));
    }

    let metadata = tokio::fs::metadata(&canonical)
        .await
        .map_err(|e| classify(name, e))?;
    if !metadata.is_file() {
        return Err(PathError::Missing(name.to_string()));
    }

    Ok(canonical)
}

fn classify(name: &str, error: io::Error) -> PathError {
    if error.kind() == io::ErrorKind::NotFound {
        PathError::Missing(name.to_string())
    } else {
        PathError::Io {
            name: name.to_string(),
            source: error,
        }
    }
}

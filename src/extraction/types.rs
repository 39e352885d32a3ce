//! Extraction data model and error definitions.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// One media variant as reported by the extraction capability.
///
/// Only `ext` is interpreted here; every other field is carried in `extra`
/// and serialized back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    #[serde(default)]
    pub ext: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FormatDescriptor {
    /// True when the container is in `allowed` (case-insensitive).
    pub fn has_extension_in(&self, allowed: &[String]) -> bool {
        self.ext
            .as_deref()
            .is_some_and(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
    }
}

/// Metadata returned by a metadata-only extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub formats: Vec<FormatDescriptor>,
}

/// Response body of a successful `POST /api/download`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioListing {
    pub title: Option<String>,
    pub audio: Vec<FormatDescriptor>,
}

/// Options passed to the extraction capability on every call.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Format selector (e.g. `bestaudio/best`).
    pub format: String,

    /// Directory any artifact produced by the capability lands in.
    pub output_dir: PathBuf,

    /// File name template inside `output_dir`, keyed by the extraction id.
    pub output_template: String,

    /// Ask the capability for verbose diagnostics.
    pub verbose: bool,
}

/// Errors that can occur while talking to the extraction capability.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The capability reported a download/extraction failure
    /// (unsupported URL, removed video, region lock...).
    #[error("{0}")]
    Failed(String),

    /// The call did not finish in time.
    #[error("extraction timed out after {0:?}")]
    Timeout(Duration),

    /// The capability could not be started.
    #[error("failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// The capability exited abnormally without a recognizable failure report.
    #[error("extractor exited with status {status}: {stderr}")]
    Exited { status: String, stderr: String },

    /// Output could not be parsed.
    #[error("invalid extractor output: {0}")]
    Parse(#[from] serde_json::Error),

    /// Capacity to run extractions is gone (shutting down).
    #[error("extractor unavailable: {0}")]
    Unavailable(String),
}

impl ExtractionError {
    /// Known extraction failures are the caller's problem; everything else is ours.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Failed(_) => "failed",
            Self::Timeout(_) => "timeout",
            Self::Spawn { .. } => "spawn",
            Self::Exited { .. } => "exited",
            Self::Parse(_) => "parse",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

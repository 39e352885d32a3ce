//! The extraction capability seam.

use async_trait::async_trait;

use super::types::{ExtractOptions, ExtractionError, VideoMetadata};

/// An external capability that inspects a media URL and reports its formats.
///
/// Implementations run in metadata-only mode: they must not transcode or
/// download media as part of this call. A capability may still leave files
/// under `options.output_dir`; those are cache artifacts keyed by the
/// extraction id.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Name of the extractor (for logging).
    fn name(&self) -> &'static str;

    /// Fetch metadata and the full format list for `url`.
    ///
    /// A recognizable "extraction failed" report must come back as
    /// [`ExtractionError::Failed`]; anything else is treated as unexpected.
    async fn extract_audio_formats(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<VideoMetadata, ExtractionError>;
}

//! Extraction gateway: inbound URL → extractor call → filtered audio listing.
//!
//! # Responsibilities
//! - Validate the inbound URL
//! - Call the extractor in metadata-only mode, bounded by a timeout and a
//!   concurrency cap
//! - Keep only formats whose container is on the allow-list
//! - Map extractor failures onto the API error taxonomy

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::time;
use url::Url;

use super::extractor::Extractor;
use super::types::{AudioListing, ExtractOptions, ExtractionError, VideoMetadata};
use crate::config::ExtractionConfig;
use crate::http::error::{ApiError, MSG_EXTRACTION_FAILED, MSG_NO_AUDIO_FORMATS, MSG_NO_URL};
use crate::observability::metrics;

pub struct ExtractionGateway {
    extractor: Arc<dyn Extractor>,
    options: ExtractOptions,
    allowed_extensions: Vec<String>,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl ExtractionGateway {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        config: &ExtractionConfig,
        storage_root: &Path,
        verbose: bool,
    ) -> Self {
        Self {
            extractor,
            options: ExtractOptions {
                format: config.format.clone(),
                output_dir: storage_root.to_path_buf(),
                output_template: config.output_template.clone(),
                verbose,
            },
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            timeout: config.timeout(),
            permits: Arc::new(Semaphore::new(config.max_concurrent)),
        }
    }

    pub fn extractor_name(&self) -> &'static str {
        self.extractor.name()
    }

    /// Resolve `url` into its title and allowed audio formats.
    pub async fn resolve_audio(&self, url: Option<&str>) -> Result<AudioListing, ApiError> {
        let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
            tracing::warn!("No URL provided in request");
            return Err(ApiError::bad_request(MSG_NO_URL));
        };

        tracing::info!(url = %url, "Processing download request");

        let metadata = match self.extract(url).await {
            Ok(metadata) => metadata,
            Err(e) if e.is_client_error() => {
                tracing::error!(url = %url, error = %e, "Extraction failed");
                metrics::record_extraction(e.kind());
                return Err(ApiError::bad_request(format!("Download error: {}", e)));
            }
            Err(e) => {
                metrics::record_extraction(e.kind());
                return Err(ApiError::internal(MSG_EXTRACTION_FAILED, e));
            }
        };

        let total = metadata.formats.len();
        let audio: Vec<_> = metadata
            .formats
            .into_iter()
            .filter(|f| f.has_extension_in(&self.allowed_extensions))
            .collect();

        if audio.is_empty() {
            tracing::warn!(url = %url, total_formats = total, "No audio formats found");
            metrics::record_extraction("no_formats");
            return Err(ApiError::bad_request(MSG_NO_AUDIO_FORMATS));
        }

        tracing::info!(
            title = metadata.title.as_deref().unwrap_or_default(),
            id = metadata.id.as_deref().unwrap_or_default(),
            audio_formats = audio.len(),
            total_formats = total,
            "Successfully processed video"
        );
        metrics::record_extraction("ok");

        Ok(AudioListing {
            title: metadata.title,
            audio,
        })
    }

    /// Run the extractor under the concurrency cap. Waiting for a slot
    /// counts against the same timeout as the call itself.
    async fn extract(&self, url: &str) -> Result<VideoMetadata, ExtractionError> {
        check_url(url)?;

        let started = Instant::now();
        let call = async {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|e| ExtractionError::Unavailable(e.to_string()))?;
            tracing::debug!(extractor = self.extractor.name(), "Extracting video info");
            self.extractor.extract_audio_formats(url, &self.options).await
        };

        let result = match time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ExtractionError::Timeout(self.timeout)),
        };
        metrics::record_extraction_duration(started.elapsed());
        result
    }
}

/// Only absolute http(s) URLs are handed to the extractor.
fn check_url(url: &str) -> Result<(), ExtractionError> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => Ok(()),
        _ => Err(ExtractionError::Failed(format!("Unsupported URL: {}", url))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Formats(serde_json::Value),
        Fail(&'static str),
        Crash,
        Hang,
    }

    struct FakeExtractor {
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl FakeExtractor {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Extractor for FakeExtractor {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn extract_audio_formats(
            &self,
            _url: &str,
            _options: &ExtractOptions,
        ) -> Result<VideoMetadata, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Formats(value) => Ok(serde_json::from_value(value.clone())?),
                Behavior::Fail(msg) => Err(ExtractionError::Failed(msg.to_string())),
                Behavior::Crash => Err(ExtractionError::Exited {
                    status: "exit status: 1".into(),
                    stderr: "Traceback".into(),
                }),
                Behavior::Hang => {
                    time::sleep(Duration::from_secs(3600)).await;
                    unreachable!()
                }
            }
        }
    }

    fn gateway(extractor: Arc<FakeExtractor>, timeout_secs: u64) -> ExtractionGateway {
        let config = ExtractionConfig {
            timeout_secs,
            ..ExtractionConfig::default()
        };
        ExtractionGateway::new(extractor, &config, Path::new("static"), false)
    }

    const URL: &str = "https://www.youtube.com/watch?v=abc";

    #[tokio::test]
    async fn test_filters_to_allowed_containers() {
        let fake = FakeExtractor::new(Behavior::Formats(json!({
            "id": "abc",
            "title": "Song",
            "formats": [
                {"format_id": "140", "ext": "m4a", "abr": 129.4},
                {"format_id": "251", "ext": "webm"},
                {"format_id": "18", "ext": "mp4"},
                {"format_id": "x", "ext": "mp3", "url": "https://cdn/x"}
            ]
        })));

        let listing = gateway(fake, 5).resolve_audio(Some(URL)).await.unwrap();
        assert_eq!(listing.title.as_deref(), Some("Song"));
        let ids: Vec<_> = listing
            .audio
            .iter()
            .map(|f| f.extra["format_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["140", "x"]);
        assert_eq!(listing.audio[0].extra["abr"], json!(129.4));
    }

    #[tokio::test]
    async fn test_missing_or_blank_url_is_bad_request() {
        let fake = FakeExtractor::new(Behavior::Crash);
        let gw = gateway(fake.clone(), 5);

        for url in [None, Some(""), Some("   ")] {
            let err = gw.resolve_audio(url).await.unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(ref m) if m == MSG_NO_URL));
        }
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_only_disallowed_formats_is_bad_request() {
        let fake = FakeExtractor::new(Behavior::Formats(json!({
            "title": "Video",
            "formats": [{"ext": "webm"}, {"ext": "mp4"}]
        })));
        let err = gateway(fake, 5).resolve_audio(Some(URL)).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m == MSG_NO_AUDIO_FORMATS));
    }

    #[tokio::test]
    async fn test_known_failure_is_bad_request_with_message() {
        let fake = FakeExtractor::new(Behavior::Fail("[youtube] abc: Video unavailable"));
        let err = gateway(fake, 5).resolve_audio(Some(URL)).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::BadRequest(ref m) if m == "Download error: [youtube] abc: Video unavailable"
        ));
    }

    #[tokio::test]
    async fn test_unexpected_failure_is_internal() {
        let fake = FakeExtractor::new(Behavior::Crash);
        let err = gateway(fake, 5).resolve_audio(Some(URL)).await.unwrap_err();
        assert!(matches!(err, ApiError::Internal { public, .. } if public == MSG_EXTRACTION_FAILED));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_extractor_times_out_as_internal() {
        let fake = FakeExtractor::new(Behavior::Hang);
        let err = gateway(fake, 2).resolve_audio(Some(URL)).await.unwrap_err();
        match err {
            ApiError::Internal { source, .. } => {
                assert!(source.to_string().contains("timed out"));
            }
            other => panic!("expected internal error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_http_url_never_reaches_extractor() {
        let fake = FakeExtractor::new(Behavior::Crash);
        let gw = gateway(fake.clone(), 5);

        for url in ["--exec rm", "file:///etc/passwd", "not a url"] {
            let err = gw.resolve_audio(Some(url)).await.unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(ref m) if m.starts_with("Download error: Unsupported URL")));
        }
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }
}

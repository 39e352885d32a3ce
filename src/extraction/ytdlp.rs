//! yt-dlp backed extractor.
//!
//! Runs the yt-dlp binary as a child process in metadata-only mode and
//! parses its single-JSON dump. Failure reports (`ERROR: ...` on stderr)
//! become [`ExtractionError::Failed`]; any other abnormal exit is unexpected.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::extractor::Extractor;
use super::types::{ExtractOptions, ExtractionError, VideoMetadata};
use crate::config::ExtractionConfig;

const ERROR_PREFIX: &str = "ERROR:";
const STDERR_TAIL: usize = 4096;

/// Extractor that shells out to yt-dlp.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    binary: String,
    /// Arguments placed before the generated ones (e.g. `-m yt_dlp`).
    leading_args: Vec<String>,
}

impl YtDlpExtractor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            leading_args: Vec::new(),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.binary.clone()).with_leading_args(config.binary_args.clone())
    }

    pub fn with_leading_args(mut self, args: Vec<String>) -> Self {
        self.leading_args = args;
        self
    }

    /// Build command arguments. The URL always follows `--` so it can
    /// never be read as an option.
    pub fn build_args(&self, url: &str, options: &ExtractOptions) -> Vec<String> {
        let template = options.output_dir.join(&options.output_template);

        let mut args = self.leading_args.clone();
        args.extend([
            "--dump-single-json".to_string(),
            "--skip-download".to_string(),
            "--no-playlist".to_string(),
            "--no-progress".to_string(),
            "-f".to_string(),
            options.format.clone(),
            "-o".to_string(),
            template.to_string_lossy().into_owned(),
        ]);
        if options.verbose {
            args.push("--verbose".to_string());
        }
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    fn classify_failure(status: String, stderr: &str) -> ExtractionError {
        let reported = stderr
            .lines()
            .rev()
            .map(str::trim)
            .find_map(|line| line.strip_prefix(ERROR_PREFIX))
            .map(str::trim);

        match reported {
            Some(message) => ExtractionError::Failed(message.to_string()),
            None => ExtractionError::Exited {
                status,
                stderr: tail(stderr, STDERR_TAIL).to_string(),
            },
        }
    }
}

fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn extract_audio_formats(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<VideoMetadata, ExtractionError> {
        let args = self.build_args(url, options);
        tracing::debug!(binary = %self.binary, args = ?args, "Invoking extractor");

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ExtractionError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            tracing::debug!(stderr = %tail(&stderr, STDERR_TAIL), "Extractor diagnostics");
        }

        if !output.status.success() {
            return Err(Self::classify_failure(output.status.to_string(), &stderr));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

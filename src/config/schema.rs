//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files, and
//! every section falls back to the documented defaults.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the audio gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Sliding-window rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Storage root and log directory.
    pub storage: StorageConfig,

    /// External extraction capability settings.
    pub extraction: ExtractionConfig,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Environment label reported by `/health` (e.g. "production").
    pub environment: String,

    /// Debug mode (verbose logging of extractor invocations).
    pub debug: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            rate_limit: RateLimitConfig::default(),
            storage: StorageConfig::default(),
            extraction: ExtractionConfig::default(),
            cors: CorsConfig::default(),
            observability: ObservabilityConfig::default(),
            timeouts: TimeoutConfig::default(),
            limits: LimitsConfig::default(),
            environment: "production".to_string(),
            debug: false,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Port to bind. `0` picks an ephemeral port.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum requests per client inside one window.
    pub requests: u32,

    /// Sliding window size in seconds.
    pub window_secs: u64,

    /// Take the client id from `X-Forwarded-For` / `X-Real-IP`.
    /// Only enable behind a proxy that overwrites these headers.
    pub trust_forwarded_headers: bool,

    /// How often fully stale client logs are dropped, in seconds.
    pub sweep_interval_secs: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: 10,
            window_secs: 60,
            trust_forwarded_headers: false,
            sweep_interval_secs: 300,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory the extractor writes into and `/download/{filename}` serves from.
    pub root: PathBuf,

    /// Directory holding log files.
    pub log_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("static"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

/// Extraction capability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Path or name of the yt-dlp binary.
    pub binary: String,

    /// Arguments placed before the generated ones, e.g. `["-m", "yt_dlp"]`
    /// when `binary` is a Python interpreter.
    pub binary_args: Vec<String>,

    /// Upper bound for one extraction call, in seconds.
    pub timeout_secs: u64,

    /// Format selector passed to the extractor.
    pub format: String,

    /// Output template, relative to the storage root.
    /// Files the extractor produces are cache artifacts keyed by the
    /// extraction-provided id.
    pub output_template: String,

    /// Containers that count as audio formats.
    pub allowed_extensions: Vec<String>,

    /// Maximum extractions running at once.
    pub max_concurrent: usize,
}

impl ExtractionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            binary_args: Vec::new(),
            timeout_secs: 120,
            format: "bestaudio/best".to_string(),
            output_template: "%(id)s.%(ext)s".to_string(),
            allowed_extensions: vec!["mp3".to_string(), "m4a".to_string()],
            max_concurrent: 8,
        }
    }
}

/// Cross-origin policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:8000".to_string(),
                "https://youtomp3.me".to_string(),
                "https://youtomp3.pages.dev".to_string(),
            ],
            allowed_methods: vec!["GET".to_string(), "POST".to_string(), "OPTIONS".to_string()],
            allowed_headers: vec![
                "Content-Type".to_string(),
                "Authorization".to_string(),
                "X-Requested-With".to_string(),
            ],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log file path. The file rolls daily.
    pub log_file: PathBuf,

    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Enable the Prometheus metrics listener.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("logs/app.log"),
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 180 }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 64 * 1024,
        }
    }
}

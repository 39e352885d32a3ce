//! Process and configuration readiness.
//!
//! # Responsibilities
//! - Make sure the storage root and log directory exist
//! - Summarize the effective rate-limit configuration
//! - Report failures as an unhealthy status instead of an error

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Local;
use serde::Serialize;

use crate::config::GatewayConfig;
use crate::storage;

/// Outcome of one health check.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HealthReport {
    Healthy {
        timestamp: String,
        version: &'static str,
        environment: String,
        static_folder: String,
        rate_limit: u32,
        rate_window: u64,
    },
    Unhealthy {
        error: String,
    },
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy { .. })
    }
}

impl IntoResponse for HealthReport {
    fn into_response(self) -> Response {
        let status = if self.is_healthy() {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(self)).into_response()
    }
}

/// Builds [`HealthReport`]s from a fixed configuration snapshot.
#[derive(Debug, Clone)]
pub struct HealthReporter {
    storage_root: PathBuf,
    log_dir: PathBuf,
    environment: String,
    rate_limit: u32,
    rate_window: u64,
}

impl HealthReporter {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            storage_root: config.storage.root.clone(),
            log_dir: config.storage.log_dir.clone(),
            environment: config.environment.clone(),
            rate_limit: config.rate_limit.requests,
            rate_window: config.rate_limit.window_secs,
        }
    }

    pub async fn status(&self) -> HealthReport {
        if let Err(e) = storage::ensure_dirs(&self.storage_root, &self.log_dir).await {
            tracing::error!(error = %e, "Health check failed");
            return HealthReport::Unhealthy {
                error: format!("failed to prepare storage directories: {}", e),
            };
        }

        HealthReport::Healthy {
            timestamp: Local::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
            environment: self.environment.clone(),
            static_folder: self.storage_root.display().to_string(),
            rate_limit: self.rate_limit,
            rate_window: self.rate_window,
        }
    }
}

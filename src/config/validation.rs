//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, timeouts > 0)
//! - Check that CORS entries are valid HTTP values
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::{HeaderName, HeaderValue, Method};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check the configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.rate_limit.requests == 0 {
        errors.push(ValidationError::new("rate_limit.requests", "must be greater than 0"));
    }
    if config.rate_limit.window_secs == 0 {
        errors.push(ValidationError::new("rate_limit.window_secs", "must be greater than 0"));
    }
    if config.rate_limit.sweep_interval_secs == 0 {
        errors.push(ValidationError::new(
            "rate_limit.sweep_interval_secs",
            "must be greater than 0",
        ));
    }

    if config.extraction.binary.trim().is_empty() {
        errors.push(ValidationError::new("extraction.binary", "must not be empty"));
    }
    if config.extraction.timeout_secs == 0 {
        errors.push(ValidationError::new("extraction.timeout_secs", "must be greater than 0"));
    }
    if config.extraction.max_concurrent == 0 {
        errors.push(ValidationError::new("extraction.max_concurrent", "must be greater than 0"));
    }
    if config.extraction.allowed_extensions.is_empty() {
        errors.push(ValidationError::new(
            "extraction.allowed_extensions",
            "at least one extension is required",
        ));
    }
    if config.extraction.output_template.contains("..") {
        errors.push(ValidationError::new(
            "extraction.output_template",
            "must stay inside the storage root",
        ));
    }

    if config.timeouts.request_secs <= config.extraction.timeout_secs {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "must exceed extraction.timeout_secs ({})",
                config.extraction.timeout_secs
            ),
        ));
    }

    for origin in &config.cors.allowed_origins {
        if HeaderValue::from_str(origin).is_err() || !origin.contains("://") {
            errors.push(ValidationError::new(
                "cors.allowed_origins",
                format!("invalid origin {:?}", origin),
            ));
        }
    }
    for method in &config.cors.allowed_methods {
        if Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_methods",
                format!("invalid method {:?}", method),
            ));
        }
    }
    for header in &config.cors.allowed_headers {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_headers",
                format!("invalid header {:?}", header),
            ));
        }
    }

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("invalid filter {:?}", config.observability.log_level),
        ));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = GatewayConfig::default();
        config.rate_limit.requests = 0;
        config.rate_limit.window_secs = 0;
        config.extraction.allowed_extensions.clear();
        config.cors.allowed_origins.push("not an origin".into());

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "rate_limit.requests",
                "rate_limit.window_secs",
                "extraction.allowed_extensions",
                "cors.allowed_origins",
            ]
        );
    }

    #[test]
    fn test_request_timeout_must_cover_extraction() {
        let mut config = GatewayConfig::default();
        config.extraction.timeout_secs = 200;
        config.timeouts.request_secs = 200;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "timeouts.request_secs");
    }

    #[test]
    fn test_bad_log_level() {
        let mut config = GatewayConfig::default();
        config.observability.log_level = "loud=[".into();
        assert!(validate_config(&config).is_err());
    }
}

//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value:?}")]
    Env { key: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration.
///
/// Layers, later wins: defaults, optional TOML file, `.env`, process environment.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => GatewayConfig::default(),
    };

    dotenv::dotenv().ok();
    apply_env(&mut config, |key| std::env::var(key).ok())?;

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Parse a TOML file into a config, without validation.
pub fn load_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment overrides using `lookup` as the variable source.
pub fn apply_env<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("HOST") {
        config.listener.host = host;
    }
    if let Some(port) = parse_var(&lookup, "PORT")? {
        config.listener.port = port;
    }

    if let Some(requests) = parse_var(&lookup, "RATE_LIMIT")? {
        config.rate_limit.requests = requests;
    }
    if let Some(window) = parse_var(&lookup, "RATE_WINDOW")? {
        config.rate_limit.window_secs = window;
    }
    if let Some(trust) = parse_bool(&lookup, "TRUST_FORWARDED_HEADERS")? {
        config.rate_limit.trust_forwarded_headers = trust;
    }

    if let Some(root) = lookup("STATIC_FOLDER") {
        config.storage.root = PathBuf::from(root);
    }
    if let Some(dir) = lookup("LOG_DIR") {
        config.storage.log_dir = PathBuf::from(dir);
    }

    if let Some(binary) = lookup("YTDLP_PATH") {
        config.extraction.binary = binary;
    }
    if let Some(timeout) = parse_var(&lookup, "EXTRACTION_TIMEOUT")? {
        config.extraction.timeout_secs = timeout;
    }

    if let Some(origins) = lookup("CORS_ORIGINS") {
        config.cors.allowed_origins = split_list(&origins);
    }

    if let Some(file) = lookup("LOG_FILE") {
        config.observability.log_file = PathBuf::from(file);
    }
    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level.to_lowercase();
    }
    if let Some(enabled) = parse_bool(&lookup, "METRICS_ENABLED")? {
        config.observability.metrics_enabled = enabled;
    }
    if let Some(address) = lookup("METRICS_ADDRESS") {
        config.observability.metrics_address = address;
    }

    if let Some(environment) = lookup("APP_ENV") {
        config.environment = environment;
    }
    if let Some(debug) = parse_bool(&lookup, "DEBUG")? {
        config.debug = debug;
    }

    Ok(())
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { key, value }),
        None => Ok(None),
    }
}

fn parse_bool<F>(lookup: &F, key: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "" | "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::Env { key, value }),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GatewayConfig::default();
        apply_env(
            &mut config,
            env(&[
                ("PORT", "8080"),
                ("RATE_LIMIT", "3"),
                ("RATE_WINDOW", "15"),
                ("STATIC_FOLDER", "/srv/audio"),
                ("CORS_ORIGINS", "https://a.example, https://b.example,"),
                ("DEBUG", "1"),
                ("APP_ENV", "staging"),
            ]),
        )
        .unwrap();

        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.rate_limit.requests, 3);
        assert_eq!(config.rate_limit.window_secs, 15);
        assert_eq!(config.storage.root, PathBuf::from("/srv/audio"));
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(config.debug);
        assert_eq!(config.environment, "staging");
    }

    #[test]
    fn test_unset_env_keeps_defaults() {
        let mut config = GatewayConfig::default();
        apply_env(&mut config, env(&[])).unwrap();

        assert_eq!(config.listener.port, 5001);
        assert_eq!(config.rate_limit.requests, 10);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.storage.root, PathBuf::from("static"));
        assert_eq!(config.environment, "production");
    }

    #[test]
    fn test_bad_number_is_an_error() {
        let mut config = GatewayConfig::default();
        let err = apply_env(&mut config, env(&[("RATE_LIMIT", "ten")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { key: "RATE_LIMIT", .. }));
    }

    #[test]
    fn test_bad_bool_is_an_error() {
        let mut config = GatewayConfig::default();
        let err = apply_env(&mut config, env(&[("DEBUG", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { key: "DEBUG", .. }));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            environment = "dev"

            [rate_limit]
            requests = 2

            [extraction]
            allowed_extensions = ["m4a"]
            "#,
        )
        .unwrap();

        assert_eq!(config.environment, "dev");
        assert_eq!(config.rate_limit.requests, 2);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.extraction.allowed_extensions, vec!["m4a"]);
        assert_eq!(config.extraction.binary, "yt-dlp");
        assert_eq!(config.listener.port, 5001);
    }
}

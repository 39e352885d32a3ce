//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Write every event to the console and to a daily-rolling log file
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - File output goes through a non-blocking writer; the returned guard
//!   must live until shutdown or buffered lines are lost

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global subscriber.
pub fn init(config: &ObservabilityConfig) -> std::io::Result<WorkerGuard> {
    let (dir, file_name) = split_log_path(&config.log_file);
    std::fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::daily(dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(&config.log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    Ok(guard)
}

/// A bare level applies to this crate and the HTTP layer only; anything
/// else is taken as a full filter directive.
fn filter_directive(level: &str) -> String {
    match level.to_ascii_lowercase().as_str() {
        lvl @ ("trace" | "debug" | "info" | "warn" | "error") => {
            format!("audio_gateway={lvl},tower_http={lvl},warn")
        }
        _ => level.to_string(),
    }
}

fn split_log_path(path: &Path) -> (&Path, &std::ffi::OsStr) {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("app.log"));
    (dir, file_name)
}

//! Audio extraction gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                  AUDIO GATEWAY                   │
//!                        │                                                  │
//!   Client Request       │  ┌───────────┐   ┌─────────────┐                 │
//!   ─────────────────────┼─▶│   http    │──▶│ rate limiter│ (download routes)│
//!                        │  │  server   │   └──────┬──────┘                 │
//!                        │  └─────┬─────┘          │                        │
//!                        │        │        ┌───────┴────────┐               │
//!                        │        │        ▼                ▼               │
//!                        │        │  ┌────────────┐  ┌────────────┐         │
//!                        │        │  │ extraction │  │  storage   │         │
//!                        │        │  │  gateway   │  │ file server│         │
//!                        │        │  └─────┬──────┘  └────────────┘         │
//!                        │        ▼        │                                │
//!                        │  ┌──────────┐   ▼                                │
//!                        │  │  health  │  yt-dlp (child process)            │
//!                        │  └──────────┘                                    │
//!                        │                                                  │
//!                        │  config · observability · security · lifecycle   │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use audio_gateway::config::{self, ConfigError, GatewayConfig};
use audio_gateway::extraction::YtDlpExtractor;
use audio_gateway::lifecycle::{wait_for_shutdown, Shutdown};
use audio_gateway::observability::{logging, metrics};
use audio_gateway::{storage, HttpServer};

#[derive(Parser, Debug)]
#[command(name = "audio-gateway", version, about = "Audio format extraction gateway")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen host.
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port.
    #[arg(short, long)]
    port: Option<u16>,
}

fn load(args: &Args) -> Result<GatewayConfig, ConfigError> {
    let mut config = config::load_config(args.config.as_deref())?;

    if let Some(host) = &args.host {
        config.listener.host = host.clone();
    }
    if let Some(port) = args.port {
        config.listener.port = port;
    }

    config::validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("audio-gateway: {}", e);
            std::process::exit(2);
        }
    };

    let _log_guard = logging::init(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "audio-gateway starting");
    tracing::info!(
        environment = %config.environment,
        debug = config.debug,
        storage_root = %config.storage.root.display(),
        rate_limit = config.rate_limit.requests,
        rate_window_secs = config.rate_limit.window_secs,
        extractor = %config.extraction.binary,
        extraction_timeout_secs = config.extraction.timeout_secs,
        "Configuration loaded"
    );

    storage::ensure_dirs(&config.storage.root, &config.storage.log_dir).await?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let extractor = Arc::new(YtDlpExtractor::from_config(&config.extraction));
    let server = HttpServer::new(config, extractor);

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server_task = tokio::spawn(server.run(listener, server_shutdown));

    wait_for_shutdown().await;
    shutdown.trigger();

    server_task.await??;
    tracing::info!("Shutdown complete");
    Ok(())
}

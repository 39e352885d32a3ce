//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Gate the download routes behind the sliding-window limiter
//! - Wire up middleware (panic capture, request ID, tracing, CORS,
//!   timeout, body limit, metrics)
//! - Serve until the shutdown signal, then drain

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::error::panic_response;
use super::handlers;
use super::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::config::GatewayConfig;
use crate::extraction::{ExtractionGateway, Extractor};
use crate::health::HealthReporter;
use crate::security::{cors_layer, rate_limit_middleware, RateLimiterState, SlidingWindowLimiter};
use crate::storage::FileServer;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ExtractionGateway>,
    pub files: FileServer,
    pub health: HealthReporter,
}

/// HTTP server for the audio gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    limiter: Arc<SlidingWindowLimiter>,
}

impl HttpServer {
    /// Create a new HTTP server backed by `extractor`.
    pub fn new(config: GatewayConfig, extractor: Arc<dyn Extractor>) -> Self {
        let limiter = Arc::new(SlidingWindowLimiter::from_config(&config.rate_limit));

        let state = AppState {
            gateway: Arc::new(ExtractionGateway::new(
                extractor,
                &config.extraction,
                &config.storage.root,
                config.debug,
            )),
            files: FileServer::new(config.storage.root.clone()),
            health: HealthReporter::new(&config),
        };

        let router = Self::build_router(&config, state, limiter.clone());
        Self {
            router,
            config,
            limiter,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &GatewayConfig,
        state: AppState,
        limiter: Arc<SlidingWindowLimiter>,
    ) -> Router {
        let rate_state = RateLimiterState::new(limiter, &config.rate_limit);

        let limited = Router::new()
            .route("/api/download", post(handlers::resolve_audio))
            .route("/download/{filename}", get(handlers::download_file))
            .route_layer(middleware::from_fn_with_state(
                rate_state,
                rate_limit_middleware,
            ));

        Router::new()
            .route("/", get(handlers::index))
            .route("/health", get(handlers::health))
            .merge(limited)
            .fallback(handlers::not_found)
            .method_not_allowed_fallback(handlers::method_not_allowed)
            .with_state(state)
            .layer(middleware::from_fn(handlers::track_metrics))
            .layer(DefaultBodyLimit::max(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(cors_layer(&config.cors))
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<axum::body::Body>))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
            .layer(CatchPanicLayer::custom(panic_response))
    }

    /// The router with all layers, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rate_limit = self.config.rate_limit.requests,
            rate_window_secs = self.config.rate_limit.window_secs,
            "HTTP server starting"
        );

        let sweeper = tokio::spawn(self.limiter.clone().run_sweeper(
            Duration::from_secs(self.config.rate_limit.sweep_interval_secs),
            shutdown.resubscribe(),
        ));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        sweeper.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

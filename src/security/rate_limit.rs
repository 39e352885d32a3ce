//! Per-client sliding-window rate limiting.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::RateLimitConfig;
use crate::http::error::ApiError;
use crate::observability::metrics;

/// Outcome of a single rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Requests left in the current window after this one.
    pub remaining: u32,
    /// Time until the oldest counted request leaves the window (denials only).
    pub retry_after: Option<Duration>,
}

/// Sliding-window limiter keyed by client id.
///
/// Each client owns an ordered log of request instants. A check purges
/// entries older than the window, compares the remaining count to the limit
/// and appends `now` only when the request is allowed. The whole cycle runs
/// under the map shard lock for that client, so concurrent checks for one
/// client are serialized.
pub struct SlidingWindowLimiter {
    logs: DashMap<String, VecDeque<Instant>>,
    limit: u32,
    window: Duration,
}

impl SlidingWindowLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            logs: DashMap::new(),
            limit,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests, config.window())
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Check `client` against the current time.
    pub fn check(&self, client: &str) -> RateDecision {
        self.check_at(client, Instant::now())
    }

    /// Check `client` as if the current time were `now`.
    pub fn check_at(&self, client: &str, now: Instant) -> RateDecision {
        let mut log = self.logs.entry(client.to_string()).or_default();

        while let Some(&oldest) = log.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                log.pop_front();
            } else {
                break;
            }
        }

        let used = log.len() as u32;
        if used >= self.limit {
            let retry_after = log
                .front()
                .map(|&oldest| self.window.saturating_sub(now.saturating_duration_since(oldest)))
                .unwrap_or(self.window);
            return RateDecision {
                allowed: false,
                remaining: 0,
                retry_after: Some(retry_after),
            };
        }

        log.push_back(now);
        RateDecision {
            allowed: true,
            remaining: self.limit - used - 1,
            retry_after: None,
        }
    }

    /// Number of clients currently holding a log.
    pub fn tracked_clients(&self) -> usize {
        self.logs.len()
    }

    /// Drop clients whose newest request already left the window.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.logs.len();
        self.logs.retain(|_, log| {
            log.back()
                .is_some_and(|&newest| now.saturating_duration_since(newest) < self.window)
        });
        before.saturating_sub(self.logs.len())
    }

    /// Periodically sweep stale clients until shutdown.
    pub async fn run_sweeper(self: Arc<Self>, every: Duration, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval(every);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.sweep_at(Instant::now());
                    if removed > 0 {
                        tracing::debug!(removed, remaining = self.tracked_clients(), "Swept stale rate limit logs");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Rate limit sweeper stopping");
                    break;
                }
            }
        }
    }
}

/// State for the rate limiting middleware.
#[derive(Clone)]
pub struct RateLimiterState {
    pub limiter: Arc<SlidingWindowLimiter>,
    pub trust_forwarded_headers: bool,
}

impl RateLimiterState {
    pub fn new(limiter: Arc<SlidingWindowLimiter>, config: &RateLimitConfig) -> Self {
        Self {
            limiter,
            trust_forwarded_headers: config.trust_forwarded_headers,
        }
    }
}

/// Identify the caller: peer IP, or forwarded headers when trusted.
pub fn client_id<B>(request: &Request<B>, trust_forwarded_headers: bool) -> String {
    if trust_forwarded_headers {
        let headers = request.headers();
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').map(str::trim).find(|ip| !ip.is_empty()))
            .or_else(|| {
                headers
                    .get("x-real-ip")
                    .and_then(|h| h.to_str().ok())
                    .map(str::trim)
                    .filter(|ip| !ip.is_empty())
            });
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware gating a route group on the sliding-window limiter.
pub async fn rate_limit_middleware(
    State(state): State<RateLimiterState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = client_id(&request, state.trust_forwarded_headers);
    let decision = state.limiter.check(&client);

    if decision.allowed {
        return next.run(request).await;
    }

    tracing::warn!(client = %client, path = %request.uri().path(), "Rate limit exceeded");
    metrics::record_rate_limited();

    let mut response = ApiError::RateLimited.into_response();
    if let Some(retry_after) = decision.retry_after {
        // Round up so clients never retry a moment too early.
        let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
    }
    response
}

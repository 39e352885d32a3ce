//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (origin allow-list, preflight)
//!     → rate_limit.rs (per-client sliding window, limited routes only)
//!     → handler
//!         → paths.rs (confine client filenames to the storage root)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input, including forwarded headers unless configured

pub mod cors;
pub mod paths;
pub mod rate_limit;

pub use cors::cors_layer;
pub use paths::{resolve_within, PathError};
pub use rate_limit::{rate_limit_middleware, RateDecision, RateLimiterState, SlidingWindowLimiter};

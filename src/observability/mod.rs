//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, console + rolling file)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log files under the configured log directory
//!     → Metrics endpoint (Prometheus scrape, opt-in)
//! ```
//!
//! # Design Decisions
//! - Request ID is attached to every request span by the trace layer
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

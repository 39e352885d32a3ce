//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health
//!     → status.rs (ensure directories, snapshot config)
//!     → 200 healthy | 500 unhealthy
//! ```
//!
//! # Design Decisions
//! - A failed check is a report, never an unhandled error
//! - The report never carries filesystem paths from the error itself

pub mod status;

pub use status::{HealthReport, HealthReporter};

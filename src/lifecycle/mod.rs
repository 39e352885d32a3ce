//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → wait_for_shutdown() returns
//!
//! Shutdown (shutdown.rs):
//!     trigger() → server stops accepting, drains in-flight requests
//!               → rate-limit sweeper exits
//! ```
//!
//! # Design Decisions
//! - Ordered startup lives in `main`: config, logging, directories, listener
//! - One broadcast channel fans the stop signal out to every task

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_shutdown;

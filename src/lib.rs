//! Audio extraction gateway library.
//!
//! Accepts video URLs, asks an external extraction capability for the
//! available formats, and returns the audio-only ones. Files the capability
//! leaves in the storage root can be downloaded by name. Download routes are
//! rate limited per client with a sliding window.

pub mod config;
pub mod extraction;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod storage;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

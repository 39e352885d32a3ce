//! Extraction subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/download { url }
//!     → gateway.rs (validate URL, permit + timeout, filter containers)
//!     → extractor.rs (capability seam)
//!         → ytdlp.rs (child process, metadata-only JSON dump)
//!     → AudioListing { title, audio }
//! ```
//!
//! # Design Decisions
//! - The capability sits behind the `Extractor` trait; yt-dlp is one implementation
//! - Only `ExtractionError::Failed` is the caller's fault (400); every other
//!   failure, timeouts included, is unexpected (500)
//! - No retries: a failure is surfaced immediately

pub mod extractor;
pub mod gateway;
pub mod types;
pub mod ytdlp;

pub use extractor::Extractor;
pub use gateway::ExtractionGateway;
pub use types::{AudioListing, ExtractOptions, ExtractionError, FormatDescriptor, VideoMetadata};
pub use ytdlp::YtDlpExtractor;

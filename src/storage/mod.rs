//! Storage subsystem.
//!
//! # Data Flow
//! ```text
//! GET /download/{filename}
//!     → security::paths (confine the name to the storage root)
//!     → files.rs (stream the file with an attachment disposition)
//! ```
//!
//! The extractor writes into the same root; nothing here deletes or
//! rotates those files.

pub mod files;

use std::io;
use std::path::Path;

pub use files::FileServer;

/// Create the storage root and log directory if they are missing.
pub async fn ensure_dirs(root: &Path, log_dir: &Path) -> io::Result<()> {
    tokio::fs::create_dir_all(root).await?;
    tokio::fs::create_dir_all(log_dir).await?;
    Ok(())
}

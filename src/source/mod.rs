//! OCR Sources
//!
//! Byte suppliers for raw OCR files. The ingestion service only sees the
//! [`OcrSource`] trait and is agnostic to where the bytes live.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_iiif::source::{LocalSource, OcrSource};
//!
//! let source = LocalSource::new("./ocr", Duration::from_secs(30));
//! if let Some(bytes) = source.fetch("vol1/p1.xml").await? {
//!     // hand to the normalizer
//! }
//! ```

mod local;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use local::LocalSource;
pub use memory::MemorySource;

#[derive(Debug, Error)]
pub enum SourceError {
    /// Path escapes the source root or is empty
    #[error("Invalid OCR path: {0}")]
    InvalidPath(String),

    #[error("Timed out fetching {path} after {seconds}s")]
    Timeout { path: String, seconds: u64 },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Supplier of raw OCR bytes keyed by a canvas's OCR file path
#[async_trait]
pub trait OcrSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Raw bytes at `path`, or `None` when nothing is stored there
    async fn fetch(&self, path: &str) -> Result<Option<Vec<u8>>, SourceError>;
}

/// Reject empty, absolute and parent-escaping paths
pub(crate) fn check_relative(path: &str) -> Result<&str, SourceError> {
    let trimmed = path.trim();
    let escapes = trimmed
        .split(['/', '\\'])
        .any(|segment| segment == "..");
    if trimmed.is_empty() || trimmed.starts_with('/') || trimmed.starts_with('\\') || escapes {
        return Err(SourceError::InvalidPath(path.to_string()));
    }
    Ok(trimmed)
}

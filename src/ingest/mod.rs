//! Ingest Module
//!
//! Fetches raw OCR for canvases, normalizes it and writes one OCR
//! annotation per word or line. Writes are keyed on geometry, so
//! re-ingesting a page updates its words in place.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_iiif::ingest::{IngestConfig, IngestService};
//!
//! let service = IngestService::new(source, store, IngestConfig::default());
//! let report = service.rebuild_manifest("volume").await;
//! tracing::info!("{} canvases rebuilt", report.rebuilt.len());
//! ```

mod service;
mod types;

pub use service::IngestService;
pub use types::{CanvasFailure, IngestConfig, IngestReport, RebuildReport};

//! Folio IIIF Library
//!
//! OCR ingestion and IIIF annotation serialization for digitized books.
//! The `folio-ingest` binary is in main.rs.
//!
//! # Modules
//!
//! - `ocr`: Format detection and parsers for ALTO, hOCR, TEI, TSV and IA-JSON
//! - `html`: OCR span rendering and plain-text extraction
//! - `annotations`: Canonical annotation model, selectors and stores
//! - `iiif`: Presentation 2.1 and Web Annotation serializers
//! - `source`: Raw OCR byte suppliers
//! - `ingest`: Fetch, normalize and upsert OCR annotations

pub mod annotations;
pub mod config;
pub mod error;
pub mod html;
pub mod iiif;
pub mod ingest;
pub mod ocr;
pub mod source;

pub use error::{Error, Result};

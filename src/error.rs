//! Error types for folio-iiif

use thiserror::Error;

use crate::annotations::StoreError;
use crate::config::ConfigError;
use crate::html::HtmlError;
use crate::iiif::IiifError;
use crate::ocr::ParseError;
use crate::source::SourceError;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown canvas: {0}")]
    UnknownCanvas(String),

    #[error("OCR parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("IIIF error: {0}")]
    Iiif(#[from] IiifError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("HTML error: {0}")]
    Html(#[from] HtmlError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

//! OCR parse errors

use super::OcrFormat;
use thiserror::Error;

/// Raised when a raw OCR payload cannot be read as its detected format.
///
/// Callers log these and treat the canvas as having no OCR.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Payload is not valid UTF-8")]
    Encoding,

    #[error("XML error: {0}")]
    Xml(String),

    #[error("HTML error: {0}")]
    Html(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TSV error: {0}")]
    Tsv(#[from] csv::Error),

    #[error("Truncated {0} document")]
    Truncated(OcrFormat),

    #[error("Invalid number '{value}' in attribute {attribute}")]
    InvalidNumber { attribute: String, value: String },

    #[error("No parser for format {0}")]
    Unsupported(OcrFormat),
}

impl From<quick_xml::Error> for ParseError {
    fn from(err: quick_xml::Error) -> Self {
        ParseError::Xml(err.to_string())
    }
}

impl From<roxmltree::Error> for ParseError {
    fn from(err: roxmltree::Error) -> Self {
        ParseError::Xml(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;

//! IIIF serialization errors
//!
//! Deserialization failures are validation errors for the caller; none of
//! them are retried.

use thiserror::Error;

use crate::annotations::{SelectorKind, StoreError};

#[derive(Debug, Error)]
pub enum IiifError {
    /// Range boundaries missing, on another canvas, or out of order
    #[error("Selector mismatch: {0}")]
    SelectorMismatch(String),

    #[error("Unknown motivation: {0}")]
    UnknownMotivation(String),

    #[error("Unknown selector type: {0}")]
    UnknownSelectorType(String),

    /// Recognized selector kind that annotations cannot carry
    #[error("Unsupported selector: {0}")]
    UnsupportedSelector(SelectorKind),

    #[error("Unknown owner: {0}")]
    UnknownOwner(String),

    #[error("Unknown canvas: {0}")]
    UnknownCanvas(String),

    #[error("Invalid fragment selector: {0}")]
    InvalidFragment(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, IiifError>;

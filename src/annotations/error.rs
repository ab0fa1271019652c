//! Annotation store errors

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Annotation not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid annotation: {0}")]
    InvalidRecord(String),

    #[error("Storage error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

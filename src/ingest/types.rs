//! Ingestion Types

use serde::Serialize;

use crate::ocr::{Granularity, OcrFormat};

/// Ingestion service configuration
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Granularity for canvases without an override
    pub default_granularity: Granularity,
    /// Language recorded on OCR annotations
    pub language: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            default_granularity: Granularity::Word,
            language: "en".to_string(),
        }
    }
}

/// Outcome of ingesting one canvas
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub canvas: String,
    pub format: OcrFormat,
    pub granularity: Granularity,
    pub created: usize,
    pub updated: usize,
    /// OCR annotations deleted before ingesting
    pub removed: usize,
}

impl IngestReport {
    pub(crate) fn new(canvas: &str, format: OcrFormat, granularity: Granularity) -> Self {
        Self {
            canvas: canvas.to_string(),
            format,
            granularity,
            created: 0,
            updated: 0,
            removed: 0,
        }
    }

    /// Words written by this run
    pub fn written(&self) -> usize {
        self.created + self.updated
    }
}

/// A canvas that could not be rebuilt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanvasFailure {
    pub canvas: String,
    pub error: String,
}

/// Outcome of rebuilding every canvas of a manifest
#[derive(Debug, Clone, Default, Serialize)]
pub struct RebuildReport {
    pub manifest: String,
    pub rebuilt: Vec<IngestReport>,
    /// Canvases without an OCR file or without stored bytes
    pub skipped: Vec<String>,
    pub failed: Vec<CanvasFailure>,
}

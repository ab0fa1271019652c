//! Ingestion Service
//!
//! Orchestrates the OCR source, the normalizer and the annotation store.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use super::types::{CanvasFailure, IngestConfig, IngestReport, RebuildReport};
use crate::annotations::{
    Annotation, AnnotationStore, Bounds, Canvas, CanvasLookup, GeometryKey, Owner, Upsert,
};
use crate::error::{Error, Result};
use crate::ocr::{canvas_text, Granularity, OcrNormalizer};
use crate::source::OcrSource;

/// Builds OCR annotations for canvases
pub struct IngestService<S> {
    source: Arc<dyn OcrSource>,
    store: Arc<S>,
    config: IngestConfig,
}

impl<S> IngestService<S>
where
    S: AnnotationStore + CanvasLookup,
{
    pub fn new(source: Arc<dyn OcrSource>, store: Arc<S>, config: IngestConfig) -> Self {
        Self { source, store, config }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Granularity used for `canvas`: its own override, else the default
    pub fn granularity_for(&self, canvas: &Canvas) -> Granularity {
        canvas.granularity.unwrap_or(self.config.default_granularity)
    }

    fn canvas(&self, pid: &str) -> Result<Canvas> {
        self.store
            .canvas(pid)
            .ok_or_else(|| Error::UnknownCanvas(pid.to_string()))
    }

    /// Normalize raw OCR for a canvas and upsert one annotation per word.
    ///
    /// Unparseable or unrecognized payloads produce an empty report rather
    /// than an error. OCR built with another granularity is removed first,
    /// and words absent from a non-empty payload are removed afterwards.
    pub fn ingest_bytes(&self, canvas: &Canvas, raw: &[u8]) -> Result<IngestReport> {
        let granularity = self.granularity_for(canvas);

        let mut removed = 0;
        if let Some(previous) = self.store.ocr_granularity(&canvas.pid)? {
            if previous != granularity {
                removed = self.store.delete_ocr_for_canvas(&canvas.pid)?;
                tracing::info!(
                    "Canvas {} OCR granularity changed from {} to {}, removed {} annotations",
                    canvas.pid,
                    previous,
                    granularity,
                    removed
                );
            }
        }

        let normalized = OcrNormalizer::new(granularity).normalize(&canvas.pid, raw);
        let mut report = IngestReport::new(&canvas.pid, normalized.format, granularity);
        report.removed = removed;

        let mut written = HashSet::new();
        for word in &normalized.words {
            let bounds = Bounds::new(word.x as f64, word.y as f64, word.w as f64, word.h as f64);
            let key = GeometryKey::new(&canvas.pid, &bounds, &Owner::SyntheticOcr);

            let (outcome, id) = self.store.upsert_by_geometry(&key, &mut |existing| {
                let id = existing.unwrap_or_else(Uuid::new_v4);
                let mut annotation = Annotation::ocr_word(id, &canvas.pid, word, &self.config.language);
                if let Some(Ok(Some(previous))) = existing.map(|id| self.store.get(id)) {
                    annotation.created_at = previous.created_at;
                    annotation.tags = previous.tags;
                }
                annotation
            })?;

            written.insert(id);

            match outcome {
                Upsert::Created => report.created += 1,
                Upsert::Updated => report.updated += 1,
            }
        }

        if !normalized.is_empty() {
            for stale in self.store.ocr_words(&canvas.pid)? {
                if !written.contains(&stale.id) && self.store.delete(stale.id)? {
                    report.removed += 1;
                }
            }
            self.store.set_ocr_granularity(&canvas.pid, granularity)?;
        }

        tracing::info!(
            "Ingested {} OCR for canvas {}: {} created, {} updated, {} removed",
            report.format,
            canvas.pid,
            report.created,
            report.updated,
            report.removed
        );
        Ok(report)
    }

    /// Fetch and ingest a canvas's OCR file. `None` when the canvas has no
    /// OCR file or the source holds nothing at its path.
    pub async fn ingest_canvas(&self, pid: &str) -> Result<Option<IngestReport>> {
        let canvas = self.canvas(pid)?;
        let Some(path) = canvas.ocr_file_path.clone() else {
            tracing::debug!("Canvas {} has no OCR file", pid);
            return Ok(None);
        };

        match self.source.fetch(&path).await? {
            Some(raw) => self.ingest_bytes(&canvas, &raw).map(Some),
            None => {
                tracing::info!(
                    "No OCR at {} for canvas {} in {} source",
                    path,
                    pid,
                    self.source.name()
                );
                Ok(None)
            }
        }
    }

    /// Delete a canvas's OCR annotations and ingest them again
    pub async fn rebuild_canvas(&self, pid: &str) -> Result<Option<IngestReport>> {
        let canvas = self.canvas(pid)?;
        let removed = self.store.delete_ocr_for_canvas(&canvas.pid)?;
        tracing::info!("Removed {} OCR annotations from canvas {}", removed, canvas.pid);

        let report = self.ingest_canvas(&canvas.pid).await?;
        Ok(report.map(|mut report| {
            report.removed += removed;
            report
        }))
    }

    /// Rebuild every canvas of a manifest. A failing canvas is recorded
    /// and the rest still run.
    pub async fn rebuild_manifest(&self, manifest_pid: &str) -> RebuildReport {
        let mut report = RebuildReport {
            manifest: manifest_pid.to_string(),
            ..RebuildReport::default()
        };

        for canvas in self.store.canvases_for_manifest(manifest_pid) {
            match self.rebuild_canvas(&canvas.pid).await {
                Ok(Some(canvas_report)) => report.rebuilt.push(canvas_report),
                Ok(None) => report.skipped.push(canvas.pid),
                Err(e) => {
                    tracing::warn!("Failed to rebuild OCR for canvas {}: {}", canvas.pid, e);
                    report.failed.push(CanvasFailure {
                        canvas: canvas.pid,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Rebuilt manifest {}: {} canvases rebuilt, {} skipped, {} failed",
            manifest_pid,
            report.rebuilt.len(),
            report.skipped.len(),
            report.failed.len()
        );
        report
    }

    /// Remove OCR annotations whose text is blank
    pub fn purge_empty_ocr(&self, pid: &str) -> Result<usize> {
        let mut purged = 0;
        for word in self.store.ocr_words(pid)? {
            if word.raw_content().trim().is_empty() && self.store.delete(word.id)? {
                purged += 1;
            }
        }
        if purged > 0 {
            tracing::info!("Purged {} empty OCR annotations from canvas {}", purged, pid);
        }
        Ok(purged)
    }

    /// Plain OCR text of a canvas in reading order
    pub fn canvas_text(&self, pid: &str) -> Result<String> {
        let words = self.store.ocr_words(pid)?;
        Ok(canvas_text(words.iter().map(|w| w.content.as_str())))
    }
}

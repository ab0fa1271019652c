//! Collaborator contracts
//!
//! The serializers and the ingestion service only see these traits;
//! [`MemoryStore`](super::MemoryStore) implements all of them.

use uuid::Uuid;

use super::error::Result;
use super::types::{Account, Annotation, Canvas, GeometryKey};
use crate::ocr::Granularity;

/// Canvas lookup by pid
pub trait CanvasLookup: Send + Sync {
    fn canvas(&self, pid: &str) -> Option<Canvas>;

    /// Canvases of a manifest ordered by position
    fn canvases_for_manifest(&self, manifest_pid: &str) -> Vec<Canvas>;
}

/// Account lookup by display name or username
pub trait AccountLookup: Send + Sync {
    fn account_by_name(&self, name: &str) -> Option<Account>;

    fn account_by_username(&self, username: &str) -> Option<Account>;
}

/// Outcome of a keyed write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

/// Annotation persistence
pub trait AnnotationStore: Send + Sync {
    fn get(&self, id: Uuid) -> Result<Option<Annotation>>;

    /// All annotations of a canvas ordered by `order`
    fn annotations_for_canvas(&self, canvas: &str) -> Result<Vec<Annotation>>;

    /// Id of the annotation already stored under `key`
    fn find_by_geometry(&self, key: &GeometryKey) -> Result<Option<Uuid>>;

    /// Insert or replace by id
    fn save(&self, annotation: Annotation) -> Result<Upsert>;

    fn delete(&self, id: Uuid) -> Result<bool>;

    /// Remove every OCR annotation of a canvas, returning how many went
    fn delete_ocr_for_canvas(&self, canvas: &str) -> Result<usize>;

    /// Granularity the canvas's OCR annotations were built with
    fn ocr_granularity(&self, canvas: &str) -> Result<Option<Granularity>>;

    fn set_ocr_granularity(&self, canvas: &str, granularity: Granularity) -> Result<()>;

    /// OCR words of a canvas ordered by `order`
    fn ocr_words(&self, canvas: &str) -> Result<Vec<Annotation>> {
        Ok(self
            .annotations_for_canvas(canvas)?
            .into_iter()
            .filter(Annotation::is_ocr)
            .collect())
    }

    /// Write an annotation keyed on its canvas, box and owner.
    ///
    /// The caller builds the record from the id that ends up being used,
    /// so derived content (such as rendered spans) stays consistent.
    fn upsert_by_geometry(
        &self,
        key: &GeometryKey,
        build: &mut dyn FnMut(Option<Uuid>) -> Annotation,
    ) -> Result<(Upsert, Uuid)> {
        let existing = self.find_by_geometry(key)?;
        let annotation = build(existing);
        let id = annotation.id;
        let outcome = self.save(annotation)?;
        Ok((outcome, id))
    }
}

/// Free-text labels per annotation
pub trait TagStore: Send + Sync {
    fn tags(&self, annotation: Uuid) -> Result<Vec<String>>;

    fn add_tag(&self, annotation: Uuid, tag: &str) -> Result<()>;

    fn remove_tag(&self, annotation: Uuid, tag: &str) -> Result<()>;
}

//! Persistence path for deserialized annotations

use chrono::Utc;
use uuid::Uuid;

use super::error::{Result, StoreError};
use super::selector::Selector;
use super::store::{AnnotationStore, TagStore};
use super::types::{Annotation, AnnotationFields, Owner};

fn validate(fields: &AnnotationFields) -> Result<()> {
    let b = &fields.bounds;
    if ![b.x, b.y, b.w, b.h].iter().all(|v| v.is_finite()) || b.w < 0.0 || b.h < 0.0 {
        return Err(StoreError::InvalidRecord(format!(
            "degenerate bounds {},{},{},{}",
            b.x, b.y, b.w, b.h
        )));
    }
    if let Selector::Svg { svg } = &fields.selector {
        if svg.trim().is_empty() {
            return Err(StoreError::InvalidRecord("SVG selector without a shape".to_string()));
        }
    }
    Ok(())
}

fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !normalized.iter().any(|t| t == tag) {
            normalized.push(tag.to_string());
        }
    }
    normalized
}

/// Create or update an annotation from deserialized fields and bring its
/// tags in line with `tags`.
///
/// Updates are matched by id. OCR annotations keep the geometry they were
/// ingested with and get their span re-rendered; they cannot be created
/// through this path.
pub fn persist<S>(store: &S, fields: AnnotationFields, tags: &[String]) -> Result<Annotation>
where
    S: AnnotationStore + TagStore + ?Sized,
{
    validate(&fields)?;
    let now = Utc::now();

    let existing = match fields.id {
        Some(id) => store.get(id)?,
        None => None,
    };

    let mut annotation = match existing {
        Some(mut annotation) => {
            if annotation.owner != fields.owner || annotation.canvas != fields.canvas {
                return Err(StoreError::InvalidRecord(format!(
                    "annotation {} belongs to another owner or canvas",
                    annotation.id
                )));
            }
            let ingested = (annotation.bounds, annotation.selector.clone());
            annotation.apply(&fields, now);
            if annotation.is_ocr() {
                annotation.bounds = ingested.0;
                annotation.selector = ingested.1;
                let text = fields.raw_content.clone();
                annotation.render_ocr_content(&text);
            }
            annotation
        }
        None => {
            if fields.owner == Owner::SyntheticOcr {
                return Err(StoreError::InvalidRecord(
                    "OCR annotations are created by ingestion".to_string(),
                ));
            }
            fields.into_annotation(now)
        }
    };

    let id = annotation.id;
    store.save(annotation.clone())?;
    annotation.tags = sync_tags(store, id, tags)?;

    tracing::debug!("Persisted annotation {} on canvas {}", id, annotation.canvas);
    Ok(annotation)
}

/// Add tags not yet stored and remove stored tags no longer present
pub fn sync_tags<S>(store: &S, annotation: Uuid, tags: &[String]) -> Result<Vec<String>>
where
    S: TagStore + ?Sized,
{
    let wanted = normalize_tags(tags);
    let current = store.tags(annotation)?;

    for tag in wanted.iter().filter(|t| !current.contains(t)) {
        store.add_tag(annotation, tag)?;
    }
    for tag in current.iter().filter(|t| !wanted.contains(t)) {
        store.remove_tag(annotation, tag)?;
    }

    store.tags(annotation)
}

/// Delete a user annotation on behalf of its owner
pub fn remove<S>(store: &S, id: Uuid, owner: &Owner) -> Result<bool>
where
    S: AnnotationStore + ?Sized,
{
    match store.get(id)? {
        Some(annotation) if &annotation.owner == owner => store.delete(id),
        Some(_) => Err(StoreError::InvalidRecord(format!(
            "annotation {} belongs to another owner",
            id
        ))),
        None => Ok(false),
    }
}

//! In-memory store
//!
//! Implements every collaborator trait behind one `RwLock`. Used by the
//! CLI and in tests.

use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;

use super::error::{Result, StoreError};
use super::store::{AccountLookup, AnnotationStore, CanvasLookup, TagStore, Upsert};
use super::types::{Account, Annotation, Canvas, GeometryKey};
use crate::ocr::Granularity;

#[derive(Default)]
struct Inner {
    canvases: HashMap<String, Canvas>,
    accounts: Vec<Account>,
    annotations: HashMap<Uuid, Annotation>,
    /// OCR annotations by geometry
    geometry: HashMap<GeometryKey, Uuid>,
    granularity: HashMap<String, Granularity>,
}

impl Inner {
    fn unindex(&mut self, annotation: &Annotation) {
        let key = annotation.geometry_key();
        if self.geometry.get(&key) == Some(&annotation.id) {
            self.geometry.remove(&key);
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_canvas(&self, canvas: Canvas) {
        self.inner.write().canvases.insert(canvas.pid.clone(), canvas);
    }

    pub fn add_account(&self, account: Account) {
        let mut inner = self.inner.write();
        inner.accounts.retain(|a| a.username != account.username);
        inner.accounts.push(account);
    }

    /// Remove a canvas and, with it, all its annotations
    pub fn remove_canvas(&self, pid: &str) -> usize {
        let mut inner = self.inner.write();
        inner.canvases.remove(pid);
        inner.granularity.remove(pid);
        let doomed: Vec<Annotation> = inner
            .annotations
            .values()
            .filter(|a| a.canvas == pid)
            .cloned()
            .collect();
        for annotation in &doomed {
            inner.unindex(annotation);
            inner.annotations.remove(&annotation.id);
        }
        doomed.len()
    }

    pub fn len(&self) -> usize {
        self.inner.read().annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CanvasLookup for MemoryStore {
    fn canvas(&self, pid: &str) -> Option<Canvas> {
        self.inner.read().canvases.get(pid).cloned()
    }

    fn canvases_for_manifest(&self, manifest_pid: &str) -> Vec<Canvas> {
        let mut canvases: Vec<Canvas> = self
            .inner
            .read()
            .canvases
            .values()
            .filter(|c| c.manifest_pid == manifest_pid)
            .cloned()
            .collect();
        canvases.sort_by_key(|c| c.position);
        canvases
    }
}

impl AccountLookup for MemoryStore {
    fn account_by_name(&self, name: &str) -> Option<Account> {
        let inner = self.inner.read();
        inner
            .accounts
            .iter()
            .find(|a| a.display_name() == name)
            .or_else(|| inner.accounts.iter().find(|a| a.username == name))
            .cloned()
    }

    fn account_by_username(&self, username: &str) -> Option<Account> {
        self.inner
            .read()
            .accounts
            .iter()
            .find(|a| a.username == username)
            .cloned()
    }
}

impl AnnotationStore for MemoryStore {
    fn get(&self, id: Uuid) -> Result<Option<Annotation>> {
        Ok(self.inner.read().annotations.get(&id).cloned())
    }

    fn annotations_for_canvas(&self, canvas: &str) -> Result<Vec<Annotation>> {
        let mut annotations: Vec<Annotation> = self
            .inner
            .read()
            .annotations
            .values()
            .filter(|a| a.canvas == canvas)
            .cloned()
            .collect();
        annotations.sort_by(|a, b| a.order.cmp(&b.order).then(a.created_at.cmp(&b.created_at)));
        Ok(annotations)
    }

    fn find_by_geometry(&self, key: &GeometryKey) -> Result<Option<Uuid>> {
        Ok(self.inner.read().geometry.get(key).copied())
    }

    fn save(&self, annotation: Annotation) -> Result<Upsert> {
        let mut inner = self.inner.write();
        let outcome = match inner.annotations.remove(&annotation.id) {
            Some(previous) => {
                inner.unindex(&previous);
                Upsert::Updated
            }
            None => Upsert::Created,
        };
        if annotation.is_ocr() {
            inner.geometry.insert(annotation.geometry_key(), annotation.id);
        }
        inner.annotations.insert(annotation.id, annotation);
        Ok(outcome)
    }

    fn delete(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write();
        match inner.annotations.remove(&id) {
            Some(annotation) => {
                inner.unindex(&annotation);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_ocr_for_canvas(&self, canvas: &str) -> Result<usize> {
        let mut inner = self.inner.write();
        let doomed: Vec<Uuid> = inner
            .annotations
            .values()
            .filter(|a| a.canvas == canvas && a.is_ocr())
            .map(|a| a.id)
            .collect();
        for id in &doomed {
            if let Some(annotation) = inner.annotations.remove(id) {
                inner.unindex(&annotation);
            }
        }
        Ok(doomed.len())
    }

    fn ocr_granularity(&self, canvas: &str) -> Result<Option<Granularity>> {
        Ok(self.inner.read().granularity.get(canvas).copied())
    }

    fn set_ocr_granularity(&self, canvas: &str, granularity: Granularity) -> Result<()> {
        self.inner
            .write()
            .granularity
            .insert(canvas.to_string(), granularity);
        Ok(())
    }
}

impl TagStore for MemoryStore {
    fn tags(&self, annotation: Uuid) -> Result<Vec<String>> {
        self.inner
            .read()
            .annotations
            .get(&annotation)
            .map(|a| a.tags.clone())
            .ok_or(StoreError::NotFound(annotation))
    }

    fn add_tag(&self, annotation: Uuid, tag: &str) -> Result<()> {
        let mut inner = self.inner.write();
        let record = inner
            .annotations
            .get_mut(&annotation)
            .ok_or(StoreError::NotFound(annotation))?;
        if !record.tags.iter().any(|t| t == tag) {
            record.tags.push(tag.to_string());
        }
        Ok(())
    }

    fn remove_tag(&self, annotation: Uuid, tag: &str) -> Result<()> {
        let mut inner = self.inner.write();
        let record = inner
            .annotations
            .get_mut(&annotation)
            .ok_or(StoreError::NotFound(annotation))?;
        record.tags.retain(|t| t != tag);
        Ok(())
    }
}

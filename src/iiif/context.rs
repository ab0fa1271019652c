//! Resolution context for the serializers
//!
//! Bundles the host used to mint URIs with the lookups needed to turn
//! published names and URIs back into canonical references.

use crate::annotations::{
    range_bounds, AccountLookup, Annotation, AnnotationStore, Bounds, Canvas, CanvasLookup, Owner,
    RangeSelector,
};

use super::error::{IiifError, Result};

pub const V2_CONTEXT: &str = "http://iiif.io/api/presentation/2/context.json";
pub const V3_CONTEXT: &str = "http://iiif.io/api/presentation/3/context.json";
pub const ANNOTATION_CONTEXT: &str = "http://www.w3.org/ns/anno.jsonld";
pub const MEDIA_FRAGMENTS: &str = "http://www.w3.org/TR/media-frags/";

/// Canvas pid from a canvas URI.
///
/// The pid is the last path segment, or the one before it when the URI
/// ends in a literal `canvas` segment. Fragments and queries are ignored.
pub fn canvas_pid_from_uri(uri: &str) -> Option<&str> {
    let path = uri.split(['#', '?']).next().unwrap_or(uri);
    let mut segments = path.rsplit('/').filter(|s| !s.is_empty());
    match segments.next()? {
        "canvas" => segments.next(),
        pid => Some(pid),
    }
}

pub struct Resolver<'a> {
    base_url: String,
    canvases: &'a dyn CanvasLookup,
    accounts: &'a dyn AccountLookup,
    annotations: &'a dyn AnnotationStore,
}

impl<'a> Resolver<'a> {
    /// Resolver backed by a single store implementing every lookup
    pub fn new<S>(base_url: &str, store: &'a S) -> Self
    where
        S: CanvasLookup + AccountLookup + AnnotationStore,
    {
        Self::from_parts(base_url, store, store, store)
    }

    pub fn from_parts(
        base_url: &str,
        canvases: &'a dyn CanvasLookup,
        accounts: &'a dyn AccountLookup,
        annotations: &'a dyn AnnotationStore,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            canvases,
            accounts,
            annotations,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn annotations(&self) -> &'a dyn AnnotationStore {
        self.annotations
    }

    pub fn canvas(&self, pid: &str) -> Result<Canvas> {
        self.canvases
            .canvas(pid)
            .ok_or_else(|| IiifError::UnknownCanvas(pid.to_string()))
    }

    /// Canvas addressed by a URI (v2 `on.full`, v3 `target.source`)
    pub fn canvas_for_uri(&self, uri: &str) -> Result<Canvas> {
        let pid = canvas_pid_from_uri(uri).ok_or_else(|| IiifError::UnknownCanvas(uri.to_string()))?;
        self.canvas(pid)
    }

    pub fn canvas_uri(&self, canvas: &Canvas) -> String {
        format!("{}/iiif/v2/{}/canvas/{}", self.base_url, canvas.manifest_pid, canvas.pid)
    }

    pub fn manifest_uri(&self, manifest_pid: &str) -> String {
        format!("{}/iiif/v2/{}/manifest", self.base_url, manifest_pid)
    }

    pub fn list_uri(&self, canvas: &Canvas) -> String {
        format!("{}/iiif/v2/{}/list/{}", self.base_url, canvas.manifest_pid, canvas.pid)
    }

    pub fn page_uri(&self, canvas: &Canvas) -> String {
        format!("{}/iiif/{}/annotationpage/{}", self.base_url, canvas.manifest_pid, canvas.pid)
    }

    /// Name an owner is published under
    pub fn owner_name(&self, owner: &Owner) -> String {
        match owner {
            Owner::SyntheticOcr => Owner::OCR_SENTINEL.to_string(),
            Owner::Human(username) => self
                .accounts
                .account_by_username(username)
                .map(|a| a.display_name().to_string())
                .unwrap_or_else(|| username.clone()),
        }
    }

    /// Owner from a published display name (v2 `annotatedBy.name`)
    pub fn owner_by_name(&self, name: &str) -> Result<Owner> {
        if Owner::is_ocr_sentinel(name) {
            return Ok(Owner::SyntheticOcr);
        }
        self.accounts
            .account_by_name(name)
            .map(|a| Owner::Human(a.username))
            .ok_or_else(|| IiifError::UnknownOwner(name.to_string()))
    }

    /// Owner from a published creator id (v3 `creator.id`)
    pub fn owner_by_id(&self, id: &str) -> Result<Owner> {
        if Owner::is_ocr_sentinel(id) {
            return Ok(Owner::SyntheticOcr);
        }
        self.accounts
            .account_by_username(id)
            .map(|a| Owner::Human(a.username))
            .ok_or_else(|| IiifError::UnknownOwner(id.to_string()))
    }

    fn boundary(&self, canvas: &str, id: uuid::Uuid, which: &str) -> Result<Annotation> {
        let word = self.annotations.get(id)?.ok_or_else(|| {
            IiifError::SelectorMismatch(format!("{} boundary {} does not exist", which, id))
        })?;
        if word.canvas != canvas {
            return Err(IiifError::SelectorMismatch(format!(
                "{} boundary {} is on canvas {}, not {}",
                which, id, word.canvas, canvas
            )));
        }
        if !word.is_ocr() {
            return Err(IiifError::SelectorMismatch(format!(
                "{} boundary {} is not an OCR word",
                which, id
            )));
        }
        Ok(word)
    }

    /// Validated box of a Range selector on `canvas`.
    ///
    /// Both boundaries must be OCR words of the canvas and the start may not
    /// come after the end. A range that starts and ends on the same word is
    /// accepted and covers that word alone.
    pub fn range_geometry(&self, canvas: &str, range: &RangeSelector) -> Result<Bounds> {
        let start = self.boundary(canvas, range.start, "start")?;
        let end = self.boundary(canvas, range.end, "end")?;
        if start.order > end.order {
            return Err(IiifError::SelectorMismatch(format!(
                "start word {} (order {}) comes after end word {} (order {})",
                start.id, start.order, end.id, end.order
            )));
        }

        let words = self.annotations.ocr_words(canvas)?;
        range_bounds(&words, start.order, end.order)
            .ok_or_else(|| IiifError::SelectorMismatch("range covers no words".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{Account, MemoryStore, Selector};
    use uuid::Uuid;

    fn store_with_words() -> (MemoryStore, Vec<Uuid>) {
        let store = MemoryStore::new();
        store.add_canvas(Canvas::new("p1", "m1", 1, "https://images/p1"));
        store.add_canvas(Canvas::new("p2", "m1", 2, "https://images/p2"));
        let mut ids = Vec::new();
        for order in 1..=5 {
            let mut word = Annotation::new(
                "p1",
                Owner::SyntheticOcr,
                Selector::Fragment,
                Bounds::new(order as f64 * 10.0, 100.0, 8.0, 20.0),
            );
            word.order = order;
            ids.push(word.id);
            store.save(word).unwrap();
        }
        (store, ids)
    }

    fn range(start: Uuid, end: Uuid) -> RangeSelector {
        RangeSelector {
            start,
            end,
            start_offset: 0,
            end_offset: 1,
        }
    }

    #[test]
    fn test_canvas_pid_from_uri() {
        assert_eq!(canvas_pid_from_uri("https://h/iiif/v2/m1/canvas/p1"), Some("p1"));
        assert_eq!(canvas_pid_from_uri("https://h/iiif/m1/p1/canvas"), Some("p1"));
        assert_eq!(canvas_pid_from_uri("https://h/iiif/v2/m1/canvas/p1/"), Some("p1"));
        assert_eq!(canvas_pid_from_uri("https://h/iiif/v2/m1/canvas/p1#xywh=1,2,3,4"), Some("p1"));
        assert_eq!(canvas_pid_from_uri(""), None);
    }

    #[test]
    fn test_uris() {
        let store = MemoryStore::new();
        let resolver = Resolver::new("https://readux.example/", &store);
        let canvas = Canvas::new("p1", "m1", 1, "https://images/p1");
        assert_eq!(resolver.canvas_uri(&canvas), "https://readux.example/iiif/v2/m1/canvas/p1");
        assert_eq!(resolver.list_uri(&canvas), "https://readux.example/iiif/v2/m1/list/p1");
        assert_eq!(resolver.page_uri(&canvas), "https://readux.example/iiif/m1/annotationpage/p1");
    }

    #[test]
    fn test_owner_resolution() {
        let store = MemoryStore::new();
        store.add_account(Account::new("zaphod", "Zaphod Beeblebrox"));
        let resolver = Resolver::new("https://h", &store);

        assert_eq!(resolver.owner_by_name("OCR").unwrap(), Owner::SyntheticOcr);
        assert_eq!(resolver.owner_by_id("OCR").unwrap(), Owner::SyntheticOcr);
        assert_eq!(resolver.owner_by_name("Zaphod Beeblebrox").unwrap(), Owner::Human("zaphod".into()));
        assert_eq!(resolver.owner_name(&Owner::Human("zaphod".into())), "Zaphod Beeblebrox");
        assert!(matches!(resolver.owner_by_id("arthur"), Err(IiifError::UnknownOwner(_))));
    }

    #[test]
    fn test_lowercase_ocr_account_is_human() {
        let store = MemoryStore::new();
        store.add_account(Account::new("ocr", "Ocr Reader"));
        let resolver = Resolver::new("https://h", &store);
        assert_eq!(resolver.owner_by_id("ocr").unwrap(), Owner::Human("ocr".into()));
        assert_eq!(resolver.owner_by_name("Ocr Reader").unwrap(), Owner::Human("ocr".into()));
    }

    #[test]
    fn test_range_geometry() {
        let (store, ids) = store_with_words();
        let resolver = Resolver::new("https://h", &store);
        let bounds = resolver.range_geometry("p1", &range(ids[1], ids[3])).unwrap();
        assert_eq!(bounds, Bounds::new(20.0, 100.0, 40.0 + 8.0 - 20.0, 20.0));
    }

    #[test]
    fn test_range_geometry_single_word() {
        let (store, ids) = store_with_words();
        let resolver = Resolver::new("https://h", &store);
        let bounds = resolver.range_geometry("p1", &range(ids[2], ids[2])).unwrap();
        assert_eq!(bounds, Bounds::new(30.0, 100.0, 8.0, 20.0));
    }

    #[test]
    fn test_range_geometry_rejects_reversed() {
        let (store, ids) = store_with_words();
        let resolver = Resolver::new("https://h", &store);
        assert!(matches!(
            resolver.range_geometry("p1", &range(ids[3], ids[1])),
            Err(IiifError::SelectorMismatch(_))
        ));
    }

    #[test]
    fn test_range_geometry_rejects_missing_or_foreign() {
        let (store, ids) = store_with_words();
        let resolver = Resolver::new("https://h", &store);
        assert!(matches!(
            resolver.range_geometry("p1", &range(Uuid::new_v4(), ids[1])),
            Err(IiifError::SelectorMismatch(_))
        ));
        assert!(matches!(
            resolver.range_geometry("p2", &range(ids[0], ids[1])),
            Err(IiifError::SelectorMismatch(_))
        ));
    }
}

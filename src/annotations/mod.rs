//! Annotations Module
//!
//! Canonical annotation records, the selector model, collaborator traits
//! and the persistence path for client-submitted annotations.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_iiif::annotations::{persist, MemoryStore};
//! use folio_iiif::iiif::{self, Resolver};
//!
//! let store = MemoryStore::new();
//! let resolver = Resolver::new("https://readux.example", &store);
//! let (fields, tags) = iiif::deserialize(&json, &resolver)?;
//! let annotation = persist(&store, fields, &tags)?;
//! ```

mod error;
mod memory;
mod persist;
mod selector;
mod store;
mod types;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use persist::{persist, remove, sync_tags};
pub use selector::{
    id_from_xpath, range_bounds, xpath_for, Bounds, FragmentUnit, RangeSelector, Selector,
    SelectorKind,
};
pub use store::{AccountLookup, AnnotationStore, CanvasLookup, TagStore, Upsert};
pub use types::{
    Account, Annotation, AnnotationFields, Canvas, GeometryKey, Owner, Purpose, ResourceType,
    TextFormat, UserId,
};

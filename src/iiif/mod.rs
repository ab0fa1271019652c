//! IIIF Module
//!
//! Converts canonical annotations to and from the two wire vocabularies:
//! IIIF Presentation 2.1 (`oa:Annotation`, `sc:AnnotationList`) and the
//! W3C Web Annotation model used by Presentation 3 (`Annotation`,
//! `AnnotationPage`).
//!
//! Both directions are lossless for Fragment, SVG and Range selectors, so
//! a document read back from either version yields the same fields.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_iiif::iiif::{self, IiifVersion, Resolver};
//!
//! let resolver = Resolver::new("https://readux.example", &store);
//! let json = iiif::serialize(&annotation, IiifVersion::V3, &resolver)?;
//! let (fields, tags) = iiif::deserialize(&json, &resolver)?;
//! ```

mod context;
mod error;
mod list;
mod types;
pub mod v2;
pub mod v3;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::annotations::{Annotation, AnnotationFields};

pub use context::{canvas_pid_from_uri, Resolver, ANNOTATION_CONTEXT, MEDIA_FRAGMENTS, V2_CONTEXT, V3_CONTEXT};
pub use error::{IiifError, Result};
pub use list::{annotation_list, annotation_page, deserialize_list, deserialize_page, AnnotationList, AnnotationPage};
pub use types::{OneOrMany, Stylesheet};

/// Presentation API version of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IiifVersion {
    #[default]
    V2,
    V3,
}

impl IiifVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V2 => "v2",
            Self::V3 => "v3",
        }
    }

    /// Version a document declares through its `@context`
    pub fn of_document(value: &Value) -> Self {
        let declares_v2 = |context: &Value| {
            context
                .as_str()
                .map(|c| c.contains("2/context.json"))
                .unwrap_or(false)
        };
        match value.get("@context") {
            Some(Value::Array(contexts)) if contexts.iter().any(declares_v2) => Self::V2,
            Some(context) if declares_v2(context) => Self::V2,
            _ => Self::V3,
        }
    }
}

impl fmt::Display for IiifVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IiifVersion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v2" | "2" => Ok(Self::V2),
            "v3" | "3" => Ok(Self::V3),
            other => Err(format!("unknown IIIF version '{}'", other)),
        }
    }
}

/// Serialize an annotation in the requested version
pub fn serialize(annotation: &Annotation, version: IiifVersion, resolver: &Resolver) -> Result<Value> {
    match version {
        IiifVersion::V2 => v2::serialize(annotation, resolver),
        IiifVersion::V3 => v3::serialize(annotation, resolver),
    }
}

/// Deserialize a client document of either version
pub fn deserialize(value: &Value, resolver: &Resolver) -> Result<(AnnotationFields, Vec<String>)> {
    match IiifVersion::of_document(value) {
        IiifVersion::V2 => v2::deserialize(value, resolver),
        IiifVersion::V3 => v3::deserialize(value, resolver),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{Account, Bounds, Canvas, MemoryStore, Owner, Selector, TextFormat};
    use serde_json::json;

    #[test]
    fn test_version_dispatch() {
        assert_eq!(IiifVersion::of_document(&json!({"@context": V2_CONTEXT})), IiifVersion::V2);
        assert_eq!(
            IiifVersion::of_document(&json!({"@context": [ANNOTATION_CONTEXT, V2_CONTEXT]})),
            IiifVersion::V2
        );
        assert_eq!(IiifVersion::of_document(&json!({"@context": ANNOTATION_CONTEXT})), IiifVersion::V3);
        assert_eq!(IiifVersion::of_document(&json!({"type": "Annotation"})), IiifVersion::V3);
    }

    #[test]
    fn test_version_from_str() {
        assert_eq!("V3".parse::<IiifVersion>().unwrap(), IiifVersion::V3);
        assert_eq!("2".parse::<IiifVersion>().unwrap(), IiifVersion::V2);
        assert!("v4".parse::<IiifVersion>().is_err());
    }

    #[test]
    fn test_dispatch_round_trip() {
        let store = MemoryStore::new();
        store.add_canvas(Canvas::new("p1", "m1", 1, "https://images.example/iiif/2/p1"));
        store.add_account(Account::new("zaphod", "Zaphod Beeblebrox"));
        let resolver = Resolver::new("https://readux.example", &store);
        let annotation = Annotation::new("p1", Owner::Human("zaphod".into()), Selector::Fragment, Bounds::new(1.0, 2.0, 3.0, 4.0))
            .with_content("<b>bold</b>", TextFormat::Html);

        for version in [IiifVersion::V2, IiifVersion::V3] {
            let json = serialize(&annotation, version, &resolver).unwrap();
            let (fields, _) = deserialize(&json, &resolver).unwrap();
            assert_eq!(fields, annotation.fields());
        }
    }
}

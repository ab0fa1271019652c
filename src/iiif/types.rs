//! Wire helpers shared by both presentation versions

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .expect("valid regex")
});

/// A JSON value that may be a single item or an array of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Single item when `items` has exactly one element
    pub fn from_vec(mut items: Vec<T>) -> Self {
        if items.len() == 1 {
            if let Some(item) = items.pop() {
                return Self::One(item);
            }
        }
        Self::Many(items)
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::One(item) => std::slice::from_ref(item),
            Self::Many(items) => items,
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

/// `stylesheet` member of an annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stylesheet {
    #[serde(rename = "type", alias = "@type", default = "css_stylesheet")]
    pub kind: String,
    pub value: String,
}

fn css_stylesheet() -> String {
    "CssStylesheet".to_string()
}

impl Stylesheet {
    pub fn css(value: &str) -> Self {
        Self {
            kind: css_stylesheet(),
            value: value.to_string(),
        }
    }
}

/// Point every UUID in a style at the annotation that owns it
pub(crate) fn own_style(style: &str, id: Uuid) -> String {
    UUID_RE.replace_all(style, id.to_string()).into_owned()
}

/// Annotation id from `@id`/`id`: a bare UUID, `#uuid`, or a URI ending in one
pub(crate) fn parse_annotation_id(value: &str) -> Option<Uuid> {
    let tail = value
        .rsplit(|c: char| c == '/' || c == '#')
        .find(|segment| !segment.is_empty())?;
    Uuid::parse_str(tail).ok()
}

//! Canonical annotation types
//!
//! Version-neutral records that both IIIF serializers map onto. OCR words
//! and user annotations share the same shape; the owner tells them apart.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::selector::{Bounds, Selector};
use crate::html::{compute_rendered_span, plain_text_lossy};
use crate::ocr::{Granularity, OcrWord};

/// Account username; opaque to this crate
pub type UserId = String;

/// Who an annotation belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "username", rename_all = "snake_case")]
pub enum Owner {
    /// A user account
    Human(UserId),
    /// Machine-generated OCR text
    SyntheticOcr,
}

impl Owner {
    /// Name and id the OCR owner is published under
    pub const OCR_SENTINEL: &'static str = "OCR";

    pub fn is_ocr(&self) -> bool {
        matches!(self, Self::SyntheticOcr)
    }

    /// Whether a published creator id or name denotes the OCR owner.
    /// Exact match, so an account named `ocr` stays a human.
    pub fn is_ocr_sentinel(value: &str) -> bool {
        value == Self::OCR_SENTINEL
    }
}

/// User account as seen by the serializers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: UserId,
    /// Display name; may be empty
    pub name: String,
}

impl Account {
    pub fn new(username: &str, name: &str) -> Self {
        Self {
            username: username.to_string(),
            name: name.to_string(),
        }
    }

    /// Name published in `annotatedBy` / `creator`
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.username
        } else {
            &self.name
        }
    }
}

/// One page of a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Canvas {
    pub pid: String,
    pub manifest_pid: String,
    /// Position in the manifest, starting at 1
    pub position: u32,
    /// Image service id used as the v3 target source
    pub resource_id: String,
    /// Granularity override for this canvas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granularity: Option<Granularity>,
    /// Path of the raw OCR file, relative to the OCR source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_file_path: Option<String>,
}

impl Canvas {
    pub fn new(pid: &str, manifest_pid: &str, position: u32, resource_id: &str) -> Self {
        Self {
            pid: pid.to_string(),
            manifest_pid: manifest_pid.to_string(),
            position,
            resource_id: resource_id.to_string(),
            granularity: None,
            ocr_file_path: None,
        }
    }

    pub fn with_ocr_file(mut self, path: &str) -> Self {
        self.ocr_file_path = Some(path.to_string());
        self
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = Some(granularity);
        self
    }
}

/// Kind of body text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// Recognized text
    Ocr,
    /// Free-form user text
    Text,
}

impl ResourceType {
    /// IIIF v2 resource `@type`
    pub fn v2_type(&self) -> &'static str {
        match self {
            Self::Ocr => "cnt:ContentAsText",
            Self::Text => "dctypes:Text",
        }
    }

    pub fn from_v2_type(value: &str) -> Option<Self> {
        match value {
            "cnt:ContentAsText" => Some(Self::Ocr),
            "dctypes:Text" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Web Annotation motivations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Assessing,
    Bookmarking,
    Classifying,
    #[default]
    Commenting,
    Describing,
    Editing,
    Highlighting,
    Identifying,
    Linking,
    Moderating,
    Painting,
    Questioning,
    Replying,
    Supplementing,
    Tagging,
}

impl Purpose {
    pub const ALL: [Purpose; 15] = [
        Self::Assessing,
        Self::Bookmarking,
        Self::Classifying,
        Self::Commenting,
        Self::Describing,
        Self::Editing,
        Self::Highlighting,
        Self::Identifying,
        Self::Linking,
        Self::Moderating,
        Self::Painting,
        Self::Questioning,
        Self::Replying,
        Self::Supplementing,
        Self::Tagging,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Assessing => "assessing",
            Self::Bookmarking => "bookmarking",
            Self::Classifying => "classifying",
            Self::Commenting => "commenting",
            Self::Describing => "describing",
            Self::Editing => "editing",
            Self::Highlighting => "highlighting",
            Self::Identifying => "identifying",
            Self::Linking => "linking",
            Self::Moderating => "moderating",
            Self::Painting => "painting",
            Self::Questioning => "questioning",
            Self::Replying => "replying",
            Self::Supplementing => "supplementing",
            Self::Tagging => "tagging",
        }
    }

    /// Parse a motivation, accepting the `oa:` and `sc:` prefixes
    pub fn from_name(value: &str) -> Option<Self> {
        let name = value
            .strip_prefix("oa:")
            .or_else(|| value.strip_prefix("sc:"))
            .unwrap_or(value);
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Media type of the body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextFormat {
    #[default]
    Plain,
    Html,
}

impl TextFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Plain => "text/plain",
            Self::Html => "text/html",
        }
    }

    pub fn from_mime(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text/plain" => Some(Self::Plain),
            "text/html" => Some(Self::Html),
            _ => None,
        }
    }
}

/// A persisted annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: Uuid,
    /// Owning canvas pid
    pub canvas: String,
    pub owner: Owner,
    /// Pixel box; computed for Range selectors
    pub bounds: Bounds,
    /// Reading order of OCR words, starting at 1; 0 for user annotations
    pub order: u32,
    /// Body text, HTML or plain
    pub content: String,
    pub resource_type: ResourceType,
    pub purpose: Purpose,
    pub format: TextFormat,
    pub language: String,
    pub selector: Selector,
    /// CSS rules published as the annotation stylesheet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Version-neutral result of deserializing an annotation document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationFields {
    /// Id carried by the document, if any
    pub id: Option<Uuid>,
    pub canvas: String,
    pub owner: Owner,
    pub bounds: Bounds,
    pub content: String,
    /// Plain text of `content`
    pub raw_content: String,
    pub resource_type: ResourceType,
    pub purpose: Purpose,
    pub format: TextFormat,
    pub language: String,
    pub selector: Selector,
    pub style: Option<String>,
}

/// Identity used to make OCR ingestion idempotent
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeometryKey {
    canvas: String,
    bounds: [u64; 4],
    owner: Owner,
}

impl GeometryKey {
    pub fn new(canvas: &str, bounds: &Bounds, owner: &Owner) -> Self {
        // + 0.0 folds -0.0 into 0.0
        let bits = |v: f64| (v + 0.0).to_bits();
        Self {
            canvas: canvas.to_string(),
            bounds: [bits(bounds.x), bits(bounds.y), bits(bounds.w), bits(bounds.h)],
            owner: owner.clone(),
        }
    }
}

impl Annotation {
    /// Create a user or OCR annotation with default body attributes
    pub fn new(canvas: &str, owner: Owner, selector: Selector, bounds: Bounds) -> Self {
        let now = Utc::now();
        let (resource_type, purpose) = match owner {
            Owner::SyntheticOcr => (ResourceType::Ocr, Purpose::Supplementing),
            Owner::Human(_) => (ResourceType::Text, Purpose::Commenting),
        };
        Self {
            id: Uuid::new_v4(),
            canvas: canvas.to_string(),
            owner,
            bounds,
            order: 0,
            content: String::new(),
            resource_type,
            purpose,
            format: TextFormat::Plain,
            language: "en".to_string(),
            selector,
            style: None,
            tags: Vec::new(),
            created_at: now,
            modified_at: now,
        }
    }

    /// OCR annotation for a recognized word, with its rendered span
    pub fn ocr_word(id: Uuid, canvas: &str, word: &OcrWord, language: &str) -> Self {
        let bounds = Bounds::new(word.x as f64, word.y as f64, word.w as f64, word.h as f64);
        let mut annotation = Self::new(canvas, Owner::SyntheticOcr, Selector::Fragment, bounds)
            .with_language(language);
        annotation.id = id;
        annotation.order = word.order;
        annotation.render_ocr_content(&word.content);
        annotation
    }

    /// Re-wrap OCR text in its letter-spacing span
    pub fn render_ocr_content(&mut self, text: &str) {
        let rendered = compute_rendered_span(self.id, text, self.bounds.w, self.bounds.h);
        self.content = rendered.html;
        self.style = Some(rendered.style);
        self.format = TextFormat::Html;
    }

    pub fn with_content(mut self, content: &str, format: TextFormat) -> Self {
        self.content = content.to_string();
        self.format = format;
        self
    }

    pub fn with_purpose(mut self, purpose: Purpose) -> Self {
        self.purpose = purpose;
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn with_style(mut self, style: &str) -> Self {
        self.style = Some(style.to_string());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_ocr(&self) -> bool {
        self.owner.is_ocr()
    }

    /// Plain text of the body
    pub fn raw_content(&self) -> String {
        plain_text_lossy(&self.content)
    }

    pub fn geometry_key(&self) -> GeometryKey {
        GeometryKey::new(&self.canvas, &self.bounds, &self.owner)
    }

    /// Version-neutral projection, comparable with deserialized documents
    pub fn fields(&self) -> AnnotationFields {
        AnnotationFields {
            id: Some(self.id),
            canvas: self.canvas.clone(),
            owner: self.owner.clone(),
            bounds: self.bounds,
            content: self.content.clone(),
            raw_content: self.raw_content(),
            resource_type: self.resource_type,
            purpose: self.purpose,
            format: self.format,
            language: self.language.clone(),
            selector: self.selector.clone(),
            style: self.style.clone(),
        }
    }

    /// Overwrite body, geometry and selector from deserialized fields
    pub fn apply(&mut self, fields: &AnnotationFields, now: DateTime<Utc>) {
        self.bounds = fields.bounds;
        self.content = fields.content.clone();
        self.resource_type = fields.resource_type;
        self.purpose = fields.purpose;
        self.format = fields.format;
        self.language = fields.language.clone();
        self.selector = fields.selector.clone();
        self.style = fields.style.clone();
        self.modified_at = now;
    }
}

impl AnnotationFields {
    /// New annotation from deserialized fields
    pub fn into_annotation(self, now: DateTime<Utc>) -> Annotation {
        let mut annotation = Annotation::new(&self.canvas, self.owner.clone(), self.selector.clone(), self.bounds);
        annotation.id = self.id.unwrap_or(annotation.id);
        annotation.created_at = now;
        annotation.apply(&self, now);
        annotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purpose_names() {
        assert_eq!(Purpose::from_name("oa:commenting"), Some(Purpose::Commenting));
        assert_eq!(Purpose::from_name("sc:painting"), Some(Purpose::Painting));
        assert_eq!(Purpose::from_name("tagging"), Some(Purpose::Tagging));
        assert_eq!(Purpose::from_name("oa:shouting"), None);
        for purpose in Purpose::ALL {
            assert_eq!(Purpose::from_name(purpose.name()), Some(purpose));
        }
    }

    #[test]
    fn test_ocr_sentinel() {
        assert!(Owner::is_ocr_sentinel("OCR"));
        assert!(!Owner::is_ocr_sentinel("ocr"));
        assert!(!Owner::is_ocr_sentinel(" OCR"));
        assert!(!Owner::is_ocr_sentinel("ocrbot"));
    }

    #[test]
    fn test_account_display_name() {
        assert_eq!(Account::new("zaphod", "Zaphod Beeblebrox").display_name(), "Zaphod Beeblebrox");
        assert_eq!(Account::new("zaphod", " ").display_name(), "zaphod");
    }

    #[test]
    fn test_ocr_word_annotation() {
        let word = OcrWord {
            content: "Distillery".to_string(),
            x: 523,
            y: 116,
            w: 151,
            h: 45,
            order: 7,
        };
        let id = Uuid::new_v4();
        let annotation = Annotation::ocr_word(id, "p1", &word, "en");

        assert_eq!(annotation.id, id);
        assert_eq!(annotation.order, 7);
        assert_eq!(annotation.resource_type, ResourceType::Ocr);
        assert_eq!(annotation.purpose, Purpose::Supplementing);
        assert_eq!(annotation.format, TextFormat::Html);
        assert!(annotation.content.contains(&format!("id='{}'", id)));
        assert_eq!(annotation.raw_content(), "Distillery");
        assert!(annotation.style.as_deref().unwrap().contains("width: 151px"));
    }

    #[test]
    fn test_geometry_key_ignores_id() {
        let a = Annotation::new("p1", Owner::SyntheticOcr, Selector::Fragment, Bounds::new(1.0, 2.0, 3.0, 4.0));
        let b = Annotation::new("p1", Owner::SyntheticOcr, Selector::Fragment, Bounds::new(1.0, 2.0, 3.0, 4.0));
        let c = Annotation::new("p1", Owner::Human("u".into()), Selector::Fragment, Bounds::new(1.0, 2.0, 3.0, 4.0));
        assert_ne!(a.id, b.id);
        assert_eq!(a.geometry_key(), b.geometry_key());
        assert_ne!(a.geometry_key(), c.geometry_key());
    }

    #[test]
    fn test_fields_round_trip_through_into_annotation() {
        let original = Annotation::new("p1", Owner::Human("u".into()), Selector::Fragment, Bounds::new(1.0, 2.0, 3.0, 4.0))
            .with_content("<p>note</p>", TextFormat::Html)
            .with_purpose(Purpose::Describing);
        let rebuilt = original.fields().into_annotation(Utc::now());
        assert_eq!(rebuilt.fields(), original.fields());
    }

    #[test]
    fn test_annotation_serialization() {
        let annotation = Annotation::new("p1", Owner::Human("u".into()), Selector::Fragment, Bounds::default());
        let json = serde_json::to_string_pretty(&annotation).unwrap();
        assert!(json.contains("\"resourceType\": \"text\""));
        assert!(json.contains("\"kind\": \"human\""));
    }
}

//! W3C Web Annotation documents (IIIF Presentation 3)
//!
//! The first body always carries the annotation content and its creator;
//! any further bodies with purpose `tagging` are tags.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::annotations::{
    id_from_xpath, xpath_for, Annotation, AnnotationFields, Bounds, FragmentUnit, Owner, Purpose,
    RangeSelector, ResourceType, Selector, SelectorKind, TextFormat,
};
use crate::html::{is_html, plain_text_lossy};

use super::context::{Resolver, ANNOTATION_CONTEXT, MEDIA_FRAGMENTS};
use super::error::{IiifError, Result};
use super::types::{own_style, parse_annotation_id, OneOrMany, Stylesheet};

// ============================================
// Wire types
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebAnnotation {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<OneOrMany<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default = "annotation_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivation: Option<OneOrMany<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<OneOrMany<TextualBody>>,
    pub target: WebTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stylesheet: Option<Stylesheet>,
}

fn annotation_type() -> String {
    "Annotation".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextualBody {
    #[serde(rename = "type", default = "textual_body")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<Creator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

fn textual_body() -> String {
    "TextualBody".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creator {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebTarget {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<WebSelector>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSelector {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conforms_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refined_by: Option<Box<WebSelector>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_selector: Option<Box<WebSelector>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_selector: Option<Box<WebSelector>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u32>,
}

impl WebSelector {
    fn typed(kind: SelectorKind, value: Option<String>) -> Self {
        Self {
            kind: kind.name().to_string(),
            value,
            ..Self::default()
        }
    }

    fn fragment(bounds: &Bounds) -> Self {
        Self {
            conforms_to: Some(MEDIA_FRAGMENTS.to_string()),
            ..Self::typed(SelectorKind::Fragment, Some(bounds.fragment(FragmentUnit::Pixel)))
        }
    }
}

// ============================================
// Serialization
// ============================================

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn target_selector(annotation: &Annotation) -> WebSelector {
    match &annotation.selector {
        Selector::Fragment => WebSelector::fragment(&annotation.bounds),
        Selector::Svg { svg } => WebSelector {
            refined_by: Some(Box::new(WebSelector::fragment(&annotation.bounds))),
            ..WebSelector::typed(SelectorKind::Svg, Some(svg.clone()))
        },
        Selector::Range(range) => WebSelector {
            start_selector: Some(Box::new(WebSelector {
                refined_by: Some(Box::new(WebSelector {
                    start: Some(range.start_offset),
                    ..WebSelector::typed(SelectorKind::TextPosition, None)
                })),
                ..WebSelector::typed(SelectorKind::XPath, Some(xpath_for(range.start)))
            })),
            end_selector: Some(Box::new(WebSelector {
                refined_by: Some(Box::new(WebSelector {
                    end: Some(range.end_offset),
                    ..WebSelector::typed(SelectorKind::TextPosition, None)
                })),
                ..WebSelector::typed(SelectorKind::XPath, Some(xpath_for(range.end)))
            })),
            ..WebSelector::typed(SelectorKind::Range, None)
        },
    }
}

/// Typed v3 document for an annotation
pub fn to_document(annotation: &Annotation, resolver: &Resolver) -> Result<WebAnnotation> {
    let canvas = resolver.canvas(&annotation.canvas)?;

    let creator = match &annotation.owner {
        Owner::SyntheticOcr => Creator {
            id: Owner::OCR_SENTINEL.to_string(),
            name: Some(Owner::OCR_SENTINEL.to_string()),
        },
        Owner::Human(username) => Creator {
            id: username.clone(),
            name: Some(resolver.owner_name(&annotation.owner)),
        },
    };
    let created = timestamp(&annotation.created_at);
    let modified = timestamp(&annotation.modified_at);

    let mut bodies = vec![TextualBody {
        kind: textual_body(),
        value: Some(annotation.content.clone()),
        format: Some(annotation.format.mime().to_string()),
        language: Some(annotation.language.clone()),
        purpose: Some(annotation.purpose.name().to_string()),
        creator: Some(creator.clone()),
        created: Some(created.clone()),
        modified: Some(modified.clone()),
    }];
    bodies.extend(annotation.tags.iter().map(|tag| TextualBody {
        kind: textual_body(),
        value: Some(tag.clone()),
        format: Some(TextFormat::Plain.mime().to_string()),
        language: None,
        purpose: Some(Purpose::Tagging.name().to_string()),
        creator: Some(creator.clone()),
        created: Some(created.clone()),
        modified: Some(modified.clone()),
    }));

    Ok(WebAnnotation {
        context: Some(OneOrMany::One(ANNOTATION_CONTEXT.to_string())),
        id: Some(format!("#{}", annotation.id)),
        kind: annotation_type(),
        motivation: Some(OneOrMany::One(annotation.purpose.name().to_string())),
        body: Some(OneOrMany::Many(bodies)),
        target: WebTarget {
            source: canvas.resource_id.clone(),
            selector: Some(target_selector(annotation)),
        },
        stylesheet: annotation.style.as_deref().map(Stylesheet::css),
    })
}

/// Serialize an annotation as a Web Annotation
pub fn serialize(annotation: &Annotation, resolver: &Resolver) -> Result<Value> {
    Ok(serde_json::to_value(to_document(annotation, resolver)?)?)
}

// ============================================
// Deserialization
// ============================================

fn fragment_bounds(value: &str) -> Result<Bounds> {
    Bounds::parse_fragment(value).ok_or_else(|| IiifError::InvalidFragment(value.to_string()))
}

fn range_selector(selector: &WebSelector) -> Result<RangeSelector> {
    let start = selector
        .start_selector
        .as_deref()
        .ok_or(IiifError::MissingField("target.selector.startSelector"))?;
    let end = selector
        .end_selector
        .as_deref()
        .ok_or(IiifError::MissingField("target.selector.endSelector"))?;

    let boundary = |s: &WebSelector| -> Result<uuid::Uuid> {
        let value = s.value.as_deref().unwrap_or("");
        id_from_xpath(value)
            .ok_or_else(|| IiifError::SelectorMismatch(format!("no annotation id in '{}'", value)))
    };

    Ok(RangeSelector {
        start: boundary(start)?,
        end: boundary(end)?,
        start_offset: start
            .refined_by
            .as_ref()
            .and_then(|r| r.start)
            .ok_or(IiifError::MissingField("startSelector.refinedBy.start"))?,
        end_offset: end
            .refined_by
            .as_ref()
            .and_then(|r| r.end)
            .ok_or(IiifError::MissingField("endSelector.refinedBy.end"))?,
    })
}

fn read_selector(selector: &WebSelector, canvas: &str, resolver: &Resolver) -> Result<(Selector, Bounds)> {
    let kind = SelectorKind::from_type_name(&selector.kind)
        .ok_or_else(|| IiifError::UnknownSelectorType(selector.kind.clone()))?;

    match kind {
        SelectorKind::Fragment => {
            let value = selector
                .value
                .as_deref()
                .ok_or(IiifError::MissingField("target.selector.value"))?;
            Ok((Selector::Fragment, fragment_bounds(value)?))
        }
        SelectorKind::Svg => {
            let svg = selector
                .value
                .clone()
                .filter(|svg| !svg.trim().is_empty())
                .ok_or(IiifError::MissingField("target.selector.value"))?;
            let bounds = match selector.refined_by.as_ref().and_then(|r| r.value.as_deref()) {
                Some(value) => fragment_bounds(value)?,
                None => Bounds::default(),
            };
            Ok((Selector::Svg { svg }, bounds))
        }
        SelectorKind::Range => {
            let range = range_selector(selector)?;
            let bounds = resolver.range_geometry(canvas, &range)?;
            Ok((Selector::Range(range), bounds))
        }
        other => Err(IiifError::UnsupportedSelector(other)),
    }
}

/// Canonical fields and tags from a typed v3 document
pub fn from_document(doc: WebAnnotation, resolver: &Resolver) -> Result<(AnnotationFields, Vec<String>)> {
    let mut bodies = doc.body.map(OneOrMany::into_vec).unwrap_or_default().into_iter();
    let content_body = bodies.next().ok_or(IiifError::MissingField("body"))?;

    let creator = content_body
        .creator
        .as_ref()
        .ok_or(IiifError::MissingField("body.creator"))?;
    let owner = resolver.owner_by_id(&creator.id)?;
    let canvas = resolver.canvas_for_uri(&doc.target.source)?;

    let mut tags = Vec::new();
    for body in bodies {
        if body.purpose.as_deref() == Some(Purpose::Tagging.name()) {
            tags.extend(body.value);
        } else {
            tracing::debug!("Ignoring extra body with purpose {:?}", body.purpose);
        }
    }

    let motivations = doc.motivation.map(OneOrMany::into_vec).unwrap_or_default();
    let declared = motivations
        .iter()
        .find(|m| m.as_str() != Purpose::Tagging.name())
        .or_else(|| motivations.first())
        .or(content_body.purpose.as_ref());
    let purpose = match declared {
        Some(m) => Purpose::from_name(m).ok_or_else(|| IiifError::UnknownMotivation(m.clone()))?,
        None => Purpose::default(),
    };

    let (resource_type, purpose) = match owner {
        Owner::SyntheticOcr => (ResourceType::Ocr, Purpose::Supplementing),
        Owner::Human(_) => (ResourceType::Text, purpose),
    };

    let content = content_body.value.clone().unwrap_or_default();
    let format = match content_body.format.as_deref() {
        Some(mime) => TextFormat::from_mime(mime).ok_or_else(|| IiifError::InvalidField {
            field: "body.format",
            value: mime.to_string(),
        })?,
        None if is_html(&content) => TextFormat::Html,
        None => TextFormat::Plain,
    };
    let language = content_body.language.clone().unwrap_or_else(|| "en".to_string());

    let selector = doc
        .target
        .selector
        .as_ref()
        .ok_or(IiifError::MissingField("target.selector"))?;
    let (selector, bounds) = read_selector(selector, &canvas.pid, resolver)?;

    let id = doc.id.as_deref().and_then(parse_annotation_id);
    let style = doc.stylesheet.map(|sheet| match id {
        Some(id) => own_style(&sheet.value, id),
        None => sheet.value,
    });

    let fields = AnnotationFields {
        id,
        canvas: canvas.pid,
        owner,
        bounds,
        raw_content: plain_text_lossy(&content),
        content,
        resource_type,
        purpose,
        format,
        language,
        selector,
        style,
    };
    Ok((fields, tags))
}

/// Deserialize a Web Annotation into canonical fields and tags
pub fn deserialize(value: &Value, resolver: &Resolver) -> Result<(AnnotationFields, Vec<String>)> {
    let doc: WebAnnotation = serde_json::from_value(value.clone())?;
    from_document(doc, resolver)
}

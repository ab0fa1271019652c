//! IIIF Presentation 2.1 annotations (`oa:Annotation`)
//!
//! The canvas selector is always published as an outer fragment selector
//! whose `item` carries the operative Fragment, SVG or Range selector.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::annotations::{
    id_from_xpath, xpath_for, Annotation, AnnotationFields, Bounds, FragmentUnit, Owner, Purpose,
    RangeSelector, ResourceType, Selector, SelectorKind, TextFormat,
};
use crate::html::{is_html, plain_text_lossy};

use super::context::{Resolver, V2_CONTEXT};
use super::error::{IiifError, Result};
use super::types::{own_style, parse_annotation_id, OneOrMany, Stylesheet};

const TAG_TYPE: &str = "oa:Tag";
const TAGGING: &str = "oa:tagging";

// ============================================
// Wire types
// ============================================

/// `oa:Annotation` document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct V2Annotation {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<OneOrMany<String>>,
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "@type", default = "annotation_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivation: Option<OneOrMany<String>>,
    #[serde(rename = "annotatedBy", default, skip_serializing_if = "Option::is_none")]
    pub annotated_by: Option<V2Agent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<OneOrMany<V2Resource>>,
    pub on: V2Target,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stylesheet: Option<Stylesheet>,
}

fn annotation_type() -> String {
    "oa:Annotation".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct V2Agent {
    pub name: String,
}

/// Body entry: content or an `oa:Tag`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct V2Resource {
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chars: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct V2Target {
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub full: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub within: Option<V2Within>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<V2Selector>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct V2Within {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: String,
}

/// Any selector shape that appears under `on.selector`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct V2Selector {
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Box<V2Selector>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Box<V2Selector>>,
    #[serde(rename = "startSelector", default, skip_serializing_if = "Option::is_none")]
    pub start_selector: Option<Box<V2Selector>>,
    #[serde(rename = "endSelector", default, skip_serializing_if = "Option::is_none")]
    pub end_selector: Option<Box<V2Selector>>,
    #[serde(rename = "refinedBy", default, skip_serializing_if = "Option::is_none")]
    pub refined_by: Option<Box<V2Selector>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u32>,
}

impl V2Selector {
    fn typed(kind: SelectorKind, value: Option<String>) -> Self {
        Self {
            kind: format!("oa:{}", kind.name()),
            value,
            ..Self::default()
        }
    }

    fn fragment(bounds: &Bounds) -> Self {
        Self::typed(SelectorKind::Fragment, Some(bounds.fragment(FragmentUnit::Implicit)))
    }
}

// ============================================
// Serialization
// ============================================

/// v2 motivation for a purpose
pub fn motivation(purpose: Purpose) -> String {
    match purpose {
        Purpose::Painting => "sc:painting".to_string(),
        other => format!("oa:{}", other.name()),
    }
}

fn selector_item(annotation: &Annotation) -> V2Selector {
    match &annotation.selector {
        Selector::Fragment => V2Selector::fragment(&annotation.bounds),
        Selector::Svg { svg } => V2Selector {
            default: Some(Box::new(V2Selector::fragment(&annotation.bounds))),
            ..V2Selector::typed(SelectorKind::Svg, Some(svg.clone()))
        },
        Selector::Range(range) => V2Selector {
            start_selector: Some(Box::new(V2Selector {
                refined_by: Some(Box::new(V2Selector {
                    start: Some(range.start_offset),
                    ..V2Selector::typed(SelectorKind::TextPosition, None)
                })),
                ..V2Selector::typed(SelectorKind::XPath, Some(xpath_for(range.start)))
            })),
            end_selector: Some(Box::new(V2Selector {
                refined_by: Some(Box::new(V2Selector {
                    end: Some(range.end_offset),
                    ..V2Selector::typed(SelectorKind::TextPosition, None)
                })),
                ..V2Selector::typed(SelectorKind::XPath, Some(xpath_for(range.end)))
            })),
            ..V2Selector::typed(SelectorKind::Range, None)
        },
    }
}

/// Typed v2 document for an annotation
pub fn to_document(annotation: &Annotation, resolver: &Resolver) -> Result<V2Annotation> {
    let canvas = resolver.canvas(&annotation.canvas)?;

    let primary = if annotation.is_ocr() {
        motivation(Purpose::Painting)
    } else {
        motivation(annotation.purpose)
    };
    let mut motivations = vec![primary];
    if !annotation.tags.is_empty() && !motivations.iter().any(|m| m == TAGGING) {
        motivations.push(TAGGING.to_string());
    }

    let mut resources = vec![V2Resource {
        kind: annotation.resource_type.v2_type().to_string(),
        format: Some(annotation.format.mime().to_string()),
        chars: Some(annotation.content.clone()),
        language: Some(annotation.language.clone()),
    }];
    resources.extend(annotation.tags.iter().map(|tag| V2Resource {
        kind: TAG_TYPE.to_string(),
        format: None,
        chars: Some(tag.clone()),
        language: None,
    }));

    Ok(V2Annotation {
        context: Some(OneOrMany::One(V2_CONTEXT.to_string())),
        id: Some(annotation.id.to_string()),
        kind: annotation_type(),
        motivation: Some(OneOrMany::from_vec(motivations)),
        annotated_by: Some(V2Agent {
            name: resolver.owner_name(&annotation.owner),
        }),
        resource: Some(OneOrMany::from_vec(resources)),
        on: V2Target {
            kind: Some("oa:SpecificResource".to_string()),
            full: resolver.canvas_uri(&canvas),
            within: Some(V2Within {
                id: resolver.manifest_uri(&canvas.manifest_pid),
                kind: "sc:Manifest".to_string(),
            }),
            selector: Some(V2Selector {
                item: Some(Box::new(selector_item(annotation))),
                ..V2Selector::fragment(&annotation.bounds)
            }),
        },
        stylesheet: annotation.style.as_deref().map(Stylesheet::css),
    })
}

/// Serialize an annotation as a v2 `oa:Annotation`
pub fn serialize(annotation: &Annotation, resolver: &Resolver) -> Result<Value> {
    Ok(serde_json::to_value(to_document(annotation, resolver)?)?)
}

// ============================================
// Deserialization
// ============================================

fn fragment_bounds(value: &str) -> Result<Bounds> {
    Bounds::parse_fragment(value).ok_or_else(|| IiifError::InvalidFragment(value.to_string()))
}

fn range_selector(item: &V2Selector) -> Result<RangeSelector> {
    let start = item
        .start_selector
        .as_deref()
        .ok_or(IiifError::MissingField("on.selector.item.startSelector"))?;
    let end = item
        .end_selector
        .as_deref()
        .ok_or(IiifError::MissingField("on.selector.item.endSelector"))?;

    let boundary = |selector: &V2Selector| -> Result<uuid::Uuid> {
        let value = selector.value.as_deref().unwrap_or("");
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

/// Selector and bounds from `on.selector`
fn read_selector(outer: &V2Selector, canvas: &str, resolver: &Resolver) -> Result<(Selector, Bounds)> {
    let item = outer.item.as_deref().unwrap_or(outer);
    let kind = SelectorKind::from_type_name(&item.kind)
        .ok_or_else(|| IiifError::UnknownSelectorType(item.kind.clone()))?;

    match kind {
        SelectorKind::Fragment => {
            let value = item
                .value
                .as_deref()
                .or(outer.value.as_deref())
                .ok_or(IiifError::MissingField("on.selector.value"))?;
            Ok((Selector::Fragment, fragment_bounds(value)?))
        }
        SelectorKind::Svg => {
            let svg = item
                .value
                .clone()
                .filter(|svg| !svg.trim().is_empty())
                .ok_or(IiifError::MissingField("on.selector.item.value"))?;
            let fragment = outer
                .value
                .as_deref()
                .filter(|_| outer.item.is_some())
                .or_else(|| item.default.as_ref().and_then(|d| d.value.as_deref()));
            let bounds = match fragment {
                Some(value) => fragment_bounds(value)?,
                None => Bounds::default(),
            };
            Ok((Selector::Svg { svg }, bounds))
        }
        SelectorKind::Range => {
            let range = range_selector(item)?;
            let bounds = resolver.range_geometry(canvas, &range)?;
            Ok((Selector::Range(range), bounds))
        }
        other => Err(IiifError::UnsupportedSelector(other)),
    }
}

/// Canonical fields and tags from a typed v2 document
pub fn from_document(doc: V2Annotation, resolver: &Resolver) -> Result<(AnnotationFields, Vec<String>)> {
    let name = doc
        .annotated_by
        .as_ref()
        .map(|agent| agent.name.as_str())
        .ok_or(IiifError::MissingField("annotatedBy"))?;
    let owner = resolver.owner_by_name(name)?;
    let canvas = resolver.canvas_for_uri(&doc.on.full)?;

    let mut tags = Vec::new();
    let mut body: Option<V2Resource> = None;
    for resource in doc.resource.map(OneOrMany::into_vec).unwrap_or_default() {
        if resource.kind == TAG_TYPE {
            tags.extend(resource.chars);
        } else if body.is_none() {
            body = Some(resource);
        } else {
            tracing::debug!("Ignoring extra v2 resource of type {}", resource.kind);
        }
    }

    let (content, format, language) = match body {
        Some(resource) => {
            if ResourceType::from_v2_type(&resource.kind).is_none() {
                return Err(IiifError::InvalidField {
                    field: "resource.@type",
                    value: resource.kind.clone(),
                });
            }
            let content = resource.chars.unwrap_or_default();
            let format = match resource.format.as_deref() {
                Some(mime) => TextFormat::from_mime(mime).ok_or_else(|| IiifError::InvalidField {
                    field: "resource.format",
                    value: mime.to_string(),
                })?,
                None if is_html(&content) => TextFormat::Html,
                None => TextFormat::Plain,
            };
            let language = resource.language.unwrap_or_else(|| "en".to_string());
            (content, format, language)
        }
        None => (String::new(), TextFormat::Plain, "en".to_string()),
    };

    let motivations = doc.motivation.map(OneOrMany::into_vec).unwrap_or_default();
    let declared = motivations
        .iter()
        .find(|m| m.as_str() != TAGGING)
        .or_else(|| motivations.first());
    let purpose = match declared {
        Some(m) => Purpose::from_name(m).ok_or_else(|| IiifError::UnknownMotivation(m.clone()))?,
        None => Purpose::default(),
    };

    // OCR is only ever owned by the sentinel; a human body is text whatever its declared type
    let (resource_type, purpose) = match owner {
        Owner::SyntheticOcr => (ResourceType::Ocr, Purpose::Supplementing),
        Owner::Human(_) => (ResourceType::Text, purpose),
    };

    let outer = doc
        .on
        .selector
        .as_ref()
        .ok_or(IiifError::MissingField("on.selector"))?;
    let (selector, bounds) = read_selector(outer, &canvas.pid, resolver)?;

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

/// Deserialize a v2 `oa:Annotation` into canonical fields and tags
pub fn deserialize(value: &Value, resolver: &Resolver) -> Result<(AnnotationFields, Vec<String>)> {
    let doc: V2Annotation = serde_json::from_value(value.clone())?;
    from_document(doc, resolver)
}

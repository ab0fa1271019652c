//! Canvas-level documents: v2 Annotation Lists and v3 Annotation Pages

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::annotations::{Annotation, AnnotationFields, Owner, UserId};

use super::context::{Resolver, V2_CONTEXT, V3_CONTEXT};
use super::error::Result;
use super::{v2, v3};

/// `sc:AnnotationList` for one canvas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationList {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(default)]
    pub resources: Vec<Value>,
}

/// v3 `AnnotationPage` for one canvas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationPage {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub items: Vec<Value>,
}

/// OCR words plus the annotations of the given owners, in canvas order
fn visible(canvas: &str, owners: &[UserId], resolver: &Resolver) -> Result<Vec<Annotation>> {
    let annotations = resolver.annotations().annotations_for_canvas(canvas)?;
    Ok(annotations
        .into_iter()
        .filter(|a| match &a.owner {
            Owner::SyntheticOcr => true,
            Owner::Human(username) => owners.contains(username),
        })
        .collect())
}

/// Annotation List for a canvas
pub fn annotation_list(canvas_pid: &str, owners: &[UserId], resolver: &Resolver) -> Result<Value> {
    let canvas = resolver.canvas(canvas_pid)?;
    let resources = visible(&canvas.pid, owners, resolver)?
        .iter()
        .map(|a| v2::serialize(a, resolver))
        .collect::<Result<Vec<_>>>()?;

    let list = AnnotationList {
        context: V2_CONTEXT.to_string(),
        id: resolver.list_uri(&canvas),
        kind: "sc:AnnotationList".to_string(),
        resources,
    };
    Ok(serde_json::to_value(list)?)
}

/// Annotation Page for a canvas
pub fn annotation_page(canvas_pid: &str, owners: &[UserId], resolver: &Resolver) -> Result<Value> {
    let canvas = resolver.canvas(canvas_pid)?;
    let items = visible(&canvas.pid, owners, resolver)?
        .iter()
        .map(|a| v3::serialize(a, resolver))
        .collect::<Result<Vec<_>>>()?;

    let page = AnnotationPage {
        context: Some(V3_CONTEXT.to_string()),
        id: Some(resolver.page_uri(&canvas)),
        kind: "AnnotationPage".to_string(),
        items,
    };
    Ok(serde_json::to_value(page)?)
}

/// Deserialize every resource of an Annotation List
pub fn deserialize_list(value: &Value, resolver: &Resolver) -> Result<Vec<(AnnotationFields, Vec<String>)>> {
    let list: AnnotationList = serde_json::from_value(value.clone())?;
    list.resources.iter().map(|r| v2::deserialize(r, resolver)).collect()
}

/// Deserialize every item of an Annotation Page
pub fn deserialize_page(value: &Value, resolver: &Resolver) -> Result<Vec<(AnnotationFields, Vec<String>)>> {
    let page: AnnotationPage = serde_json::from_value(value.clone())?;
    page.items.iter().map(|item| v3::deserialize(item, resolver)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{Account, AnnotationStore, Bounds, Canvas, MemoryStore, Selector, TextFormat};
    use crate::iiif::IiifError;

    fn setup() -> (MemoryStore, Vec<Annotation>) {
        let store = MemoryStore::new();
        store.add_canvas(Canvas::new("p1", "m1", 1, "https://images.example/iiif/2/p1"));
        store.add_account(Account::new("zaphod", "Zaphod Beeblebrox"));
        store.add_account(Account::new("trillian", "Tricia McMillan"));

        let mut ocr = Annotation::new("p1", Owner::SyntheticOcr, Selector::Fragment, Bounds::new(1.0, 2.0, 30.0, 16.0));
        ocr.order = 1;
        ocr.render_ocr_content("Towel");
        let mine = Annotation::new("p1", Owner::Human("zaphod".into()), Selector::Fragment, Bounds::new(5.0, 5.0, 5.0, 5.0))
            .with_content("mine", TextFormat::Plain);
        let theirs = Annotation::new("p1", Owner::Human("trillian".into()), Selector::Fragment, Bounds::new(6.0, 6.0, 6.0, 6.0))
            .with_content("theirs", TextFormat::Plain);

        let all = vec![ocr, mine, theirs];
        for annotation in &all {
            store.save(annotation.clone()).unwrap();
        }
        (store, all)
    }

    #[test]
    fn test_annotation_list_shape() {
        let (store, _) = setup();
        let resolver = Resolver::new("https://readux.example", &store);
        let list = annotation_list("p1", &["zaphod".to_string()], &resolver).unwrap();

        assert_eq!(list["@context"], V2_CONTEXT);
        assert_eq!(list["@id"], "https://readux.example/iiif/v2/m1/list/p1");
        assert_eq!(list["@type"], "sc:AnnotationList");
        assert_eq!(list["resources"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_annotation_page_shape() {
        let (store, _) = setup();
        let resolver = Resolver::new("https://readux.example", &store);
        let page = annotation_page("p1", &[], &resolver).unwrap();

        assert_eq!(page["@context"], V3_CONTEXT);
        assert_eq!(page["id"], "https://readux.example/iiif/m1/annotationpage/p1");
        assert_eq!(page["type"], "AnnotationPage");
        let items = page["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["body"][0]["creator"]["id"], "OCR");
    }

    #[test]
    fn test_documents_round_trip() {
        let (store, all) = setup();
        let resolver = Resolver::new("https://readux.example", &store);
        let owners = vec!["zaphod".to_string(), "trillian".to_string()];

        let mut expected: Vec<AnnotationFields> = all.iter().map(Annotation::fields).collect();
        expected.sort_by_key(|f| f.id);

        let mut from_list: Vec<AnnotationFields> =
            deserialize_list(&annotation_list("p1", &owners, &resolver).unwrap(), &resolver)
                .unwrap()
                .into_iter()
                .map(|(fields, _)| fields)
                .collect();
        from_list.sort_by_key(|f| f.id);

        let mut from_page: Vec<AnnotationFields> =
            deserialize_page(&annotation_page("p1", &owners, &resolver).unwrap(), &resolver)
                .unwrap()
                .into_iter()
                .map(|(fields, _)| fields)
                .collect();
        from_page.sort_by_key(|f| f.id);

        assert_eq!(from_list, expected);
        assert_eq!(from_page, expected);
    }

    #[test]
    fn test_unknown_canvas() {
        let (store, _) = setup();
        let resolver = Resolver::new("https://readux.example", &store);
        assert!(matches!(annotation_list("p9", &[], &resolver), Err(IiifError::UnknownCanvas(_))));
    }
}

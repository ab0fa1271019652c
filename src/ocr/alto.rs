//! ALTO parser
//!
//! Streams `TextBlock/TextLine/String` elements with quick-xml. Coordinates
//! use the ALTO top-left origin; both the `HPOS/VPOS/WIDTH/HEIGHT` and the
//! `ulx/uly/lrx/lry` corner forms are read, decimals rounded.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::error::{ParseError, Result};
use super::types::{Granularity, OcrFormat, OcrWord, PixelBox, WordCollector};

/// Parse an ALTO document into words, or lines when `granularity` is `Line`
pub fn parse(text: &str, granularity: Granularity) -> Result<Vec<OcrWord>> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut collector = WordCollector::new(OcrFormat::Alto);
    let mut line: Option<LineBuilder> = None;
    let mut pending: Option<PendingString> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"TextLine" => {
                        line = Some(LineBuilder::new(read_box(&attributes(&e)?)?));
                    }
                    b"String" => {
                        let attrs = attributes(&e)?;
                        let bbox = read_box(&attrs)?;
                        match attrs.get("content") {
                            Some(content) => {
                                emit(content, bbox, granularity, &mut line, &mut collector)
                            }
                            // Text child instead of a CONTENT attribute
                            None => {
                                pending = Some(PendingString {
                                    bbox,
                                    text: String::new(),
                                })
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"String" {
                    let attrs = attributes(&e)?;
                    let bbox = read_box(&attrs)?;
                    let content = attrs.get("content").map(String::as_str).unwrap_or("");
                    emit(content, bbox, granularity, &mut line, &mut collector);
                }
            }
            Event::Text(t) => {
                if let Some(pending) = pending.as_mut() {
                    pending.text.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                match e.local_name().as_ref() {
                    b"String" => {
                        if let Some(p) = pending.take() {
                            emit(&p.text, p.bbox, granularity, &mut line, &mut collector);
                        }
                    }
                    b"TextLine" => {
                        if let Some(builder) = line.take() {
                            if granularity == Granularity::Line {
                                builder.finish(&mut collector);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth > 0 {
        return Err(ParseError::Truncated(OcrFormat::Alto));
    }

    Ok(collector.finish())
}

struct PendingString {
    bbox: Option<PixelBox>,
    text: String,
}

/// Accumulates the strings of one `TextLine`
struct LineBuilder {
    declared: Option<PixelBox>,
    union: Option<PixelBox>,
    parts: Vec<String>,
}

impl LineBuilder {
    fn new(declared: Option<PixelBox>) -> Self {
        Self {
            declared,
            union: None,
            parts: Vec::new(),
        }
    }

    fn add(&mut self, content: &str, bbox: Option<PixelBox>) {
        let content = content.trim();
        if !content.is_empty() {
            self.parts.push(content.to_string());
        }
        if let Some(bbox) = bbox {
            self.union = Some(match self.union {
                Some(current) => current.union(&bbox),
                None => bbox,
            });
        }
    }

    fn finish(self, collector: &mut WordCollector) {
        match self.declared.or(self.union) {
            Some(bbox) => collector.push(&self.parts.join(" "), bbox),
            None => collector.skip(),
        }
    }
}

fn emit(
    content: &str,
    bbox: Option<PixelBox>,
    granularity: Granularity,
    line: &mut Option<LineBuilder>,
    collector: &mut WordCollector,
) {
    match (granularity, line.as_mut()) {
        (Granularity::Line, Some(builder)) => builder.add(content, bbox),
        _ => match bbox {
            Some(bbox) => collector.push(content, bbox),
            None => collector.skip(),
        },
    }
}

/// Attributes keyed by lowercased local name
fn attributes(e: &BytesStart<'_>) -> Result<HashMap<String, String>> {
    let mut attrs = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ParseError::Xml(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_ascii_lowercase();
        let value = attr.unescape_value()?.into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

fn read_box(attrs: &HashMap<String, String>) -> Result<Option<PixelBox>> {
    let get = |name: &str| -> Result<Option<i64>> {
        attrs
            .get(name)
            .map(|value| parse_coordinate(name, value))
            .transpose()
    };

    if let (Some(x), Some(y), Some(w), Some(h)) =
        (get("hpos")?, get("vpos")?, get("width")?, get("height")?)
    {
        return Ok(Some(PixelBox::new(x, y, w, h)));
    }
    if let (Some(x0), Some(y0), Some(x1), Some(y1)) =
        (get("ulx")?, get("uly")?, get("lrx")?, get("lry")?)
    {
        return Ok(Some(PixelBox::from_corners(x0, y0, x1, y1)));
    }
    Ok(None)
}

/// Parse a possibly fractional coordinate, rounding to the nearest pixel
pub(crate) fn parse_coordinate(attribute: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.round() as i64)
        .ok_or_else(|| ParseError::InvalidNumber {
            attribute: attribute.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<alto xmlns="http://www.loc.gov/standards/alto/ns-v3#">
  <Layout>
    <Page ID="p1" WIDTH="2000" HEIGHT="3000">
      <PrintSpace>
        <TextBlock ID="b1">
          <TextLine HPOS="100" VPOS="200" WIDTH="400" HEIGHT="50">
            <String CONTENT="Old" HPOS="100" VPOS="200" WIDTH="120" HEIGHT="50"/>
            <SP/>
            <String CONTENT="Kentucky" HPOS="230.6" VPOS="201.2" WIDTH="270" HEIGHT="48"/>
          </TextLine>
          <TextLine HPOS="100" VPOS="260" WIDTH="200" HEIGHT="45">
            <String CONTENT="Home" HPOS="100" VPOS="260" WIDTH="200" HEIGHT="45"/>
            <String CONTENT=" " HPOS="300" VPOS="260" WIDTH="5" HEIGHT="45"/>
          </TextLine>
        </TextBlock>
      </PrintSpace>
    </Page>
  </Layout>
</alto>"#;

    #[test]
    fn test_parse_words() {
        let words = parse(PAGE, Granularity::Word).unwrap();
        assert_eq!(words.len(), 3);
        assert_eq!(words[0].content, "Old");
        assert_eq!((words[0].x, words[0].y, words[0].w, words[0].h), (100, 200, 120, 50));
        assert_eq!(words[1].content, "Kentucky");
        assert_eq!((words[1].x, words[1].y), (231, 201));
        assert_eq!(words[2].order, 3);
    }

    #[test]
    fn test_parse_lines() {
        let lines = parse(PAGE, Granularity::Line).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].content, "Old Kentucky");
        assert_eq!((lines[0].x, lines[0].y, lines[0].w, lines[0].h), (100, 200, 400, 50));
        assert_eq!(lines[1].content, "Home");
        assert_eq!(lines[1].order, 2);
    }

    #[test]
    fn test_parse_corner_coordinates() {
        let doc = r#"<alto><TextLine><String CONTENT="word" ulx="10" uly="20" lrx="60" lry="45"/></TextLine></alto>"#;
        let words = parse(doc, Granularity::Word).unwrap();
        assert_eq!((words[0].x, words[0].y, words[0].w, words[0].h), (10, 20, 50, 25));
    }

    #[test]
    fn test_line_box_falls_back_to_union() {
        let doc = r#"<alto><TextLine>
            <String CONTENT="a" HPOS="10" VPOS="10" WIDTH="10" HEIGHT="10"/>
            <String CONTENT="b" HPOS="30" VPOS="5" WIDTH="10" HEIGHT="10"/>
        </TextLine></alto>"#;
        let lines = parse(doc, Granularity::Line).unwrap();
        assert_eq!(lines[0].content, "a b");
        assert_eq!((lines[0].x, lines[0].y, lines[0].w, lines[0].h), (10, 5, 30, 15));
    }

    #[test]
    fn test_string_text_child() {
        let doc = r#"<alto><String HPOS="1" VPOS="2" WIDTH="3" HEIGHT="4">caf&#233;</String></alto>"#;
        let words = parse(doc, Granularity::Word).unwrap();
        assert_eq!(words[0].content, "café");
    }

    #[test]
    fn test_truncated_document() {
        let doc = r#"<alto><Layout><Page><TextLine><String CONTENT="a" HPOS="1" VPOS="1" WIDTH="1" HEIGHT="1"/>"#;
        let err = parse(doc, Granularity::Word).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Truncated(OcrFormat::Alto) | ParseError::Xml(_)
        ));
    }

    #[test]
    fn test_invalid_coordinate() {
        let doc = r#"<alto><String CONTENT="a" HPOS="x" VPOS="1" WIDTH="1" HEIGHT="1"/></alto>"#;
        assert!(matches!(
            parse(doc, Granularity::Word),
            Err(ParseError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_parse_coordinate_rounds() {
        assert_eq!(parse_coordinate("hpos", "10.5").unwrap(), 11);
        assert_eq!(parse_coordinate("hpos", " 7 ").unwrap(), 7);
        assert!(parse_coordinate("hpos", "NaN").is_err());
    }
}

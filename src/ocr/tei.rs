//! TEI facsimile parser
//!
//! Walks `surface > zone > zone` structures. Each inner zone is one line;
//! its box comes from `ulx/uly/lrx/lry` (top-left origin) and its content
//! from the last text-bearing child. TEI output is always line level.

use roxmltree::{Document, Node, ParsingOptions};

use super::alto::parse_coordinate;
use super::error::Result;
use super::types::{OcrFormat, OcrWord, PixelBox, WordCollector};

pub(crate) fn parsing_options() -> ParsingOptions {
    ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    }
}

/// Parse TEI zones into line records
pub fn parse(text: &str) -> Result<Vec<OcrWord>> {
    let doc = Document::parse_with_options(text, parsing_options())?;
    let mut collector = WordCollector::new(OcrFormat::Tei);

    for surface in doc.descendants().filter(|n| n.tag_name().name() == "surface") {
        for block in surface.children().filter(|n| n.tag_name().name() == "zone") {
            for line in block.children().filter(|n| n.is_element()) {
                match zone_box(&line)? {
                    Some(bbox) => collector.push(&line_text(&line), bbox),
                    None => collector.skip(),
                }
            }
        }
    }

    Ok(collector.finish())
}

fn zone_box(node: &Node) -> Result<Option<PixelBox>> {
    let get = |name: &str| -> Result<Option<i64>> {
        node.attribute(name)
            .map(|value| parse_coordinate(name, value))
            .transpose()
    };
    match (get("ulx")?, get("uly")?, get("lrx")?, get("lry")?) {
        (Some(x0), Some(y0), Some(x1), Some(y1)) => Ok(Some(PixelBox::from_corners(x0, y0, x1, y1))),
        _ => Ok(None),
    }
}

fn line_text(line: &Node) -> String {
    match line.children().filter(|n| n.is_element()).last() {
        Some(last) => last
            .descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect(),
        None => line.text().unwrap_or_default().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <teiHeader><fileDesc><titleStmt><title>p1</title></titleStmt></fileDesc></teiHeader>
  <facsimile>
    <surface ulx="0" uly="0" lrx="2000" lry="3000">
      <zone type="textblock" ulx="100" uly="100" lrx="900" lry="300">
        <zone type="line" ulx="100" uly="100" lrx="900" lry="150">
          <line>The quick brown fox</line>
        </zone>
        <zone type="line" ulx="100" uly="160" lrx="600" lry="210">
          <note>ignored</note>
          <line>jumps over</line>
        </zone>
        <zone type="line" ulx="100" uly="220" lrx="600" lry="270"><line>   </line></zone>
        <zone type="line"><line>no box</line></zone>
      </zone>
    </surface>
  </facsimile>
</TEI>"#;

    #[test]
    fn test_parse_lines() {
        let lines = parse(DOC).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].content, "The quick brown fox");
        assert_eq!((lines[0].x, lines[0].y, lines[0].w, lines[0].h), (100, 100, 800, 50));
        assert_eq!(lines[1].content, "jumps over");
        assert_eq!(lines[1].order, 2);
    }

    #[test]
    fn test_malformed_xml() {
        assert!(parse("<TEI><facsimile><surface>").is_err());
    }
}

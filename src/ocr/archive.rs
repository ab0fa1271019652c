//! Internet Archive page JSON parser
//!
//! The payload is `{"ocr": [[ [text, [x1, y1, x2, y3, ...]], ... ], ...]}`,
//! one inner array per line. The y-axis is inverted relative to ALTO/TEI:
//! `y1` is the bottom edge and `y3` the top, so `y = y3` and `h = y1 - y3`.

use serde::Deserialize;

use super::error::Result;
use super::types::{Granularity, OcrFormat, OcrWord, PixelBox, WordCollector};

#[derive(Debug, Deserialize)]
struct ArchivePage {
    #[serde(default)]
    ocr: Vec<Vec<ArchiveWord>>,
}

/// `[text, [x1, y1, x2, y3, ...]]`
#[derive(Debug, Deserialize)]
struct ArchiveWord(Option<String>, Vec<f64>);

impl ArchiveWord {
    fn bbox(&self) -> Option<PixelBox> {
        let coords = &self.1;
        if coords.len() < 4 || coords.iter().take(4).any(|c| !c.is_finite()) {
            return None;
        }
        let x1 = coords[0].round() as i64;
        let y1 = coords[1].round() as i64;
        let x2 = coords[2].round() as i64;
        let y3 = coords[3].round() as i64;
        Some(PixelBox::new(x1, y3, x2 - x1, y1 - y3))
    }

    fn text(&self) -> &str {
        self.0.as_deref().unwrap_or("")
    }
}

/// Parse an Internet Archive page into words, or lines when `granularity`
/// is `Line`
pub fn parse(text: &str, granularity: Granularity) -> Result<Vec<OcrWord>> {
    let page: ArchivePage = serde_json::from_str(text)?;
    let mut collector = WordCollector::new(OcrFormat::ArchiveJson);

    for line in &page.ocr {
        match granularity {
            Granularity::Word => {
                for word in line {
                    match word.bbox() {
                        Some(bbox) => collector.push(word.text(), bbox),
                        None => collector.skip(),
                    }
                }
            }
            Granularity::Line => {
                let bbox = line
                    .iter()
                    .filter_map(ArchiveWord::bbox)
                    .reduce(|acc, b| acc.union(&b));
                let content = line
                    .iter()
                    .map(|w| w.text().trim())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                match bbox {
                    Some(bbox) => collector.push(&content, bbox),
                    None => collector.skip(),
                }
            }
        }
    }

    Ok(collector.finish())
}

/// Top-level object with an `ocr` array
pub(crate) fn looks_like_archive(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text)
        .map(|value| value.get("ocr").is_some_and(|ocr| ocr.is_array()))
        .unwrap_or(false)
}

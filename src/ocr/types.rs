//! OCR Types
//!
//! Canonical word records shared by every format parser, plus the
//! format/granularity enums used to route raw OCR bytes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source vocabulary of a raw OCR payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrFormat {
    /// ALTO XML (Library of Congress)
    Alto,
    /// hOCR (HTML microformat, Tesseract et al.)
    Hocr,
    /// TEI facsimile with zones
    Tei,
    /// Tab separated `x y w h content` rows
    Tsv,
    /// Internet Archive page JSON
    ArchiveJson,
    /// Nothing recognizable; treated as "no OCR available"
    Unknown,
}

impl OcrFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alto => "alto",
            Self::Hocr => "hocr",
            Self::Tei => "tei",
            Self::Tsv => "tsv",
            Self::ArchiveJson => "archive_json",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the format distinguishes words from lines
    pub fn supports_lines(&self) -> bool {
        matches!(self, Self::Alto | Self::Hocr | Self::ArchiveJson)
    }
}

impl fmt::Display for OcrFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit of text that becomes one annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Word,
    Line,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Line => "line",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word" | "words" => Ok(Self::Word),
            "line" | "lines" => Ok(Self::Line),
            other => Err(format!("unknown granularity '{}'", other)),
        }
    }
}

/// Integer pixel box, origin top-left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelBox {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl PixelBox {
    pub fn new(x: i64, y: i64, w: i64, h: i64) -> Self {
        Self { x, y, w, h }
    }

    /// Box from two corners (`ulx, uly, lrx, lry`)
    pub fn from_corners(x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        Self {
            x: x0,
            y: y0,
            w: x1 - x0,
            h: y1 - y0,
        }
    }

    /// Smallest box containing both
    pub fn union(&self, other: &PixelBox) -> PixelBox {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.w).max(other.x + other.w);
        let y1 = (self.y + self.h).max(other.y + other.h);
        PixelBox::from_corners(x0, y0, x1, y1)
    }
}

/// Canonical OCR word (or line, in line granularity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrWord {
    /// Recognized text, trimmed, never empty
    pub content: String,
    pub x: i64,
    pub y: i64,
    /// Width, never negative
    pub w: i64,
    /// Height, never negative
    pub h: i64,
    /// Discovery order in the source document, starting at 1
    pub order: u32,
}

impl OcrWord {
    pub fn bbox(&self) -> PixelBox {
        PixelBox::new(self.x, self.y, self.w, self.h)
    }
}

/// Accumulates parser output: drops blank records, clamps negative
/// extents and numbers words in discovery order.
#[derive(Debug)]
pub(crate) struct WordCollector {
    format: OcrFormat,
    words: Vec<OcrWord>,
    dropped: usize,
}

impl WordCollector {
    pub(crate) fn new(format: OcrFormat) -> Self {
        Self {
            format,
            words: Vec::new(),
            dropped: 0,
        }
    }

    pub(crate) fn push(&mut self, content: &str, bbox: PixelBox) {
        let content = content.trim();
        if content.is_empty() {
            self.dropped += 1;
            return;
        }
        if bbox.w < 0 || bbox.h < 0 {
            tracing::debug!(
                "Clamping negative extent {}x{} for '{}' in {} OCR",
                bbox.w,
                bbox.h,
                content,
                self.format
            );
        }
        let order = self.words.len() as u32 + 1;
        self.words.push(OcrWord {
            content: content.to_string(),
            x: bbox.x,
            y: bbox.y,
            w: bbox.w.max(0),
            h: bbox.h.max(0),
            order,
        });
    }

    /// Count a record that could not become a word
    pub(crate) fn skip(&mut self) {
        self.dropped += 1;
    }

    pub(crate) fn finish(self) -> Vec<OcrWord> {
        if self.dropped > 0 {
            tracing::debug!(
                "Dropped {} empty or incomplete {} records",
                self.dropped,
                self.format
            );
        }
        self.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_drops_blank_content() {
        let mut collector = WordCollector::new(OcrFormat::Tsv);
        collector.push("  ", PixelBox::new(0, 0, 1, 1));
        collector.push("", PixelBox::new(0, 0, 1, 1));
        collector.push("word", PixelBox::new(1, 2, 3, 4));
        let words = collector.finish();

        assert_eq!(words.len(), 1);
        assert_eq!(words[0].content, "word");
        assert_eq!(words[0].order, 1);
    }

    #[test]
    fn test_collector_orders_sequentially() {
        let mut collector = WordCollector::new(OcrFormat::Alto);
        for text in ["a", "", "b", "c"] {
            collector.push(text, PixelBox::default());
        }
        let orders: Vec<u32> = collector.finish().iter().map(|w| w.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn test_collector_clamps_negative_extent() {
        let mut collector = WordCollector::new(OcrFormat::Tei);
        collector.push("x", PixelBox::from_corners(10, 10, 5, 8));
        let words = collector.finish();
        assert_eq!((words[0].w, words[0].h), (0, 0));
        assert_eq!((words[0].x, words[0].y), (10, 10));
    }

    #[test]
    fn test_pixel_box_union() {
        let a = PixelBox::new(10, 20, 30, 10);
        let b = PixelBox::new(50, 15, 10, 10);
        assert_eq!(a.union(&b), PixelBox::new(10, 15, 50, 15));
    }

    #[test]
    fn test_granularity_from_str() {
        assert_eq!("Line".parse::<Granularity>().unwrap(), Granularity::Line);
        assert_eq!("word".parse::<Granularity>().unwrap(), Granularity::Word);
        assert!("page".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_format_serialization() {
        let json = serde_json::to_string(&OcrFormat::ArchiveJson).unwrap();
        assert_eq!(json, "\"archive_json\"");
    }
}

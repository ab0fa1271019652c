//! OCR normalizer
//!
//! Runs detection and the matching parser, recovering from parse failures
//! so a corrupt page yields no words instead of aborting a batch.

use serde::Serialize;

use super::detect::{decode, detect_str};
use super::error::{ParseError, Result};
use super::types::{Granularity, OcrFormat, OcrWord};
use super::{alto, archive, hocr, tei, tsv};

/// Words extracted from one page
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedOcr {
    pub format: OcrFormat,
    pub granularity: Granularity,
    pub words: Vec<OcrWord>,
}

impl NormalizedOcr {
    fn empty(format: OcrFormat, granularity: Granularity) -> Self {
        Self {
            format,
            granularity,
            words: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Parse `text` as `format`
pub fn parse_as(format: OcrFormat, text: &str, granularity: Granularity) -> Result<Vec<OcrWord>> {
    match format {
        OcrFormat::Alto => alto::parse(text, granularity),
        OcrFormat::Hocr => hocr::parse(text, granularity),
        OcrFormat::Tei => tei::parse(text),
        OcrFormat::Tsv => tsv::parse(text),
        OcrFormat::ArchiveJson => archive::parse(text, granularity),
        OcrFormat::Unknown => Err(ParseError::Unsupported(format)),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OcrNormalizer {
    granularity: Granularity,
}

impl OcrNormalizer {
    pub fn new(granularity: Granularity) -> Self {
        Self { granularity }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Detect and parse, surfacing parse errors
    pub fn try_normalize(&self, raw: &[u8]) -> Result<NormalizedOcr> {
        let text = decode(raw).ok_or(ParseError::Encoding)?;
        let format = detect_str(text);
        if format == OcrFormat::Unknown {
            return Ok(NormalizedOcr::empty(format, self.granularity));
        }
        if self.granularity == Granularity::Line && !format.supports_lines() {
            tracing::debug!("{} OCR has a single granularity, ignoring line mode", format);
        }

        let words = parse_as(format, text, self.granularity)?;
        Ok(NormalizedOcr {
            format,
            granularity: self.granularity,
            words,
        })
    }

    /// Detect and parse; undetectable or malformed pages yield no words
    pub fn normalize(&self, canvas_pid: &str, raw: &[u8]) -> NormalizedOcr {
        match self.try_normalize(raw) {
            Ok(normalized) => {
                if normalized.format == OcrFormat::Unknown {
                    tracing::info!("No recognizable OCR for canvas {}", canvas_pid);
                }
                normalized
            }
            Err(e) => {
                let format = decode(raw).map(detect_str).unwrap_or(OcrFormat::Unknown);
                tracing::warn!(
                    "Failed to parse {} OCR for canvas {}: {}, skipping",
                    format,
                    canvas_pid,
                    e
                );
                NormalizedOcr::empty(format, self.granularity)
            }
        }
    }
}

/// Plain text of a page in reading order, markup stripped
pub fn canvas_text<'a, I>(contents: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    contents
        .into_iter()
        .map(crate::html::plain_text_lossy)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tsv() {
        let normalizer = OcrNormalizer::default();
        let result = normalizer.normalize("p1", b"523\t116\t151\t45\tDistillery\r\n");
        assert_eq!(result.format, OcrFormat::Tsv);
        assert_eq!(result.words.len(), 1);
    }

    #[test]
    fn test_normalize_is_repeatable() {
        let normalizer = OcrNormalizer::new(Granularity::Word);
        let raw = b"1\t2\t3\t4\tone\n5\t6\t7\t8\ttwo\n";
        let first = normalizer.normalize("p1", raw);
        let second = normalizer.normalize("p1", raw);
        assert_eq!(first.words, second.words);
    }

    #[test]
    fn test_normalize_recovers_from_parse_error() {
        let normalizer = OcrNormalizer::default();
        let raw = b"<alto><String CONTENT=\"a\" HPOS=\"bad\" VPOS=\"1\" WIDTH=\"1\" HEIGHT=\"1\"/></alto>";
        assert!(normalizer.try_normalize(raw).is_err());

        let result = normalizer.normalize("p1", raw);
        assert_eq!(result.format, OcrFormat::Alto);
        assert!(result.is_empty());
    }

    #[test]
    fn test_normalize_unknown() {
        let result = OcrNormalizer::default().normalize("p1", b"nothing to see");
        assert_eq!(result.format, OcrFormat::Unknown);
        assert!(result.is_empty());
    }

    #[test]
    fn test_parse_as_unknown() {
        assert!(matches!(
            parse_as(OcrFormat::Unknown, "", Granularity::Word),
            Err(ParseError::Unsupported(OcrFormat::Unknown))
        ));
    }

    #[test]
    fn test_canvas_text() {
        let contents = vec!["<span id='a'>Old</span>", "  ", "Home &amp; away"];
        assert_eq!(canvas_text(contents), "Old Home & away");
    }
}

//! Format detection
//!
//! Never fails: anything unrecognizable is `OcrFormat::Unknown`, which the
//! normalizer treats as "no OCR available".

use std::sync::LazyLock;

use regex::Regex;
use roxmltree::Document;

use super::archive::looks_like_archive;
use super::tei::parsing_options;
use super::tsv::looks_like_tsv;
use super::OcrFormat;

const TEI_NAMESPACE: &str = "http://www.tei-c.org/ns/1.0";

/// hOCR page marker for markup that is not well-formed XML
static HOCR_PAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"class\s*=\s*['"][^'"]*\bocr_page\b"#).expect("valid regex")
});

static ALTO_ROOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:\w+:)?alto[\s>]").expect("valid regex"));

/// Decode raw bytes, dropping a UTF-8 byte order mark
pub(crate) fn decode(raw: &[u8]) -> Option<&str> {
    let raw = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
    std::str::from_utf8(raw).ok()
}

/// Classify a raw OCR payload
pub fn detect(raw: &[u8]) -> OcrFormat {
    match decode(raw) {
        Some(text) => detect_str(text),
        None => OcrFormat::Unknown,
    }
}

pub fn detect_str(text: &str) -> OcrFormat {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return OcrFormat::Unknown;
    }

    if trimmed.starts_with('<') {
        if let Ok(doc) = Document::parse_with_options(trimmed, parsing_options()) {
            return classify_xml(&doc);
        }
        // Markup that is not XML: HTML hOCR or a truncated document
        if HOCR_PAGE_RE.is_match(trimmed) {
            return OcrFormat::Hocr;
        }
        if ALTO_ROOT_RE.is_match(trimmed) {
            return OcrFormat::Alto;
        }
        return OcrFormat::Unknown;
    }

    if looks_like_tsv(text) {
        return OcrFormat::Tsv;
    }
    if looks_like_archive(trimmed) {
        return OcrFormat::ArchiveJson;
    }
    OcrFormat::Unknown
}

fn classify_xml(doc: &Document) -> OcrFormat {
    let root = doc.root_element();
    let name = root.tag_name().name();
    let namespace = root.tag_name().namespace().unwrap_or("");

    if name.eq_ignore_ascii_case("alto") || namespace.contains("standards/alto") {
        return OcrFormat::Alto;
    }
    if name == "TEI" || name == "TEI.2" || namespace == TEI_NAMESPACE {
        return OcrFormat::Tei;
    }
    let has_page = doc.descendants().any(|n| {
        n.attribute("class")
            .is_some_and(|class| class.split_whitespace().any(|c| c == "ocr_page"))
    });
    if has_page {
        return OcrFormat::Hocr;
    }
    OcrFormat::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_alto() {
        let doc = br#"<?xml version="1.0"?><alto xmlns="http://www.loc.gov/standards/alto/ns-v4#"><Layout/></alto>"#;
        assert_eq!(detect(doc), OcrFormat::Alto);
    }

    #[test]
    fn test_detect_truncated_alto() {
        assert_eq!(detect(b"<alto><Layout><Page>"), OcrFormat::Alto);
    }

    #[test]
    fn test_detect_hocr_xhtml() {
        let doc = br#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml"><body><div class='ocr_page' title='bbox 0 0 10 10'></div></body></html>"#;
        assert_eq!(detect(doc), OcrFormat::Hocr);
    }

    #[test]
    fn test_detect_hocr_html() {
        let doc = b"<html><body><div class=\"ocr_page\"><br></div></body></html>";
        assert_eq!(detect(doc), OcrFormat::Hocr);
    }

    #[test]
    fn test_detect_tei() {
        let doc = br#"<TEI xmlns="http://www.tei-c.org/ns/1.0"><facsimile/></TEI>"#;
        assert_eq!(detect(doc), OcrFormat::Tei);
    }

    #[test]
    fn test_detect_tsv() {
        assert_eq!(detect(b"523\t116\t151\t45\tDistillery\r\n"), OcrFormat::Tsv);
        assert_eq!(detect(b"\xEF\xBB\xBF1\t2\t3\t4\tword\n"), OcrFormat::Tsv);
    }

    #[test]
    fn test_detect_archive_json() {
        assert_eq!(detect(br#"{"ocr": [[["a", [1, 2, 3, 0, 2]]]]}"#), OcrFormat::ArchiveJson);
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect(b"\xff\xfe\x00garbage"), OcrFormat::Unknown);
        assert_eq!(detect(b""), OcrFormat::Unknown);
        assert_eq!(detect(b"plain prose without structure"), OcrFormat::Unknown);
        assert_eq!(detect(br#"{"pages": []}"#), OcrFormat::Unknown);
        assert_eq!(detect(b"<html><body><p>hi</p></body></html>"), OcrFormat::Unknown);
    }
}

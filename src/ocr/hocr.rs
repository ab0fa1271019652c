//! hOCR parser
//!
//! hOCR is HTML, so it goes through lol_html rather than an XML parser and
//! unclosed void elements are tolerated. Boxes come from the `title`
//! microsyntax `bbox x0 y0 x1 y1` (top-left origin).

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::LazyLock;

use lol_html::html_content::{Element, EndTag};
use lol_html::{element, rewrite_str, text, HandlerResult, RewriteStrSettings};
use regex::Regex;

use super::error::{ParseError, Result};
use super::types::{Granularity, OcrFormat, OcrWord, PixelBox, WordCollector};

static BBOX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"bbox\s+(-?\d+)\s+(-?\d+)\s+(-?\d+)\s+(-?\d+)").expect("valid regex")
});

#[derive(Default)]
struct HocrState {
    words: Vec<(Option<PixelBox>, String)>,
    /// Line box plus indexes into `words`
    lines: Vec<(Option<PixelBox>, Vec<usize>)>,
    /// Lines whose end tag has not been seen yet, innermost last
    open: Vec<usize>,
}

impl HocrState {
    fn open_word(&mut self, el: &Element) {
        let index = self.words.len();
        self.words.push((title_bbox(el), String::new()));
        if let Some(&line) = self.open.last() {
            self.lines[line].1.push(index);
        }
    }

    fn close_line(&mut self, line: usize) {
        if let Some(position) = self.open.iter().rposition(|&open| open == line) {
            self.open.truncate(position);
        }
    }

    fn push_text(&mut self, chunk: &str) {
        if let Some((_, text)) = self.words.last_mut() {
            text.push_str(chunk);
        }
    }
}

/// Record a line and keep it open until its end tag
fn open_line(state: &Rc<RefCell<HocrState>>, el: &mut Element) -> HandlerResult {
    let line = {
        let mut state = state.borrow_mut();
        state.lines.push((title_bbox(el), Vec::new()));
        state.lines.len() - 1
    };
    if let Some(handlers) = el.end_tag_handlers() {
        state.borrow_mut().open.push(line);
        let state = Rc::clone(state);
        handlers.push(Box::new(move |_end: &mut EndTag<'_>| -> HandlerResult {
            state.borrow_mut().close_line(line);
            Ok(())
        }));
    }
    Ok(())
}

/// Parse an hOCR page into `ocrx_word` records, or `ocr_line` records
/// when `granularity` is `Line`. In line mode, words outside every line
/// are left out.
pub fn parse(text: &str, granularity: Granularity) -> Result<Vec<OcrWord>> {
    let state = Rc::new(RefCell::new(HocrState::default()));

    rewrite_str(
        text,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(".ocr_line", |el| open_line(&state, el)),
                element!(".ocr_header", |el| open_line(&state, el)),
                element!(".ocr_caption", |el| open_line(&state, el)),
                element!(".ocr_textfloat", |el| open_line(&state, el)),
                element!(".ocrx_word", |el| {
                    state.borrow_mut().open_word(el);
                    Ok(())
                }),
                text!(".ocrx_word", |t| {
                    state.borrow_mut().push_text(t.as_str());
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| ParseError::Html(e.to_string()))?;

    let state = state.take();
    let words: Vec<(Option<PixelBox>, String)> = state
        .words
        .into_iter()
        .map(|(bbox, raw)| (bbox, html_escape::decode_html_entities(&raw).trim().to_string()))
        .collect();

    let mut collector = WordCollector::new(OcrFormat::Hocr);
    match granularity {
        Granularity::Word => {
            for (bbox, content) in &words {
                match bbox {
                    Some(bbox) => collector.push(content, *bbox),
                    None => collector.skip(),
                }
            }
        }
        Granularity::Line => {
            for (bbox, members) in &state.lines {
                let content = members
                    .iter()
                    .map(|&i| words[i].1.as_str())
                    .filter(|w| !w.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                match bbox {
                    Some(bbox) => collector.push(&content, *bbox),
                    None => collector.skip(),
                }
            }
        }
    }

    Ok(collector.finish())
}

fn title_bbox(el: &Element) -> Option<PixelBox> {
    let title = el.get_attribute("title")?;
    let caps = BBOX_RE.captures(&title)?;
    let n = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<i64>().ok());
    Some(PixelBox::from_corners(n(1)?, n(2)?, n(3)?, n(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="en" lang="en">
 <head>
  <meta name='ocr-system' content='tesseract 5.3.0' />
 </head>
 <body>
  <div class='ocr_page' id='page_1' title='image "p1.png"; bbox 0 0 2000 3000; ppageno 0'>
   <span class='ocr_line' id='line_1_1' title="bbox 100 200 500 250; baseline 0 -5">
    <span class='ocrx_word' id='word_1_1' title='bbox 100 200 220 250; x_wconf 96'>Fish</span>
    <span class='ocrx_word' id='word_1_2' title='bbox 240 205 500 248; x_wconf 91'>&amp; Chips</span>
   </span>
   <span class='ocr_line' id='line_1_2' title="bbox 100 260 300 300">
    <span class='ocrx_word' id='word_1_3' title='bbox 100 260 300 300; x_wconf 12'> </span>
   </span>
  </div>
 </body>
</html>"#;

    #[test]
    fn test_parse_words() {
        let words = parse(PAGE, Granularity::Word).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].content, "Fish");
        assert_eq!((words[0].x, words[0].y, words[0].w, words[0].h), (100, 200, 120, 50));
        assert_eq!(words[1].content, "& Chips");
        assert_eq!(words[1].order, 2);
    }

    #[test]
    fn test_parse_lines() {
        let lines = parse(PAGE, Granularity::Line).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].content, "Fish & Chips");
        assert_eq!((lines[0].x, lines[0].y, lines[0].w, lines[0].h), (100, 200, 400, 50));
    }

    #[test]
    fn test_words_after_a_line_are_not_joined_to_it() {
        let doc = r#"<div class="ocr_page">
  <span class="ocr_line" title="bbox 0 0 100 20"><span class="ocrx_word" title="bbox 0 0 40 20">Arthur</span></span>
  <span class="ocrx_word" title="bbox 0 50 40 70">stray</span>
</div>"#;
        let lines = parse(doc, Granularity::Line).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].content, "Arthur");

        let words = parse(doc, Granularity::Word).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].content, "stray");
    }

    #[test]
    fn test_word_without_bbox_is_skipped() {
        let doc = r#"<div class="ocr_page"><span class="ocrx_word" title="x_wconf 90">lost</span></div>"#;
        assert!(parse(doc, Granularity::Word).unwrap().is_empty());
    }

    #[test]
    fn test_title_bbox_tolerates_extra_fields() {
        let doc = r#"<span class="ocrx_word" title="x_wconf 90; bbox 1 2 11 22">ok</span>"#;
        let words = parse(doc, Granularity::Word).unwrap();
        assert_eq!((words[0].x, words[0].y, words[0].w, words[0].h), (1, 2, 10, 20));
    }
}

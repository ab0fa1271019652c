//! Tab separated OCR parser
//!
//! Rows are `x\ty\tw\th\tcontent` (top-left origin), optionally preceded by
//! a header naming the columns in any order. Quote characters are literal,
//! so content containing tabs is split and then rejoined.

use csv::{ReaderBuilder, StringRecord};

use super::error::Result;
use super::types::{OcrFormat, OcrWord, PixelBox, WordCollector};

/// Column positions of a TSV payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    x: usize,
    y: usize,
    w: usize,
    h: usize,
    content: usize,
}

impl Layout {
    const POSITIONAL: Layout = Layout {
        x: 0,
        y: 1,
        w: 2,
        h: 3,
        content: 4,
    };

    /// Layout from a header row, if the row names every column
    fn from_header(fields: &[&str]) -> Option<Layout> {
        let position = |name: &str| {
            fields
                .iter()
                .position(|f| f.trim().eq_ignore_ascii_case(name))
        };
        Some(Layout {
            x: position("x")?,
            y: position("y")?,
            w: position("w")?,
            h: position("h")?,
            content: position("content")?,
        })
    }

    fn width(&self) -> usize {
        5
    }

    fn content_is_last(&self) -> bool {
        self.content == 4
    }
}

enum Row {
    Word(String, PixelBox),
    /// Numeric columns present but content missing
    Blank,
    Invalid,
}

fn read_records(text: &str) -> Result<Vec<StringRecord>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        records.push(record);
    }
    Ok(records)
}

/// Split the header off, returning the layout and the data rows
fn split_header(records: &[StringRecord]) -> (Layout, &[StringRecord]) {
    match records.first() {
        Some(first) => {
            let fields: Vec<&str> = first.iter().collect();
            match Layout::from_header(&fields) {
                Some(layout) => (layout, &records[1..]),
                None => (Layout::POSITIONAL, records),
            }
        }
        None => (Layout::POSITIONAL, records),
    }
}

fn classify(record: &StringRecord, layout: &Layout) -> Row {
    let mut fields: Vec<&str> = record.iter().collect();

    // Stray tabs at either end of the row
    if fields.len() > layout.width() {
        while fields.len() > 4 && fields.first().is_some_and(|f| f.trim().is_empty()) {
            fields.remove(0);
        }
        while fields.len() > 4 && fields.last().is_some_and(|f| f.trim().is_empty()) {
            fields.pop();
        }
    }

    if fields.len() == 4 {
        let numeric = fields.iter().all(|f| parse_number(f).is_some());
        return if numeric { Row::Blank } else { Row::Invalid };
    }
    if fields.len() < 4 {
        return Row::Invalid;
    }

    let content = if fields.len() > layout.width() {
        if !layout.content_is_last() {
            return Row::Invalid;
        }
        fields[layout.content..].join("\t")
    } else {
        fields[layout.content].to_string()
    };

    let number = |i: usize| fields.get(i).and_then(|f| parse_number(f));
    match (number(layout.x), number(layout.y), number(layout.w), number(layout.h)) {
        (Some(x), Some(y), Some(w), Some(h)) => Row::Word(content, PixelBox::new(x, y, w, h)),
        _ => Row::Invalid,
    }
}

fn parse_number(field: &str) -> Option<i64> {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.round() as i64)
}

/// Parse TSV rows into words
pub fn parse(text: &str) -> Result<Vec<OcrWord>> {
    let records = read_records(text)?;
    let (layout, rows) = split_header(&records);
    let mut collector = WordCollector::new(OcrFormat::Tsv);

    for record in rows {
        match classify(record, &layout) {
            Row::Word(content, bbox) => collector.push(&content, bbox),
            Row::Blank | Row::Invalid => collector.skip(),
        }
    }

    Ok(collector.finish())
}

/// Heuristic used by detection: a header or at least half the rows must
/// carry numeric geometry in the expected columns.
pub(crate) fn looks_like_tsv(text: &str) -> bool {
    if !text.contains('\t') {
        return false;
    }
    let records = match read_records(text) {
        Ok(records) => records,
        Err(_) => return false,
    };
    let (layout, rows) = split_header(&records);
    if rows.is_empty() {
        return rows.len() < records.len();
    }
    let valid = rows
        .iter()
        .filter(|r| !matches!(classify(r, &layout), Row::Invalid))
        .count();
    valid > 0 && valid * 2 >= rows.len()
}

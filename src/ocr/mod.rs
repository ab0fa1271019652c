//! OCR Module
//!
//! Turns raw OCR payloads into canonical word records.
//!
//! Supported vocabularies:
//! - ALTO XML (streamed with quick-xml)
//! - hOCR (parsed as HTML with lol_html)
//! - TEI facsimile zones
//! - Tab separated `x y w h content` rows
//! - Internet Archive page JSON (inverted y-axis)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_iiif::ocr::{Granularity, OcrNormalizer};
//!
//! let normalizer = OcrNormalizer::new(Granularity::Word);
//! let page = normalizer.normalize("canvas-1", &raw_bytes);
//!
//! for word in &page.words {
//!     println!("{} at {},{}", word.content, word.x, word.y);
//! }
//! ```

pub mod alto;
pub mod archive;
mod detect;
mod error;
pub mod hocr;
mod normalizer;
pub mod tei;
pub mod tsv;
mod types;

pub use detect::{detect, detect_str};
pub use error::ParseError;
pub use normalizer::{canvas_text, parse_as, NormalizedOcr, OcrNormalizer};
pub use types::{Granularity, OcrFormat, OcrWord, PixelBox};

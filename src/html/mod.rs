//! HTML processing module
//!
//! Provides HTML handling for annotation bodies including:
//! - OCR span rendering with synthesized letter spacing
//! - Plain text extraction
//!
//! Uses lol_html for streaming HTML processing.

mod span;
mod text;

pub use span::{compute_rendered_span, letter_spacing, LetterSpacing, RenderedContent, SPAN_CLASS_PREFIX};
pub use text::{is_html, plain_text, plain_text_lossy};

/// Errors during HTML processing
#[derive(Debug, thiserror::Error)]
pub enum HtmlError {
    #[error("HTML rewrite failed: {0}")]
    RewriteError(String),
}

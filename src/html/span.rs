//! OCR span rendering
//!
//! OCR text is laid over the page image, so each word is wrapped in a span
//! whose letter spacing stretches the glyphs across the word's box.

use serde::Serialize;
use uuid::Uuid;

use super::text::plain_text_lossy;

/// Class prefix for generated spans and their style rules
pub const SPAN_CLASS_PREFIX: &str = "anno-";

/// Glyph height to font size ratio
const FONT_SIZE_RATIO: f64 = 1.6;

/// Computed letter spacing for one word
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LetterSpacing {
    pub font_size: f64,
    /// Spacing in pixels
    pub letter_spacing: f64,
    /// Spacing as a fraction of the box width
    pub relative_letter_spacing: f64,
}

/// Letter spacing that makes `character_count` glyphs fill a `w` x `h` box.
///
/// Degenerate input (no characters, zero or negative width, non-finite
/// values) yields zero spacing.
pub fn letter_spacing(character_count: usize, w: f64, h: f64) -> LetterSpacing {
    let font_size = finite_or_zero(h / FONT_SIZE_RATIO);
    if character_count == 0 || !w.is_finite() || w <= 0.0 {
        return LetterSpacing {
            font_size,
            letter_spacing: 0.0,
            relative_letter_spacing: 0.0,
        };
    }

    let count = character_count as f64;
    let string_width = (font_size / 2.0) * count;
    let letter_spacing = finite_or_zero((w - string_width) / count);
    LetterSpacing {
        font_size,
        letter_spacing,
        relative_letter_spacing: finite_or_zero(letter_spacing / w),
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Markup and style for an OCR annotation body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedContent {
    /// `<span>` wrapping the escaped word text
    pub html: String,
    /// CSS rule for the span's class
    pub style: String,
    /// Plain text that was wrapped
    pub text: String,
    pub spacing: LetterSpacing,
}

/// A span produced by `compute_rendered_span`
fn is_rendered_span(content: &str) -> bool {
    let content = content.trim_start();
    content.starts_with("<span")
        && content.ends_with("</span>")
        && (content.contains(&format!("class='{}", SPAN_CLASS_PREFIX))
            || content.contains(&format!("class=\"{}", SPAN_CLASS_PREFIX)))
}

/// Wrap OCR text for the annotation `id`.
///
/// A previously rendered span is reduced to its text first, so rendering is
/// idempotent. Any other markup-like text is kept literally.
pub fn compute_rendered_span(id: Uuid, content: &str, w: f64, h: f64) -> RenderedContent {
    let text = if is_rendered_span(content.trim_end()) {
        plain_text_lossy(content)
    } else {
        content.trim().to_string()
    };
    let spacing = letter_spacing(text.chars().count(), w, h);

    let html = format!(
        "<span id='{id}' class='{prefix}{id}' data-letter-spacing='{rel}'>{text}</span>",
        id = id,
        prefix = SPAN_CLASS_PREFIX,
        rel = spacing.relative_letter_spacing,
        text = html_escape::encode_text(&text),
    );
    let style = format!(
        ".{prefix}{id} {{ height: {h}px; width: {w}px; font-size: {fs}px; letter-spacing: {ls}px; }}",
        prefix = SPAN_CLASS_PREFIX,
        id = id,
        h = h,
        w = w,
        fs = spacing.font_size,
        ls = spacing.letter_spacing,
    );

    RenderedContent {
        html,
        style,
        text,
        spacing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_spacing_formula() {
        // font 25, string width 12.5 * 4 = 50, (150 - 50) / 4 = 25
        let spacing = letter_spacing(4, 150.0, 40.0);
        assert!((spacing.font_size - 25.0).abs() < 1e-9);
        assert!((spacing.letter_spacing - 25.0).abs() < 1e-9);
        assert!((spacing.relative_letter_spacing - 25.0 / 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_width_is_tolerated() {
        let spacing = letter_spacing(5, 0.0, 40.0);
        assert_eq!(spacing.letter_spacing, 0.0);
        assert_eq!(spacing.relative_letter_spacing, 0.0);
    }

    #[test]
    fn test_empty_content_is_tolerated() {
        let spacing = letter_spacing(0, 120.0, 0.0);
        assert_eq!(spacing.letter_spacing, 0.0);
        assert_eq!(spacing.font_size, 0.0);

        let rendered = compute_rendered_span(Uuid::new_v4(), "", 0.0, 0.0);
        assert_eq!(rendered.spacing.letter_spacing, 0.0);
        assert_eq!(rendered.text, "");
    }

    #[test]
    fn test_negative_spacing_for_narrow_box() {
        let spacing = letter_spacing(10, 20.0, 16.0);
        assert!((spacing.letter_spacing - (-3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_rendered_span_markup() {
        let id = Uuid::new_v4();
        let rendered = compute_rendered_span(id, "Fish & Chips", 151.0, 45.0);

        assert!(rendered.html.starts_with(&format!("<span id='{}' class='anno-{}'", id, id)));
        assert!(rendered.html.contains(">Fish &amp; Chips</span>"));
        assert!(rendered.style.starts_with(&format!(".anno-{} {{", id)));
        assert!(rendered.style.contains("height: 45px; width: 151px;"));
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let id = Uuid::new_v4();
        let first = compute_rendered_span(id, "Distillery", 151.0, 45.0);
        let second = compute_rendered_span(id, &first.html, 151.0, 45.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_markup_like_words_are_kept() {
        let id = Uuid::new_v4();
        let rendered = compute_rendered_span(id, "<i>", 40.0, 20.0);
        assert_eq!(rendered.text, "<i>");
        assert!(rendered.html.contains("&lt;i&gt;"));
        assert_eq!(compute_rendered_span(id, &rendered.html, 40.0, 20.0), rendered);
    }
}

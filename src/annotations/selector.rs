//! Selector model and geometry
//!
//! Only Fragment, SVG and Range selectors are operative; the remaining
//! Web Annotation kinds are recognized so they can be rejected explicitly.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::Annotation;

static XPATH_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9\-]+").expect("valid regex"));

/// Every selector type name the Web Annotation model defines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectorKind {
    Fragment,
    Css,
    XPath,
    TextQuote,
    TextPosition,
    DataPosition,
    Svg,
    Range,
}

impl SelectorKind {
    /// Type name without a vocabulary prefix
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fragment => "FragmentSelector",
            Self::Css => "CssSelector",
            Self::XPath => "XPathSelector",
            Self::TextQuote => "TextQuoteSelector",
            Self::TextPosition => "TextPositionSelector",
            Self::DataPosition => "DataPositionSelector",
            Self::Svg => "SvgSelector",
            Self::Range => "RangeSelector",
        }
    }

    /// Parse a type name, with or without the `oa:` prefix
    pub fn from_type_name(value: &str) -> Option<Self> {
        let name = value.strip_prefix("oa:").unwrap_or(value);
        [
            Self::Fragment,
            Self::Css,
            Self::XPath,
            Self::TextQuote,
            Self::TextPosition,
            Self::DataPosition,
            Self::Svg,
            Self::Range,
        ]
        .into_iter()
        .find(|kind| kind.name() == name)
    }

    /// Whether annotations can carry this selector
    pub fn is_operative(&self) -> bool {
        matches!(self, Self::Fragment | Self::Svg | Self::Range)
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pixel box on a canvas, origin top-left
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Media fragment flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentUnit {
    /// `xywh=x,y,w,h` (IIIF v2)
    Implicit,
    /// `xywh=pixel:x,y,w,h` (IIIF v3)
    Pixel,
}

impl Bounds {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn fragment(&self, unit: FragmentUnit) -> String {
        let prefix = match unit {
            FragmentUnit::Implicit => "xywh=",
            FragmentUnit::Pixel => "xywh=pixel:",
        };
        format!("{}{},{},{},{}", prefix, self.x, self.y, self.w, self.h)
    }

    /// Parse `xywh=` with or without the `pixel:` unit. A URI carrying the
    /// fragment after `#` is accepted too.
    pub fn parse_fragment(value: &str) -> Option<Bounds> {
        let (_, coords) = value.rsplit_once("xywh=")?;
        let coords = coords.strip_prefix("pixel:").unwrap_or(coords);
        let numbers: Vec<f64> = coords
            .split(',')
            .map(|part| part.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
            .collect::<Option<Vec<_>>>()?;
        match numbers.as_slice() {
            [x, y, w, h] if *w >= 0.0 && *h >= 0.0 => Some(Bounds::new(*x, *y, *w, *h)),
            _ => None,
        }
    }
}

/// Character range between two word annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeSelector {
    /// Annotation holding the first character
    pub start: Uuid,
    /// Annotation holding the last character
    pub end: Uuid,
    /// Offset into the start annotation's text
    pub start_offset: u32,
    /// Offset into the end annotation's text
    pub end_offset: u32,
}

/// Where an annotation applies on its canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Selector {
    /// Rectangle given by the annotation's bounds
    Fragment,
    /// Arbitrary shape; bounds are its bounding box
    Svg { svg: String },
    /// Text span across word annotations; bounds are computed
    Range(RangeSelector),
}

impl Selector {
    pub fn kind(&self) -> SelectorKind {
        match self {
            Self::Fragment => SelectorKind::Fragment,
            Self::Svg { .. } => SelectorKind::Svg,
            Self::Range(_) => SelectorKind::Range,
        }
    }

    pub fn range(&self) -> Option<&RangeSelector> {
        match self {
            Self::Range(range) => Some(range),
            _ => None,
        }
    }
}

/// XPath addressing the element rendered for annotation `id`
pub fn xpath_for(id: Uuid) -> String {
    format!("//*[@id='{}']", id)
}

/// Annotation id from an XPath-like selector value
pub fn id_from_xpath(value: &str) -> Option<Uuid> {
    let candidate = XPATH_ID_RE.find_iter(value).last()?;
    Uuid::parse_str(candidate.as_str()).ok()
}

/// Union box of the words whose `order` lies in `start..=end`.
///
/// `x` is the leftmost word edge, `y` and `h` the largest among the words,
/// and the width runs to the right edge of the last word by order.
pub fn range_bounds<'a, I>(words: I, start: u32, end: u32) -> Option<Bounds>
where
    I: IntoIterator<Item = &'a Annotation>,
{
    let mut selected: Vec<&Annotation> = words
        .into_iter()
        .filter(|w| w.order >= start && w.order <= end)
        .collect();
    selected.sort_by_key(|w| w.order);

    let last = *selected.last()?;
    let x = selected
        .iter()
        .map(|w| w.bounds.x)
        .fold(f64::INFINITY, f64::min);
    let y = selected
        .iter()
        .map(|w| w.bounds.y)
        .fold(f64::NEG_INFINITY, f64::max);
    let h = selected
        .iter()
        .map(|w| w.bounds.h)
        .fold(f64::NEG_INFINITY, f64::max);

    Some(Bounds::new(x, y, last.bounds.x + last.bounds.w - x, h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::Owner;

    fn word(order: u32, x: f64, y: f64, w: f64, h: f64) -> Annotation {
        let mut annotation = Annotation::new("p1", Owner::SyntheticOcr, Selector::Fragment, Bounds::new(x, y, w, h));
        annotation.order = order;
        annotation
    }

    #[test]
    fn test_fragment_formats() {
        let bounds = Bounds::new(523.0, 116.0, 151.0, 45.5);
        assert_eq!(bounds.fragment(FragmentUnit::Implicit), "xywh=523,116,151,45.5");
        assert_eq!(bounds.fragment(FragmentUnit::Pixel), "xywh=pixel:523,116,151,45.5");
    }

    #[test]
    fn test_parse_fragment() {
        let expected = Some(Bounds::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(Bounds::parse_fragment("xywh=1,2,3,4"), expected);
        assert_eq!(Bounds::parse_fragment("xywh=pixel:1,2,3,4"), expected);
        assert_eq!(Bounds::parse_fragment("https://h/canvas/p1#xywh=1,2,3,4"), expected);
        assert_eq!(Bounds::parse_fragment("xywh=1,2,3"), None);
        assert_eq!(Bounds::parse_fragment("xywh=1,2,-3,4"), None);
        assert_eq!(Bounds::parse_fragment("t=10,20"), None);
    }

    #[test]
    fn test_selector_kind_names() {
        assert_eq!(SelectorKind::from_type_name("oa:SvgSelector"), Some(SelectorKind::Svg));
        assert_eq!(SelectorKind::from_type_name("RangeSelector"), Some(SelectorKind::Range));
        assert_eq!(SelectorKind::from_type_name("oa:CssSelector"), Some(SelectorKind::Css));
        assert_eq!(SelectorKind::from_type_name("BoxSelector"), None);
        assert!(!SelectorKind::TextQuote.is_operative());
    }

    #[test]
    fn test_xpath_round_trip() {
        let id = Uuid::new_v4();
        assert_eq!(id_from_xpath(&xpath_for(id)), Some(id));
        assert_eq!(id_from_xpath("//*[@id='not-a-uuid']"), None);
    }

    #[test]
    fn test_range_bounds() {
        let words: Vec<Annotation> = (1..=20)
            .map(|order| word(order, 10.0 * order as f64, 100.0 + order as f64, 8.0, 20.0 + (order % 4) as f64))
            .collect();

        let bounds = range_bounds(&words, 3, 15).unwrap();
        assert_eq!(bounds.x, 30.0);
        assert_eq!(bounds.y, 115.0);
        assert_eq!(bounds.h, 23.0);
        assert_eq!(bounds.w, 150.0 + 8.0 - 30.0);
    }

    #[test]
    fn test_range_bounds_single_word() {
        let words = vec![word(1, 5.0, 6.0, 7.0, 8.0), word(2, 50.0, 6.0, 7.0, 8.0)];
        assert_eq!(range_bounds(&words, 2, 2), Some(Bounds::new(50.0, 6.0, 7.0, 8.0)));
        assert_eq!(range_bounds(&words, 5, 9), None);
    }
}

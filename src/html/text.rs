//! Text extraction from annotation bodies

use std::cell::{Cell, RefCell};

use lol_html::{doc_text, element, rewrite_str, RewriteStrSettings};

use super::HtmlError;

#[derive(Default)]
struct TextNodes {
    current: String,
    nodes: Vec<String>,
}

/// Text content of an HTML fragment.
///
/// Each text node is entity-decoded and trimmed; non-empty nodes are joined
/// with single spaces.
pub fn plain_text(html: &str) -> Result<String, HtmlError> {
    let state = RefCell::new(TextNodes::default());

    rewrite_str(
        html,
        RewriteStrSettings {
            document_content_handlers: vec![doc_text!(|t| {
                let mut state = state.borrow_mut();
                state.current.push_str(t.as_str());
                if t.last_in_text_node() {
                    let node = std::mem::take(&mut state.current);
                    state.nodes.push(node);
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| HtmlError::RewriteError(e.to_string()))?;

    let mut state = state.into_inner();
    if !state.current.is_empty() {
        let rest = std::mem::take(&mut state.current);
        state.nodes.push(rest);
    }

    Ok(state
        .nodes
        .iter()
        .map(|node| html_escape::decode_html_entities(node).trim().to_string())
        .filter(|node| !node.is_empty())
        .collect::<Vec<_>>()
        .join(" "))
}

/// Like [`plain_text`], falling back to the trimmed input
pub fn plain_text_lossy(html: &str) -> String {
    plain_text(html).unwrap_or_else(|e| {
        tracing::debug!("Text extraction failed: {}, keeping raw content", e);
        html.trim().to_string()
    })
}

/// Whether the content contains at least one element
pub fn is_html(content: &str) -> bool {
    if !content.contains('<') {
        return false;
    }
    let found = Cell::new(false);
    let result = rewrite_str(
        content,
        RewriteStrSettings {
            element_content_handlers: vec![element!("*", |_el| {
                found.set(true);
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    );
    result.is_ok() && found.get()
}

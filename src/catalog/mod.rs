//! Sample node catalogs: a slice of C, and XML.

pub mod c;
pub mod xml;

use crate::node::Node;
use crate::render::{GenContext, RenderError};

/// The node's `text` attribute, word-wrapped to the generator budget.
fn words(node: &Node, cx: &GenContext) -> Result<Vec<String>, RenderError> {
    let text = node.get("text")?.to_string();
    let words = text.split_whitespace().collect::<Vec<_>>();
    Ok(cx.wrap(&words))
}

/// Tokens of a comma separated list: every token but the last gets a trailing comma.
fn comma_tokens<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    let mut tokens = items.into_iter().collect::<Vec<_>>();
    let len = tokens.len();
    for token in tokens.iter_mut().take(len.saturating_sub(1)) {
        token.push(',');
    }
    tokens
}

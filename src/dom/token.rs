//! Token tree adapter.
//!
//! The markup tokenizer is `dom_query` (html5ever underneath). This module
//! narrows its node types down to the six token kinds the builder consumes
//! and exposes the few pieces of token data it needs: tag name, attribute
//! list, text payload and the parent's tag.

pub use dom_query::{Document as TokenTree, NodeRef as Token};

use dom_query::NodeData;

/// Kind of a token in the tokenizer's tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Element,
    Text,
    Comment,
    /// Document and fragment roots.
    Document,
    Doctype,
    /// Anything the tokenizer produced that has no other mapping
    /// (processing instructions).
    Error,
}

impl TokenKind {
    /// Synthetic tag used for non-element nodes.
    #[must_use]
    pub fn synthetic_tag(self) -> Option<&'static str> {
        match self {
            Self::Comment => Some("comment"),
            Self::Document => Some("document"),
            Self::Doctype => Some("doctype"),
            Self::Error => Some("error"),
            Self::Element | Self::Text => None,
        }
    }
}

/// Parse a full document.
#[must_use]
pub fn parse_document(html: &str) -> TokenTree {
    TokenTree::from(html)
}

/// Parse a markup fragment (body context).
#[must_use]
pub fn parse_fragment(html: &str) -> TokenTree {
    TokenTree::fragment(html)
}

/// Classify a token. `None` when the token is not backed by a tree node.
#[must_use]
pub fn kind(token: &Token) -> Option<TokenKind> {
    token.query(|node| match &node.data {
        NodeData::Element(_) => TokenKind::Element,
        NodeData::Text { .. } => TokenKind::Text,
        NodeData::Comment { .. } => TokenKind::Comment,
        NodeData::Document | NodeData::Fragment => TokenKind::Document,
        NodeData::Doctype { .. } => TokenKind::Doctype,
        _ => TokenKind::Error,
    })
}

/// Element name, lower-cased.
#[must_use]
pub fn tag_name(token: &Token) -> Option<String> {
    token.node_name().map(|name| name.to_lowercase())
}

/// Tag of the token's parent element, if the parent is an element.
#[must_use]
pub fn parent_tag(token: &Token) -> Option<String> {
    token
        .parent()
        .filter(dom_query::NodeRef::is_element)
        .and_then(|p| tag_name(&p))
}

/// Text payload of a text token.
#[must_use]
pub fn text(token: &Token) -> Option<String> {
    token
        .query(|node| match &node.data {
            NodeData::Text { contents } => Some(contents.to_string()),
            _ => None,
        })
        .flatten()
}

/// Attributes as `(name, value)` pairs in source order.
///
/// Whitespace never survives in a parsed attribute name; it is stripped here
/// so keys stay clean regardless of the tokenizer. Values are kept verbatim.
#[must_use]
pub fn attributes(token: &Token) -> Vec<(String, String)> {
    token
        .attrs()
        .iter()
        .map(|attr| {
            let key: String = attr.name.local.split_whitespace().collect();
            (key, attr.value.to_string())
        })
        .collect()
}

/// Children of a token, first-child / next-sibling order.
pub fn children<'a>(token: &Token<'a>) -> impl Iterator<Item = Token<'a>> {
    std::iter::successors(token.first_child(), Token::next_sibling)
}

//! DOM builder.
//!
//! One depth-first, pre-order walk over the token tree. Elements become arena
//! nodes linked to their parent; comments, doctypes, document roots and
//! unknown tokens become unlinked leaf nodes that only occupy a position in
//! document order; text is trimmed and attached as a fragment.

use tracing::{debug, trace, warn};

use super::token::{self, Token, TokenKind};
use super::{Attributes, Document, DomNode, NodeId};
use crate::error::Error;

/// Parents whose text is raw content and must never be re-parsed as markup.
const PARSE_SKIP_TAGS: &[&str] = &["script", "style", "body"];

/// Structural tags the fragment parser wraps around its output; they already
/// exist in the outer document.
const FRAGMENT_SKIP_TAGS: &[&str] = &["html", "head", "body"];

/// Build `doc` from its raw contents. An unusable token tree leaves the
/// document empty.
pub(super) fn build(doc: &mut Document) {
    let tree = token::parse_document(&doc.contents);
    let root = tree.root();

    if token::kind(&root).is_none() {
        let err = Error::ParseUnavailable("token tree has no root node".to_string());
        warn!(error = %err, "leaving document empty");
        return;
    }

    let mut builder = Builder {
        doc,
        last_element: None,
    };
    builder.walk(None, &root, false);
    debug!(nodes = builder.doc.nodes.len(), "built DOM");
}

struct Builder<'d> {
    doc: &'d mut Document,
    last_element: Option<NodeId>,
}

impl Builder<'_> {
    /// Pre-order walk with an explicit stack, so nesting depth is bounded by
    /// the heap rather than the call stack.
    fn walk(&mut self, parent: Option<NodeId>, root: &Token, fragment: bool) {
        let mut stack = vec![(parent, *root)];

        while let Some((mut parent, current)) = stack.pop() {
            match token::kind(&current) {
                Some(TokenKind::Element) => {
                    let tag = token::tag_name(&current).unwrap_or_default();
                    if !fragment || !FRAGMENT_SKIP_TAGS.contains(&tag.as_str()) {
                        let attributes: Attributes =
                            token::attributes(&current).into_iter().collect();
                        let id = self.push_element(parent, &tag, attributes);
                        parent = Some(id);
                    }
                }
                Some(TokenKind::Text) => {
                    self.text(parent, &current, fragment);
                }
                // Fragment roots are wrappers, not content.
                Some(TokenKind::Document) if fragment => {}
                Some(kind) => {
                    if let Some(tag) = kind.synthetic_tag() {
                        self.push_leaf(tag);
                    }
                }
                None => continue,
            }

            let mark = stack.len();
            stack.extend(token::children(&current).map(|child| (parent, child)));
            stack[mark..].reverse();
        }
    }

    fn text(&mut self, parent: Option<NodeId>, current: &Token, fragment: bool) {
        let Some(raw) = token::text(current) else {
            return;
        };
        let text = raw.trim();
        if text.is_empty() {
            return;
        }

        let raw_content = token::parent_tag(current)
            .is_some_and(|tag| PARSE_SKIP_TAGS.contains(&tag.as_str()));

        if text.contains('<') && !raw_content && !fragment {
            self.parse_fragment(parent, text);
        } else {
            self.attach(text);
        }
    }

    /// Text that itself carries markup is tokenized again and its nodes are
    /// parented under the current element.
    fn parse_fragment(&mut self, parent: Option<NodeId>, contents: &str) {
        trace!(contents, "re-parsing embedded markup");
        let tree = token::parse_fragment(contents);
        let root = tree.root();
        self.walk(parent, &root, true);
    }

    /// Attach to the most recent element; if it already owns a fragment the
    /// text follows a closed sibling and belongs to that element's parent.
    fn attach(&mut self, text: &str) {
        let Some(mut target) = self.last_element else {
            trace!(text, "dropping text with no element to attach to");
            return;
        };

        if !self.doc.nodes[target.0].text_fragments.is_empty() {
            match self.doc.nodes[target.0].parent {
                Some(parent) => target = parent,
                None => {
                    trace!(text, "dropping text following a parentless element");
                    return;
                }
            }
        }

        self.doc.nodes[target.0].text_fragments.push(text.to_string());
    }

    fn push_element(&mut self, parent: Option<NodeId>, tag: &str, attributes: Attributes) -> NodeId {
        let id = NodeId(self.doc.nodes.len());
        let node = DomNode::new(id.0, parent, tag, attributes);

        if let Some(parent) = parent {
            self.doc.nodes[parent.0].children.push(id);
        }
        self.doc
            .tag_index
            .entry(node.tag.clone())
            .or_default()
            .push(id);
        self.doc.nodes.push(node);
        self.last_element = Some(id);
        id
    }

    fn push_leaf(&mut self, tag: &str) {
        let id = self.doc.nodes.len();
        self.doc
            .nodes
            .push(DomNode::new(id, None, tag, Attributes::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(doc: &Document) -> Vec<String> {
        doc.nodes().map(|n| n.tag().to_string()).collect()
    }

    #[test]
    fn test_document_node_has_index_zero() {
        let doc = Document::parse("<p>x</p>");
        let first = doc.nodes().next().expect("document node");
        assert_eq!(first.tag(), "document");
        assert_eq!(first.index(), 0);
    }

    #[test]
    fn test_indices_match_positions() {
        let doc = Document::parse("<!DOCTYPE html><html><head><title>t</title></head><body><!-- c --><div><p>a</p></div></body></html>");
        for (i, node) in doc.nodes().enumerate() {
            assert_eq!(node.index(), i);
            assert_eq!(node.id().index(), i);
        }
        assert_eq!(
            tags(&doc),
            ["document", "doctype", "html", "head", "title", "body", "comment", "div", "p"]
        );
    }

    #[test]
    fn test_leaf_nodes_are_unlinked() {
        let doc = Document::parse("<div><!-- note --><p>a</p></div>");
        let comment = doc.nodes_with_tag("comment").next();
        assert!(comment.is_none(), "comments are not tag-indexed");

        let comment = doc.nodes().find(|n| n.tag() == "comment").expect("comment node");
        assert!(comment.parent_id().is_none());
        let div = doc.nodes_with_tag("div").next().expect("div");
        assert!(div.child_ids().iter().all(|&id| id != comment.id()));
    }

    #[test]
    fn test_parent_child_links() {
        let doc = Document::parse("<ul><li>a</li><li>b</li></ul>");
        let ul = doc.nodes_with_tag("ul").next().expect("ul");
        let items: Vec<_> = doc.nodes_with_tag("li").collect();
        assert_eq!(items.len(), 2);
        for li in &items {
            assert_eq!(li.parent_id(), Some(ul.id()));
        }
        assert_eq!(ul.child_ids(), [items[0].id(), items[1].id()]);
    }

    #[test]
    fn test_whitespace_only_text_discarded() {
        let doc = Document::parse("<div>   \n\t  <p> x </p>  </div>");
        let div = doc.nodes_with_tag("div").next().expect("div");
        assert!(div.text_fragments().is_empty());
        let p = doc.nodes_with_tag("p").next().expect("p");
        assert_eq!(p.text_fragments(), ["x"]);
    }

    #[test]
    fn test_attributes_copied() {
        let doc = Document::parse(r#"<div id="main" class="a b">x</div>"#);
        let div = doc.nodes_with_tag("div").next().expect("div");
        assert_eq!(div.attr("id"), Some("main"));
        assert_eq!(div.attr("class"), Some("a b"));
        assert_eq!(div.attr("missing"), None);
    }

    #[test]
    fn test_embedded_markup_is_reparsed() {
        // Escaped markup becomes literal "<b>" text after entity decoding.
        let doc = Document::parse("<div>&lt;b&gt;bold&lt;/b&gt;</div>");
        let div = doc.nodes_with_tag("div").next().expect("div");
        let b = doc.nodes_with_tag("b").next().expect("re-parsed b");
        assert_eq!(b.parent_id(), Some(div.id()));
        assert_eq!(b.text(), "bold");
        assert!(doc.nodes_with_tag("body").count() == 1);
        assert!(doc.nodes_with_tag("html").count() == 1);
    }

    #[test]
    fn test_script_text_is_not_reparsed() {
        let doc = Document::parse("<script>if (a < b) { x = '<p>y</p>'; }</script>");
        let script = doc.nodes_with_tag("script").next().expect("script");
        assert!(script.text().contains("<p>y</p>"));
        assert_eq!(doc.nodes_with_tag("p").count(), 0);
    }

    #[test]
    fn test_reparse_happens_once() {
        // "a < b" stays text after re-parsing and must not loop.
        let doc = Document::parse("<p>a &lt; b</p>");
        let p = doc.nodes_with_tag("p").next().expect("p");
        assert_eq!(p.text(), "a < b");
    }

    #[test]
    fn test_deep_nesting_builds_without_recursion() {
        let depth = 20_000;
        let html = format!("{}x{}", "<div>".repeat(depth), "</div>".repeat(depth));
        let doc = Document::parse(&html);

        let divs: Vec<_> = doc.nodes_with_tag("div").collect();
        assert_eq!(divs.len(), depth);
        for pair in divs.windows(2) {
            assert_eq!(pair[1].parent_id(), Some(pair[0].id()));
        }
        assert_eq!(divs[depth - 1].text(), "x");
        assert_eq!(divs[0].reader_text(), "x");
        assert!(doc.is_descendant(Some(divs[0].id()), Some(divs[depth - 1].id())));
    }

    #[test]
    fn test_reparsed_fragment_precedes_later_siblings() {
        let doc = Document::parse("<div>&lt;b&gt;in&lt;/b&gt;</div><p>after</p>");
        let b = doc.nodes_with_tag("b").next().expect("re-parsed b");
        let p = doc.nodes_with_tag("p").next().expect("p");
        assert!(b.index() < p.index());
        assert_eq!(p.text(), "after");
    }

    #[test]
    fn test_trailing_text_goes_to_container() {
        let doc = Document::parse("<div><p>x</p>tail</div>");
        let div = doc.nodes_with_tag("div").next().expect("div");
        let p = doc.nodes_with_tag("p").next().expect("p");
        assert_eq!(p.text_fragments(), ["x"]);
        assert_eq!(div.text_fragments(), ["tail"]);
    }
}

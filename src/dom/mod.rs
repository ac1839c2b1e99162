//! Indexed DOM model.
//!
//! A `Document` is a flat arena of `DomNode`s stored in document order
//! (depth-first, pre-order). A node's `NodeId` is its position in that arena,
//! so comparing ids compares document positions without walking the tree.
//! Parent links are plain ids; children are owned through the arena.
//!
//! Alongside the arena the document keeps a tag index (`tag -> ids`, in
//! document order) which backs every query in [`query`].
//!
//! ## Text fragments
//!
//! Text is not stored as separate nodes. Each trimmed, non-empty text run is
//! attached as a *fragment* to an element:
//!
//! ```html
//! <div>foo<strong>baz</strong>bar</div>
//! ```
//!
//! `foo` and `bar` are fragments of `div`, `baz` is a fragment of `strong`.
//! [`Node::reader_text`] recombines them into `"foo baz bar"`.

mod builder;
pub mod query;
pub mod token;

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::OnceLock;

/// Attribute map of a node (name -> value).
pub type Attributes = HashMap<String, String>;

/// Tag of the document's top-level container element.
pub const ROOT_TAG: &str = "html";

/// Position of a node in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The document-order index of the node.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single node of the simplified tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomNode {
    index: usize,
    tag: String,
    attributes: Attributes,
    text_fragments: Vec<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl DomNode {
    fn new(index: usize, parent: Option<NodeId>, tag: &str, attributes: Attributes) -> Self {
        Self {
            index,
            tag: tag.to_lowercase(),
            attributes,
            text_fragments: Vec::new(),
            parent,
            children: Vec::new(),
        }
    }

    /// Document-order index.
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Lower-cased tag, or one of `comment`, `error`, `document`, `doctype`.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Value of the attribute `key`, if present.
    #[inline]
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Text fragments owned directly by this node, in document order.
    #[inline]
    #[must_use]
    pub fn text_fragments(&self) -> &[String] {
        &self.text_fragments
    }

    #[inline]
    #[must_use]
    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn child_ids(&self) -> &[NodeId] {
        &self.children
    }

    /// The node's own fragments joined with single spaces.
    #[must_use]
    pub fn text(&self) -> String {
        // Single fragments are by far the common case; skip the join.
        match self.text_fragments.as_slice() {
            [] => String::new(),
            [only] => only.clone(),
            many => many.join(" "),
        }
    }
}

/// Borrowed view of a node inside its document.
///
/// Derefs to [`DomNode`] for the node's own data and adds the operations that
/// need the rest of the tree (parent, children, reader text).
#[derive(Clone, Copy)]
pub struct Node<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> Node<'a> {
    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn document(&self) -> &'a Document {
        self.doc
    }

    #[must_use]
    pub fn parent(&self) -> Option<Node<'a>> {
        self.entry().parent.map(|id| self.doc.node(id))
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let doc = self.doc;
        doc.entry(self.id).children.iter().map(move |&id| doc.node(id))
    }

    /// Human reading-order text of this node and its descendants.
    ///
    /// The first owned fragment leads, each child's reader text follows in
    /// order, and when the node owns more than two fragments the next one is
    /// interleaved after each non-empty child. Whatever fragments remain are
    /// appended at the end. Nodes with at most two fragments are treated as
    /// "leading + trailing" only.
    #[must_use]
    pub fn reader_text(&self) -> String {
        // Children always sit after their parent in the arena, so a reverse
        // pass over the subtree composes every child before its parent.
        let mut subtree = vec![self.id];
        let mut pending = vec![self.id];
        while let Some(id) = pending.pop() {
            let children = &self.doc.entry(id).children;
            subtree.extend(children);
            pending.extend(children);
        }
        subtree.sort_unstable();

        let mut composed: HashMap<NodeId, String> = HashMap::with_capacity(subtree.len());
        for &id in subtree.iter().rev() {
            let text = compose_reader_text(self.doc.entry(id), &mut composed);
            composed.insert(id, text);
        }
        composed.remove(&self.id).unwrap_or_default()
    }

    fn entry(&self) -> &'a DomNode {
        self.doc.entry(self.id)
    }
}

/// Reader text of `node` given the already composed text of its children.
fn compose_reader_text(node: &DomNode, composed: &mut HashMap<NodeId, String>) -> String {
    if node.children.is_empty() {
        return node.text();
    }

    let fragments = &node.text_fragments;
    let mut result = String::new();
    let mut used = 0;

    if let Some(leading) = fragments.first() {
        result.push_str(leading);
        result.push(' ');
        used = 1;
    }

    for child in &node.children {
        let child_text = composed.remove(child).unwrap_or_default();
        if child_text.is_empty() {
            continue;
        }
        result.push_str(&child_text);
        result.push(' ');
        if fragments.len() > 2 && used < fragments.len() {
            result.push_str(&fragments[used]);
            result.push(' ');
            used += 1;
        }
    }

    let mut result = result.trim().to_string();

    if used < fragments.len() {
        if !result.is_empty() {
            result.push(' ');
        }
        result.push_str(&fragments[used..].join(" "));
    }

    result
}

impl Deref for Node<'_> {
    type Target = DomNode;

    fn deref(&self) -> &DomNode {
        self.doc.entry(self.id)
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("index", &self.id.0)
            .field("tag", &self.tag())
            .finish()
    }
}

impl fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Index:\t{}", self.index())?;
        writeln!(f, "Tag:\t{}", self.tag())?;
        writeln!(f, "Attr:\t{:?}", self.attributes())?;
        writeln!(f, "TextFragments:\t{:?}", self.text_fragments())?;
        if let Some(parent) = self.parent() {
            writeln!(f, "Edges:\n\tParent:\t{} - {}", parent.index(), parent.tag())?;
        }
        for child in self.children() {
            writeln!(f, "\tChild:\t{} - {}", child.index(), child.tag())?;
        }
        Ok(())
    }
}

/// A parsed document: node arena, tag index and cached root node.
///
/// A fresh tree is built on every [`Document::set_contents`]; nothing is
/// updated incrementally.
#[derive(Debug, Clone, Default)]
pub struct Document {
    contents: String,
    nodes: Vec<DomNode>,
    tag_index: HashMap<String, Vec<NodeId>>,
    root: OnceLock<Option<NodeId>>,
}

impl Document {
    /// An empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `html` into a new document.
    ///
    /// # Example
    ///
    /// ```rust
    /// use scrapekit::Document;
    ///
    /// let doc = Document::parse("<div>foo<strong>baz</strong>bar</div>");
    /// let div = doc.find("div", &[]);
    /// assert_eq!(div[0].reader_text(), "foo baz bar");
    /// ```
    #[must_use]
    pub fn parse(html: &str) -> Self {
        let mut doc = Self::new();
        doc.set_contents(html);
        doc
    }

    /// Replace the document contents, discarding the previous tree, index and
    /// root cache before rebuilding.
    pub fn set_contents(&mut self, html: &str) {
        *self = Self {
            contents: html.to_string(),
            ..Self::default()
        };
        builder::build(self);
    }

    /// The raw markup the document was built from.
    #[must_use]
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Byte length of the raw markup.
    #[must_use]
    pub fn content_length(&self) -> usize {
        self.contents.len()
    }

    /// Number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node with the given id, if it belongs to this document.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<Node<'_>> {
        (id.0 < self.nodes.len()).then(|| self.node(id))
    }

    /// Every node in document order.
    pub fn nodes(&self) -> impl Iterator<Item = Node<'_>> {
        (0..self.nodes.len()).map(|i| self.node(NodeId(i)))
    }

    /// Nodes carrying `tag`, in document order.
    pub fn nodes_with_tag<'a>(&'a self, tag: &str) -> impl Iterator<Item = Node<'a>> + 'a {
        self.tag_index
            .get(tag)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(move |&id| self.node(id))
    }

    /// The first `<html>` element, resolved on first use and cached.
    #[must_use]
    pub fn root_node(&self) -> Option<Node<'_>> {
        self.root_id().map(|id| self.node(id))
    }

    pub(crate) fn root_id(&self) -> Option<NodeId> {
        *self.root.get_or_init(|| {
            self.nodes
                .iter()
                .position(|n| n.tag == ROOT_TAG)
                .map(NodeId)
        })
    }

    /// Log the textual dump of every node at debug level.
    pub fn dump(&self) {
        tracing::debug!("{self}");
    }

    fn node(&self, id: NodeId) -> Node<'_> {
        Node { doc: self, id }
    }

    fn entry(&self, id: NodeId) -> &DomNode {
        &self.nodes[id.0]
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.nodes() {
            writeln!(f, "Node:\n{node}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first<'a>(doc: &'a Document, tag: &str) -> Node<'a> {
        doc.nodes_with_tag(tag)
            .next()
            .unwrap_or_else(|| panic!("no <{tag}> in document"))
    }

    #[test]
    fn test_text_single_and_multiple_fragments() {
        let node = DomNode {
            text_fragments: vec!["a".to_string()],
            ..DomNode::new(1, None, "p", Attributes::new())
        };
        assert_eq!(node.text(), "a");

        let node = DomNode {
            text_fragments: vec!["a".to_string(), "b".to_string()],
            ..DomNode::new(1, None, "p", Attributes::new())
        };
        assert_eq!(node.text(), "a b");

        let node = DomNode::new(1, None, "p", Attributes::new());
        assert_eq!(node.text(), "");
    }

    #[test]
    fn test_tag_is_lowercased() {
        let node = DomNode::new(3, None, "DIV", Attributes::new());
        assert_eq!(node.tag(), "div");
    }

    #[test]
    fn test_reader_text_leading_and_trailing() {
        let doc = Document::parse("<html><body><div>foo<strong>baz</strong>bar</div></body></html>");
        let div = first(&doc, "div");
        assert_eq!(div.text_fragments(), ["foo", "bar"]);
        assert_eq!(div.text(), "foo bar");
        assert_eq!(div.reader_text(), "foo baz bar");
    }

    #[test]
    fn test_reader_text_interleaves_with_more_than_two_fragments() {
        let doc = Document::parse("<p>one<b>two</b>three<i>four</i>five</p>");
        let p = first(&doc, "p");
        assert_eq!(p.text_fragments(), ["one", "three", "five"]);
        assert_eq!(p.reader_text(), "one two three four five");
    }

    #[test]
    fn test_reader_text_without_children_is_text() {
        let doc = Document::parse("<p>  plain   words </p>");
        let p = first(&doc, "p");
        assert_eq!(p.reader_text(), "plain   words");
        assert_eq!(p.reader_text(), p.text());
    }

    #[test]
    fn test_reader_text_only_trailing_fragment() {
        let doc = Document::parse("<div><p></p><span>x</span></div>");
        let div = first(&doc, "div");
        assert_eq!(div.reader_text(), "x");
    }

    #[test]
    fn test_root_node_is_cached_html() {
        let doc = Document::parse("<p>x</p>");
        let root = doc.root_node().expect("html root");
        assert_eq!(root.tag(), "html");
        assert_eq!(doc.root_node(), Some(root));
    }

    #[test]
    fn test_set_contents_discards_previous_tree() {
        let mut doc = Document::parse("<div><p>a</p><p>b</p></div>");
        assert_eq!(doc.nodes_with_tag("p").count(), 2);

        doc.set_contents("<span>c</span>");
        assert_eq!(doc.nodes_with_tag("p").count(), 0);
        assert_eq!(doc.nodes_with_tag("span").count(), 1);
        assert_eq!(doc.contents(), "<span>c</span>");
        assert_eq!(doc.content_length(), 14);
    }

    #[test]
    fn test_get_out_of_range() {
        let doc = Document::parse("<p>x</p>");
        assert!(doc.get(NodeId(doc.len())).is_none());
        assert!(doc.get(NodeId(0)).is_some());
    }

    #[test]
    fn test_display_lists_edges() {
        let doc = Document::parse("<div><p>x</p></div>");
        let p = first(&doc, "p");
        let dump = p.to_string();
        assert!(dump.contains("Tag:\tp"));
        assert!(dump.contains("Parent:"));
        assert!(doc.to_string().contains("Node:"));
    }
}

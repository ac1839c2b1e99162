//! Query engine over a built [`Document`].
//!
//! Every lookup starts from the tag index and filters by scope, so a query
//! costs one pass over the nodes of a single tag. Scope tests walk parent
//! links upward and stop as soon as the walk passes the candidate ancestor's
//! document position: an ancestor never has a larger index than its
//! descendants.
//!
//! Scopes are `Option<NodeId>`; `None` means the whole document.

use tracing::debug;

use super::{Document, Node, NodeId};
use crate::error::{Error, Result};
use crate::json::{self, JsonMap, JsonShape};

impl Document {
    /// Is `node` the same node as, or a descendant of, `ancestor`?
    ///
    /// A `None` ancestor matches everything; a `None` node matches nothing
    /// (unless the ancestor is also `None`).
    #[must_use]
    pub fn is_descendant(&self, ancestor: Option<NodeId>, node: Option<NodeId>) -> bool {
        let Some(ancestor) = ancestor else {
            return true;
        };
        let Some(mut node) = node else {
            return false;
        };
        if ancestor == node {
            return true;
        }

        let root = self.root_id();
        while node.0 < self.nodes.len() && ancestor.0 <= node.0 && Some(node) != root {
            match self.nodes[node.0].parent {
                Some(parent) if parent == ancestor => return true,
                Some(parent) => node = parent,
                None => break,
            }
        }
        false
    }

    /// Is `parent` the direct parent of `node`? Not transitive.
    #[must_use]
    pub fn is_child(&self, parent: NodeId, node: NodeId) -> bool {
        self.nodes
            .get(node.0)
            .is_some_and(|n| n.parent == Some(parent))
    }

    /// Nodes of `tag` under the root node whose attributes include every
    /// `(name, value)` pair of `filter`. An empty filter matches every node of
    /// the tag.
    ///
    /// # Example
    ///
    /// ```rust
    /// use scrapekit::Document;
    ///
    /// let doc = Document::parse(r#"<a class="x">1</a><a class="y">2</a>"#);
    /// let hits = doc.find("a", &[("class", "y")]);
    /// assert_eq!(hits.len(), 1);
    /// assert_eq!(hits[0].text(), "2");
    /// ```
    #[must_use]
    pub fn find(&self, tag: &str, filter: &[(&str, &str)]) -> Vec<Node<'_>> {
        self.child_find(self.root_id(), tag, filter)
    }

    /// [`Document::find`] restricted to descendants of `scope`.
    #[must_use]
    pub fn child_find(
        &self,
        scope: Option<NodeId>,
        tag: &str,
        filter: &[(&str, &str)],
    ) -> Vec<Node<'_>> {
        self.nodes_with_tag(tag)
            .filter(|node| {
                filter
                    .iter()
                    .all(|&(key, value)| node.attr(key) == Some(value))
            })
            .filter(|node| self.is_descendant(scope, Some(node.id())))
            .collect()
    }

    /// Nodes of `tag` whose own text contains `substring` (case-sensitive).
    #[must_use]
    pub fn find_with_key(&self, tag: &str, substring: &str) -> Vec<Node<'_>> {
        self.child_find_with_key(self.root_id(), tag, substring)
    }

    /// [`Document::find_with_key`] restricted to descendants of `scope`.
    #[must_use]
    pub fn child_find_with_key(
        &self,
        scope: Option<NodeId>,
        tag: &str,
        substring: &str,
    ) -> Vec<Node<'_>> {
        self.nodes_with_tag(tag)
            .filter(|node| self.is_descendant(scope, Some(node.id())))
            .filter(|node| node.text().contains(substring))
            .collect()
    }

    /// Text of the first `tag` whose `class` attribute equals `class` exactly,
    /// or an empty string.
    #[must_use]
    pub fn find_text_for_class(&self, tag: &str, class: &str) -> String {
        self.child_find_text_for_class(self.root_id(), tag, class)
    }

    #[must_use]
    pub fn child_find_text_for_class(
        &self,
        scope: Option<NodeId>,
        tag: &str,
        class: &str,
    ) -> String {
        self.child_find(scope, tag, &[("class", class)])
            .first()
            .map(|node| node.text())
            .unwrap_or_default()
    }

    /// JSON dictionary following `key` in the first script mentioning it.
    pub fn find_json_for_script_with_key(&self, key: &str) -> Result<JsonMap> {
        self.child_find_json_for_script_with_key_shape(self.root_id(), key, JsonShape::Dictionary)
    }

    /// JSON blob of the given shape following `key` in the first script
    /// mentioning it.
    pub fn find_json_for_script_with_key_shape(
        &self,
        key: &str,
        shape: JsonShape,
    ) -> Result<JsonMap> {
        self.child_find_json_for_script_with_key_shape(self.root_id(), key, shape)
    }

    pub fn child_find_json_for_script_with_key_shape(
        &self,
        scope: Option<NodeId>,
        key: &str,
        shape: JsonShape,
    ) -> Result<JsonMap> {
        for node in self.child_find_with_key(scope, "script", key) {
            let contents = node.text();
            if let Some(start) = contents.find(key) {
                debug!(key, script = node.index(), "extracting JSON from script");
                return json::extract_json(&contents[start..], shape);
            }
        }
        Err(Error::NotJson(format!("no script contains {key:?}")))
    }

    /// Dictionary body between `open` and `close` after `key` in the first
    /// script that has all three, parsed as `{ body }`.
    ///
    /// For values that are not JSON fragments on their own, such as a bare
    /// `a: 1, b: 2` list inside a function call.
    ///
    /// # Example
    ///
    /// ```rust
    /// use scrapekit::Document;
    ///
    /// let doc = Document::parse("<script>player.setup(width: 640, height: 360);</script>");
    /// let map = doc.find_json_for_script_with_key_and_delimiters("setup", "(", ")")?;
    /// assert_eq!(map["width"], 640);
    /// # Ok::<(), scrapekit::Error>(())
    /// ```
    pub fn find_json_for_script_with_key_and_delimiters(
        &self,
        key: &str,
        open: &str,
        close: &str,
    ) -> Result<JsonMap> {
        self.child_find_json_for_script_with_key_and_delimiters(self.root_id(), key, open, close)
    }

    pub fn child_find_json_for_script_with_key_and_delimiters(
        &self,
        scope: Option<NodeId>,
        key: &str,
        open: &str,
        close: &str,
    ) -> Result<JsonMap> {
        for node in self.child_find_with_key(scope, "script", key) {
            let contents = node.text();
            if let Some(body) = delimited_after(&contents, key, open, close) {
                debug!(key, script = node.index(), "extracting delimited JSON body");
                return json::extract_json(&format!("{{{body}}}"), JsonShape::Dictionary);
            }
        }
        Err(Error::NotJson(format!(
            "no script contains {key:?} followed by {open:?}...{close:?}"
        )))
    }
}

/// Text strictly between the first `open` after `key` and the next `close`.
fn delimited_after<'t>(text: &'t str, key: &str, open: &str, close: &str) -> Option<&'t str> {
    let rest = &text[text.find(key)?..];
    let body_start = rest.find(open)? + open.len();
    let body = &rest[body_start..];
    let body_end = body.find(close)?;
    Some(&body[..body_end])
}

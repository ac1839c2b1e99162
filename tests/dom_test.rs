use scrapekit::{parse_bytes, Document, Node};

const ARTICLE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><title>Article</title><meta name="author" content="Jane"></head>
<body>
  <!-- header -->
  <div id="main">
    <h1>Heading</h1>
    <p>Intro <a href="/x">link</a> outro</p>
    <div class="note">foo<strong>baz</strong>bar</div>
    <ul><li>one</li><li>two</li></ul>
  </div>
</body>
</html>"#;

fn first<'a>(doc: &'a Document, tag: &str) -> Node<'a> {
    doc.nodes_with_tag(tag)
        .next()
        .unwrap_or_else(|| panic!("expected a <{tag}>"))
}

fn descendants<'a>(node: Node<'a>, out: &mut Vec<Node<'a>>) {
    for child in node.children() {
        out.push(child);
        descendants(child, out);
    }
}

#[test]
fn indices_strictly_increase_in_document_order() {
    let doc = Document::parse(ARTICLE);
    let indices: Vec<usize> = doc.nodes().map(|n| n.index()).collect();
    assert!(!indices.is_empty());
    assert!(indices.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(indices[0], 0);
}

#[test]
fn descendants_never_precede_their_ancestor() {
    let doc = Document::parse(ARTICLE);
    for node in doc.nodes() {
        let mut below = Vec::new();
        descendants(node, &mut below);
        for d in below {
            assert!(
                d.index() >= node.index(),
                "<{}> #{} is below <{}> #{}",
                d.tag(),
                d.index(),
                node.tag(),
                node.index()
            );
        }
    }
}

#[test]
fn every_linked_child_appears_once_in_its_parent() {
    let doc = Document::parse(ARTICLE);
    for node in doc.nodes() {
        if let Some(parent) = node.parent() {
            let count = parent.child_ids().iter().filter(|&&id| id == node.id()).count();
            assert_eq!(count, 1, "<{}> #{}", node.tag(), node.index());
        }
    }
}

#[test]
fn tag_index_lists_nodes_in_document_order() {
    let doc = Document::parse(ARTICLE);
    let divs: Vec<usize> = doc.nodes_with_tag("div").map(|n| n.index()).collect();
    assert_eq!(divs.len(), 2);
    assert!(divs[0] < divs[1]);
    assert!(doc.nodes_with_tag("DIV").next().is_none());
}

#[test]
fn root_node_is_first_html_element() {
    let doc = Document::parse(ARTICLE);
    let root = doc.root_node().expect("root");
    assert_eq!(root.tag(), "html");
    assert_eq!(root.attr("lang"), Some("en"));
    assert_eq!(root, doc.root_node().expect("cached root"));
}

#[test]
fn text_joins_own_fragments() {
    let doc = Document::parse(ARTICLE);
    assert_eq!(first(&doc, "title").text(), "Article");
    assert_eq!(first(&doc, "p").text(), "Intro outro");
    assert_eq!(first(&doc, "ul").text(), "");
}

#[test]
fn reader_text_follows_reading_order() {
    let doc = Document::parse(ARTICLE);
    let note = doc.find("div", &[("class", "note")])[0];
    assert_eq!(note.reader_text(), "foo baz bar");
    assert_eq!(first(&doc, "p").reader_text(), "Intro link outro");
    assert_eq!(first(&doc, "ul").reader_text(), "one two");
    assert_eq!(first(&doc, "li").reader_text(), "one");
}

#[test]
fn reader_text_interleaves_with_more_than_two_fragments() {
    let doc = Document::parse("<p>a<b>1</b>b<i>2</i>c</p>");
    let p = first(&doc, "p");
    assert_eq!(p.text_fragments(), ["a", "b", "c"]);
    assert_eq!(p.reader_text(), "a 1 b 2 c");
}

#[test]
fn building_twice_yields_identical_trees() {
    let a = Document::parse(ARTICLE);
    let b = Document::parse(ARTICLE);
    assert_eq!(a.len(), b.len());
    for (x, y) in a.nodes().zip(b.nodes()) {
        assert_eq!(*x, *y);
    }
}

#[test]
fn set_contents_discards_previous_tree() {
    let mut doc = Document::parse(ARTICLE);
    assert!(doc.nodes_with_tag("li").next().is_some());

    doc.set_contents("<p>fresh</p>");
    assert!(doc.nodes_with_tag("li").next().is_none());
    assert_eq!(doc.find("p", &[]).len(), 1);
    assert_eq!(doc.contents(), "<p>fresh</p>");
    assert_eq!(doc.content_length(), 12);
    assert_eq!(doc.root_node().expect("new root").tag(), "html");
}

#[test]
fn empty_document_has_no_root() {
    let doc = Document::new();
    assert!(doc.is_empty());
    assert!(doc.root_node().is_none());
    assert!(doc.find("p", &[]).is_empty());
}

#[test]
fn display_dump_lists_every_node() {
    let doc = Document::parse("<p class=\"x\">hi</p>");
    let dump = doc.to_string();
    assert_eq!(dump.matches("Node:\n").count(), doc.len());
    assert!(dump.contains("Tag:\tp"));
    assert!(dump.contains("\"hi\""));
}

#[test]
fn parse_bytes_detects_meta_charset() {
    let doc = parse_bytes(b"<html><head><meta charset=\"windows-1252\"></head><body><p>\x93q\x94</p></body></html>");
    assert_eq!(first(&doc, "p").text(), "\u{201C}q\u{201D}");
}

//! Markup tree built from the scanner's tokens.
//!
//! The tree is forgiving: unclosed elements extend to the end of their parent,
//! stray end tags are ignored, and void elements close as soon as their start
//! tag does. Nodes live in an arena owned by [`HtmlDocument`].

use super::scanner::{Scanner, ScannerState, TokenType};

/// Elements that never have content or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "menuitem",
    "meta", "param", "source", "track", "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS
        .binary_search(&tag.to_ascii_lowercase().as_str())
        .is_ok()
}

/// Index of a node in its document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A start-tag attribute with its raw (possibly quoted) value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// `None` for valueless attributes such as `checked`.
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Tag name as written. `None` for the document root and nameless tags.
    pub tag: Option<String>,
    /// Offset of the `<` opening the start tag.
    pub start: usize,
    /// Offset just past the start tag's `>`, once seen.
    pub start_tag_end: Option<usize>,
    /// Offset just past the element (end tag, or where it was implicitly closed).
    pub end: usize,
    /// Offset of the `</` of the matching end tag.
    pub end_tag_start: Option<usize>,
    /// Whether the element was explicitly closed.
    pub closed: bool,
    pub attributes: Vec<Attribute>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    fn new(start: usize, end: usize, parent: Option<NodeId>) -> Self {
        Node {
            tag: None,
            start,
            start_tag_end: None,
            end,
            end_tag_start: None,
            closed: false,
            attributes: Vec::new(),
            parent,
            children: Vec::new(),
        }
    }

    /// Case-insensitive tag comparison against an already lowercased name.
    pub fn is_same_tag(&self, lowercase_tag: &str) -> bool {
        self.tag
            .as_deref()
            .is_some_and(|tag| tag.len() == lowercase_tag.len() && tag.to_ascii_lowercase() == lowercase_tag)
    }

    /// Raw value of the first attribute called `name`.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    fn set_attribute(&mut self, name: &str, value: Option<String>) {
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value,
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
    }
}

/// A parsed markup document.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    nodes: Vec<Node>,
}

impl HtmlDocument {
    const ROOT: NodeId = NodeId(0);

    /// The pseudo node spanning the whole text. It has no tag and no start tag.
    pub fn root(&self) -> &Node {
        &self.nodes[Self::ROOT.0]
    }

    pub fn root_id(&self) -> NodeId {
        Self::ROOT
    }

    /// Top-level elements.
    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.children(Self::ROOT)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<&Node> {
        self.node(id).parent.map(|parent| self.node(parent))
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Node> {
        self.node(id).children.iter().map(|&child| self.node(child))
    }

    /// All elements in document order.
    pub fn descendants(&self) -> impl Iterator<Item = &Node> {
        // Nodes are pushed in start-tag order, which is document order
        self.nodes.iter().skip(1)
    }

    /// The innermost node containing `offset`, or the root.
    ///
    /// A node contains offsets in `(start, end]`.
    pub fn find_node_at(&self, offset: usize) -> NodeId {
        let mut current = Self::ROOT;
        loop {
            let children = &self.node(current).children;
            let idx = children.partition_point(|&child| self.node(child).start < offset);
            let Some(&candidate) = idx.checked_sub(1).and_then(|idx| children.get(idx)) else {
                return current;
            };
            let child = self.node(candidate);
            if offset > child.start && offset <= child.end {
                current = candidate;
            } else {
                return current;
            }
        }
    }

    /// The last node that starts before `offset`, descending into unclosed or
    /// enclosing elements.
    pub fn find_node_before(&self, offset: usize) -> NodeId {
        let mut current = Self::ROOT;
        loop {
            let children = &self.node(current).children;
            let idx = children.partition_point(|&child| self.node(child).start < offset);
            let Some(&candidate) = idx.checked_sub(1).and_then(|idx| children.get(idx)) else {
                return current;
            };
            let child = self.node(candidate);
            if offset > child.start {
                if offset < child.end {
                    current = candidate;
                    continue;
                }
                if let Some(&last) = child.children.last() {
                    if !self.node(last).closed {
                        current = candidate;
                        continue;
                    }
                }
                return candidate;
            }
            return current;
        }
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        if let Some(parent) = node.parent {
            self.nodes[parent.0].children.push(id);
        }
        self.nodes.push(node);
        id
    }
}

/// Parse `text` as markup.
///
/// `text` should already be preprocessed when it can contain expression
/// attributes; see [`crate::html::preprocess`].
pub fn parse_html(text: &str) -> HtmlDocument {
    let mut scanner =
        Scanner::new(text, 0, ScannerState::WithinContent).with_pseudo_close_tags(true);
    let mut doc = HtmlDocument {
        nodes: vec![Node::new(0, text.len(), None)],
    };

    let mut curr = HtmlDocument::ROOT;
    let mut end_tag_start = None;
    let mut end_tag_name: Option<String> = None;
    let mut pending_attribute: Option<String> = None;

    let mut token = scanner.scan();
    while token != TokenType::Eos {
        match token {
            TokenType::StartTagOpen => {
                let child = Node::new(scanner.token_offset(), text.len(), Some(curr));
                curr = doc.push(child);
            }
            TokenType::StartTag => {
                doc.nodes[curr.0].tag = Some(scanner.token_text().to_string());
            }
            TokenType::StartTagClose => {
                if let Some(parent) = doc.nodes[curr.0].parent {
                    let node = &mut doc.nodes[curr.0];
                    // Might be moved to the end tag later
                    node.end = scanner.token_end();
                    if scanner.token_length() > 0 {
                        node.start_tag_end = Some(scanner.token_end());
                        if node.tag.as_deref().is_some_and(is_void_element) {
                            node.closed = true;
                            curr = parent;
                        }
                    } else {
                        // Pseudo close token from an incomplete start tag
                        curr = parent;
                    }
                }
            }
            TokenType::StartTagSelfClose => {
                if let Some(parent) = doc.nodes[curr.0].parent {
                    let node = &mut doc.nodes[curr.0];
                    node.closed = true;
                    node.end = scanner.token_end();
                    node.start_tag_end = Some(scanner.token_end());
                    curr = parent;
                }
            }
            TokenType::EndTagOpen => {
                end_tag_start = Some(scanner.token_offset());
                end_tag_name = None;
            }
            TokenType::EndTag => {
                end_tag_name = Some(scanner.token_text().to_ascii_lowercase());
            }
            TokenType::EndTagClose => {
                if let (Some(name), Some(tag_start)) = (&end_tag_name, end_tag_start) {
                    let mut node = curr;
                    while !doc.node(node).is_same_tag(name) {
                        match doc.node(node).parent {
                            Some(parent) => node = parent,
                            None => break,
                        }
                    }
                    if doc.node(node).parent.is_some() {
                        while curr != node {
                            let unclosed = &mut doc.nodes[curr.0];
                            unclosed.end = tag_start;
                            unclosed.closed = false;
                            curr = unclosed.parent.unwrap_or(HtmlDocument::ROOT);
                        }
                        let matched = &mut doc.nodes[curr.0];
                        matched.closed = true;
                        matched.end_tag_start = Some(tag_start);
                        matched.end = scanner.token_end();
                        curr = matched.parent.unwrap_or(HtmlDocument::ROOT);
                    }
                }
            }
            TokenType::AttributeName => {
                let name = scanner.token_text().to_string();
                // Valueless until a value shows up, e.g. `checked`
                doc.nodes[curr.0].set_attribute(&name, None);
                pending_attribute = Some(name);
            }
            TokenType::AttributeValue => {
                if let Some(name) = pending_attribute.take() {
                    let value = scanner.token_text().to_string();
                    doc.nodes[curr.0].set_attribute(&name, Some(value));
                }
            }
            _ => {}
        }
        token = scanner.scan();
    }

    while let Some(parent) = doc.nodes[curr.0].parent {
        let node = &mut doc.nodes[curr.0];
        node.end = text.len();
        node.closed = false;
        curr = parent;
    }

    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_tree() {
        let text = "<div><p>hi</p><br></div>";
        let doc = parse_html(text);

        let roots: Vec<_> = doc.roots().collect();
        assert_eq!(roots.len(), 1);
        let div = roots[0];
        assert_eq!(div.tag.as_deref(), Some("div"));
        assert_eq!((div.start, div.start_tag_end, div.end), (0, Some(5), 24));
        assert!(div.closed);

        let children: Vec<_> = div.children.iter().map(|&id| doc.node(id)).collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].tag.as_deref(), Some("p"));
        assert_eq!(children[0].end_tag_start, Some(10));
        assert_eq!(children[1].tag.as_deref(), Some("br"));
        assert!(children[1].closed);
    }

    #[test]
    fn unclosed_elements_extend_to_end() {
        let text = "<main><section>text";
        let doc = parse_html(text);
        let main = doc.roots().next().unwrap();
        assert_eq!(main.end, text.len());
        assert!(!main.closed);
    }

    #[test]
    fn end_tag_closes_intermediate_elements() {
        let text = "<ul><li>a</ul>";
        let doc = parse_html(text);
        let ul = doc.roots().next().unwrap();
        assert!(ul.closed);
        let li = doc.node(ul.children[0]);
        assert!(!li.closed);
        assert_eq!(li.end, 9);
    }

    #[test]
    fn records_attributes() {
        let doc = parse_html(r#"<input type="text" disabled value=3 />"#);
        let input = doc.roots().next().unwrap();
        assert_eq!(
            input.attributes,
            vec![
                Attribute {
                    name: "type".into(),
                    value: Some("\"text\"".into())
                },
                Attribute {
                    name: "disabled".into(),
                    value: None
                },
                Attribute {
                    name: "value".into(),
                    value: Some("3".into())
                },
            ]
        );
    }

    #[test]
    fn find_node_at_offsets() {
        let text = "<div><span>x</span></div>";
        let doc = parse_html(text);

        let span = doc.find_node_at(8);
        assert_eq!(doc.node(span).tag.as_deref(), Some("span"));

        // The start offset itself belongs to the parent
        let at_span_start = doc.find_node_at(5);
        assert_eq!(doc.node(at_span_start).tag.as_deref(), Some("div"));

        assert_eq!(doc.find_node_at(0), doc.root_id());
    }

    #[test]
    fn find_node_before_offsets() {
        let text = "<div></div><p></p>";
        let doc = parse_html(text);
        let before = doc.find_node_before(18);
        assert_eq!(doc.node(before).tag.as_deref(), Some("p"));
        let before = doc.find_node_before(11);
        assert_eq!(doc.node(before).tag.as_deref(), Some("div"));
    }

    #[test]
    fn incomplete_start_tag_is_closed_by_next_tag() {
        let text = "<div <span></span>";
        let doc = parse_html(text);
        let roots: Vec<_> = doc.roots().collect();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].start_tag_end, None);
        assert_eq!(roots[1].tag.as_deref(), Some("span"));
    }

    #[test]
    fn void_element_lookup_is_case_insensitive() {
        assert!(is_void_element("BR"));
        assert!(is_void_element("img"));
        assert!(!is_void_element("div"));
    }
}

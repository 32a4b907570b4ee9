//! Small classifiers shared by the preprocessor and the completion helpers.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::html::{HtmlDocument, Node};

static NAMESPACED_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r".+[.][A-Za-z]+").unwrap());

/// Check whether `end` falls inside an unclosed `{ ... }` expression that
/// starts after `start`.
///
/// Only the last brace of each kind counts: the span is "inside" when its last
/// `{` comes after its last `}`.
pub fn is_inside_expression(text: &str, start: usize, end: usize) -> bool {
    let Some(span) = text.get(start..end) else {
        return false;
    };
    match (span.rfind('{'), span.rfind('}')) {
        (Some(open), Some(close)) => open > close,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Brace positions of a text, answering [`is_inside_expression`] queries in
/// constant time.
///
/// Only braces are recorded, so the index stays valid while `<` and `>`
/// characters of the text are blanked.
#[derive(Debug, Clone)]
pub struct ExpressionIndex {
    /// Last `{` strictly before each offset
    last_open: Vec<Option<usize>>,
    /// Last `}` strictly before each offset
    last_close: Vec<Option<usize>>,
}

impl ExpressionIndex {
    pub fn new(text: &str) -> Self {
        let mut last_open = Vec::with_capacity(text.len() + 1);
        let mut last_close = Vec::with_capacity(text.len() + 1);
        let (mut open, mut close) = (None, None);

        last_open.push(open);
        last_close.push(close);
        for (idx, byte) in text.bytes().enumerate() {
            match byte {
                b'{' => open = Some(idx),
                b'}' => close = Some(idx),
                _ => {}
            }
            last_open.push(open);
            last_close.push(close);
        }

        Self {
            last_open,
            last_close,
        }
    }

    /// Same answer as [`is_inside_expression`] over the indexed text.
    pub fn is_inside(&self, start: usize, end: usize) -> bool {
        if start > end {
            return false;
        }
        match self.last_open.get(end).copied().flatten() {
            Some(open) if open >= start => self.last_close[end].is_none_or(|close| close < open),
            _ => false,
        }
    }
}

/// Components are capitalized (`<Card>`) or namespaced (`<ui.Card>`).
pub fn is_possible_component(node: &Node) -> bool {
    let Some(tag) = node.tag.as_deref() else {
        return false;
    };
    tag.starts_with(|c: char| c.is_ascii_uppercase()) || NAMESPACED_TAG.is_match(tag)
}

/// Check whether `offset` is inside the start tag of a component element.
///
/// Start tags that never closed extend to the end of the element.
pub fn is_in_component_start_tag(html: &HtmlDocument, offset: usize) -> bool {
    let node = html.node(html.find_node_at(offset));
    is_possible_component(node) && node.start_tag_end.is_none_or(|end| offset < end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;
    use proptest::prelude::*;

    #[test]
    fn test_inside_expression() {
        let text = "<Foo checked={a < 1}>";
        assert!(is_inside_expression(text, 0, 16));
        assert!(!is_inside_expression(text, 0, 20));
        assert!(!is_inside_expression(text, 0, 4));
        assert!(is_inside_expression("{{a}", 0, 4));
    }

    #[test]
    fn test_inside_expression_out_of_bounds() {
        assert!(!is_inside_expression("{a", 0, 10));
        assert!(!is_inside_expression("{a", 2, 1));
    }

    #[test]
    fn test_possible_component() {
        let doc = parse_html("<Card></Card><div></div><ui.button />");
        let tags: Vec<_> = doc.roots().map(is_possible_component).collect();
        assert_eq!(tags, vec![true, false, true]);
    }

    #[test]
    fn test_namespaced_tag_needs_a_name_after_the_dot() {
        let doc = parse_html("<ui. /><a.1 /><x.y />");
        let tags: Vec<_> = doc.roots().map(is_possible_component).collect();
        assert_eq!(tags, vec![false, false, true]);
    }

    #[test]
    fn test_expression_index() {
        let text = "<Foo checked={a < 1}>";
        let index = ExpressionIndex::new(text);
        assert!(index.is_inside(0, 16));
        assert!(!index.is_inside(0, 20));
        assert!(!index.is_inside(0, 4));
        // The `{` sits before the span
        assert!(!index.is_inside(14, 16));
        assert!(!index.is_inside(0, 100));
        assert!(!index.is_inside(5, 2));
    }

    proptest! {
        #[test]
        fn expression_index_agrees_with_scan(
            text in "[a-z{}<> ]{0,30}",
            start in 0usize..32,
            end in 0usize..32,
        ) {
            let index = ExpressionIndex::new(&text);
            prop_assert_eq!(index.is_inside(start, end), is_inside_expression(&text, start, end));
        }
    }

    #[test]
    fn test_in_component_start_tag() {
        let text = "<Card title=\"a\">body</Card><div class=\"b\"></div>";
        let doc = parse_html(text);
        assert!(is_in_component_start_tag(&doc, 6));
        assert!(!is_in_component_start_tag(&doc, 17));
        assert!(!is_in_component_start_tag(&doc, 33));
    }
}

//! Which attribute, if any, the cursor is on.

use serde::Serialize;

use crate::document::AstroDocument;
use crate::html::{HtmlDocument, Scanner, ScannerState, TokenType, preprocess};
use crate::types::Position;

/// The attribute under a cursor inside a start tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeContext {
    /// Attribute name as written.
    pub name: String,
    /// Whether the cursor is in (or right at the start of) the value.
    pub in_value: bool,
    /// Byte offsets of the value, without its quotes.
    pub value_range: Option<(usize, usize)>,
}

/// Find the attribute at `position` in `document`.
///
/// Returns `None` unless the position is strictly inside a start tag that has
/// at least one attribute.
pub fn get_attribute_context_at_position(
    document: &AstroDocument,
    position: Position,
) -> Option<AttributeContext> {
    let offset = document.offset_at(position);
    attribute_context_at_offset(document.text(), document.html(), offset)
}

/// Offset-based form of [`get_attribute_context_at_position`].
///
/// `html` must have been parsed from `text` (or its preprocessed form).
pub fn attribute_context_at_offset(
    text: &str,
    html: &HtmlDocument,
    offset: usize,
) -> Option<AttributeContext> {
    let node = html.node(html.find_node_at(offset));
    let start_tag_end = node.start_tag_end?;
    if offset <= node.start || offset >= start_tag_end || node.attributes.is_empty() {
        return None;
    }

    // Rescan the start tag alone, keeping absolute offsets
    let tag_text = text.get(node.start..start_tag_end)?;
    let mut scan_text = String::with_capacity(start_tag_end);
    scan_text.push_str(&text[..node.start]);
    scan_text.push_str(&preprocess(tag_text, None));

    let mut scanner = Scanner::new(&scan_text, node.start, ScannerState::WithinContent);
    let mut current_name: Option<&str> = None;
    let mut token = scanner.scan();

    while token != TokenType::Eos {
        let in_token = scanner.token_offset() <= offset && offset <= scanner.token_end();
        match token {
            TokenType::AttributeName => {
                let name = scanner.token_text();
                current_name = Some(name);
                if in_token {
                    return Some(AttributeContext {
                        name: name.to_string(),
                        in_value: false,
                        value_range: None,
                    });
                }
            }
            TokenType::DelimiterAssign => {
                if let Some(name) = current_name
                    && scanner.token_end() == offset
                {
                    let value_end = match scanner.scan() {
                        TokenType::AttributeValue => scanner.token_end(),
                        _ => offset,
                    };
                    return Some(AttributeContext {
                        name: name.to_string(),
                        in_value: true,
                        value_range: Some((offset, value_end)),
                    });
                }
            }
            TokenType::AttributeValue => {
                if let Some(name) = current_name
                    && in_token
                {
                    let value_range = unquoted_range(
                        scanner.token_text(),
                        scanner.token_offset(),
                        scanner.token_end(),
                    );
                    return Some(AttributeContext {
                        name: name.to_string(),
                        in_value: true,
                        value_range: Some(value_range),
                    });
                }
                current_name = None;
            }
            _ => {}
        }
        token = scanner.scan();
    }

    None
}

/// Drop a leading quote and its matching closing quote from a value span.
fn unquoted_range(value: &str, start: usize, end: usize) -> (usize, usize) {
    let Some(quote) = value.chars().next().filter(|c| *c == '"' || *c == '\'') else {
        return (start, end);
    };
    let end = if value.len() > 1 && value.ends_with(quote) {
        end - 1
    } else {
        end
    };
    (start + 1, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;

    fn context_at(text: &str, offset: usize) -> Option<AttributeContext> {
        let html = parse_html(&preprocess(text, None));
        attribute_context_at_offset(text, &html, offset)
    }

    #[test]
    fn cursor_inside_quoted_value() {
        let context = context_at(r#"<div class="foo bar">"#, 13).unwrap();
        assert_eq!(
            context,
            AttributeContext {
                name: "class".into(),
                in_value: true,
                value_range: Some((12, 19)),
            }
        );
    }

    #[test]
    fn cursor_on_attribute_name() {
        let context = context_at(r#"<div class="foo">"#, 7).unwrap();
        assert_eq!(context.name, "class");
        assert!(!context.in_value);
        assert_eq!(context.value_range, None);
    }

    #[test]
    fn cursor_right_after_equals() {
        let text = "<div class= id=\"x\">";
        let context = context_at(text, 11).unwrap();
        assert_eq!(context.name, "class");
        assert!(context.in_value);
        assert_eq!(context.value_range, Some((11, 11)));
    }

    #[test]
    fn cursor_after_equals_before_value() {
        let context = context_at("<a href=foo>", 8).unwrap();
        assert_eq!(context.name, "href");
        assert_eq!(context.value_range, Some((8, 11)));
    }

    #[test]
    fn expression_value_is_rescanned() {
        let text = "<Foo when={a < 1} class=\"x\">";
        let context = context_at(text, 25).unwrap();
        assert_eq!(context.name, "class");
        assert_eq!(context.value_range, Some((25, 26)));
    }

    #[test]
    fn no_context_outside_start_tags() {
        let text = r#"<div class="a">text</div><p>"#;
        assert_eq!(context_at(text, 0), None);
        assert_eq!(context_at(text, 17), None);
        // Start tag without attributes
        assert_eq!(context_at(text, 27), None);
    }

    #[test]
    fn unterminated_quote_keeps_end() {
        assert_eq!(unquoted_range("\"ab", 4, 7), (5, 7));
        assert_eq!(unquoted_range("'ab'", 4, 8), (5, 7));
        assert_eq!(unquoted_range("\"", 4, 5), (5, 5));
        assert_eq!(unquoted_range("ab", 4, 6), (4, 6));
    }
}

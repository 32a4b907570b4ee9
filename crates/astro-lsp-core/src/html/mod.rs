//! Markup scanning and parsing for component templates.

pub mod parser;
pub mod preprocess;
pub mod scanner;

pub use parser::{Attribute, HtmlDocument, Node, NodeId, is_void_element, parse_html};
pub use preprocess::preprocess;
pub use scanner::{Scanner, ScannerState, TokenType};

use crate::frontmatter::AstroMetadata;

/// Parse a component's markup, blanking expression delimiters and frontmatter
/// operators first.
///
/// Node offsets refer to `text` itself since preprocessing keeps every offset.
pub fn parse_html_with_metadata(text: &str, metadata: &AstroMetadata) -> HtmlDocument {
    let preprocessed = preprocess(text, metadata.content.first_non_whitespace_offset);
    parse_html(&preprocessed)
}

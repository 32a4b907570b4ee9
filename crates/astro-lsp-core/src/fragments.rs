//! Extraction of embedded `<style>` and `<script>` blocks.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::html::{Attribute, HtmlDocument, Node};
use crate::types::Position;
use astro_source_map::LineIndex;

/// Span of a whole element, tags included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Container {
    pub start: usize,
    pub end: usize,
}

/// An embedded fragment and where it sits in its parent document.
///
/// `start..end` is the content between the start tag and the end tag, and
/// `content` is exactly that slice of the parent text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagInformation {
    pub content: String,
    /// Attribute values without their quotes. Valueless attributes map to
    /// their own name.
    pub attributes: BTreeMap<String, String>,
    pub start: usize,
    pub end: usize,
    pub start_pos: Position,
    pub end_pos: Position,
    pub container: Container,
    /// Whether the element has an end tag.
    pub closed: bool,
}

impl TagInformation {
    /// Describe `content` as sitting at `start` in a parent text, with no
    /// surrounding tags.
    pub fn from_span(parent: &str, start: usize, end: usize) -> Self {
        let index = LineIndex::new(parent);
        TagInformation {
            content: parent.get(start..end).unwrap_or_default().to_string(),
            attributes: BTreeMap::new(),
            start,
            end,
            start_pos: index.position_at(parent, start),
            end_pos: index.position_at(parent, end),
            container: Container { start, end },
            closed: true,
        }
    }
}

/// Style blocks of the document.
pub fn extract_style_tags(text: &str, html: &HtmlDocument) -> Vec<TagInformation> {
    extract_tags(text, html, "style")
}

/// Script blocks of the document.
pub fn extract_script_tags(text: &str, html: &HtmlDocument) -> Vec<TagInformation> {
    extract_tags(text, html, "script")
}

/// Top-level `tag` elements, or nested ones when there is none at the top level.
fn extract_tags(text: &str, html: &HtmlDocument, tag: &str) -> Vec<TagInformation> {
    let mut matched: Vec<&Node> = html
        .roots()
        .filter(|node| node.tag.as_deref() == Some(tag))
        .collect();
    if matched.is_empty() {
        matched = html
            .descendants()
            .filter(|node| node.tag.as_deref() == Some(tag))
            .collect();
    }

    let index = LineIndex::new(text);
    matched
        .into_iter()
        .map(|node| {
            let start = node.start_tag_end.unwrap_or(node.start);
            let end = node.end_tag_start.unwrap_or(node.end);
            TagInformation {
                content: text.get(start..end).unwrap_or_default().to_string(),
                attributes: unquoted_attributes(&node.attributes),
                start,
                end,
                start_pos: index.position_at(text, start),
                end_pos: index.position_at(text, end),
                container: Container {
                    start: node.start,
                    end: node.end,
                },
                closed: node.closed,
            }
        })
        .collect()
}

fn unquoted_attributes(attributes: &[Attribute]) -> BTreeMap<String, String> {
    attributes
        .iter()
        .map(|attr| {
            let value = match &attr.value {
                Some(value) => remove_outer_quotes(value).to_string(),
                None => attr.name.clone(),
            };
            (attr.name.clone(), value)
        })
        .collect()
}

fn remove_outer_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

//! Open `.astro` documents.
//!
//! A document holds one version of a component's text together with what is
//! derived from it: the line-offset table, the frontmatter metadata and the
//! parsed markup. All of it is rebuilt when the text changes, so a document is
//! always internally consistent.

use std::collections::HashMap;

use astro_source_map::LineIndex;

use crate::attributes::{AttributeContext, attribute_context_at_offset};
use crate::frontmatter::{AstroMetadata, parse_astro};
use crate::html::{HtmlDocument, parse_html_with_metadata};
use crate::types::Position;

/// A component document.
#[derive(Debug, Clone)]
pub struct AstroDocument {
    /// The document's URI or path.
    uri: String,
    /// Version number for tracking changes (optional, used by LSP).
    version: Option<i32>,
    text: String,
    line_index: LineIndex,
    metadata: AstroMetadata,
    html: HtmlDocument,
}

impl AstroDocument {
    /// Create a new document with the given URI and text.
    pub fn new(uri: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_index = LineIndex::new(&text);
        let metadata = parse_astro(&text);
        let html = parse_html_with_metadata(&text, &metadata);
        Self {
            uri: uri.into(),
            version: None,
            text,
            line_index,
            metadata,
            html,
        }
    }

    /// Create a new document with a version number.
    pub fn with_version(uri: impl Into<String>, text: impl Into<String>, version: i32) -> Self {
        Self {
            version: Some(version),
            ..Self::new(uri, text)
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn version(&self) -> Option<i32> {
        self.version
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Get the filename from the URI (for display purposes).
    pub fn filename(&self) -> &str {
        self.uri.rsplit(['/', '\\']).next().unwrap_or(&self.uri)
    }

    pub fn metadata(&self) -> &AstroMetadata {
        &self.metadata
    }

    /// The parsed markup. Node offsets refer to [`Self::text`].
    pub fn html(&self) -> &HtmlDocument {
        &self.html
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// Replace the text, rebuilding everything derived from it.
    pub fn set_text_with_version(&mut self, text: impl Into<String>, version: i32) {
        let uri = std::mem::take(&mut self.uri);
        *self = Self::with_version(uri, text, version);
    }

    pub fn offset_at(&self, position: Position) -> usize {
        self.line_index.offset_at(&self.text, position)
    }

    pub fn position_at(&self, offset: usize) -> Position {
        self.line_index.position_at(&self.text, offset)
    }

    /// Text from the start of the line containing `offset` up to `offset`.
    pub fn line_until_offset(&self, offset: usize) -> &str {
        let position = self.position_at(offset);
        let line_start = self.offset_at(Position::new(position.line, 0));
        let end = self.offset_at(position);
        &self.text[line_start..end]
    }

    /// Whether `offset` lies inside the frontmatter script.
    pub fn is_in_frontmatter(&self, offset: usize) -> bool {
        let frontmatter = &self.metadata.frontmatter;
        match (frontmatter.start_offset, frontmatter.end_offset) {
            (Some(start), Some(end)) => offset > start && offset <= end,
            (Some(start), None) => offset > start,
            _ => false,
        }
    }

    /// The attribute under `position`, if it is inside a start tag.
    pub fn attribute_context_at_position(&self, position: Position) -> Option<AttributeContext> {
        attribute_context_at_offset(&self.text, &self.html, self.offset_at(position))
    }
}

/// An in-memory store of open documents, keyed by URI.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: HashMap<String, AstroDocument>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open or replace a document.
    pub fn open(&mut self, uri: impl Into<String>, text: impl Into<String>, version: i32) {
        let uri = uri.into();
        tracing::debug!(%uri, version, "Opening document");
        self.documents
            .insert(uri.clone(), AstroDocument::with_version(uri, text, version));
    }

    /// Update an open document's text. Unknown URIs are ignored.
    pub fn change(&mut self, uri: &str, text: impl Into<String>, version: i32) {
        match self.documents.get_mut(uri) {
            Some(doc) => doc.set_text_with_version(text, version),
            None => tracing::debug!(uri, "Ignoring change to a document that is not open"),
        }
    }

    pub fn close(&mut self, uri: &str) {
        self.documents.remove(uri);
    }

    pub fn get(&self, uri: &str) -> Option<&AstroDocument> {
        self.documents.get(uri)
    }

    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(|s| s.as_str())
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.documents.contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

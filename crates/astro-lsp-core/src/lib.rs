//! Transport-agnostic language analysis for Astro components.
//!
//! This crate holds the position bookkeeping every editor feature depends on,
//! without any LSP protocol dependencies. Feature providers (completions,
//! hover, diagnostics) and the language services behind them live elsewhere
//! and talk to this crate through the LSP-shaped values in [`types`].
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                          astro-lsp-core                           │
//! │  document ─► frontmatter ─► html::preprocess ─► html::parser      │
//! │      │                                             │              │
//! │      ▼                                             ▼              │
//! │  fragments ─► mapper chain ─► mapping        attributes           │
//! │                                                    │              │
//! │                                                    ▼              │
//! │                                              completions          │
//! └───────────────────────────────────────────────────────────────────┘
//!             │
//!             ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │     astro-source-map (line-offset tables, source-map lookups)     │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use astro_lsp_core::{
//!     AstroDocument, DocumentMapper, FragmentMapper, Position, Range, extract_style_tags,
//!     map_range_to_original,
//! };
//!
//! let doc = AstroDocument::new("file:///Card.astro", "<div />\n<style>\n.a {}\n</style>");
//! let style = extract_style_tags(doc.text(), doc.html()).remove(0);
//! let mapper = FragmentMapper::new(doc.text(), style, doc.uri());
//!
//! // `.a` on the style block's second line is line 2 of the component
//! let range = map_range_to_original(&mapper, Range::from_coords(1, 0, 1, 2));
//! assert_eq!(range, Range::from_coords(2, 0, 2, 2));
//! assert!(mapper.is_in_generated(Position::new(2, 1)));
//! ```

pub mod attributes;
pub mod completions;
pub mod config;
pub mod document;
pub mod fragments;
pub mod frontmatter;
pub mod html;
pub mod mapper;
pub mod mapping;
pub mod snapshot;
pub mod types;
pub mod utils;

// Re-export main types and functions for convenience
pub use attributes::{AttributeContext, get_attribute_context_at_position};
pub use completions::{SelectorKind, id_class_completions};
pub use config::{ConfigError, MappingOptions, Settings};
pub use document::{AstroDocument, DocumentStore};
pub use fragments::{TagInformation, extract_script_tags, extract_style_tags};
pub use frontmatter::{AstroMetadata, FrontmatterState, parse_astro};
pub use html::{HtmlDocument, parse_html, parse_html_with_metadata, preprocess};
pub use mapper::{
    ConsumerDocumentMapper, DocumentMapper, FragmentMapper, IdentityMapper,
    OriginalPositionMapper, SourceMapDocumentMapper,
};
pub use mapping::{
    map_range_to_generated, map_range_to_original, map_range_to_original_with,
    map_span_start_across,
};
pub use snapshot::MappedSnapshot;
pub use types::{Position, Range, RangeError};

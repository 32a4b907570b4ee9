//! Source mapping for Astro language tooling
//!
//! This crate provides the coordinate arithmetic every editor feature relies
//! on: converting between byte offsets and LSP positions for a text snapshot,
//! and querying standard source maps produced when a component is lowered to
//! a single-language representation.
//!
//! # Overview
//!
//! The core types are:
//! - [`Position`] and [`Range`]: zero-based LSP coordinates, with
//!   [`Position::UNMAPPED`] as the "no counterpart" value
//! - [`LineIndex`]: the line-offset table of one text snapshot
//! - [`TraceMap`]: a decoded source map answering one-based lookups in both
//!   directions
//!
//! # Example
//!
//! ```rust
//! use astro_source_map::*;
//!
//! let text = "---\nconst a = 1;\n---\n<div />";
//! let index = LineIndex::new(text);
//!
//! let position = index.position_at(text, 8);
//! assert_eq!(position, Position::new(1, 4));
//! assert_eq!(index.offset_at(text, position), 8);
//! ```

pub mod line_index;
pub mod trace;
pub mod types;
pub mod utils;

// Re-export main types
pub use line_index::LineIndex;
pub use trace::{LineColumn, OriginalLocation, SourceMapError, TraceMap};
pub use types::{Position, Range, RangeError};
pub use utils::{offset_at, position_at, utf16_len};

//! Utility functions for working with source positions
//!
//! These helpers build a throwaway [`LineIndex`]. Callers converting many
//! positions against the same snapshot should keep a `LineIndex` instead.

use crate::line_index::LineIndex;
use crate::types::Position;

/// Number of UTF-16 code units needed to encode `text`.
pub fn utf16_len(text: &str) -> usize {
    // Fast path: ASCII has one unit per byte
    if text.is_ascii() {
        text.len()
    } else {
        text.chars().map(char::len_utf16).sum()
    }
}

/// Convert a byte offset in `text` into a position.
///
/// Offsets outside the text clamp to the nearest boundary.
pub fn position_at(text: &str, offset: usize) -> Position {
    LineIndex::new(text).position_at(text, offset)
}

/// Convert a position into a byte offset in `text`.
///
/// Positions outside the text clamp to the nearest valid offset.
pub fn offset_at(text: &str, position: Position) -> usize {
    LineIndex::new(text).offset_at(text, position)
}

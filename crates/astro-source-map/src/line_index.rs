//! Line-offset tables for offset/position conversion

use crate::types::Position;
use crate::utils::utf16_len;
use serde::{Deserialize, Serialize};

/// The line-offset table of one text snapshot.
///
/// Stores the byte offset at which every line starts. Only `\n` terminates a
/// line; a preceding `\r` stays part of the line's content. The table is
/// immutable and must only be used with the text it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineIndex {
    /// Byte offset of the first character of each line. Always starts with 0.
    line_starts: Vec<usize>,

    /// Total length of the text in bytes
    total_length: usize,
}

impl LineIndex {
    /// Build the line-offset table for `content`.
    ///
    /// # Example
    ///
    /// ```
    /// use astro_source_map::LineIndex;
    ///
    /// let index = LineIndex::new("line 1\nline 2\nline 3");
    /// assert_eq!(index.line_count(), 3);
    /// ```
    pub fn new(content: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(
                content
                    .bytes()
                    .enumerate()
                    .filter_map(|(idx, byte)| (byte == b'\n').then_some(idx + 1)),
            )
            .collect();

        LineIndex {
            line_starts,
            total_length: content.len(),
        }
    }

    /// Convert a byte offset into a position.
    ///
    /// Offsets past the end of the text clamp to the end; offsets inside a
    /// multi-byte character round down to the character start. The line is
    /// found by binary search over the line starts.
    ///
    /// # Example
    ///
    /// ```
    /// use astro_source_map::{LineIndex, Position};
    ///
    /// let text = "hello\nworld";
    /// let index = LineIndex::new(text);
    /// assert_eq!(index.position_at(text, 6), Position::new(1, 0));
    /// ```
    pub fn position_at(&self, text: &str, offset: usize) -> Position {
        let offset = floor_char_boundary(text, offset.min(self.total_length));

        // Greatest line whose start is <= offset
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line];

        Position::new(
            to_i32(line),
            to_i32(utf16_len(&text[line_start..offset])),
        )
    }

    /// Convert a position into a byte offset.
    ///
    /// A line past the last line clamps to the end of the text and a negative
    /// line to the start. A character past the end of its line clamps to the
    /// line's end (the offset of its `\n`).
    pub fn offset_at(&self, text: &str, position: Position) -> usize {
        if position.line < 0 {
            return 0;
        }
        let line = position.line as usize;
        if line >= self.line_starts.len() {
            return self.total_length;
        }

        let line_start = self.line_starts[line];
        let line_end = self.line_content_end(line);
        if position.character <= 0 {
            return line_start;
        }

        let wanted = position.character as usize;
        let content = &text[line_start..line_end];
        if content.is_ascii() {
            return line_start + wanted.min(content.len());
        }

        let mut units = 0;
        for (idx, ch) in content.char_indices() {
            let next = units + ch.len_utf16();
            if next > wanted {
                return line_start + idx;
            }
            units = next;
        }
        line_end
    }

    /// Byte offset at which `line` starts, if the line exists.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Byte offset just before the `\n` that terminates `line` (or the end of
    /// the text for the last line).
    fn line_content_end(&self, line: usize) -> usize {
        match self.line_starts.get(line + 1) {
            Some(next_start) => next_start - 1,
            None => self.total_length,
        }
    }

    /// Get the total length of the text in bytes
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Get the number of lines in the text
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

fn floor_char_boundary(text: &str, mut offset: usize) -> usize {
    while offset > 0 && !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

fn to_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

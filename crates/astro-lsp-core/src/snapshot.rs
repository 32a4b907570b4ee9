//! Generated text paired with the mapper back to its original document.

use astro_source_map::LineIndex;

use crate::mapper::{DocumentMapper, OriginalPositionMapper};
use crate::types::Position;

/// One version of a generated view: its text and how to map it.
///
/// Snapshots are built per document version and dropped when a newer version
/// replaces them.
pub struct MappedSnapshot {
    text: String,
    line_index: LineIndex,
    mapper: Box<dyn DocumentMapper>,
}

impl MappedSnapshot {
    pub fn new(text: impl Into<String>, mapper: Box<dyn DocumentMapper>) -> Self {
        let text = text.into();
        let line_index = LineIndex::new(&text);
        Self {
            text,
            line_index,
            mapper,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Position of a byte offset in the generated text.
    pub fn position_at(&self, offset: usize) -> Position {
        self.line_index.position_at(&self.text, offset)
    }

    /// Byte offset of a position in the generated text.
    pub fn offset_at(&self, position: Position) -> usize {
        self.line_index.offset_at(&self.text, position)
    }
}

impl OriginalPositionMapper for MappedSnapshot {
    fn get_original_position(&self, generated: Position) -> Position {
        self.mapper.get_original_position(generated)
    }
}

impl DocumentMapper for MappedSnapshot {
    fn get_generated_position(&self, original: Position) -> Position {
        self.mapper.get_generated_position(original)
    }

    fn is_in_generated(&self, original: Position) -> bool {
        self.mapper.is_in_generated(original)
    }

    fn url(&self) -> &str {
        self.mapper.url()
    }

    fn destroy(&mut self) {
        self.mapper.destroy();
    }
}

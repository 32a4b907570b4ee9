//! Core coordinate types for source mapping

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A position in a text document, expressed as zero-based line and character offset.
///
/// Character offsets are measured in UTF-16 code units to match the LSP specification.
/// Components are signed so that [`Position::UNMAPPED`] can travel through a mapper
/// chain as an ordinary value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Position {
    /// Zero-based line number.
    pub line: i32,
    /// Zero-based character offset (UTF-16 code units).
    pub character: i32,
}

impl Position {
    /// The position returned when a location has no counterpart in the other
    /// coordinate space.
    pub const UNMAPPED: Position = Position {
        line: -1,
        character: -1,
    };

    /// Create a new position.
    pub const fn new(line: i32, character: i32) -> Self {
        Self { line, character }
    }

    /// True when this position carries no location (negative line).
    pub fn is_unmapped(&self) -> bool {
        self.line < 0
    }
}

/// Errors raised by the validating [`Range::try_new`] constructor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("range position {0:?} has a negative component")]
    NegativeComponent(Position),

    #[error("range start {start:?} is after its end {end:?}")]
    Inverted { start: Position, end: Position },
}

/// A range in a text document, expressed as start and end positions.
///
/// [`Range::new`] is a plain structural constructor and accepts unmapped
/// positions. Use [`Range::try_new`] at boundaries that require a
/// well-formed range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Range {
    /// The range's start position (inclusive).
    pub start: Position,
    /// The range's end position (exclusive).
    pub end: Position,
}

impl Range {
    /// Create a new range without validation.
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create a range, rejecting negative components and inverted bounds.
    pub fn try_new(start: Position, end: Position) -> Result<Self, RangeError> {
        for position in [start, end] {
            if position.line < 0 || position.character < 0 {
                return Err(RangeError::NegativeComponent(position));
            }
        }
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Create a range from four coordinates without validation.
    pub const fn from_coords(
        start_line: i32,
        start_character: i32,
        end_line: i32,
        end_character: i32,
    ) -> Self {
        Self {
            start: Position::new(start_line, start_character),
            end: Position::new(end_line, end_character),
        }
    }

    /// Create a range spanning a single position (zero-width).
    pub fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Check if this range contains a position.
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Check if this range is empty (zero-width).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if both ends sit on the same line.
    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }

    /// True when either end is unmapped.
    pub fn is_unmapped(&self) -> bool {
        self.start.is_unmapped() || self.end.is_unmapped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_ordering() {
        let p1 = Position::new(0, 5);
        let p2 = Position::new(0, 10);
        let p3 = Position::new(1, 0);

        assert!(p1 < p2);
        assert!(p2 < p3);
        assert!(p1 < p3);
    }

    #[test]
    fn test_unmapped_sentinel() {
        assert!(Position::UNMAPPED.is_unmapped());
        assert!(!Position::new(0, 0).is_unmapped());
        assert_eq!(Position::UNMAPPED, Position::new(-1, -1));
    }

    #[test]
    fn test_structural_range_accepts_sentinel() {
        let range = Range::new(Position::UNMAPPED, Position::new(2, 3));
        assert!(range.is_unmapped());
        assert_eq!(range.start, Position::UNMAPPED);
    }

    #[test]
    fn test_try_new_rejects_negative_components() {
        let err = Range::try_new(Position::UNMAPPED, Position::new(0, 1)).unwrap_err();
        assert_eq!(err, RangeError::NegativeComponent(Position::UNMAPPED));

        let err = Range::try_new(Position::new(0, 0), Position::new(0, -1)).unwrap_err();
        assert_eq!(err, RangeError::NegativeComponent(Position::new(0, -1)));
    }

    #[test]
    fn test_try_new_rejects_inverted_range() {
        let result = Range::try_new(Position::new(2, 0), Position::new(1, 4));
        assert!(matches!(result, Err(RangeError::Inverted { .. })));
    }

    #[test]
    fn test_range_contains() {
        let range = Range::from_coords(1, 0, 1, 10);

        assert!(range.contains(Position::new(1, 0)));
        assert!(range.contains(Position::new(1, 5)));
        assert!(!range.contains(Position::new(1, 10))); // End is exclusive
        assert!(!range.contains(Position::new(0, 5)));
        assert!(!range.contains(Position::new(2, 0)));
    }

    #[test]
    fn test_serialization_position() {
        let pos = Position::new(5, 10);
        let json = serde_json::to_string(&pos).unwrap();
        assert_eq!(json, r#"{"line":5,"character":10}"#);
        let deserialized: Position = serde_json::from_str(&json).unwrap();
        assert_eq!(pos, deserialized);
    }
}

//! Decoded source maps with one-based lookups
//!
//! [`TraceMap`] wraps a standard (v3) source map produced by the code
//! generator. Lookups use one-based lines and zero-based columns, the
//! convention of JavaScript source-map tooling; the mappers in
//! `astro-lsp-core` convert LSP positions to and from it.
//!
//! Both directions resolve to the greatest segment at or before the queried
//! column on the queried line. A lookup that finds no such segment returns
//! `None`; it never fails.

use std::collections::HashMap;

use thiserror::Error;

/// Errors that can occur while loading a source map.
#[derive(Error, Debug)]
pub enum SourceMapError {
    #[error("invalid source map: {0}")]
    Invalid(#[from] sourcemap::Error),
    #[error("source {0:?} is not listed in the source map")]
    UnknownSource(String),
}

/// A one-based line with a zero-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineColumn {
    /// One-based line number.
    pub line: u32,
    /// Zero-based column (UTF-16 code units).
    pub column: u32,
}

impl LineColumn {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Result of mapping a generated location back to an original source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalLocation<'a> {
    /// The source identifier, as listed in the map's `sources`.
    pub source: &'a str,
    /// One-based line in the original source.
    pub line: u32,
    /// Zero-based column in the original source.
    pub column: u32,
    /// The symbol name attached to the segment, if any.
    pub name: Option<&'a str>,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    generated_column: u32,
    source: Option<usize>,
    original_line: u32,
    original_column: u32,
    name: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct ReverseSegment {
    original_column: u32,
    generated_line: u32,
    generated_column: u32,
}

/// A decoded source map indexed for lookups in both directions.
///
/// Immutable once built.
#[derive(Debug, Clone)]
pub struct TraceMap {
    sources: Vec<String>,
    names: Vec<String>,
    /// Segments per generated line, sorted by generated column
    lines: Vec<Vec<Segment>>,
    /// Per source, segments per original line, sorted by original column
    by_source: Vec<Vec<Vec<ReverseSegment>>>,
}

impl TraceMap {
    /// Parse a source map from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, SourceMapError> {
        Self::from_slice(json.as_bytes())
    }

    /// Parse a source map from raw bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SourceMapError> {
        let map = sourcemap::SourceMap::from_slice(bytes)?;
        Ok(Self::from_source_map(&map))
    }

    /// Index an already decoded source map.
    pub fn from_source_map(map: &sourcemap::SourceMap) -> Self {
        let sources: Vec<String> = map.sources().map(str::to_string).collect();
        let source_ids: HashMap<&str, usize> = sources
            .iter()
            .enumerate()
            .map(|(idx, source)| (source.as_str(), idx))
            .collect();

        let mut names: Vec<String> = Vec::new();
        let mut name_ids: HashMap<String, usize> = HashMap::new();

        let mut lines: Vec<Vec<Segment>> = Vec::new();
        let mut by_source: Vec<Vec<Vec<ReverseSegment>>> = vec![Vec::new(); sources.len()];

        for token in map.tokens() {
            let generated_line = token.get_dst_line();
            let source = token.get_source().and_then(|s| source_ids.get(s).copied());
            let name = token.get_name().map(|name| {
                *name_ids.entry(name.to_string()).or_insert_with(|| {
                    names.push(name.to_string());
                    names.len() - 1
                })
            });

            let line = generated_line as usize;
            if lines.len() <= line {
                lines.resize_with(line + 1, Vec::new);
            }
            lines[line].push(Segment {
                generated_column: token.get_dst_col(),
                source,
                original_line: token.get_src_line(),
                original_column: token.get_src_col(),
                name,
            });

            if let Some(source) = source {
                let per_line = &mut by_source[source];
                let original_line = token.get_src_line() as usize;
                if per_line.len() <= original_line {
                    per_line.resize_with(original_line + 1, Vec::new);
                }
                per_line[original_line].push(ReverseSegment {
                    original_column: token.get_src_col(),
                    generated_line,
                    generated_column: token.get_dst_col(),
                });
            }
        }

        // Stable sorts keep generation order between equal columns
        for segments in &mut lines {
            segments.sort_by_key(|segment| segment.generated_column);
        }
        for per_line in &mut by_source {
            for segments in per_line.iter_mut() {
                segments.sort_by_key(|segment| segment.original_column);
            }
        }

        tracing::debug!(
            sources = sources.len(),
            generated_lines = lines.len(),
            "Indexed source map"
        );

        TraceMap {
            sources,
            names,
            lines,
            by_source,
        }
    }

    /// The source identifiers this map refers to.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(String::as_str)
    }

    /// Check whether `source` is one of this map's sources.
    pub fn has_source(&self, source: &str) -> bool {
        self.source_index(source).is_some()
    }

    fn source_index(&self, source: &str) -> Option<usize> {
        self.sources.iter().position(|s| s == source)
    }

    /// Map a generated location to its original location.
    ///
    /// Returns `None` when the line has no segment at or before the column, or
    /// when that segment carries no source.
    pub fn original_position_for(&self, needle: LineColumn) -> Option<OriginalLocation<'_>> {
        let line = needle.line.checked_sub(1)? as usize;
        let segments = self.lines.get(line)?;
        let idx = greatest_lower_bound(segments, needle.column, |s| s.generated_column)?;
        let segment = &segments[idx];
        let source = segment.source?;

        Some(OriginalLocation {
            source: &self.sources[source],
            line: segment.original_line + 1,
            column: segment.original_column,
            name: segment.name.map(|name| self.names[name].as_str()),
        })
    }

    /// Map an original location in `source` to its generated location.
    ///
    /// Returns `None` for unknown sources and for original lines with no
    /// segment at or before the column.
    pub fn generated_position_for(&self, source: &str, needle: LineColumn) -> Option<LineColumn> {
        let source = self.source_index(source)?;
        let line = needle.line.checked_sub(1)? as usize;
        let segments = self.by_source[source].get(line)?;
        let idx = greatest_lower_bound(segments, needle.column, |s| s.original_column)?;
        let segment = &segments[idx];

        Some(LineColumn::new(
            segment.generated_line + 1,
            segment.generated_column,
        ))
    }
}

/// Index of the first segment whose key equals `column`, or else the last
/// segment whose key is below it.
fn greatest_lower_bound<T>(segments: &[T], column: u32, key: impl Fn(&T) -> u32) -> Option<usize> {
    let idx = segments.partition_point(|segment| key(segment) < column);
    if segments.get(idx).is_some_and(|segment| key(segment) == column) {
        Some(idx)
    } else {
        idx.checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Generated:            Original (component.astro):
    // line 1: "abcdef"       line 1 col 0 -> gen (1, 0)
    //                        line 1 col 4 -> gen (1, 2)
    // line 2: "  xyz"        line 3 col 2 -> gen (2, 2)
    fn fixture() -> TraceMap {
        let json = serde_json::json!({
            "version": 3,
            "sources": ["component.astro"],
            "names": ["xyz"],
            "mappings": "AAAA,EAAI;EAEF",
        });
        TraceMap::from_json(&json.to_string()).unwrap()
    }

    #[test]
    fn test_original_position_exact_segment() {
        let map = fixture();
        let original = map.original_position_for(LineColumn::new(1, 2)).unwrap();
        assert_eq!(original.source, "component.astro");
        assert_eq!(original.line, 1);
        assert_eq!(original.column, 4);
    }

    #[test]
    fn test_original_position_uses_greatest_lower_bound() {
        let map = fixture();
        // Column 5 on line 1 resolves to the segment at column 2, without offset
        let original = map.original_position_for(LineColumn::new(1, 5)).unwrap();
        assert_eq!((original.line, original.column), (1, 4));
    }

    #[test]
    fn test_original_position_before_first_segment() {
        let map = fixture();
        assert!(map.original_position_for(LineColumn::new(2, 1)).is_none());
        assert!(map.original_position_for(LineColumn::new(2, 2)).is_some());
    }

    #[test]
    fn test_original_position_out_of_range_lines() {
        let map = fixture();
        assert!(map.original_position_for(LineColumn::new(0, 0)).is_none());
        assert!(map.original_position_for(LineColumn::new(9, 0)).is_none());
    }

    #[test]
    fn test_generated_position_for() {
        let map = fixture();
        assert_eq!(
            map.generated_position_for("component.astro", LineColumn::new(1, 4)),
            Some(LineColumn::new(1, 2))
        );
        assert_eq!(
            map.generated_position_for("component.astro", LineColumn::new(3, 7)),
            Some(LineColumn::new(2, 2))
        );
        // Line 2 of the original has no segments
        assert_eq!(
            map.generated_position_for("component.astro", LineColumn::new(2, 0)),
            None
        );
    }

    #[test]
    fn test_generated_position_unknown_source() {
        let map = fixture();
        assert!(!map.has_source("other.astro"));
        assert_eq!(
            map.generated_position_for("other.astro", LineColumn::new(1, 0)),
            None
        );
    }

    #[test]
    fn test_invalid_source_map() {
        let result = TraceMap::from_json("{ not json");
        assert!(matches!(result, Err(SourceMapError::Invalid(_))));
    }
}

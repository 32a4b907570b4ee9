//! Position mappers between an original document and generated views of it.
//!
//! A generated view is anything derived from the `.astro` file: an extracted
//! `<style>` block, the TSX the compiler lowers the component to, or the
//! markup after preprocessing. Mappers can wrap a parent mapper, so a chain
//! like identity → fragment → source map translates across every stage.
//!
//! When a position has no counterpart, mappers return [`Position::UNMAPPED`]
//! instead of failing. Every consumer has to check for it before treating a
//! result as a real location.

use std::sync::Arc;

use astro_source_map::{LineColumn, LineIndex, SourceMapError, TraceMap};

use crate::fragments::TagInformation;
use crate::types::Position;

/// The generated-to-original half of a mapper.
///
/// Mapping results back to the original document only needs this direction,
/// so the range utilities in [`crate::mapping`] accept any implementor.
pub trait OriginalPositionMapper {
    /// Map a position in the generated view to the original document.
    fn get_original_position(&self, generated: Position) -> Position;
}

/// A two-way position mapper.
pub trait DocumentMapper: OriginalPositionMapper {
    /// Map a position in the original document to the generated view.
    fn get_generated_position(&self, original: Position) -> Position;

    /// Check whether an original position is covered by the generated view.
    fn is_in_generated(&self, original: Position) -> bool;

    /// The document the original side of this mapper represents.
    fn url(&self) -> &str;

    /// Release resources before the mapper is discarded.
    ///
    /// Mappers that own a parent pass the call on to it. Calling this more
    /// than once is harmless.
    fn destroy(&mut self) {}
}

impl<T: OriginalPositionMapper + ?Sized> OriginalPositionMapper for Box<T> {
    fn get_original_position(&self, generated: Position) -> Position {
        (**self).get_original_position(generated)
    }
}

impl<T: DocumentMapper + ?Sized> DocumentMapper for Box<T> {
    fn get_generated_position(&self, original: Position) -> Position {
        (**self).get_generated_position(original)
    }

    fn is_in_generated(&self, original: Position) -> bool {
        (**self).is_in_generated(original)
    }

    fn url(&self) -> &str {
        (**self).url()
    }

    fn destroy(&mut self) {
        (**self).destroy()
    }
}

/// Does not map. Positions pass through unchanged, or through the parent when
/// there is one.
pub struct IdentityMapper {
    url: String,
    parent: Option<Box<dyn DocumentMapper>>,
}

impl IdentityMapper {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            parent: None,
        }
    }

    pub fn with_parent(url: impl Into<String>, parent: Box<dyn DocumentMapper>) -> Self {
        Self {
            url: url.into(),
            parent: Some(parent),
        }
    }
}

impl OriginalPositionMapper for IdentityMapper {
    fn get_original_position(&self, generated: Position) -> Position {
        match &self.parent {
            Some(parent) => parent.get_original_position(generated),
            None => generated,
        }
    }
}

impl DocumentMapper for IdentityMapper {
    fn get_generated_position(&self, original: Position) -> Position {
        match &self.parent {
            Some(parent) => parent.get_generated_position(original),
            None => original,
        }
    }

    fn is_in_generated(&self, original: Position) -> bool {
        self.parent
            .as_ref()
            .is_none_or(|parent| parent.is_in_generated(original))
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn destroy(&mut self) {
        tracing::trace!(url = %self.url, "Destroying identity mapper");
        if let Some(parent) = &mut self.parent {
            parent.destroy();
        }
    }
}

/// Maps positions in an extracted fragment to its parent document.
///
/// The fragment's content starts at `TagInformation::start` in the parent, so
/// the mapping is a constant offset shift. It is total: callers should check
/// [`DocumentMapper::is_in_generated`] before trusting a result outside the
/// fragment.
pub struct FragmentMapper {
    original_text: String,
    original_index: LineIndex,
    tag: TagInformation,
    fragment_index: LineIndex,
    url: String,
}

impl FragmentMapper {
    /// `tag` must describe a span of `original_text` with `start <= end`.
    pub fn new(original_text: impl Into<String>, tag: TagInformation, url: impl Into<String>) -> Self {
        let original_text = original_text.into();
        let original_index = LineIndex::new(&original_text);
        let fragment_index = LineIndex::new(&tag.content);
        Self {
            original_text,
            original_index,
            tag,
            fragment_index,
            url: url.into(),
        }
    }

    pub fn tag(&self) -> &TagInformation {
        &self.tag
    }

    fn original_offset(&self, position: Position) -> usize {
        self.original_index.offset_at(&self.original_text, position)
    }
}

impl OriginalPositionMapper for FragmentMapper {
    fn get_original_position(&self, generated: Position) -> Position {
        if generated.is_unmapped() {
            return Position::UNMAPPED;
        }
        let fragment_offset = self.fragment_index.offset_at(&self.tag.content, generated);
        self.original_index
            .position_at(&self.original_text, self.tag.start + fragment_offset)
    }
}

impl DocumentMapper for FragmentMapper {
    fn get_generated_position(&self, original: Position) -> Position {
        if original.is_unmapped() {
            return Position::UNMAPPED;
        }
        // Positions before the fragment clamp to its start
        let fragment_offset = self.original_offset(original).saturating_sub(self.tag.start);
        self.fragment_index
            .position_at(&self.tag.content, fragment_offset)
    }

    fn is_in_generated(&self, original: Position) -> bool {
        if original.is_unmapped() {
            return false;
        }
        let offset = self.original_offset(original);
        offset >= self.tag.start && offset <= self.tag.end
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Maps positions through a source map produced by the compiler.
///
/// With a parent, positions are first translated by the parent and then by the
/// source map, so several transformation stages compose.
pub struct SourceMapDocumentMapper {
    trace_map: Arc<TraceMap>,
    source_uri: String,
    parent: Option<Box<dyn DocumentMapper>>,
}

impl SourceMapDocumentMapper {
    /// `source_uri` names the original document among the map's sources.
    pub fn new(trace_map: Arc<TraceMap>, source_uri: impl Into<String>) -> Self {
        Self {
            trace_map,
            source_uri: source_uri.into(),
            parent: None,
        }
    }

    /// Like [`Self::new`], but rejects a `source_uri` the map does not list.
    pub fn try_new(
        trace_map: Arc<TraceMap>,
        source_uri: impl Into<String>,
    ) -> Result<Self, SourceMapError> {
        let source_uri = source_uri.into();
        if !trace_map.has_source(&source_uri) {
            return Err(SourceMapError::UnknownSource(source_uri));
        }
        Ok(Self::new(trace_map, source_uri))
    }

    pub fn with_parent(
        trace_map: Arc<TraceMap>,
        source_uri: impl Into<String>,
        parent: Box<dyn DocumentMapper>,
    ) -> Self {
        Self {
            trace_map,
            source_uri: source_uri.into(),
            parent: Some(parent),
        }
    }

    pub fn trace_map(&self) -> &TraceMap {
        &self.trace_map
    }
}

/// One-based source-map needle for a zero-based position.
fn needle(position: Position) -> Option<LineColumn> {
    let line = u32::try_from(position.line).ok()?;
    let column = u32::try_from(position.character.max(0)).ok()?;
    Some(LineColumn::new(line + 1, column))
}

fn from_one_based(line: u32, column: u32) -> Position {
    let line = i32::try_from(line).unwrap_or(i32::MAX);
    let column = i32::try_from(column).unwrap_or(i32::MAX);
    Position::new(line - 1, column)
}

impl OriginalPositionMapper for SourceMapDocumentMapper {
    fn get_original_position(&self, generated: Position) -> Position {
        let generated = match &self.parent {
            Some(parent) => parent.get_original_position(generated),
            None => generated,
        };
        let Some(needle) = needle(generated) else {
            return Position::UNMAPPED;
        };

        match self.trace_map.original_position_for(needle) {
            Some(original) => from_one_based(original.line, original.column),
            None => {
                tracing::debug!(
                    line = generated.line,
                    character = generated.character,
                    "No original position in source map"
                );
                Position::UNMAPPED
            }
        }
    }
}

impl DocumentMapper for SourceMapDocumentMapper {
    fn get_generated_position(&self, original: Position) -> Position {
        let original = match &self.parent {
            Some(parent) => parent.get_generated_position(original),
            None => original,
        };
        let Some(needle) = needle(original) else {
            return Position::UNMAPPED;
        };

        match self
            .trace_map
            .generated_position_for(&self.source_uri, needle)
        {
            Some(generated) => from_one_based(generated.line, generated.column),
            None => {
                tracing::debug!(
                    source = %self.source_uri,
                    line = original.line,
                    character = original.character,
                    "No generated position in source map"
                );
                Position::UNMAPPED
            }
        }
    }

    fn is_in_generated(&self, original: Position) -> bool {
        if let Some(parent) = &self.parent
            && !parent.is_in_generated(original)
        {
            return false;
        }
        !self.get_generated_position(original).is_unmapped()
    }

    fn url(&self) -> &str {
        &self.source_uri
    }

    fn destroy(&mut self) {
        tracing::trace!(source = %self.source_uri, "Destroying source map mapper");
        if let Some(parent) = &mut self.parent {
            parent.destroy();
        }
    }
}

/// Source-map mapper for generated text with boilerplate lines prepended
/// ahead of the mapped content.
///
/// It sits at the root of a chain describing a whole generated document, so
/// it reports every position as covered and leaves unmapped outliers to the
/// caller.
pub struct ConsumerDocumentMapper {
    inner: SourceMapDocumentMapper,
    prepended_lines: i32,
}

impl ConsumerDocumentMapper {
    pub fn new(trace_map: Arc<TraceMap>, source_uri: impl Into<String>, prepended_lines: i32) -> Self {
        Self {
            inner: SourceMapDocumentMapper::new(trace_map, source_uri),
            prepended_lines,
        }
    }

    pub fn prepended_lines(&self) -> i32 {
        self.prepended_lines
    }
}

impl OriginalPositionMapper for ConsumerDocumentMapper {
    fn get_original_position(&self, generated: Position) -> Position {
        if generated.is_unmapped() {
            return Position::UNMAPPED;
        }
        // Lines inside the prepended block come out negative and map to nothing
        self.inner.get_original_position(Position::new(
            generated.line - self.prepended_lines,
            generated.character,
        ))
    }
}

impl DocumentMapper for ConsumerDocumentMapper {
    fn get_generated_position(&self, original: Position) -> Position {
        let generated = self.inner.get_generated_position(original);
        if generated.is_unmapped() {
            return generated;
        }
        Position::new(generated.line + self.prepended_lines, generated.character)
    }

    fn is_in_generated(&self, _original: Position) -> bool {
        true
    }

    fn url(&self) -> &str {
        self.inner.url()
    }

    fn destroy(&mut self) {
        self.inner.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    // Generated line 1: "abcdef", original (component.astro) line 1 col 0 -> (1, 0)
    //                                              line 1 col 4 -> (1, 2)
    // Generated line 2: "  xyz",  original line 3 col 2 -> (2, 2)
    fn trace_map() -> Arc<TraceMap> {
        let json = serde_json::json!({
            "version": 3,
            "sources": ["component.astro"],
            "names": [],
            "mappings": "AAAA,EAAI;EAEF",
        });
        Arc::new(TraceMap::from_json(&json.to_string()).unwrap())
    }

    struct CountingMapper {
        destroyed: Rc<Cell<usize>>,
        shift: i32,
    }

    impl OriginalPositionMapper for CountingMapper {
        fn get_original_position(&self, generated: Position) -> Position {
            Position::new(generated.line + self.shift, generated.character)
        }
    }

    impl DocumentMapper for CountingMapper {
        fn get_generated_position(&self, original: Position) -> Position {
            Position::new(original.line - self.shift, original.character)
        }

        fn is_in_generated(&self, original: Position) -> bool {
            original.line >= self.shift
        }

        fn url(&self) -> &str {
            "counting"
        }

        fn destroy(&mut self) {
            self.destroyed.set(self.destroyed.get() + 1);
        }
    }

    #[test]
    fn identity_without_parent() {
        let mapper = IdentityMapper::new("file:///a.astro");
        let position = Position::new(3, 7);
        assert_eq!(mapper.get_original_position(position), position);
        assert_eq!(mapper.get_generated_position(position), position);
        assert!(mapper.is_in_generated(position));
        assert_eq!(mapper.url(), "file:///a.astro");
    }

    #[test]
    fn identity_delegates_to_parent() {
        let destroyed = Rc::new(Cell::new(0));
        let parent = CountingMapper {
            destroyed: destroyed.clone(),
            shift: 2,
        };
        let mut mapper = IdentityMapper::with_parent("file:///a.astro", Box::new(parent));

        assert_eq!(mapper.get_original_position(Position::new(1, 4)), Position::new(3, 4));
        assert_eq!(mapper.get_generated_position(Position::new(3, 4)), Position::new(1, 4));
        assert!(!mapper.is_in_generated(Position::new(1, 0)));
        assert_eq!(mapper.url(), "file:///a.astro");

        mapper.destroy();
        mapper.destroy();
        assert_eq!(destroyed.get(), 2);
    }

    #[test]
    fn fragment_mapper_shifts_by_start() {
        let parent = "<div>\n<style>\n.a {}\n</style>";
        let start = parent.find(".a").unwrap();
        let tag = TagInformation::from_span(parent, start, start + 5);
        let mapper = FragmentMapper::new(parent, tag, "file:///a.astro");

        assert_eq!(mapper.get_original_position(Position::new(0, 1)), Position::new(2, 1));
        assert_eq!(mapper.get_generated_position(Position::new(2, 1)), Position::new(0, 1));
        assert!(mapper.is_in_generated(Position::new(2, 0)));
        assert!(mapper.is_in_generated(Position::new(2, 5)));
        assert!(!mapper.is_in_generated(Position::new(3, 0)));
        assert!(!mapper.is_in_generated(Position::new(1, 6)));
    }

    #[test]
    fn fragment_mapper_keeps_sentinel() {
        let tag = TagInformation::from_span("abc", 0, 2);
        let mapper = FragmentMapper::new("abc", tag, "file:///a.astro");
        assert!(mapper.get_original_position(Position::UNMAPPED).is_unmapped());
        assert!(mapper.get_generated_position(Position::UNMAPPED).is_unmapped());
        assert!(!mapper.is_in_generated(Position::UNMAPPED));
    }

    #[test]
    fn source_map_mapper_both_directions() {
        let mapper = SourceMapDocumentMapper::new(trace_map(), "component.astro");

        assert_eq!(mapper.get_original_position(Position::new(0, 2)), Position::new(0, 4));
        assert_eq!(mapper.get_original_position(Position::new(1, 3)), Position::new(2, 2));
        assert_eq!(mapper.get_generated_position(Position::new(0, 4)), Position::new(0, 2));
        assert_eq!(mapper.get_generated_position(Position::new(2, 9)), Position::new(1, 2));
        assert_eq!(mapper.url(), "component.astro");
    }

    #[test]
    fn source_map_mapper_unmapped() {
        let mapper = SourceMapDocumentMapper::new(trace_map(), "component.astro");

        // Before the first segment of line 2
        assert!(mapper.get_original_position(Position::new(1, 0)).is_unmapped());
        // No segments on original line 2
        assert!(mapper.get_generated_position(Position::new(1, 0)).is_unmapped());
        assert!(!mapper.is_in_generated(Position::new(1, 0)));
        assert!(mapper.is_in_generated(Position::new(0, 0)));
        assert!(mapper.get_original_position(Position::UNMAPPED).is_unmapped());
    }

    #[test]
    fn source_map_mapper_unknown_source() {
        assert!(matches!(
            SourceMapDocumentMapper::try_new(trace_map(), "other.astro"),
            Err(SourceMapError::UnknownSource(source)) if source == "other.astro"
        ));
        assert!(SourceMapDocumentMapper::try_new(trace_map(), "component.astro").is_ok());

        let mapper = SourceMapDocumentMapper::new(trace_map(), "other.astro");
        assert!(mapper.get_generated_position(Position::new(0, 0)).is_unmapped());
        assert!(!mapper.is_in_generated(Position::new(0, 0)));
    }

    #[test]
    fn source_map_mapper_composes_with_parent() {
        let destroyed = Rc::new(Cell::new(0));
        let parent = CountingMapper {
            destroyed: destroyed.clone(),
            shift: 1,
        };
        let mut mapper =
            SourceMapDocumentMapper::with_parent(trace_map(), "component.astro", Box::new(parent));

        // Parent maps line -1 -> 0 before the source map applies
        assert_eq!(mapper.get_original_position(Position::new(-1, 2)), Position::new(0, 4));
        // Parent maps line 1 -> 0, then the source map maps (0, 4) -> (0, 2)
        assert_eq!(mapper.get_generated_position(Position::new(1, 4)), Position::new(0, 2));
        // The parent rejects line 0
        assert!(!mapper.is_in_generated(Position::new(0, 4)));

        mapper.destroy();
        assert_eq!(destroyed.get(), 1);
    }

    #[test]
    fn consumer_mapper_accounts_for_prepended_lines() {
        let mapper = ConsumerDocumentMapper::new(trace_map(), "component.astro", 3);

        assert_eq!(mapper.get_original_position(Position::new(3, 2)), Position::new(0, 4));
        assert_eq!(mapper.get_generated_position(Position::new(0, 4)), Position::new(3, 2));
        // Inside the prepended block
        assert!(mapper.get_original_position(Position::new(1, 0)).is_unmapped());
        // Unmapped results are not shifted
        assert_eq!(
            mapper.get_generated_position(Position::new(1, 0)),
            Position::UNMAPPED
        );
        assert!(mapper.is_in_generated(Position::new(1, 0)));
        assert!(mapper.is_in_generated(Position::UNMAPPED));
        assert_eq!(mapper.prepended_lines(), 3);
    }

    #[test]
    fn boxed_chain_is_a_mapper() {
        let mapper: Box<dyn DocumentMapper> = Box::new(IdentityMapper::with_parent(
            "file:///a.astro",
            Box::new(ConsumerDocumentMapper::new(trace_map(), "component.astro", 1)),
        ));
        assert_eq!(mapper.get_generated_position(Position::new(0, 0)), Position::new(1, 0));
        assert_eq!(mapper.url(), "file:///a.astro");
    }
}

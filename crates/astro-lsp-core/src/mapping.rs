//! Lifting position mappers to ranges and LSP structures.
//!
//! Each function maps the range-bearing fields of a value and carries every
//! other field through unchanged. Ranges are built structurally, never with
//! [`Range::try_new`], because either end may come back unmapped. Callers
//! decide case by case what to do with those.

use crate::config::MappingOptions;
use crate::mapper::{DocumentMapper, OriginalPositionMapper};
use crate::snapshot::MappedSnapshot;
use crate::types::{
    CodeAction, ColorPresentation, CompletionItem, CompletionTextEdit, Diagnostic, FoldingRange,
    Hover, InsertReplaceEdit, Location, LocationLink, Range, SelectionRange, SymbolInformation,
    TextDocumentEdit, TextEdit,
};

/// Values carrying a single range.
pub trait HasRange {
    fn range_mut(&mut self) -> &mut Range;
}

impl HasRange for TextEdit {
    fn range_mut(&mut self) -> &mut Range {
        &mut self.range
    }
}

impl HasRange for Location {
    fn range_mut(&mut self) -> &mut Range {
        &mut self.range
    }
}

impl HasRange for Diagnostic {
    fn range_mut(&mut self) -> &mut Range {
        &mut self.range
    }
}

/// Map a generated range to the original document with default options.
pub fn map_range_to_original<M>(mapper: &M, range: Range) -> Range
where
    M: OriginalPositionMapper + ?Sized,
{
    map_range_to_original_with(mapper, range, MappingOptions::default())
}

/// Map a generated range to the original document.
///
/// Source-map lookups can land one character short on single-line spans.
/// With `widen_one_short_ranges`, a single-line range that maps to a
/// single-line range exactly one character narrower gets its end widened
/// back by one.
pub fn map_range_to_original_with<M>(mapper: &M, range: Range, options: MappingOptions) -> Range
where
    M: OriginalPositionMapper + ?Sized,
{
    let mut original = Range::new(
        mapper.get_original_position(range.start),
        mapper.get_original_position(range.end),
    );

    if options.widen_one_short_ranges
        && !original.is_unmapped()
        && original.is_single_line()
        && range.is_single_line()
        && original.end.character - original.start.character
            == range.end.character - range.start.character - 1
    {
        original.end.character += 1;
    }

    original
}

/// Map an original range into the generated view.
pub fn map_range_to_generated<M>(mapper: &M, range: Range) -> Range
where
    M: DocumentMapper + ?Sized,
{
    Range::new(
        mapper.get_generated_position(range.start),
        mapper.get_generated_position(range.end),
    )
}

pub fn map_obj_with_range_to_original<M, T>(mapper: &M, mut obj: T) -> T
where
    M: OriginalPositionMapper + ?Sized,
    T: HasRange,
{
    let range = obj.range_mut();
    *range = map_range_to_original(mapper, *range);
    obj
}

pub fn map_insert_replace_edit_to_original<M>(mapper: &M, edit: InsertReplaceEdit) -> InsertReplaceEdit
where
    M: OriginalPositionMapper + ?Sized,
{
    InsertReplaceEdit {
        insert: map_range_to_original(mapper, edit.insert),
        replace: map_range_to_original(mapper, edit.replace),
        ..edit
    }
}

pub fn map_edit_to_original<M>(mapper: &M, edit: CompletionTextEdit) -> CompletionTextEdit
where
    M: OriginalPositionMapper + ?Sized,
{
    match edit {
        CompletionTextEdit::Edit(edit) => {
            CompletionTextEdit::Edit(map_obj_with_range_to_original(mapper, edit))
        }
        CompletionTextEdit::InsertAndReplace(edit) => {
            CompletionTextEdit::InsertAndReplace(map_insert_replace_edit_to_original(mapper, edit))
        }
    }
}

/// Map a completion item's edits. Items without edits come back unchanged.
pub fn map_completion_item_to_original<M>(mapper: &M, item: CompletionItem) -> CompletionItem
where
    M: OriginalPositionMapper + ?Sized,
{
    CompletionItem {
        text_edit: item
            .text_edit
            .map(|edit| map_edit_to_original(mapper, edit)),
        additional_text_edits: item
            .additional_text_edits
            .into_iter()
            .map(|edit| map_obj_with_range_to_original(mapper, edit))
            .collect(),
        ..item
    }
}

pub fn map_hover_to_parent<M>(mapper: &M, hover: Hover) -> Hover
where
    M: OriginalPositionMapper + ?Sized,
{
    Hover {
        range: hover.range.map(|range| map_range_to_original(mapper, range)),
        ..hover
    }
}

/// Map a diagnostic reported against the original document into the
/// generated view.
pub fn map_diagnostic_to_generated<M>(mapper: &M, diagnostic: Diagnostic) -> Diagnostic
where
    M: DocumentMapper + ?Sized,
{
    Diagnostic {
        range: map_range_to_generated(mapper, diagnostic.range),
        ..diagnostic
    }
}

pub fn map_color_presentation_to_original<M>(
    mapper: &M,
    presentation: ColorPresentation,
) -> ColorPresentation
where
    M: OriginalPositionMapper + ?Sized,
{
    ColorPresentation {
        text_edit: presentation
            .text_edit
            .map(|edit| map_obj_with_range_to_original(mapper, edit)),
        additional_text_edits: presentation
            .additional_text_edits
            .into_iter()
            .map(|edit| map_obj_with_range_to_original(mapper, edit))
            .collect(),
        ..presentation
    }
}

pub fn map_symbol_information_to_original<M>(mapper: &M, info: SymbolInformation) -> SymbolInformation
where
    M: OriginalPositionMapper + ?Sized,
{
    SymbolInformation {
        location: map_obj_with_range_to_original(mapper, info.location),
        ..info
    }
}

/// Map a definition link. Target ranges are only mapped when the link points
/// into the mapper's own document.
pub fn map_location_link_to_original<M>(mapper: &M, link: LocationLink) -> LocationLink
where
    M: DocumentMapper + ?Sized,
{
    let same_document = mapper.url() == link.target_uri;
    let map_target = |range: Range| {
        if same_document {
            map_range_to_original(mapper, range)
        } else {
            range
        }
    };

    LocationLink {
        origin_selection_range: link
            .origin_selection_range
            .map(|range| map_range_to_original(mapper, range)),
        target_range: map_target(link.target_range),
        target_selection_range: map_target(link.target_selection_range),
        target_uri: link.target_uri,
    }
}

/// Map the edits of a document edit that targets the mapper's document.
/// Edits to other documents come back unchanged.
pub fn map_text_document_edit_to_original<M>(mapper: &M, edit: TextDocumentEdit) -> TextDocumentEdit
where
    M: DocumentMapper + ?Sized,
{
    if edit.text_document.uri != mapper.url() {
        return edit;
    }

    TextDocumentEdit {
        edits: edit
            .edits
            .into_iter()
            .map(|text_edit| map_obj_with_range_to_original(mapper, text_edit))
            .collect(),
        ..edit
    }
}

/// Map every document change of a code action. Actions without an edit come
/// back unchanged.
pub fn map_code_action_to_original<M>(mapper: &M, action: CodeAction) -> CodeAction
where
    M: DocumentMapper + ?Sized,
{
    let edit = action.edit.map(|mut edit| {
        edit.document_changes = edit
            .document_changes
            .into_iter()
            .map(|change| map_text_document_edit_to_original(mapper, change))
            .collect();
        edit
    });

    CodeAction { edit, ..action }
}

/// Map a folding range. Characters are only reported back when the input had
/// them.
pub fn map_folding_range_to_parent<M>(mapper: &M, folding_range: FoldingRange) -> FoldingRange
where
    M: OriginalPositionMapper + ?Sized,
{
    let range = map_range_to_original(
        mapper,
        Range::from_coords(
            folding_range.start_line,
            folding_range.start_character.unwrap_or(0),
            folding_range.end_line,
            folding_range.end_character.unwrap_or(0),
        ),
    );

    FoldingRange {
        start_line: range.start.line,
        start_character: folding_range
            .start_character
            .map(|_| range.start.character),
        end_line: range.end.line,
        end_character: folding_range.end_character.map(|_| range.end.character),
        kind: folding_range.kind,
    }
}

/// Map a selection range and all of its parents.
pub fn map_selection_range_to_parent<M>(mapper: &M, selection_range: SelectionRange) -> SelectionRange
where
    M: OriginalPositionMapper + ?Sized,
{
    SelectionRange {
        range: map_range_to_original(mapper, selection_range.range),
        parent: selection_range
            .parent
            .map(|parent| Box::new(map_selection_range_to_parent(mapper, *parent))),
    }
}

/// Carry an offset in one generated view over to another view of the same
/// document, through the original document.
///
/// Returns `None` when either hop has no counterpart.
pub fn map_span_start_across(
    span_start: usize,
    from: &MappedSnapshot,
    to: &MappedSnapshot,
) -> Option<usize> {
    let original = from.get_original_position(from.position_at(span_start));
    if original.is_unmapped() {
        return None;
    }
    let generated = to.get_generated_position(original);
    if generated.is_unmapped() {
        tracing::debug!(span_start, "Span start has no position in target snapshot");
        return None;
    }
    Some(to.offset_at(generated))
}

//! Source positions, ranges and text edits
//!
//! Positions follow the common editor protocol shape: 0-based lines and
//! characters, ranges end-exclusive. Characters are counted in Unicode
//! scalar values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use similar::TextDiff;
use std::cmp::Ordering;
use std::fmt;

use crate::{CdsEditError, Result};

/// A 0-based position in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then(self.character.cmp(&other.character))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.character + 1)
    }
}

/// An end-exclusive range between two positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Shorthand for `Range::new(Position::new(..), Position::new(..))`
    pub const fn from_coords(
        start_line: u32,
        start_character: u32,
        end_line: u32,
        end_character: u32,
    ) -> Self {
        Self {
            start: Position::new(start_line, start_character),
            end: Position::new(end_line, end_character),
        }
    }

    /// Zero-width range at a position
    pub const fn empty(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if `other` lies completely inside this range (bounds included)
    pub fn contains(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn contains_position(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }

    /// Smallest range covering both ranges
    pub fn union(&self, other: &Range) -> Range {
        Range {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Check if the ranges share at least one character
    pub fn overlaps(&self, other: &Range) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A literal replacement of a range in the original text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

impl TextEdit {
    pub fn new(range: Range, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }

    /// Create an insertion edit
    pub fn insert(position: Position, text: impl Into<String>) -> Self {
        Self::new(Range::empty(position), text)
    }

    /// Create a deletion edit
    pub fn delete(range: Range) -> Self {
        Self::new(range, String::new())
    }

    /// Check if this edit is an insertion
    pub fn is_insertion(&self) -> bool {
        self.range.is_empty() && !self.new_text.is_empty()
    }

    /// Check if this edit is a deletion
    pub fn is_deletion(&self) -> bool {
        !self.range.is_empty() && self.new_text.is_empty()
    }
}

/// Text edits of one batch grouped by document uri
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkspaceEdit {
    pub changes: IndexMap<String, Vec<TextEdit>>,
}

impl WorkspaceEdit {
    pub fn is_empty(&self) -> bool {
        self.changes.values().all(Vec::is_empty)
    }

    pub fn edits_for(&self, uri: &str) -> &[TextEdit] {
        self.changes.get(uri).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Source text with precomputed line starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    text: String,
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        line_starts.extend(
            text.char_indices()
                .filter(|(_, c)| *c == '\n')
                .map(|(offset, _)| offset + 1),
        );
        Self { text, line_starts }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// Text of a line without its line break
    pub fn line_text(&self, line: u32) -> &str {
        let Some(&start) = self.line_starts.get(line as usize) else {
            return "";
        };
        let end = self
            .line_starts
            .get(line as usize + 1)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        self.text[start..end].trim_end_matches('\r')
    }

    /// Position right after the last character of a line
    pub fn line_end(&self, line: u32) -> Position {
        Position::new(line, self.line_text(line).chars().count() as u32)
    }

    /// Position after the last character of the text
    pub fn end(&self) -> Position {
        self.line_end(self.line_count() - 1)
    }

    /// Byte offset of a position, clamped to the end of its line
    pub fn offset(&self, position: Position) -> usize {
        let Some(&start) = self.line_starts.get(position.line as usize) else {
            return self.text.len();
        };
        let line = self.line_text(position.line);
        let within = line
            .char_indices()
            .nth(position.character as usize)
            .map(|(offset, _)| offset)
            .unwrap_or(line.len());
        start + within
    }

    /// Position of a byte offset
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = self.line_starts.partition_point(|start| *start <= offset) - 1;
        let start = self.line_starts[line];
        Position::new(line as u32, self.text[start..offset].chars().count() as u32)
    }

    pub fn slice(&self, range: Range) -> &str {
        let start = self.offset(range.start);
        let end = self.offset(range.end).max(start);
        &self.text[start..end]
    }

    /// Leading whitespace of a line
    pub fn line_indent(&self, line: u32) -> &str {
        let text = self.line_text(line);
        &text[..text.len() - text.trim_start().len()]
    }
}

/// Apply a list of non-overlapping edits to a text
pub fn apply_text_edits(text: &str, edits: &[TextEdit]) -> Result<String> {
    let index = LineIndex::new(text);
    let mut sorted: Vec<(usize, &TextEdit)> = edits.iter().enumerate().collect();
    sorted.sort_by(|(a_seq, a), (b_seq, b)| {
        a.range
            .start
            .cmp(&b.range.start)
            .then(a.range.end.cmp(&b.range.end))
            .then(a_seq.cmp(b_seq))
    });

    let mut result = String::with_capacity(text.len());
    let mut cursor = 0;
    for (_, edit) in sorted {
        let start = index.offset(edit.range.start);
        let end = index.offset(edit.range.end);
        if start < cursor {
            return Err(CdsEditError::invalid_edit(format!(
                "edit at {} overlaps a previous edit",
                edit.range
            )));
        }
        result.push_str(&text[cursor..start]);
        result.push_str(&edit.new_text);
        cursor = end.max(start);
    }
    result.push_str(&text[cursor..]);
    Ok(result)
}

/// Render a unified diff between two versions of a document
pub fn render_diff(uri: &str, before: &str, after: &str) -> String {
    TextDiff::from_lines(before, after)
        .unified_diff()
        .context_radius(2)
        .header(uri, uri)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_offsets() {
        let index = LineIndex::new("annotate A with\n  @UI.Hidden;\n");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_text(1), "  @UI.Hidden;");
        assert_eq!(index.offset(Position::new(1, 2)), 18);
        assert_eq!(index.position(18), Position::new(1, 2));
        assert_eq!(index.line_end(1), Position::new(1, 13));
        assert_eq!(index.line_indent(1), "  ");
        assert_eq!(index.slice(Range::from_coords(1, 3, 1, 5)), "UI");
    }

    #[test]
    fn test_offsets_count_characters() {
        let index = LineIndex::new("x = 'äö';");
        assert_eq!(index.slice(Range::from_coords(0, 4, 0, 8)), "'äö'");
    }

    #[test]
    fn test_apply_edits_in_any_order() {
        let text = "[ a, b ]";
        let edits = vec![
            TextEdit::new(Range::from_coords(0, 5, 0, 6), "c"),
            TextEdit::insert(Position::new(0, 2), "x, "),
        ];
        assert_eq!(apply_text_edits(text, &edits).unwrap(), "[ x, a, c ]");
    }

    #[test]
    fn test_same_position_inserts_keep_order() {
        let edits = vec![
            TextEdit::insert(Position::new(0, 1), "1"),
            TextEdit::insert(Position::new(0, 1), "2"),
        ];
        assert_eq!(apply_text_edits("ab", &edits).unwrap(), "a12b");
    }

    #[test]
    fn test_overlapping_edits_are_rejected() {
        let edits = vec![
            TextEdit::delete(Range::from_coords(0, 0, 0, 3)),
            TextEdit::delete(Range::from_coords(0, 2, 0, 4)),
        ];
        assert!(apply_text_edits("abcdef", &edits).is_err());
    }

    #[test]
    fn test_render_diff() {
        let diff = render_diff("file.cds", "a\nb\n", "a\nc\n");
        assert!(diff.contains("-b"));
        assert!(diff.contains("+c"));
    }

    #[test]
    fn test_range_relations() {
        let outer = Range::from_coords(1, 0, 4, 2);
        assert!(outer.contains(&Range::from_coords(2, 0, 3, 0)));
        assert!(!outer.contains(&Range::from_coords(0, 5, 2, 0)));
        assert!(outer.overlaps(&Range::from_coords(4, 1, 5, 0)));
        assert!(!outer.overlaps(&Range::from_coords(4, 2, 5, 0)));
    }
}

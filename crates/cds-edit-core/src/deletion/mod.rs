//! Deletion ranges
//!
//! A deletion starts as the token span of one node and is grown outward over
//! the syntax that would otherwise be left dangling: comments attached to
//! it, the `@` in front of a bare annotation, the brackets of a compound
//! list, the name of an annotated element, the `annotate ... with` clause.
//! Adjacent ranges separated only by a list separator are merged, and the
//! final ranges are turned into text edits that also remove the separator
//! shared with a surviving sibling.

mod edits;
mod expand;
mod merge;

pub use edits::to_text_edits;
pub use expand::expand;
pub use merge::merge;

use std::collections::HashSet;

use crate::config::VocabularyAliases;
use crate::model::TargetIndex;
use crate::text::{LineIndex, Range};
use crate::token::TokenStream;

/// How much surrounding syntax a range already covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeletionKind {
    /// A term or list item without its `@`
    Term,
    /// A term starting with a vocabulary alias
    QualifiedTerm,
    /// A complete annotation, `@` included
    Annotation,
    /// A complete annotation list with its brackets
    Assignments,
    /// A target declaration with its name or `annotate` clause
    Target,
}

/// Separator convention of the list a range lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrintPattern {
    /// `@A @B`, no separator
    BareAnnotations,
    /// `a, b`
    CommaList,
    /// `a; b;`
    Declarations,
}

impl PrintPattern {
    pub fn separator(self) -> Option<&'static str> {
        match self {
            PrintPattern::BareAnnotations => None,
            PrintPattern::CommaList => Some(","),
            PrintPattern::Declarations => Some(";"),
        }
    }
}

/// Inclusive index span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexRange {
    pub start: usize,
    pub end: usize,
}

impl IndexRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(index: usize) -> Self {
        Self::new(index, index)
    }

    pub fn union(&self, other: &IndexRange) -> IndexRange {
        IndexRange::new(self.start.min(other.start), self.end.max(other.end))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeletionRange {
    pub kind: DeletionKind,
    pub print_pattern: PrintPattern,
    /// Sibling indices at the deletion's list level
    pub term_range: IndexRange,
    /// Token indices to delete
    pub token_range: IndexRange,
    pub is_expanded: bool,
    /// The whole target is deleted, names and clauses included
    pub include_target: bool,
}

/// Everything the engine reads besides the ranges themselves
pub struct DeletionContext<'a> {
    pub tokens: &'a TokenStream,
    pub lines: &'a LineIndex,
    pub targets: &'a TargetIndex,
    /// Names of the targets deleted in the same batch
    pub deleted_targets: &'a HashSet<String>,
}

/// Initial range of a node to delete
///
/// `term` is the term or name the node starts with; it decides between
/// [`DeletionKind::Term`] and [`DeletionKind::QualifiedTerm`]. Returns
/// `None` when the node range covers no token.
pub fn range_for_node(
    tokens: &TokenStream,
    node_range: Range,
    term: Option<&str>,
    aliases: &VocabularyAliases,
    print_pattern: PrintPattern,
    sibling_index: usize,
) -> Option<DeletionRange> {
    let indices = tokens.indices_within(node_range);
    if indices.is_empty() {
        return None;
    }
    let kind = if term.is_some_and(|term| aliases.is_qualified(term)) {
        DeletionKind::QualifiedTerm
    } else {
        DeletionKind::Term
    };
    Some(DeletionRange {
        kind,
        print_pattern,
        term_range: IndexRange::single(sibling_index),
        token_range: IndexRange::new(indices.start, indices.end - 1),
        is_expanded: false,
        include_target: false,
    })
}

/// Expand every range to its fixed point, merge, and repeat until stable
pub fn expand_and_merge(
    ranges: Vec<DeletionRange>,
    context: &DeletionContext<'_>,
) -> Vec<DeletionRange> {
    let mut current = ranges;
    loop {
        let expanded: Vec<DeletionRange> = current
            .iter()
            .cloned()
            .map(|range| expand(range, context))
            .collect();
        let merged = merge(expanded, context.tokens);
        if merged == current {
            tracing::debug!(ranges = merged.len(), "deletion ranges settled");
            return merged;
        }
        current = merged;
    }
}

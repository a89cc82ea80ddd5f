//! Deletions
//!
//! Nodes are only recorded while operations are dispatched. Once every
//! operation has been seen the recorded ranges go through the deletion range
//! engine together, so neighbouring deletions merge and shared separators
//! disappear exactly once.

use super::{EditPriority, SynthesisContext};
use crate::cst::{Assignment, CstNode};
use crate::deletion::{expand_and_merge, range_for_node, to_text_edits, DeletionContext, PrintPattern};
use crate::pointer::Pointer;
use crate::text::{Position, Range, TextEdit};
use crate::{CdsEditError, Result};

#[derive(Debug, Clone)]
pub(super) struct DeletionRequest {
    pub range: Range,
    /// Term or name the node starts with
    pub term: Option<String>,
    pub pattern: PrintPattern,
    pub sibling: usize,
    pub include_target: bool,
}

impl DeletionRequest {
    pub fn new(range: Range, term: Option<String>, pattern: PrintPattern, sibling: usize) -> Self {
        Self {
            range,
            term,
            pattern,
            sibling,
            include_target: false,
        }
    }
}

fn assignment_term(assignment: &Assignment) -> String {
    match assignment {
        Assignment::Annotation(annotation) => annotation.term.text(),
        Assignment::Group(group) => group.name.text.clone(),
    }
}

impl SynthesisContext<'_> {
    pub(super) fn delete_target(&mut self, pointer: &Pointer) -> Result<()> {
        let CstNode::Target(target) = self.node(pointer)? else {
            return Err(CdsEditError::internal_error(format!("'{pointer}' is not a target")));
        };
        self.deleted_targets.insert(target.name.clone());
        let pattern = match target.compound {
            Some(_) => PrintPattern::CommaList,
            None => PrintPattern::BareAnnotations,
        };
        for (index, assignment) in target.assignments.iter().enumerate() {
            let mut request = DeletionRequest::new(
                assignment.range(),
                Some(assignment_term(assignment)),
                pattern,
                index,
            );
            request.include_target = true;
            self.deletions.push(request);
        }
        Ok(())
    }

    /// Annotation, group, embedded annotation or record property
    pub(super) fn delete_list_child(&mut self, pointer: &Pointer) -> Result<()> {
        let node = self.node(pointer)?;
        let (Some(sibling), Some(container)) = (pointer.last_index(), pointer.ancestor(2)) else {
            return Err(CdsEditError::internal_error(format!(
                "'{pointer}' is not a list child"
            )));
        };
        let pattern = match self.node(&container)? {
            CstNode::Target(target) if target.compound.is_none() => PrintPattern::BareAnnotations,
            _ => PrintPattern::CommaList,
        };
        let (range, term) = match node {
            CstNode::Annotation(annotation) => (annotation.range, annotation.term.text()),
            CstNode::Group(group) => (group.range, group.name.text.clone()),
            CstNode::Property(property) => (property.range, property.name.text()),
            node => {
                return Err(CdsEditError::internal_error(format!(
                    "cannot delete a {} as a list child",
                    node.kind_name()
                )));
            }
        };
        self.deletions
            .push(DeletionRequest::new(range, Some(term), pattern, sibling));
        Ok(())
    }

    /// Collection item, or the value of an annotation or property
    pub(super) fn delete_value(&mut self, pointer: &Pointer) -> Result<()> {
        let value = self.node(pointer)?.range();
        if pointer.last() != Some("value") {
            let sibling = pointer.last_index().ok_or_else(|| {
                CdsEditError::internal_error(format!("'{pointer}' is not a value"))
            })?;
            self.deletions.push(DeletionRequest::new(
                value,
                None,
                PrintPattern::CommaList,
                sibling,
            ));
            return Ok(());
        }

        let owner = pointer
            .parent()
            .ok_or_else(|| CdsEditError::internal_error("value without owner"))?;
        let head_end = match self.node(&owner)? {
            CstNode::Annotation(annotation) => annotation.head_end(),
            CstNode::Property(property) => property.name.range.end,
            node => {
                return Err(CdsEditError::internal_error(format!(
                    "{} does not hold a value",
                    node.kind_name()
                )));
            }
        };
        self.push(TextEdit::delete(Range::new(head_end, value.end)), EditPriority::Normal);
        Ok(())
    }

    pub(super) fn delete_qualifier(&mut self, pointer: &Pointer) -> Result<()> {
        let CstNode::Qualifier(qualifier) = self.node(pointer)? else {
            return Err(CdsEditError::internal_error(format!("'{pointer}' is not a qualifier")));
        };
        self.push(TextEdit::delete(qualifier.range), EditPriority::Normal);
        Ok(())
    }

    /// Everything between the braces of a group
    pub(super) fn delete_group_items(&mut self, pointer: &Pointer) -> Result<()> {
        let CstNode::GroupItems(items) = self.node(pointer)? else {
            return Err(CdsEditError::internal_error(format!(
                "'{pointer}' is not an annotation group"
            )));
        };
        let range = items.range;
        let inner = Range::new(
            Position::new(range.start.line, range.start.character + 1),
            Position::new(range.end.line, range.end.character.saturating_sub(1)),
        );
        if !inner.is_empty() {
            self.push(TextEdit::delete(inner), EditPriority::Normal);
        }
        Ok(())
    }

    pub(super) fn flush_deletions(&mut self) {
        if self.deletions.is_empty() {
            return;
        }
        let document = self.document;
        let aliases = self.printer.aliases();
        let ranges = std::mem::take(&mut self.deletions)
            .into_iter()
            .filter_map(|request| {
                let mut range = range_for_node(
                    &document.tokens,
                    request.range,
                    request.term.as_deref(),
                    aliases,
                    request.pattern,
                    request.sibling,
                )?;
                range.include_target = request.include_target;
                Some(range)
            })
            .collect();
        let context = DeletionContext {
            tokens: &document.tokens,
            lines: &document.lines,
            targets: &document.targets,
            deleted_targets: &self.deleted_targets,
        };
        let merged = expand_and_merge(ranges, &context);
        let edits = to_text_edits(&merged, &context);
        tracing::debug!(ranges = merged.len(), edits = edits.len(), "deletion edits");
        for edit in edits {
            self.push(edit, EditPriority::Normal);
        }
    }
}

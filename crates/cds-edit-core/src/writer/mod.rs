//! Edit synthesis
//!
//! A [`Writer`] collects the operations of one batch for one document,
//! converting each to concrete pointers as it is added. Text edits are
//! produced on demand: the batch is optimized and every operation is turned
//! into edits against the original text through a [`SynthesisContext`] that
//! lives for exactly one call.

mod collection;
mod compound;
mod convert;
mod delete;
mod indent;
mod insert;
mod update;

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::change::Operation;
use crate::config::WriterConfiguration;
use crate::cst::CstNode;
use crate::document::Document;
use crate::optimize::optimize;
use crate::pointer::Pointer;
use crate::printer::Printer;
use crate::result::ResultExt;
use crate::text::{Position, Range, TextEdit};
use crate::{CdsEditError, Result};

use delete::DeletionRequest;
use indent::IndentCache;
use insert::{EmptyContainer, Promotion};

pub struct Writer<'d> {
    document: &'d Document,
    config: WriterConfiguration,
    printer: Printer,
    changes: Vec<Operation>,
}

impl<'d> Writer<'d> {
    pub fn new(document: &'d Document, config: WriterConfiguration) -> Self {
        let printer = Printer::new(&config);
        Self {
            document,
            config,
            printer,
            changes: Vec::new(),
        }
    }

    /// Convert an operation to concrete pointers and queue it
    pub fn add_change(&mut self, operation: Operation) -> Result<()> {
        if self.document.ghost {
            return Err(CdsEditError::ReadOnlyDocument {
                uri: self.document.uri.clone(),
            });
        }
        let converted = convert::convert(operation, self.document, &self.config.aliases())?;
        self.changes.push(converted);
        Ok(())
    }

    /// Queued operations, already converted
    pub fn changes(&self) -> &[Operation] {
        &self.changes
    }

    pub fn reset(&mut self) {
        self.changes.clear();
    }

    /// Text edits for all queued operations
    ///
    /// Ambiguous operations are logged and skipped; any other failure aborts
    /// the whole batch.
    pub fn get_text_edits(&self) -> Result<Vec<TextEdit>> {
        let operations = optimize(&self.document.cst, self.changes.clone());
        let mut context = SynthesisContext::new(self.document, &self.printer, &self.config, &operations);
        for operation in &operations {
            context.dispatch(operation).recoverable()?;
        }
        let edits = context.finish()?;
        tracing::debug!(uri = %self.document.uri, edits = edits.len(), "synthesized text edits");
        Ok(edits)
    }
}

/// Ordering of edits starting at the same position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum EditPriority {
    /// Opening bracket of a compound conversion
    Open = 0,
    Normal = 1,
    /// Closing bracket of a compound conversion
    Close = 2,
}

#[derive(Debug, Clone)]
struct PrioritizedEdit {
    edit: TextEdit,
    priority: EditPriority,
    sequence: usize,
}

/// State of one `get_text_edits` call
pub(crate) struct SynthesisContext<'w> {
    document: &'w Document,
    printer: &'w Printer,
    indents: IndentCache,
    /// Deletions waiting for the range engine
    deletions: Vec<DeletionRequest>,
    deleted_targets: HashSet<String>,
    /// Inserts into containers without children, written bracket to bracket
    empty_containers: IndexMap<Pointer, EmptyContainer>,
    /// Annotations whose value is wrapped into a `$value` record
    promotions: IndexMap<Pointer, Promotion>,
    /// Bare targets converted to compound syntax, with the `unnecessary` flag
    converting: HashMap<Pointer, bool>,
    /// Lines to shift right by one unit after deletions are known
    reindent_lines: Vec<u32>,
    replaced: HashSet<Pointer>,
    /// Inline containers whose closing bracket was moved to its own line
    closing_moved: HashSet<Pointer>,
    /// Ends of last siblings that already received the separator for
    /// appended fragments
    separated: HashSet<Position>,
    edits: Vec<PrioritizedEdit>,
}

impl<'w> SynthesisContext<'w> {
    fn new(
        document: &'w Document,
        printer: &'w Printer,
        config: &WriterConfiguration,
        operations: &[Operation],
    ) -> Self {
        let converting = operations
            .iter()
            .filter_map(|operation| match operation {
                Operation::ConvertToCompoundAnnotation {
                    pointer,
                    unnecessary,
                } => Some((pointer.clone(), *unnecessary)),
                _ => None,
            })
            .collect();
        let replaced = operations
            .iter()
            .filter(|operation| matches!(operation, Operation::ReplaceNode { .. }))
            .map(|operation| operation.pointer().clone())
            .collect();
        Self {
            document,
            printer,
            indents: IndentCache::new(config.indent_style(), config.indent_size()),
            deletions: Vec::new(),
            deleted_targets: HashSet::new(),
            empty_containers: IndexMap::new(),
            promotions: IndexMap::new(),
            converting,
            reindent_lines: Vec::new(),
            replaced,
            closing_moved: HashSet::new(),
            separated: HashSet::new(),
            edits: Vec::new(),
        }
    }

    fn dispatch(&mut self, operation: &Operation) -> Result<()> {
        match operation {
            Operation::InsertTarget { index, target, .. } => self.insert_target(*index, target),
            Operation::InsertReference { reference, .. } => self.insert_reference(reference),
            Operation::InsertAnnotation {
                pointer,
                index,
                element,
            } => self.insert_annotation(pointer, *index, element),
            Operation::InsertEmbeddedAnnotation {
                pointer,
                index,
                element,
            } => self.insert_embedded_annotation(pointer, *index, element),
            Operation::InsertRecord {
                pointer,
                index,
                element,
            }
            | Operation::InsertCollection {
                pointer,
                index,
                element,
            }
            | Operation::InsertPrimitiveValue {
                pointer,
                index,
                element,
            } => self.insert_value(pointer, *index, element),
            Operation::InsertRecordProperty {
                pointer,
                index,
                element,
            } => self.insert_record_property(pointer, *index, element),
            Operation::InsertQualifier { pointer, value } => self.insert_qualifier(pointer, value),
            Operation::DeleteTarget { pointer } => self.delete_target(pointer),
            Operation::DeleteAnnotation { pointer }
            | Operation::DeleteAnnotationGroup { pointer }
            | Operation::DeleteEmbeddedAnnotation { pointer }
            | Operation::DeleteRecordProperty { pointer } => self.delete_list_child(pointer),
            Operation::DeleteAnnotationGroupItems { pointer } => self.delete_group_items(pointer),
            Operation::DeleteRecord { pointer }
            | Operation::DeleteCollection { pointer }
            | Operation::DeletePrimitiveValue { pointer } => self.delete_value(pointer),
            Operation::DeleteQualifier { pointer } => self.delete_qualifier(pointer),
            Operation::ReplaceNode { pointer, element } => self.replace_node(pointer, element),
            Operation::ReplaceRecordProperty { pointer, element } => {
                self.replace_record_property(pointer, element)
            }
            Operation::ReplaceTextValue { pointer, text } => self.replace_text_value(pointer, text),
            Operation::UpdatePrimitiveValue { pointer, element } => {
                self.update_primitive_value(pointer, element)
            }
            Operation::SetFlags { pointer, value } => self.set_flags(pointer, value),
            Operation::MoveCollectionValue {
                pointer,
                index,
                from_pointers,
            } => self.move_collection_values(pointer, *index, from_pointers),
            Operation::ConvertToCompoundAnnotation {
                pointer,
                unnecessary,
            } => self.convert_to_compound(pointer, *unnecessary),
        }
    }

    fn node(&self, pointer: &Pointer) -> Result<CstNode<'w>> {
        self.document.cst.resolve(pointer).ok_or_else(|| {
            CdsEditError::internal_error(format!("pointer '{pointer}' does not resolve"))
        })
    }

    fn level(&mut self, line: u32) -> usize {
        self.indents.level(self.document, line)
    }

    fn indent(&self, level: usize) -> String {
        self.printer.indent(level)
    }

    fn push(&mut self, edit: TextEdit, priority: EditPriority) {
        let sequence = self.edits.len();
        self.edits.push(PrioritizedEdit {
            edit,
            priority,
            sequence,
        });
    }

    fn insert(&mut self, position: Position, text: impl Into<String>) {
        self.push(TextEdit::insert(position, text), EditPriority::Normal);
    }

    fn replace(&mut self, range: Range, text: impl Into<String>) {
        self.push(TextEdit::new(range, text), EditPriority::Normal);
    }

    /// Flush pending work and return the edits in application order
    fn finish(mut self) -> Result<Vec<TextEdit>> {
        self.flush_empty_containers();
        self.flush_promotions();
        self.flush_deletions();
        self.flush_reindent();

        let edits = std::mem::take(&mut self.edits);
        let mut edits = self.relocate_contained_insertions(edits);
        edits.sort_by(|a, b| {
            a.edit
                .range
                .start
                .cmp(&b.edit.range.start)
                .then(a.edit.range.end.cmp(&b.edit.range.end))
                .then(a.priority.cmp(&b.priority))
                .then(a.sequence.cmp(&b.sequence))
        });
        edits.dedup_by(|a, b| a.edit.is_deletion() && a.edit == b.edit);

        let mut end: Option<Position> = None;
        for edit in &edits {
            if let Some(end) = end
                && edit.edit.range.start < end
            {
                return Err(CdsEditError::internal_error(format!(
                    "edits overlap at {}",
                    edit.edit.range
                )));
            }
            end = Some(end.map_or(edit.edit.range.end, |end| end.max(edit.edit.range.end)));
        }
        Ok(edits.into_iter().map(|edit| edit.edit).collect())
    }

    /// Move insertions that fall strictly inside a deleted range to its start
    ///
    /// Whitespace deleted in front of the insertion point is re-added as a
    /// prefix so the inserted text keeps its indentation.
    fn relocate_contained_insertions(&self, edits: Vec<PrioritizedEdit>) -> Vec<PrioritizedEdit> {
        let deletions: Vec<Range> = edits
            .iter()
            .filter(|edit| edit.edit.is_deletion())
            .map(|edit| edit.edit.range)
            .collect();
        edits
            .into_iter()
            .map(|mut edit| {
                if !edit.edit.is_insertion() {
                    return edit;
                }
                let position = edit.edit.range.start;
                if let Some(deleted) = deletions
                    .iter()
                    .find(|deleted| deleted.start < position && position < deleted.end)
                {
                    let skipped = self.document.lines.slice(Range::new(deleted.start, position));
                    if skipped.trim().is_empty() {
                        edit.edit.new_text = format!("{skipped}{}", edit.edit.new_text);
                    }
                    edit.edit.range = Range::empty(deleted.start);
                }
                edit
            })
            .collect()
    }
}

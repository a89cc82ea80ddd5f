//! Conversion of a bare annotation to `@( ... )` syntax

use super::{EditPriority, SynthesisContext};
use crate::cst::CstNode;
use crate::pointer::Pointer;
use crate::text::{Position, TextEdit};
use crate::{CdsEditError, Result};

impl SynthesisContext<'_> {
    /// Wrap the sole annotation of a target into brackets
    ///
    /// The annotation moves one level in; its continuation lines are shifted
    /// once deletions are known. Nothing is written when the conversion was
    /// only requested for inserts that ended up elsewhere.
    pub(super) fn convert_to_compound(&mut self, pointer: &Pointer, unnecessary: bool) -> Result<()> {
        if unnecessary {
            return Ok(());
        }
        let CstNode::Target(target) = self.node(pointer)? else {
            return Err(CdsEditError::internal_error(format!("'{pointer}' is not a target")));
        };
        let Some(assignment) = target.assignments.first() else {
            return Err(CdsEditError::internal_error("nothing to convert to compound syntax"));
        };
        let Some(at) = assignment.at() else {
            return Err(CdsEditError::internal_error("bare annotation without '@'"));
        };
        let range = assignment.range();
        let level = self.level(at.start.line);
        let open = format!("(\n{}", self.indent(level + 1));
        let close = format!("\n{})", self.indent(level));
        self.push(TextEdit::insert(at.end, open), EditPriority::Open);
        self.push(TextEdit::insert(range.end, close), EditPriority::Close);

        if !self.replaced.contains(&pointer.join("assignments/0")) {
            self.reindent_lines.extend(range.start.line + 1..=range.end.line);
        }
        Ok(())
    }

    /// Shift the recorded lines one unit right, skipping lines that are
    /// blank or rewritten by another edit
    pub(super) fn flush_reindent(&mut self) {
        let mut lines = std::mem::take(&mut self.reindent_lines);
        lines.sort_unstable();
        lines.dedup();
        let unit = self.printer.indent_unit().to_string();
        for line in lines {
            if self.document.lines.line_text(line).trim().is_empty() {
                continue;
            }
            let position = Position::new(line, 0);
            let rewritten = self.edits.iter().any(|edit| {
                let range = edit.edit.range;
                !edit.edit.is_insertion()
                    && position < range.end
                    && (range.start < position || (edit.edit.is_deletion() && range.start == position))
            });
            if !rewritten {
                self.insert(position, unit.clone());
            }
        }
    }
}

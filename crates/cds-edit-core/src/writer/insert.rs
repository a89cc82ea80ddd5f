//! Inserts: list children, valueless slots, promoted values, targets and
//! references

use super::SynthesisContext;
use super::indent::reindent;
use crate::cst::{AnnotationGroup, CstNode, Target, Value};
use crate::model::{Element, Reference, Target as NewTarget};
use crate::pointer::Pointer;
use crate::printer::{AnnotationForm, Printer};
use crate::text::{Position, Range};
use crate::{CdsEditError, Result};

/// Container without children, rewritten bracket to bracket once
pub(super) struct EmptyContainer {
    open: Range,
    close: Range,
    level: usize,
    fragments: Vec<String>,
}

/// Annotation whose value is wrapped into `{ $value : ..., ![@T] : ... }`
pub(super) struct Promotion {
    head_end: Position,
    value: Option<Range>,
    level: usize,
    fragments: Vec<String>,
}

/// A bracketed list of children
struct ListContainer {
    pointer: Pointer,
    open: Range,
    close: Range,
    items: Vec<Range>,
    /// Level of the line holding the opening bracket
    level: usize,
}

impl SynthesisContext<'_> {
    fn bracketed(&mut self, pointer: &Pointer, range: Range, items: Vec<Range>) -> Result<ListContainer> {
        let tokens = &self.document.tokens;
        let (Some(open), Some(close)) = (
            tokens.index_starting_at(range.start),
            tokens.index_ending_at(range.end),
        ) else {
            return Err(CdsEditError::internal_error(format!(
                "no brackets around {range}"
            )));
        };
        let open = tokens.tokens()[open].range;
        let close = tokens.tokens()[close].range;
        Ok(ListContainer {
            pointer: pointer.clone(),
            open,
            close,
            items,
            level: self.level(range.start.line),
        })
    }

    /// `( ... )` of a compound target
    fn compound_list(&mut self, pointer: &Pointer, target: &Target, compound: Range) -> Result<ListContainer> {
        let tokens = &self.document.tokens;
        let open = tokens
            .index_starting_at(compound.start)
            .and_then(|at| tokens.next_code(at))
            .map(|open| tokens.tokens()[open].range.start)
            .ok_or_else(|| CdsEditError::internal_error("compound annotation without '('"))?;
        let items = target.assignments.iter().map(|a| a.range()).collect();
        let mut list = self.bracketed(pointer, Range::new(open, compound.end), items)?;
        list.level = self.level(compound.start.line);
        Ok(list)
    }

    fn insert_into_list(
        &mut self,
        list: ListContainer,
        index: Option<usize>,
        fragment: &dyn Fn(usize) -> String,
    ) -> Result<()> {
        let document = self.document;
        let tokens = &document.tokens;

        if list.items.is_empty() {
            let text = fragment(list.level + 1);
            self.empty_containers
                .entry(list.pointer)
                .or_insert_with(|| EmptyContainer {
                    open: list.open,
                    close: list.close,
                    level: list.level,
                    fragments: Vec::new(),
                })
                .fragments
                .push(text);
            return Ok(());
        }

        if let Some(index) = index.filter(|index| *index < list.items.len()) {
            let anchor = list.items[index];
            let own_line = tokens
                .index_starting_at(anchor.start)
                .is_some_and(|first| tokens.is_first_on_line(first));
            if own_line {
                let level = self.level(anchor.start.line);
                let text = format!("{},\n{}", fragment(level), self.indent(level));
                self.insert(anchor.start, text);
            } else {
                self.insert(anchor.start, format!("{}, ", fragment(list.level)));
            }
            return Ok(());
        }

        self.append_to_list(&list, fragment)
    }

    fn append_to_list(&mut self, list: &ListContainer, fragment: &dyn Fn(usize) -> String) -> Result<()> {
        let document = self.document;
        let tokens = &document.tokens;
        let Some(last) = list.items.last().copied() else {
            return Ok(());
        };
        let last_token = tokens
            .index_ending_at(last.end)
            .ok_or_else(|| CdsEditError::internal_error(format!("no token ends at {}", last.end)))?;
        let comma = tokens
            .next_code(last_token)
            .filter(|&next| tokens.tokens()[next].is(","));
        let anchor = comma.unwrap_or(last_token);
        let comment_end = tokens
            .get(anchor + 1)
            .filter(|next| {
                next.is_comment() && next.range.start.line == tokens.tokens()[anchor].range.end.line
            })
            .map(|comment| comment.range.end);

        let own_line = tokens
            .index_starting_at(last.start)
            .is_some_and(|first| tokens.is_first_on_line(first));
        if own_line {
            let level = self.level(last.start.line);
            let text = fragment(level);
            let indent = self.indent(level);
            match (comma, comment_end) {
                (Some(comma), _) => {
                    let position = comment_end.unwrap_or(tokens.tokens()[comma].range.end);
                    self.insert(position, format!("\n{indent}{text},"));
                }
                (None, Some(comment_end)) => {
                    // Comma before the trailing comment, once per sibling
                    if self.separated.insert(last.end) {
                        self.insert(last.end, ",");
                        self.insert(comment_end, format!("\n{indent}{text}"));
                    } else {
                        self.insert(comment_end, format!(",\n{indent}{text}"));
                    }
                }
                (None, None) => self.insert(last.end, format!(",\n{indent}{text}")),
            }
            return Ok(());
        }

        let text = fragment(list.level);
        match comma {
            Some(comma) => self.insert(tokens.tokens()[comma].range.end, format!(" {text},")),
            None => self.insert(last.end, format!(", {text}")),
        }
        if text.contains('\n') && self.closing_moved.insert(list.pointer.clone()) {
            if let Some(close) = tokens.index_starting_at(list.close.start)
                && close > 0
                && !tokens.is_first_on_line(close)
            {
                let previous = tokens.tokens()[close - 1].range.end;
                let indent = self.indent(list.level);
                self.replace(Range::new(previous, list.close.start), format!("\n{indent}"));
            }
        }
        Ok(())
    }

    pub(super) fn insert_annotation(&mut self, pointer: &Pointer, index: Option<usize>, element: &Element) -> Result<()> {
        let printer = self.printer;
        match self.node(pointer)? {
            CstNode::Target(target) => {
                if self.converting.get(pointer) == Some(&false) {
                    return self.insert_converting(target, index, element);
                }
                match target.compound {
                    Some(compound) => {
                        let list = self.compound_list(pointer, target, compound)?;
                        self.insert_into_list(list, index, &|level| {
                            printer.print_annotation(element, AnnotationForm::Compound, level)
                        })
                    }
                    None => self.insert_bare_annotation(target, index, element),
                }
            }
            CstNode::GroupItems(items) => {
                let document = self.document;
                let group = pointer
                    .parent()
                    .and_then(|parent| document.cst.resolve(&parent))
                    .and_then(|node| match node {
                        CstNode::Group(group) => Some(group),
                        _ => None,
                    })
                    .ok_or_else(|| CdsEditError::internal_error("group items outside a group"))?;
                let list = self.bracketed(pointer, items.range, items.items.iter().map(|a| a.range).collect())?;
                self.insert_into_list(list, index, &|level| print_group_item(printer, element, group, level))
            }
            node => Err(CdsEditError::internal_error(format!(
                "cannot insert an annotation into a {}",
                node.kind_name()
            ))),
        }
    }

    fn insert_bare_annotation(&mut self, target: &Target, index: Option<usize>, element: &Element) -> Result<()> {
        let document = self.document;
        let tokens = &document.tokens;
        let printer = self.printer;

        if target.assignments.is_empty() {
            let after_name = tokens
                .code_after(target.name_range.end)
                .filter(|&next| tokens.tokens()[next].is_keyword("with"))
                .map(|with| tokens.tokens()[with].range.end)
                .unwrap_or(target.name_range.end);
            let level = self.level(target.name_range.start.line);
            let text = printer.print_annotation(element, AnnotationForm::Bare, level);
            self.insert(after_name, format!(" {text}"));
            return Ok(());
        }

        if let Some(index) = index.filter(|index| *index < target.assignments.len()) {
            let anchor = target.assignments[index].full_range();
            let level = self.level(anchor.start.line);
            let text = printer.print_annotation(element, AnnotationForm::Bare, level);
            let own_line = tokens
                .index_starting_at(anchor.start)
                .is_some_and(|first| tokens.is_first_on_line(first));
            if own_line {
                let indent = self.indent(level);
                self.insert(anchor.start, format!("{text}\n{indent}"));
            } else {
                self.insert(anchor.start, format!("{text} "));
            }
            return Ok(());
        }

        let Some(last) = target.assignments.last().map(|a| a.full_range()) else {
            return Ok(());
        };
        let level = self.level(last.start.line);
        let text = printer.print_annotation(element, AnnotationForm::Bare, level);
        let own_line = tokens
            .index_starting_at(last.start)
            .is_some_and(|first| tokens.is_first_on_line(first));
        if last.start.line == target.name_range.start.line || !own_line {
            self.insert(last.end, format!(" {text}"));
        } else {
            let comment_end = tokens
                .index_ending_at(last.end)
                .and_then(|token| tokens.get(token + 1))
                .filter(|next| next.is_comment() && next.range.start.line == last.end.line)
                .map(|comment| comment.range.end);
            let indent = self.indent(level);
            self.insert(comment_end.unwrap_or(last.end), format!("\n{indent}{text}"));
        }
        Ok(())
    }

    /// Insert next to the sole annotation of a target being converted to
    /// compound syntax
    fn insert_converting(&mut self, target: &Target, index: Option<usize>, element: &Element) -> Result<()> {
        let Some(assignment) = target.assignments.first() else {
            return Err(CdsEditError::internal_error("converted target has no annotation"));
        };
        let range = assignment.range();
        let level = self.level(assignment.full_range().start.line) + 1;
        let text = self
            .printer
            .print_annotation(element, AnnotationForm::Compound, level);
        let indent = self.indent(level);
        if index == Some(0) {
            self.insert(range.start, format!("{text},\n{indent}"));
        } else {
            self.insert(range.end, format!(",\n{indent}{text}"));
        }
        Ok(())
    }

    pub(super) fn insert_embedded_annotation(
        &mut self,
        pointer: &Pointer,
        index: Option<usize>,
        element: &Element,
    ) -> Result<()> {
        let printer = self.printer;
        match self.node(pointer)? {
            CstNode::Record(record) => {
                let items = record.entries.iter().map(|entry| entry.range()).collect();
                let list = self.bracketed(pointer, record.range, items)?;
                self.insert_into_list(list, index, &|level| {
                    printer.print_annotation(element, AnnotationForm::Embedded, level)
                })
            }
            CstNode::Annotation(annotation) => {
                let level = self.level(annotation.range.start.line);
                let text = printer.print_annotation(element, AnnotationForm::Embedded, level + 1);
                self.promotions
                    .entry(pointer.clone())
                    .or_insert_with(|| Promotion {
                        head_end: annotation.head_end(),
                        value: annotation.value.as_ref().map(Value::range),
                        level,
                        fragments: Vec::new(),
                    })
                    .fragments
                    .push(text);
                Ok(())
            }
            node => Err(CdsEditError::internal_error(format!(
                "cannot embed an annotation into a {}",
                node.kind_name()
            ))),
        }
    }

    pub(super) fn insert_value(&mut self, pointer: &Pointer, index: Option<usize>, element: &Element) -> Result<()> {
        let printer = self.printer;
        match self.node(pointer)? {
            CstNode::Collection(collection) => {
                let items = collection.items.iter().map(Value::range).collect();
                let list = self.bracketed(pointer, collection.range, items)?;
                self.insert_into_list(list, index, &|level| printer.print_value(element, level))
            }
            node => self.fill_valueless_slot(&node, |level| printer.print_value(element, level)),
        }
    }

    /// ` : value` after the head of an annotation or property without value
    pub(super) fn fill_valueless_slot(&mut self, node: &CstNode<'_>, value: impl Fn(usize) -> String) -> Result<()> {
        let (head_end, line) = match node {
            CstNode::Annotation(annotation) if annotation.value.is_none() => {
                (annotation.head_end(), annotation.range.start.line)
            }
            CstNode::Property(property) if property.value.is_none() => {
                (property.name.range.end, property.range.start.line)
            }
            node => {
                return Err(CdsEditError::internal_error(format!(
                    "{} has no empty value slot",
                    node.kind_name()
                )));
            }
        };
        let level = self.level(line);
        self.insert(head_end, format!(" : {}", value(level)));
        Ok(())
    }

    pub(super) fn insert_record_property(
        &mut self,
        pointer: &Pointer,
        index: Option<usize>,
        element: &Element,
    ) -> Result<()> {
        let printer = self.printer;
        let CstNode::Record(record) = self.node(pointer)? else {
            return Err(CdsEditError::internal_error("record property outside a record"));
        };
        let items = record.entries.iter().map(|entry| entry.range()).collect();
        let list = self.bracketed(pointer, record.range, items)?;
        self.insert_into_list(list, index, &|level| printer.print_property(element, level))
    }

    pub(super) fn insert_qualifier(&mut self, pointer: &Pointer, value: &str) -> Result<()> {
        let CstNode::Annotation(annotation) = self.node(pointer)? else {
            return Err(CdsEditError::internal_error("qualifier outside an annotation"));
        };
        self.insert(annotation.term.range.end, format!("#{value}"));
        Ok(())
    }

    pub(super) fn insert_target(&mut self, index: Option<usize>, target: &NewTarget) -> Result<()> {
        let text = self.printer.print_target(target);
        let document = self.document;
        let tokens = document.tokens.tokens();
        match index.and_then(|index| document.cst.targets.get(index)) {
            Some(anchor) => {
                let start = tokens
                    .iter()
                    .rev()
                    .find(|token| token.range.start <= anchor.range.start && token.is_keyword("annotate"))
                    .map(|token| token.range.start)
                    .unwrap_or(anchor.range.start);
                self.insert(start, format!("{text}\n\n"));
            }
            None => match tokens.last() {
                Some(last) => self.insert(last.range.end, format!("\n\n{text}")),
                None => self.insert(Position::default(), format!("{text}\n")),
            },
        }
        Ok(())
    }

    pub(super) fn insert_reference(&mut self, reference: &Reference) -> Result<()> {
        let text = self.printer.print_reference(reference);
        match self.document.cst.usings.last() {
            Some(using) => self.insert(using.range.end, format!("\n{text}")),
            None => self.insert(Position::default(), format!("{text}\n")),
        }
        Ok(())
    }

    pub(super) fn flush_empty_containers(&mut self) {
        for (_, container) in std::mem::take(&mut self.empty_containers) {
            let text = self
                .printer
                .print_block("", "", &container.fragments, container.level);
            self.replace(Range::new(container.open.end, container.close.start), text);
        }
    }

    pub(super) fn flush_promotions(&mut self) {
        let unit = self.printer.indent_unit().to_string();
        for (_, promotion) in std::mem::take(&mut self.promotions) {
            let value = match promotion.value {
                Some(range) => reindent(self.document.lines.slice(range), &unit, 1),
                None => "true".to_string(),
            };
            let mut entries = vec![format!("$value : {value}")];
            entries.extend(promotion.fragments);
            let text = self.printer.print_block("{", "}", &entries, promotion.level);
            match promotion.value {
                Some(range) => self.replace(range, text),
                None => self.insert(promotion.head_end, format!(" : {text}")),
            }
        }
    }
}

/// Annotation inside `@Group : { ... }`, written without the group name
fn print_group_item(
    printer: &Printer,
    element: &Element,
    group: &AnnotationGroup,
    level: usize,
) -> String {
    let text = printer.print_annotation(element, AnnotationForm::Compound, level);
    let prefix = format!("{}.", group.name.text);
    text.strip_prefix(&prefix).map(str::to_string).unwrap_or(text)
}

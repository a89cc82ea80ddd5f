//! In-place replacements of nodes and values

use super::SynthesisContext;
use crate::cst::{CstNode, Primitive, PrimitiveKind};
use crate::model::{Element, ElementKind};
use crate::pointer::Pointer;
use crate::printer::{enum_member, quote, AnnotationForm};
use crate::{CdsEditError, Result};

/// String literal in the quote style of an existing primitive
fn requote(original: &Primitive, text: &str) -> String {
    match original.kind {
        PrimitiveKind::MultiLineString if original.text.starts_with('`') => format!("`{text}`"),
        _ => quote(text),
    }
}

impl SynthesisContext<'_> {
    pub(super) fn replace_node(&mut self, pointer: &Pointer, element: &Element) -> Result<()> {
        let printer = self.printer;
        match self.node(pointer)? {
            CstNode::Annotation(annotation) if annotation.embedded => {
                let level = self.level(annotation.range.start.line);
                let text = printer.print_annotation(element, AnnotationForm::Embedded, level);
                self.replace(annotation.range, text);
            }
            node @ (CstNode::Annotation(_) | CstNode::Group(_)) => {
                let range = node.range();
                let mut level = self.level(range.start.line);
                let target = pointer
                    .index_after("assignments")
                    .and_then(|_| pointer.ancestor(pointer.depth() - 2));
                if let Some(target) = &target
                    && self.converting.get(target) == Some(&false)
                {
                    level += 1;
                }
                // `@` stays in front of the replaced range
                let mut text = printer.print_annotation(element, AnnotationForm::Compound, level);
                if let Some(group) = self.enclosing_group(pointer) {
                    let prefix = format!("{group}.");
                    if let Some(stripped) = text.strip_prefix(&prefix) {
                        text = stripped.to_string();
                    }
                }
                self.replace(range, text);
            }
            node if node.is_value() => {
                let level = self.level(node.range().start.line);
                self.replace(node.range(), printer.print_value(element, level));
            }
            node => {
                return Err(CdsEditError::internal_error(format!(
                    "cannot replace a {}",
                    node.kind_name()
                )));
            }
        }
        Ok(())
    }

    /// Name of the group whose items contain the node
    fn enclosing_group(&self, pointer: &Pointer) -> Option<String> {
        let segments = pointer.segments();
        let position = segments
            .windows(2)
            .rposition(|pair| pair[0] == "items" && pair[1] == "items")?;
        let group = Pointer::from_segments(&segments[..position]);
        match self.document.cst.resolve(&group)? {
            CstNode::Group(group) => Some(group.name.text.clone()),
            _ => None,
        }
    }

    pub(super) fn replace_record_property(&mut self, pointer: &Pointer, element: &Element) -> Result<()> {
        let CstNode::Property(property) = self.node(pointer)? else {
            return Err(CdsEditError::internal_error(format!(
                "'{pointer}' is not a record property"
            )));
        };
        let level = self.level(property.range.start.line);
        let text = self.printer.print_property(element, level);
        self.replace(property.range, text);
        Ok(())
    }

    pub(super) fn replace_text_value(&mut self, pointer: &Pointer, text: &str) -> Result<()> {
        let CstNode::Primitive(primitive) = self.node(pointer)? else {
            return Err(CdsEditError::internal_error(format!(
                "'{pointer}' is not a primitive value"
            )));
        };
        self.replace(primitive.range, requote(primitive, text));
        Ok(())
    }

    pub(super) fn update_primitive_value(&mut self, pointer: &Pointer, element: &Element) -> Result<()> {
        let printer = self.printer;
        match self.node(pointer)? {
            CstNode::Primitive(primitive) => {
                let text = element.text().unwrap_or_default();
                let new_text = match element.kind() {
                    ElementKind::String => requote(primitive, text),
                    ElementKind::EnumMember if text.split_whitespace().count() == 1 => {
                        enum_member(text)
                    }
                    _ => {
                        let level = self.level(primitive.range.start.line);
                        printer.print_value(element, level)
                    }
                };
                self.replace(primitive.range, new_text);
                Ok(())
            }
            node => self.fill_valueless_slot(&node, |level| printer.print_value(element, level)),
        }
    }

    pub(super) fn set_flags(&mut self, pointer: &Pointer, value: &str) -> Result<()> {
        let printer = self.printer;
        match self.node(pointer)? {
            CstNode::Collection(collection) => {
                self.replace(collection.range, printer.print_flags(value));
                Ok(())
            }
            CstNode::Primitive(primitive) => Err(CdsEditError::ambiguous(
                "set-flags",
                format!(
                    "'{}' at {} is a single value, not a flag collection",
                    primitive.text, primitive.range
                ),
            )),
            node => self.fill_valueless_slot(&node, |_| printer.print_flags(value)),
        }
    }
}

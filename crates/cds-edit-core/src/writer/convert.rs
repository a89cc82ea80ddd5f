//! Conversion of submitted operations to concrete pointers
//!
//! Every pointer is translated and the node it lands on is checked against
//! the operation. Insert indexes are mapped by range, deletions below a
//! flattened path become deletions of the flattened node, and embedded
//! inserts on promoted annotations are redirected into their `$value` record.

use crate::change::Operation;
use crate::config::VocabularyAliases;
use crate::cst::{Assignment, CstNode, Target, Value};
use crate::document::Document;
use crate::model::{AbstractNode, Element, ElementKind, Node};
use crate::pointer::Pointer;
use crate::text::Range;
use crate::translate::{TranslatedPointer, concrete_child_ranges, map_insert_index, translate};
use crate::{CdsEditError, Result};

pub(super) fn convert(
    operation: Operation,
    document: &Document,
    aliases: &VocabularyAliases,
) -> Result<Operation> {
    let converter = Converter { document, aliases };
    let converted = converter.convert(operation)?;
    tracing::debug!(
        operation = converted.kind(),
        pointer = %converted.pointer(),
        "converted operation"
    );
    Ok(converted)
}

struct Converter<'d> {
    document: &'d Document,
    aliases: &'d VocabularyAliases,
}

fn unsupported(operation: &str, reason: impl Into<String>) -> CdsEditError {
    CdsEditError::unsupported(operation, reason)
}

impl<'d> Converter<'d> {
    fn resolve(&self, pointer: &Pointer) -> Result<(TranslatedPointer, CstNode<'d>)> {
        let translated = translate(pointer, &self.document.ast, &self.document.cst, self.aliases)?;
        let node = self.document.cst.resolve(&translated.pointer).ok_or_else(|| {
            CdsEditError::pointer_resolution(pointer, "translated pointer does not resolve")
        })?;
        Ok((translated, node))
    }

    /// Ranges of the abstract children an insert index counts
    fn abstract_children(&self, pointer: &Pointer) -> Vec<Option<Range>> {
        match self.document.ast.resolve(pointer) {
            Some(AbstractNode::File(file)) => file.targets.iter().map(|target| target.range).collect(),
            Some(AbstractNode::Target(target)) => target.terms.iter().map(|term| term.range).collect(),
            Some(AbstractNode::Element(element)) => element.content.iter().map(Node::range).collect(),
            _ => Vec::new(),
        }
    }

    fn map_index(&self, pointer: &Pointer, index: Option<usize>, node: &CstNode<'_>) -> Option<usize> {
        map_insert_index(index, &self.abstract_children(pointer), &concrete_child_ranges(node))
    }

    /// Group of the target whose name is the vocabulary of `element`
    fn matching_group(&self, target: &Target, element: &Element) -> Option<usize> {
        let term = self.aliases.shorten(element.term()?);
        let (vocabulary, _) = term.split_once('.')?;
        target.assignments.iter().position(|assignment| {
            matches!(assignment, Assignment::Group(group) if group.name.text == vocabulary)
        })
    }

    fn convert(&self, operation: Operation) -> Result<Operation> {
        let kind = operation.kind();
        match operation {
            Operation::InsertTarget {
                pointer,
                index,
                target,
            } => {
                if !pointer.is_root() {
                    return Err(unsupported(kind, "targets are inserted at the file root"));
                }
                let concrete: Vec<Range> = self.document.cst.targets.iter().map(|t| t.range).collect();
                let index = map_insert_index(index, &self.abstract_children(&pointer), &concrete);
                Ok(Operation::InsertTarget {
                    pointer,
                    index,
                    target,
                })
            }
            Operation::InsertReference { pointer, reference } => {
                if !pointer.is_root() {
                    return Err(unsupported(kind, "references are inserted at the file root"));
                }
                Ok(Operation::InsertReference { pointer, reference })
            }
            Operation::InsertAnnotation {
                pointer,
                index,
                element,
            } => {
                expect_kind(kind, &element, |kind| kind == ElementKind::Annotation)?;
                let (translated, node) = self.resolve(&pointer)?;
                let CstNode::Target(target) = node else {
                    return Err(unsupported(kind, format!("cannot insert into a {}", node.kind_name())));
                };
                if let Some(group) = self.matching_group(target, &element) {
                    return Ok(Operation::InsertAnnotation {
                        pointer: translated.pointer.join(&format!("assignments/{group}/items")),
                        index: None,
                        element,
                    });
                }
                Ok(Operation::InsertAnnotation {
                    index: self.map_index(&pointer, index, &node),
                    pointer: translated.pointer,
                    element,
                })
            }
            Operation::InsertEmbeddedAnnotation {
                pointer,
                index,
                element,
            } => {
                expect_kind(kind, &element, |kind| kind == ElementKind::Annotation)?;
                let (translated, node) = self.resolve(&pointer)?;
                let (pointer, index) = match node {
                    CstNode::Record(_) => (translated.pointer, self.map_index(&pointer, index, &node)),
                    CstNode::Annotation(annotation) => match &annotation.value {
                        Some(Value::Record(_)) => (translated.pointer.child("value"), None),
                        _ => (translated.pointer, None),
                    },
                    node => {
                        return Err(unsupported(
                            kind,
                            format!("a {} cannot carry annotations", node.kind_name()),
                        ));
                    }
                };
                Ok(Operation::InsertEmbeddedAnnotation {
                    pointer,
                    index,
                    element,
                })
            }
            Operation::InsertRecord { .. }
            | Operation::InsertCollection { .. }
            | Operation::InsertPrimitiveValue { .. } => self.convert_value_insert(operation),
            Operation::InsertRecordProperty {
                pointer,
                index,
                element,
            } => {
                expect_kind(kind, &element, |kind| kind == ElementKind::PropertyValue)?;
                let (translated, node) = self.resolve(&pointer)?;
                if !matches!(node, CstNode::Record(_)) {
                    return Err(unsupported(kind, format!("cannot add a property to a {}", node.kind_name())));
                }
                Ok(Operation::InsertRecordProperty {
                    index: self.map_index(&pointer, index, &node),
                    pointer: translated.pointer,
                    element,
                })
            }
            Operation::InsertQualifier { pointer, value } => {
                let (translated, node) = self.resolve(&pointer)?;
                match node {
                    CstNode::Annotation(annotation) if annotation.qualifier.is_none() => {
                        Ok(Operation::InsertQualifier {
                            pointer: translated.pointer,
                            value,
                        })
                    }
                    CstNode::Annotation(_) => Err(unsupported(kind, "annotation is already qualified")),
                    node => Err(unsupported(kind, format!("a {} has no qualifier", node.kind_name()))),
                }
            }
            Operation::DeleteTarget { pointer } => {
                let (translated, node) = self.resolve(&pointer)?;
                if !matches!(node, CstNode::Target(_)) {
                    return Err(unsupported(kind, format!("expected a target, found a {}", node.kind_name())));
                }
                Ok(Operation::DeleteTarget {
                    pointer: translated.pointer,
                })
            }
            Operation::DeleteAnnotation { pointer } => {
                let (translated, node) = self.resolve(&pointer)?;
                match node {
                    CstNode::Annotation(annotation) if annotation.embedded => {
                        Ok(Operation::DeleteEmbeddedAnnotation {
                            pointer: translated.pointer,
                        })
                    }
                    CstNode::Annotation(_) => Ok(Operation::DeleteAnnotation {
                        pointer: translated.pointer,
                    }),
                    CstNode::Group(_) => Ok(Operation::DeleteAnnotationGroup {
                        pointer: translated.pointer,
                    }),
                    node => Err(unsupported(kind, format!("expected an annotation, found a {}", node.kind_name()))),
                }
            }
            Operation::DeleteEmbeddedAnnotation { pointer } => {
                let (translated, node) = self.resolve(&pointer)?;
                match node {
                    CstNode::Annotation(annotation) if annotation.embedded => {
                        Ok(Operation::DeleteEmbeddedAnnotation {
                            pointer: translated.pointer,
                        })
                    }
                    node => Err(unsupported(
                        kind,
                        format!("expected an embedded annotation, found a {}", node.kind_name()),
                    )),
                }
            }
            Operation::DeleteRecord { .. }
            | Operation::DeleteCollection { .. }
            | Operation::DeletePrimitiveValue { .. }
            | Operation::DeleteRecordProperty { .. } => self.convert_value_deletion(operation),
            Operation::DeleteQualifier { pointer } => {
                let (translated, node) = self.resolve(&pointer)?;
                let pointer = match node {
                    CstNode::Qualifier(_) => translated.pointer,
                    CstNode::Annotation(annotation) if annotation.qualifier.is_some() => {
                        translated.pointer.child("qualifier")
                    }
                    node => {
                        return Err(unsupported(kind, format!("the {} has no qualifier", node.kind_name())));
                    }
                };
                Ok(Operation::DeleteQualifier { pointer })
            }
            Operation::ReplaceNode { pointer, element } => {
                let (translated, node) = self.resolve_editable(kind, &pointer)?;
                let fits = match node {
                    CstNode::Annotation(_) | CstNode::Group(_) => element.kind() == ElementKind::Annotation,
                    node if node.is_value() => element.kind() != ElementKind::Annotation,
                    _ => false,
                };
                if !fits {
                    return Err(unsupported(
                        kind,
                        format!("cannot replace a {} with {:?}", node.kind_name(), element.kind()),
                    ));
                }
                Ok(Operation::ReplaceNode {
                    pointer: translated.pointer,
                    element,
                })
            }
            Operation::ReplaceRecordProperty { pointer, element } => {
                expect_kind(kind, &element, |kind| kind == ElementKind::PropertyValue)?;
                let (translated, node) = self.resolve_editable(kind, &pointer)?;
                if !matches!(node, CstNode::Property(_)) {
                    return Err(unsupported(kind, format!("expected a record property, found a {}", node.kind_name())));
                }
                Ok(Operation::ReplaceRecordProperty {
                    pointer: translated.pointer,
                    element,
                })
            }
            Operation::ReplaceTextValue { pointer, text } => {
                let (translated, node) = self.resolve_editable(kind, &pointer)?;
                if !matches!(node, CstNode::Primitive(_)) {
                    return Err(unsupported(kind, format!("a {} has no text value", node.kind_name())));
                }
                Ok(Operation::ReplaceTextValue {
                    pointer: translated.pointer,
                    text,
                })
            }
            Operation::UpdatePrimitiveValue { pointer, element } => {
                expect_kind(kind, &element, ElementKind::is_primitive)?;
                let (translated, node) = self.resolve_editable(kind, &pointer)?;
                if !(matches!(node, CstNode::Primitive(_)) || is_valueless(&node)) {
                    return Err(unsupported(kind, format!("a {} is not a primitive value", node.kind_name())));
                }
                Ok(Operation::UpdatePrimitiveValue {
                    pointer: translated.pointer,
                    element,
                })
            }
            Operation::SetFlags { pointer, value } => {
                let (translated, node) = self.resolve_editable(kind, &pointer)?;
                let fits = matches!(node, CstNode::Collection(_) | CstNode::Primitive(_))
                    || is_valueless(&node);
                if !fits {
                    return Err(unsupported(kind, format!("a {} cannot hold flags", node.kind_name())));
                }
                Ok(Operation::SetFlags {
                    pointer: translated.pointer,
                    value,
                })
            }
            Operation::MoveCollectionValue {
                pointer,
                index,
                from_pointers,
            } => {
                let (translated, node) = self.resolve_editable(kind, &pointer)?;
                if !matches!(node, CstNode::Collection(_)) {
                    return Err(unsupported(kind, format!("cannot move values into a {}", node.kind_name())));
                }
                let index = self.map_index(&pointer, index, &node);
                let from_pointers = from_pointers
                    .iter()
                    .map(|source| self.convert_move_source(kind, source))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Operation::MoveCollectionValue {
                    pointer: translated.pointer,
                    index,
                    from_pointers,
                })
            }
            Operation::DeleteAnnotationGroup { .. }
            | Operation::DeleteAnnotationGroupItems { .. }
            | Operation::ConvertToCompoundAnnotation { .. } => {
                Err(unsupported(kind, "operation is derived during optimization only"))
            }
        }
    }

    /// Resolve a pointer whose node is edited in place
    fn resolve_editable(&self, kind: &str, pointer: &Pointer) -> Result<(TranslatedPointer, CstNode<'d>)> {
        let (translated, node) = self.resolve(pointer)?;
        if translated.collapsed {
            return Err(unsupported(
                kind,
                format!("node is folded into the flattened {}", node.kind_name()),
            ));
        }
        Ok((translated, node))
    }

    fn convert_value_deletion(&self, mut operation: Operation) -> Result<Operation> {
        let kind = operation.kind();
        let (translated, node) = self.resolve(operation.pointer())?;
        if translated.collapsed {
            return flattened_deletion(kind, translated.pointer, &node);
        }
        let fits = matches!(
            (&operation, node),
            (Operation::DeleteRecord { .. }, CstNode::Record(_))
                | (Operation::DeleteCollection { .. }, CstNode::Collection(_))
                | (Operation::DeletePrimitiveValue { .. }, CstNode::Primitive(_))
                | (Operation::DeleteRecordProperty { .. }, CstNode::Property(_))
        );
        if !fits {
            return Err(unsupported(kind, format!("pointer addresses a {}", node.kind_name())));
        }
        operation.set_pointer(translated.pointer);
        Ok(operation)
    }

    fn convert_value_insert(&self, mut operation: Operation) -> Result<Operation> {
        let kind = operation.kind();
        let pointer = operation.pointer().clone();
        if let Some(element) = operation.element() {
            let expected = match &operation {
                Operation::InsertRecord { .. } => element.kind() == ElementKind::Record,
                Operation::InsertCollection { .. } => element.kind() == ElementKind::Collection,
                _ => element.kind().is_primitive(),
            };
            if !expected {
                return Err(unsupported(kind, format!("unexpected {:?} payload", element.kind())));
            }
        }
        let (translated, node) = self.resolve_editable(kind, &pointer)?;
        let index = match node {
            CstNode::Collection(_) => self.map_index(&pointer, operation.index(), &node),
            node if is_valueless(&node) => None,
            CstNode::Annotation(_) | CstNode::Property(_) => {
                return Err(unsupported(kind, format!("the {} already has a value", node.kind_name())));
            }
            node => {
                return Err(unsupported(kind, format!("cannot insert a value into a {}", node.kind_name())));
            }
        };
        operation.set_pointer(translated.pointer);
        operation.set_index(index);
        Ok(operation)
    }

    fn convert_move_source(&self, kind: &str, source: &Pointer) -> Result<Pointer> {
        let (translated, _) = self.resolve_editable(kind, source)?;
        let is_item = translated.pointer.last_index().is_some()
            && translated
                .pointer
                .ancestor(2)
                .and_then(|parent| self.document.cst.resolve(&parent))
                .is_some_and(|parent| matches!(parent, CstNode::Collection(_)));
        if !is_item {
            return Err(unsupported(kind, format!("'{source}' is not a collection item")));
        }
        Ok(translated.pointer)
    }
}

fn expect_kind(operation: &str, element: &Element, accept: impl Fn(ElementKind) -> bool) -> Result<()> {
    if accept(element.kind()) {
        Ok(())
    } else {
        Err(unsupported(operation, format!("unexpected {:?} payload", element.kind())))
    }
}

/// Annotation or record property written without a value
fn is_valueless(node: &CstNode<'_>) -> bool {
    match node {
        CstNode::Annotation(annotation) => annotation.value.is_none(),
        CstNode::Property(property) => property.value.is_none(),
        _ => false,
    }
}

/// Deletion of an abstract level collapsed into a flattened concrete node
fn flattened_deletion(kind: &str, pointer: Pointer, node: &CstNode<'_>) -> Result<Operation> {
    match node {
        CstNode::Annotation(annotation) if annotation.embedded => {
            Ok(Operation::DeleteEmbeddedAnnotation { pointer })
        }
        CstNode::Annotation(_) => Ok(Operation::DeleteAnnotation { pointer }),
        CstNode::Property(_) => Ok(Operation::DeleteRecordProperty { pointer }),
        node => Err(unsupported(
            kind,
            format!("flattened path ends at a {}", node.kind_name()),
        )),
    }
}

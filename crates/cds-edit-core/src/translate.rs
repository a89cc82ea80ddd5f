//! Translation of abstract tree pointers into concrete tree pointers
//!
//! The two trees disagree on child counts: groups add a level, flattened
//! dotted terms remove several, and promoted `$value` records reshuffle the
//! content of an annotation. Children are therefore never matched by index.
//! At every level the concrete child whose range contains the range of the
//! addressed abstract node is chosen, and the walk fails as soon as no such
//! child exists.

use std::collections::VecDeque;

use crate::config::VocabularyAliases;
use crate::cst::{CdsDocument, CstNode, RecordEntry, Value};
use crate::model::{AbstractNode, AnnotationFile, Element, ElementKind, PROPERTY, QUALIFIER, TYPE};
use crate::pointer::Pointer;
use crate::text::Range;
use crate::{CdsEditError, Result};

/// Result of a successful translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedPointer {
    pub pointer: Pointer,
    /// Set when the walk passed abstract levels that are collapsed into one
    /// flattened concrete node
    pub contains_flattened_nodes: bool,
    /// Set when the addressed abstract node is one of those collapsed
    /// levels and has no concrete node of its own
    pub collapsed: bool,
}

pub fn translate(
    pointer: &Pointer,
    file: &AnnotationFile,
    document: &CdsDocument,
    aliases: &VocabularyAliases,
) -> Result<TranslatedPointer> {
    let path = file.walk(pointer).ok_or_else(|| {
        CdsEditError::pointer_resolution(pointer, "no such node in the annotation tree")
    })?;

    let Some(last) = path.last() else {
        return Err(CdsEditError::pointer_resolution(pointer, "empty path"));
    };
    if matches!(last, AbstractNode::File(_)) {
        return Ok(TranslatedPointer {
            pointer: Pointer::root(),
            contains_flattened_nodes: false,
            collapsed: false,
        });
    }
    let target_range = last.range().ok_or_else(|| {
        CdsEditError::pointer_resolution(pointer, "node has no source range")
    })?;

    let mut descent = Descent {
        source: pointer,
        aliases,
        target_range,
        node: CstNode::Document(document),
        pointer: Pointer::root(),
        extra: VecDeque::new(),
        flattened: false,
        collapsed: false,
    };
    for pair in path.windows(2) {
        descent.step(&pair[0], &pair[1])?;
    }

    tracing::debug!(from = %pointer, to = %descent.pointer, "translated pointer");
    Ok(TranslatedPointer {
        pointer: descent.pointer,
        contains_flattened_nodes: descent.flattened,
        collapsed: descent.collapsed,
    })
}

struct Descent<'a, 'd> {
    source: &'a Pointer,
    aliases: &'a VocabularyAliases,
    target_range: Range,
    node: CstNode<'d>,
    pointer: Pointer,
    /// Term or property segments of the current concrete node not yet
    /// matched by an abstract level
    extra: VecDeque<String>,
    flattened: bool,
    /// Whether the last step was virtual
    collapsed: bool,
}

impl<'a, 'd> Descent<'a, 'd> {
    fn fail(&self, reason: impl Into<String>) -> CdsEditError {
        CdsEditError::pointer_resolution(self.source, reason)
    }

    /// Move to the child of the current node that contains the target range
    fn enter(&mut self, accept: impl Fn(&CstNode<'d>) -> bool, what: &str) -> Result<()> {
        let found = self
            .node
            .children()
            .into_iter()
            .find(|(_, child)| accept(child) && child.range().contains(&self.target_range));
        let Some((segments, child)) = found else {
            return Err(self.fail(format!(
                "no {what} below {} '{}' contains {}",
                self.node.kind_name(),
                self.pointer,
                self.target_range
            )));
        };
        for segment in segments {
            self.pointer.push(segment);
        }
        self.node = child;
        Ok(())
    }

    fn step(&mut self, parent: &AbstractNode<'_>, child: &AbstractNode<'_>) -> Result<()> {
        self.collapsed = false;
        match child {
            AbstractNode::File(_) => Ok(()),
            AbstractNode::Reference(_) => self.enter(|node| matches!(node, CstNode::Using(_)), "using"),
            AbstractNode::Target(_) => self.enter(|node| matches!(node, CstNode::Target(_)), "target"),
            AbstractNode::Element(element) => self.step_element(parent, element),
            AbstractNode::Text { .. } => Ok(()),
            AbstractNode::Attribute { attribute, .. } => match attribute.name.as_str() {
                QUALIFIER => self.enter(|node| matches!(node, CstNode::Qualifier(_)), "qualifier"),
                TYPE => self.enter_type(),
                _ => Ok(()),
            },
        }
    }

    fn step_element(&mut self, parent: &AbstractNode<'_>, element: &Element) -> Result<()> {
        let parent_kind = match parent {
            AbstractNode::Target(_) => None,
            AbstractNode::Element(parent) => Some(parent.kind()),
            _ => return Err(self.fail("element below a non-element node")),
        };

        match (parent_kind, element.kind()) {
            (None, ElementKind::Annotation) => self.enter_assignment(element),
            (Some(ElementKind::Annotation), ElementKind::Annotation) => {
                self.enter_value(|node| matches!(node, CstNode::Record(_)))?;
                self.enter_embedded(element)
            }
            (Some(ElementKind::Record), ElementKind::Annotation) => {
                if !self.extra.is_empty() {
                    return Err(self.fail("embedded annotation inside a flattened record"));
                }
                self.enter_embedded(element)
            }
            (Some(ElementKind::Annotation | ElementKind::PropertyValue), kind) => {
                if !self.extra.is_empty() {
                    if kind == ElementKind::Record {
                        self.flattened = true;
                        self.collapsed = true;
                        return Ok(());
                    }
                    return Err(self.fail(format!(
                        "flattened path expects a record, found {kind:?}"
                    )));
                }
                self.enter_value(|_| true)?;
                self.unwrap_promoted_value();
                Ok(())
            }
            (Some(ElementKind::Record), ElementKind::PropertyValue) => {
                let name = element.attribute(PROPERTY).unwrap_or_default();
                if let Some(segment) = self.extra.pop_front() {
                    if segment != name {
                        return Err(self.fail(format!(
                            "flattened segment '{segment}' does not match property '{name}'"
                        )));
                    }
                    self.flattened = true;
                    self.collapsed = true;
                    return Ok(());
                }
                self.enter(|node| matches!(node, CstNode::Property(_)), "record property")?;
                if let CstNode::Property(property) = self.node {
                    self.extra = property
                        .name
                        .segments
                        .iter()
                        .skip(1)
                        .map(|segment| segment.text.clone())
                        .collect();
                }
                Ok(())
            }
            (Some(ElementKind::Collection), _) => self.enter(CstNode::is_value, "collection item"),
            (parent, kind) => Err(self.fail(format!(
                "{kind:?} cannot be placed below {}",
                parent.map(|kind| format!("{kind:?}")).unwrap_or("a target".into())
            ))),
        }
    }

    /// Annotation directly below a target, possibly a group item
    fn enter_assignment(&mut self, element: &Element) -> Result<()> {
        self.enter(
            |node| matches!(node, CstNode::Annotation(_) | CstNode::Group(_)),
            "assignment",
        )?;
        let mut concrete_term = Vec::new();
        if let CstNode::Group(group) = self.node {
            concrete_term.push(group.name.text.clone());
            self.enter(|node| matches!(node, CstNode::GroupItems(_)), "group items")?;
            self.enter(|node| matches!(node, CstNode::Annotation(_)), "group item")?;
        }
        if let CstNode::Annotation(annotation) = self.node {
            concrete_term.extend(annotation.term.segments.iter().map(|s| s.text.clone()));
        }
        self.track_flattened_term(&concrete_term.join("."), element);
        Ok(())
    }

    fn enter_embedded(&mut self, element: &Element) -> Result<()> {
        self.enter(
            |node| matches!(node, CstNode::Annotation(annotation) if annotation.embedded),
            "embedded annotation",
        )?;
        if let CstNode::Annotation(annotation) = self.node {
            let term = annotation.term.text();
            self.track_flattened_term(&term, element);
        }
        Ok(())
    }

    /// Remember the segments of a concrete term beyond the abstract term
    fn track_flattened_term(&mut self, concrete: &str, element: &Element) {
        let concrete = self.aliases.shorten(concrete);
        let term = self.aliases.shorten(element.term().unwrap_or_default());
        self.extra = concrete
            .strip_prefix(term.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .map(|rest| rest.split('.').map(str::to_string).collect())
            .unwrap_or_default();
    }

    fn enter_value(&mut self, accept: impl Fn(&CstNode<'d>) -> bool) -> Result<()> {
        if !matches!(self.node, CstNode::Annotation(_) | CstNode::Property(_)) {
            return Err(self.fail(format!("{} has no value", self.node.kind_name())));
        }
        self.enter(|node| node.is_value() && accept(node), "value")
    }

    /// Step into `$value` of a promoted record when the target range lies there
    fn unwrap_promoted_value(&mut self) {
        let CstNode::Record(record) = self.node else {
            return;
        };
        if let Some((index, property)) = record.value_entry()
            && let Some(value) = &property.value
            && value.range().contains(&self.target_range)
        {
            self.pointer.push("properties");
            self.pointer.push(index);
            self.pointer.push("value");
            self.node = CstNode::from(value);
        }
    }

    /// `Type` attribute of a record: the value of its `$Type` entry
    fn enter_type(&mut self) -> Result<()> {
        let CstNode::Record(record) = self.node else {
            return Err(self.fail("type attribute outside a record"));
        };
        let Some((index, property)) = record.type_entry() else {
            return Err(self.fail("record has no $Type entry"));
        };
        let Some(value) = &property.value else {
            return Err(self.fail("$Type entry has no value"));
        };
        self.pointer.push("properties");
        self.pointer.push(index);
        self.pointer.push("value");
        self.node = CstNode::from(value);
        Ok(())
    }
}

/// Concrete index at which an abstract child index lands in a list
///
/// The abstract child `index` is looked up among `abstract_children`; the
/// concrete child containing its range gives the concrete index. Inserting
/// past the end or before a synthesized node appends.
pub fn map_insert_index(
    index: Option<usize>,
    abstract_children: &[Option<Range>],
    concrete_children: &[Range],
) -> Option<usize> {
    let index = index?;
    let Some(Some(range)) = abstract_children.get(index) else {
        return None;
    };
    concrete_children
        .iter()
        .position(|concrete| concrete.contains(range))
        .or(Some(concrete_children.len()))
}

/// Concrete child ranges of a list container, for index mapping
pub fn concrete_child_ranges(node: &CstNode<'_>) -> Vec<Range> {
    match node {
        CstNode::Target(target) => target.assignments.iter().map(|a| a.range()).collect(),
        CstNode::GroupItems(items) => items.items.iter().map(|a| a.range).collect(),
        CstNode::Record(record) => record.entries.iter().map(RecordEntry::range).collect(),
        CstNode::Collection(collection) => collection.items.iter().map(Value::range).collect(),
        _ => Vec::new(),
    }
}

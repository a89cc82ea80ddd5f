//! Borrowed view over concrete syntax tree nodes

use super::{
    Annotation, AnnotationGroup, AnnotationGroupItems, Assignment, CdsDocument, Collection,
    Identifier, Primitive, Record, RecordEntry, RecordProperty, Target, UsingDeclaration, Value,
};
use crate::pointer::Pointer;
use crate::text::Range;

#[derive(Debug, Clone, Copy)]
pub enum CstNode<'a> {
    Document(&'a CdsDocument),
    Using(&'a UsingDeclaration),
    Target(&'a Target),
    Annotation(&'a Annotation),
    Group(&'a AnnotationGroup),
    GroupItems(&'a AnnotationGroupItems),
    Record(&'a Record),
    Property(&'a RecordProperty),
    Collection(&'a Collection),
    Primitive(&'a Primitive),
    Qualifier(&'a Identifier),
}

impl<'a> From<&'a Value> for CstNode<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Record(record) => CstNode::Record(record),
            Value::Collection(collection) => CstNode::Collection(collection),
            Value::Primitive(primitive) => CstNode::Primitive(primitive),
        }
    }
}

impl<'a> From<&'a Assignment> for CstNode<'a> {
    fn from(assignment: &'a Assignment) -> Self {
        match assignment {
            Assignment::Annotation(annotation) => CstNode::Annotation(annotation),
            Assignment::Group(group) => CstNode::Group(group),
        }
    }
}

impl<'a> From<&'a RecordEntry> for CstNode<'a> {
    fn from(entry: &'a RecordEntry) -> Self {
        match entry {
            RecordEntry::Property(property) => CstNode::Property(property),
            RecordEntry::Annotation(annotation) => CstNode::Annotation(annotation),
        }
    }
}

impl<'a> CstNode<'a> {
    pub fn range(&self) -> Range {
        match self {
            CstNode::Document(document) => document.range,
            CstNode::Using(using) => using.range,
            CstNode::Target(target) => target.range,
            CstNode::Annotation(annotation) => annotation.range,
            CstNode::Group(group) => group.range,
            CstNode::GroupItems(items) => items.range,
            CstNode::Record(record) => record.range,
            CstNode::Property(property) => property.range,
            CstNode::Collection(collection) => collection.range,
            CstNode::Primitive(primitive) => primitive.range,
            CstNode::Qualifier(qualifier) => qualifier.range,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            CstNode::Document(_) => "document",
            CstNode::Using(_) => "using",
            CstNode::Target(_) => "target",
            CstNode::Annotation(annotation) if annotation.embedded => "embedded annotation",
            CstNode::Annotation(_) => "annotation",
            CstNode::Group(_) => "annotation group",
            CstNode::GroupItems(_) => "annotation group items",
            CstNode::Record(_) => "record",
            CstNode::Property(_) => "record property",
            CstNode::Collection(_) => "collection",
            CstNode::Primitive(_) => "primitive value",
            CstNode::Qualifier(_) => "qualifier",
        }
    }

    /// Direct children with their pointer segments relative to this node
    pub fn children(&self) -> Vec<(Vec<String>, CstNode<'a>)> {
        fn indexed<'a, T: 'a>(
            name: &str,
            items: &'a [T],
            view: impl Fn(&'a T) -> CstNode<'a>,
        ) -> Vec<(Vec<String>, CstNode<'a>)> {
            items
                .iter()
                .enumerate()
                .map(|(index, item)| (vec![name.to_string(), index.to_string()], view(item)))
                .collect()
        }

        match *self {
            CstNode::Document(document) => {
                let mut children = indexed("usings", &document.usings, CstNode::Using);
                children.extend(indexed("targets", &document.targets, CstNode::Target));
                children
            }
            CstNode::Target(target) => indexed("assignments", &target.assignments, CstNode::from),
            CstNode::Annotation(annotation) => {
                let mut children = Vec::new();
                if let Some(qualifier) = &annotation.qualifier {
                    children.push((vec!["qualifier".to_string()], CstNode::Qualifier(qualifier)));
                }
                if let Some(value) = &annotation.value {
                    children.push((vec!["value".to_string()], CstNode::from(value)));
                }
                children
            }
            CstNode::Group(group) => vec![(vec!["items".to_string()], CstNode::GroupItems(&group.items))],
            CstNode::GroupItems(items) => indexed("items", &items.items, CstNode::Annotation),
            CstNode::Record(record) => indexed("properties", &record.entries, CstNode::from),
            CstNode::Property(property) => property
                .value
                .iter()
                .map(|value| (vec!["value".to_string()], CstNode::from(value)))
                .collect(),
            CstNode::Collection(collection) => indexed("items", &collection.items, CstNode::from),
            CstNode::Using(_) | CstNode::Primitive(_) | CstNode::Qualifier(_) => Vec::new(),
        }
    }

    /// Resolve a pointer relative to this node
    pub fn resolve(&self, pointer: &Pointer) -> Option<CstNode<'a>> {
        let mut node = *self;
        let mut rest = pointer.segments();
        while !rest.is_empty() {
            let (consumed, child) = node
                .children()
                .into_iter()
                .find(|(segments, _)| rest.starts_with(segments))?;
            node = child;
            rest = &rest[consumed.len()..];
        }
        Some(node)
    }

    pub fn as_annotation(&self) -> Option<&'a Annotation> {
        match self {
            CstNode::Annotation(annotation) => Some(annotation),
            _ => None,
        }
    }

    pub fn as_target(&self) -> Option<&'a Target> {
        match self {
            CstNode::Target(target) => Some(target),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&'a Record> {
        match self {
            CstNode::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&'a Collection> {
        match self {
            CstNode::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<&'a Primitive> {
        match self {
            CstNode::Primitive(primitive) => Some(primitive),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&'a RecordProperty> {
        match self {
            CstNode::Property(property) => Some(property),
            _ => None,
        }
    }

    /// Check if the node is a value (record, collection or primitive)
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            CstNode::Record(_) | CstNode::Collection(_) | CstNode::Primitive(_)
        )
    }

    /// Number of list children for list-like containers
    pub fn list_len(&self) -> Option<usize> {
        match self {
            CstNode::Target(target) => Some(target.assignments.len()),
            CstNode::GroupItems(items) => Some(items.items.len()),
            CstNode::Record(record) => Some(record.entries.len()),
            CstNode::Collection(collection) => Some(collection.items.len()),
            _ => None,
        }
    }
}

impl CdsDocument {
    pub fn resolve(&self, pointer: &Pointer) -> Option<CstNode<'_>> {
        CstNode::Document(self).resolve(pointer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::{Path, PrimitiveKind, TargetKind};

    fn ident(text: &str, line: u32, start: u32) -> Identifier {
        Identifier {
            text: text.to_string(),
            range: Range::from_coords(line, start, line, start + text.chars().count() as u32),
        }
    }

    fn path(segments: &[(&str, u32)], line: u32) -> Path {
        let segments: Vec<Identifier> = segments
            .iter()
            .map(|(text, start)| ident(text, line, *start))
            .collect();
        Path {
            range: segments[0].range.union(&segments[segments.len() - 1].range),
            segments,
        }
    }

    // annotate Books with @UI: { Hidden : true };
    fn document() -> CdsDocument {
        let item = Annotation {
            range: Range::from_coords(0, 25, 0, 38),
            at: None,
            term: path(&[("Hidden", 25)], 0),
            qualifier: None,
            colon: Some(Range::from_coords(0, 32, 0, 33)),
            value: Some(Value::Primitive(Primitive {
                range: Range::from_coords(0, 34, 0, 38),
                kind: PrimitiveKind::Boolean,
                text: "true".into(),
            })),
            embedded: false,
        };
        CdsDocument {
            uri: "file:///a.cds".into(),
            range: Range::from_coords(0, 0, 0, 42),
            usings: Vec::new(),
            targets: vec![Target {
                kind: TargetKind::Entity,
                name: "Books".into(),
                name_range: Range::from_coords(0, 9, 0, 14),
                range: Range::from_coords(0, 0, 0, 40),
                compound: None,
                assignments: vec![Assignment::Group(AnnotationGroup {
                    range: Range::from_coords(0, 21, 0, 40),
                    at: Some(Range::from_coords(0, 20, 0, 21)),
                    name: ident("UI", 0, 21),
                    colon: Range::from_coords(0, 23, 0, 24),
                    items: AnnotationGroupItems {
                        range: Range::from_coords(0, 24, 0, 40),
                        items: vec![item],
                    },
                })],
            }],
        }
    }

    #[test]
    fn test_resolve_group_item_value() {
        let document = document();
        let pointer = Pointer::parse("/targets/0/assignments/0/items/items/0/value").unwrap();
        let node = document.resolve(&pointer).unwrap();
        assert_eq!(node.as_primitive().unwrap().text, "true");
        assert_eq!(node.kind_name(), "primitive value");
    }

    #[test]
    fn test_resolve_missing_node() {
        let document = document();
        assert!(document.resolve(&Pointer::parse("/targets/1").unwrap()).is_none());
        assert!(document
            .resolve(&Pointer::parse("/targets/0/assignments/0/value").unwrap())
            .is_none());
    }

    #[test]
    fn test_list_lengths() {
        let document = document();
        let items = document
            .resolve(&Pointer::parse("/targets/0/assignments/0/items").unwrap())
            .unwrap();
        assert_eq!(items.list_len(), Some(1));
        assert_eq!(CstNode::Document(&document).children().len(), 1);
    }
}

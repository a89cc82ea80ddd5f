//! Concrete syntax tree
//!
//! The parser's view of an annotation file. Unlike the abstract tree it keeps
//! the surface structure: annotation groups, compound `@( ... )` lists,
//! flattened dotted terms and embedded annotations inside records all stay
//! visible, and every node carries its source range.
//!
//! Ranges follow a few conventions the writer relies on:
//! - an annotation range starts at its term, a leading `@` is kept in `at`
//! - a qualifier range includes its `#`
//! - container ranges include their brackets
//! - an embedded annotation covers the whole `![@Term] : value` entry

mod node;

pub use node::CstNode;

use serde::{Deserialize, Serialize};

use crate::text::Range;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdsDocument {
    pub uri: String,
    pub range: Range,
    #[serde(default)]
    pub usings: Vec<UsingDeclaration>,
    #[serde(default)]
    pub targets: Vec<Target>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsingDeclaration {
    pub range: Range,
    pub name: Option<Path>,
    pub alias: Option<Identifier>,
    pub from: Option<Primitive>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    Entity,
    Element,
    BoundAction,
    Parameter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub kind: TargetKind,
    /// Full target name, `Entity/element` for members
    pub name: String,
    pub name_range: Range,
    pub range: Range,
    /// Range of `@( ... )` when the target uses compound syntax
    pub compound: Option<Range>,
    pub assignments: Vec<Assignment>,
}

impl Target {
    /// Check if an assignment is written inside the compound list
    pub fn in_compound(&self, assignment: &Assignment) -> bool {
        self.compound
            .is_some_and(|compound| compound.contains(&assignment.range()))
    }

    /// Assignments written as bare `@Term` annotations
    pub fn bare_assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments
            .iter()
            .filter(|assignment| !self.in_compound(assignment))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Assignment {
    Annotation(Annotation),
    Group(AnnotationGroup),
}

impl Assignment {
    pub fn range(&self) -> Range {
        match self {
            Assignment::Annotation(annotation) => annotation.range,
            Assignment::Group(group) => group.range,
        }
    }

    /// Range of the leading `@`
    pub fn at(&self) -> Option<Range> {
        match self {
            Assignment::Annotation(annotation) => annotation.at,
            Assignment::Group(group) => group.at,
        }
    }

    /// Range including the leading `@`
    pub fn full_range(&self) -> Range {
        match self.at() {
            Some(at) => at.union(&self.range()),
            None => self.range(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub range: Range,
    pub at: Option<Range>,
    pub term: Path,
    pub qualifier: Option<Identifier>,
    pub colon: Option<Range>,
    pub value: Option<Value>,
    #[serde(default)]
    pub embedded: bool,
}

impl Annotation {
    /// End of `Term#Qualifier`, where a value would be attached
    pub fn head_end(&self) -> crate::text::Position {
        self.qualifier
            .as_ref()
            .map(|qualifier| qualifier.range.end)
            .unwrap_or(self.term.range.end)
    }

    pub fn qualifier_text(&self) -> Option<&str> {
        self.qualifier
            .as_ref()
            .map(|qualifier| qualifier.text.trim_start_matches('#'))
    }
}

/// `@Alias : { Term : value, ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationGroup {
    pub range: Range,
    pub at: Option<Range>,
    pub name: Identifier,
    pub colon: Range,
    pub items: AnnotationGroupItems,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationGroupItems {
    pub range: Range,
    pub items: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Value {
    Record(Record),
    Collection(Collection),
    Primitive(Primitive),
}

impl Value {
    pub fn range(&self) -> Range {
        match self {
            Value::Record(record) => record.range,
            Value::Collection(collection) => collection.range,
            Value::Primitive(primitive) => primitive.range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub range: Range,
    pub entries: Vec<RecordEntry>,
}

impl Record {
    /// Entry holding `$value`, present on promoted annotation values
    pub fn value_entry(&self) -> Option<(usize, &RecordProperty)> {
        self.entries
            .iter()
            .enumerate()
            .find_map(|(index, entry)| match entry {
                RecordEntry::Property(property) if property.name.text() == "$value" => {
                    Some((index, property))
                }
                _ => None,
            })
    }

    pub fn type_entry(&self) -> Option<(usize, &RecordProperty)> {
        self.entries
            .iter()
            .enumerate()
            .find_map(|(index, entry)| match entry {
                RecordEntry::Property(property) if property.name.text() == "$Type" => {
                    Some((index, property))
                }
                _ => None,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RecordEntry {
    Property(RecordProperty),
    Annotation(Annotation),
}

impl RecordEntry {
    pub fn range(&self) -> Range {
        match self {
            RecordEntry::Property(property) => property.range,
            RecordEntry::Annotation(annotation) => annotation.range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordProperty {
    pub range: Range,
    pub name: Path,
    pub colon: Option<Range>,
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub range: Range,
    pub items: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    String,
    MultiLineString,
    Number,
    Boolean,
    Null,
    Enum,
    Path,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Primitive {
    pub range: Range,
    pub kind: PrimitiveKind,
    /// Source text, quotes and `#` included
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Path {
    pub range: Range,
    pub segments: Vec<Identifier>,
}

impl Path {
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    pub text: String,
    pub range: Range,
}

impl CdsDocument {
    pub fn target(&self, index: usize) -> Option<&Target> {
        self.targets.get(index)
    }
}

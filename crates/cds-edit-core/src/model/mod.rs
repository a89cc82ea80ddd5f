//! Abstract annotation tree
//!
//! A syntax-independent view of the annotations of one file: targets own
//! term elements, elements own attributes and content nodes. A node without a
//! range was synthesized and does not exist in the source yet.
//!
//! # Pointers
//!
//! ```text
//! /targets/0                          target
//! /targets/0/terms/1                  annotation element
//! /targets/0/terms/1/content/0        value of the annotation
//! /targets/0/terms/1/attributes/Term  attribute of the annotation
//! /references/2                       using reference
//! ```

mod index;

pub use index::{TargetEntry, TargetIndex};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::pointer::Pointer;
use crate::text::Range;

pub const TERM: &str = "Term";
pub const QUALIFIER: &str = "Qualifier";
pub const TYPE: &str = "Type";
pub const PROPERTY: &str = "Property";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationFile {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub targets: Vec<Target>,
}

/// A `using` reference to another file or namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_range: Option<Range>,
    #[serde(default)]
    pub terms: Vec<Element>,
}

impl Target {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            range: None,
            name_range: None,
            terms: Vec::new(),
        }
    }

    pub fn with_term(mut self, term: Element) -> Self {
        self.terms.push(term);
        self
    }

    /// Entity part of the target name (`Books` for `Books/title`)
    pub fn entity(&self) -> &str {
        self.name.split('/').next().unwrap_or(&self.name)
    }

    /// Element, action or parameter path below the entity, if any
    pub fn member(&self) -> Option<&str> {
        self.name.split_once('/').map(|(_, member)| member)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Annotation,
    Record,
    Collection,
    PropertyValue,
    String,
    Bool,
    Int,
    Decimal,
    Float,
    EnumMember,
    Path,
    PropertyPath,
    NavigationPropertyPath,
    AnnotationPath,
    Null,
}

impl ElementKind {
    pub fn is_primitive(self) -> bool {
        !matches!(
            self,
            ElementKind::Annotation
                | ElementKind::Record
                | ElementKind::Collection
                | ElementKind::PropertyValue
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Element(Element),
    Text(TextNode),
}

impl Node {
    pub fn range(&self) -> Option<Range> {
        match self {
            Node::Element(element) => element.range,
            Node::Text(text) => text.range,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub name: ElementKind,
    #[serde(default)]
    pub attributes: IndexMap<String, Attribute>,
    #[serde(default)]
    pub content: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_range: Option<Range>,
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            name: kind,
            attributes: IndexMap::new(),
            content: Vec::new(),
            range: None,
            name_range: None,
        }
    }

    pub fn annotation(term: impl Into<String>) -> Self {
        Self::new(ElementKind::Annotation).with_attribute(TERM, term)
    }

    pub fn record() -> Self {
        Self::new(ElementKind::Record)
    }

    pub fn collection() -> Self {
        Self::new(ElementKind::Collection)
    }

    pub fn property(name: impl Into<String>, value: Element) -> Self {
        Self::new(ElementKind::PropertyValue)
            .with_attribute(PROPERTY, name)
            .with_element(value)
    }

    pub fn primitive(kind: ElementKind, text: impl Into<String>) -> Self {
        Self::new(kind).with_text(text)
    }

    pub fn string(text: impl Into<String>) -> Self {
        Self::primitive(ElementKind::String, text)
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(
            name.to_string(),
            Attribute {
                name: name.to_string(),
                value: value.into(),
                range: None,
            },
        );
        self
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.content.push(Node::Element(element));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.content.push(Node::Text(TextNode {
            text: text.into(),
            range: None,
        }));
        self
    }

    pub fn with_range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }

    pub fn kind(&self) -> ElementKind {
        self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|attribute| attribute.value.as_str())
    }

    pub fn term(&self) -> Option<&str> {
        self.attribute(TERM)
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.attribute(QUALIFIER)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.content.iter().filter_map(Node::as_element)
    }

    /// Text content of a primitive element
    pub fn text(&self) -> Option<&str> {
        self.content.iter().find_map(|node| match node {
            Node::Text(text) => Some(text.text.as_str()),
            Node::Element(_) => None,
        })
    }

    /// Value of an annotation or property value
    pub fn value(&self) -> Option<&Element> {
        self.elements()
            .find(|element| element.kind() != ElementKind::Annotation)
    }

    /// Embedded annotations of an annotation or record
    pub fn embedded(&self) -> impl Iterator<Item = &Element> {
        self.elements()
            .filter(|element| element.kind() == ElementKind::Annotation)
    }

    /// Property values of a record
    pub fn properties(&self) -> impl Iterator<Item = &Element> {
        self.elements()
            .filter(|element| element.kind() == ElementKind::PropertyValue)
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind(), ElementKind::Record | ElementKind::Collection)
    }
}

/// A node of the abstract tree addressed by a pointer
#[derive(Debug, Clone, Copy)]
pub enum AbstractNode<'a> {
    File(&'a AnnotationFile),
    Reference(&'a Reference),
    Target(&'a Target),
    Element(&'a Element),
    Text {
        text: &'a TextNode,
        parent: &'a Element,
    },
    Attribute {
        attribute: &'a Attribute,
        parent: &'a Element,
    },
}

impl<'a> AbstractNode<'a> {
    /// Source range, falling back to the owning element for texts
    pub fn range(&self) -> Option<Range> {
        match self {
            AbstractNode::File(file) => file.range,
            AbstractNode::Reference(reference) => reference.range,
            AbstractNode::Target(target) => target.range,
            AbstractNode::Element(element) => element.range,
            AbstractNode::Text { text, parent } => text.range.or(parent.range),
            AbstractNode::Attribute { attribute, parent } => attribute.range.or(parent.range),
        }
    }

    pub fn as_element(&self) -> Option<&'a Element> {
        match self {
            AbstractNode::Element(element) => Some(element),
            _ => None,
        }
    }
}

impl AnnotationFile {
    /// Resolve a pointer, returning every node visited from the root
    ///
    /// The first entry is always the file itself; the last one is the node
    /// addressed by the pointer. `None` if any segment does not resolve.
    pub fn walk(&self, pointer: &Pointer) -> Option<Vec<AbstractNode<'_>>> {
        let mut path = vec![AbstractNode::File(self)];
        let mut segments = pointer.segments().iter().map(String::as_str);
        while let Some(segment) = segments.next() {
            let current = path.last().copied()?;
            let next = match (current, segment) {
                (AbstractNode::File(file), "targets") => {
                    AbstractNode::Target(file.targets.get(next_index(&mut segments)?)?)
                }
                (AbstractNode::File(file), "references") => {
                    AbstractNode::Reference(file.references.get(next_index(&mut segments)?)?)
                }
                (AbstractNode::Target(target), "terms") => {
                    AbstractNode::Element(target.terms.get(next_index(&mut segments)?)?)
                }
                (AbstractNode::Element(element), "content") => {
                    match element.content.get(next_index(&mut segments)?)? {
                        Node::Element(child) => AbstractNode::Element(child),
                        Node::Text(text) => AbstractNode::Text {
                            text,
                            parent: element,
                        },
                    }
                }
                (AbstractNode::Element(element), "attributes") => AbstractNode::Attribute {
                    attribute: element.attributes.get(segments.next()?)?,
                    parent: element,
                },
                _ => return None,
            };
            path.push(next);
        }
        Some(path)
    }

    pub fn resolve(&self, pointer: &Pointer) -> Option<AbstractNode<'_>> {
        self.walk(pointer)?.pop()
    }

    pub fn target_by_name(&self, name: &str) -> Option<(usize, &Target)> {
        self.targets
            .iter()
            .enumerate()
            .find(|(_, target)| target.name == name)
    }
}

fn next_index<'a>(segments: &mut impl Iterator<Item = &'a str>) -> Option<usize> {
    segments.next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> AnnotationFile {
        AnnotationFile {
            uri: "file:///srv/annotations.cds".into(),
            range: None,
            references: Vec::new(),
            targets: vec![
                Target::new("Books/title").with_term(
                    Element::annotation("UI.LineItem")
                        .with_attribute(QUALIFIER, "Main")
                        .with_element(
                            Element::collection().with_element(
                                Element::record()
                                    .with_attribute(TYPE, "UI.DataField")
                                    .with_element(Element::property(
                                        "Value",
                                        Element::primitive(ElementKind::Path, "title"),
                                    )),
                            ),
                        ),
                ),
            ],
        }
    }

    #[test]
    fn test_walk_pointer() {
        let file = file();
        let pointer = Pointer::parse("/targets/0/terms/0/content/0/content/0/content/0").unwrap();
        let path = file.walk(&pointer).unwrap();
        assert_eq!(path.len(), 6);
        let property = path[5].as_element().unwrap();
        assert_eq!(property.kind(), ElementKind::PropertyValue);
        assert_eq!(property.attribute(PROPERTY), Some("Value"));
        assert_eq!(property.value().and_then(Element::text), Some("title"));
    }

    #[test]
    fn test_resolve_attribute_and_text() {
        let file = file();
        let qualifier = file
            .resolve(&Pointer::parse("/targets/0/terms/0/attributes/Qualifier").unwrap())
            .unwrap();
        assert!(matches!(qualifier, AbstractNode::Attribute { attribute, .. } if attribute.value == "Main"));
        assert!(file.resolve(&Pointer::parse("/targets/0/terms/4").unwrap()).is_none());
        assert!(file.resolve(&Pointer::parse("/targets/0/bogus/0").unwrap()).is_none());
    }

    #[test]
    fn test_target_names() {
        let target = Target::new("Books/title");
        assert_eq!(target.entity(), "Books");
        assert_eq!(target.member(), Some("title"));
        assert_eq!(Target::new("Books").member(), None);
    }

    #[test]
    fn test_node_serde_shape() {
        let node = Node::Element(Element::string("Title"));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "element");
        assert_eq!(json["name"], "String");
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][0]["text"], "Title");
    }
}

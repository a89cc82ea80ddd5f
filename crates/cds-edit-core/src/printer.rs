//! Printing of abstract elements as annotation source fragments
//!
//! Only fragments are printed: a new annotation, a value, a record property,
//! a target statement or a `using` line. Multi-line fragments start without
//! indentation (they are placed after existing text) and indent every
//! following line relative to `level`.

use crate::config::{VocabularyAliases, WriterConfiguration};
use crate::model::{Element, ElementKind, Reference, Target, PROPERTY, TYPE};

/// Syntax an annotation is printed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationForm {
    /// `@Term#Q : value`
    Bare,
    /// `Term#Q : value`, an item of `@( ... )`
    Compound,
    /// `![@Term#Q] : value`, an entry of a record
    Embedded,
}

pub struct Printer {
    indent_unit: String,
    aliases: VocabularyAliases,
}

impl Printer {
    pub fn new(config: &WriterConfiguration) -> Self {
        Self {
            indent_unit: config.indent_unit(),
            aliases: config.aliases(),
        }
    }

    pub fn indent(&self, level: usize) -> String {
        self.indent_unit.repeat(level)
    }

    pub fn indent_unit(&self) -> &str {
        &self.indent_unit
    }

    pub fn aliases(&self) -> &VocabularyAliases {
        &self.aliases
    }

    /// Term with qualifier, namespaces shortened to aliases
    pub fn print_term(&self, element: &Element) -> String {
        let term = self.aliases.shorten(element.term().unwrap_or_default());
        match element.qualifier() {
            Some(qualifier) => format!("{term}#{qualifier}"),
            None => term,
        }
    }

    pub fn print_annotation(&self, element: &Element, form: AnnotationForm, level: usize) -> String {
        let head = match form {
            AnnotationForm::Bare => format!("@{}", self.print_term(element)),
            AnnotationForm::Compound => self.print_term(element),
            AnnotationForm::Embedded => format!("![@{}]", self.print_term(element)),
        };
        match self.print_annotation_value(element, level) {
            Some(value) => format!("{head} : {value}"),
            None => head,
        }
    }

    /// Value of an annotation, promoted to a `$value` record when the
    /// annotation carries embedded annotations
    pub fn print_annotation_value(&self, element: &Element, level: usize) -> Option<String> {
        let embedded: Vec<&Element> = element.embedded().collect();
        let value = element.value();
        if embedded.is_empty() {
            return value.map(|value| self.print_value(value, level));
        }
        let inner = level + 1;
        let mut entries = Vec::new();
        if let Some(value) = value {
            entries.push(format!("$value : {}", self.print_value(value, inner)));
        }
        entries.extend(
            embedded
                .iter()
                .map(|annotation| self.print_annotation(annotation, AnnotationForm::Embedded, inner)),
        );
        Some(self.print_block("{", "}", &entries, level))
    }

    pub fn print_value(&self, element: &Element, level: usize) -> String {
        let text = element.text().unwrap_or_default();
        match element.kind() {
            ElementKind::Record => self.print_record(element, level),
            ElementKind::Collection => {
                let items: Vec<String> = element
                    .elements()
                    .map(|item| self.print_value(item, level + 1))
                    .collect();
                self.print_block("[", "]", &items, level)
            }
            ElementKind::String => quote(text),
            ElementKind::EnumMember => {
                let members: Vec<&str> = text.split_whitespace().collect();
                if members.len() > 1 {
                    self.print_flags(text)
                } else {
                    enum_member(text)
                }
            }
            ElementKind::AnnotationPath => quote(&self.shorten_annotation_path(text)),
            ElementKind::Null => "null".to_string(),
            ElementKind::Bool => text.to_ascii_lowercase(),
            ElementKind::Annotation => self.print_annotation(element, AnnotationForm::Embedded, level),
            ElementKind::PropertyValue => self.print_property(element, level),
            ElementKind::Int
            | ElementKind::Decimal
            | ElementKind::Float
            | ElementKind::Path
            | ElementKind::PropertyPath
            | ElementKind::NavigationPropertyPath => text.to_string(),
        }
    }

    fn print_record(&self, element: &Element, level: usize) -> String {
        let inner = level + 1;
        let mut entries = Vec::new();
        if let Some(record_type) = element.attribute(TYPE) {
            entries.push(format!("$Type : {}", quote(&self.aliases.shorten(record_type))));
        }
        for child in element.elements() {
            entries.push(match child.kind() {
                ElementKind::Annotation => {
                    self.print_annotation(child, AnnotationForm::Embedded, inner)
                }
                _ => self.print_property(child, inner),
            });
        }
        self.print_block("{", "}", &entries, level)
    }

    /// `Name : value` of a property value element
    pub fn print_property(&self, element: &Element, level: usize) -> String {
        let name = element.attribute(PROPERTY).unwrap_or_default();
        match element.value() {
            Some(value) => format!("{name} : {}", self.print_value(value, level)),
            None => name.to_string(),
        }
    }

    /// Enum flag set `A/x A/y` as `[ #x, #y ]`
    pub fn print_flags(&self, value: &str) -> String {
        let members: Vec<String> = value.split_whitespace().map(enum_member).collect();
        format!("[ {} ]", members.join(", "))
    }

    /// One entry per line between brackets, `open`/`close` at `level`
    pub fn print_block(&self, open: &str, close: &str, entries: &[String], level: usize) -> String {
        if entries.is_empty() {
            return format!("{open}{close}");
        }
        let inner = self.indent(level + 1);
        let body: Vec<String> = entries.iter().map(|entry| format!("{inner}{entry}")).collect();
        format!("{open}\n{}\n{}{close}", body.join(",\n"), self.indent(level))
    }

    pub fn print_target(&self, target: &Target) -> String {
        let annotations: Vec<&Element> = target.terms.iter().collect();
        match target.member() {
            None => format!(
                "annotate {} with {};",
                target.entity(),
                self.print_assignments(&annotations, 0)
            ),
            Some(member) => {
                let member = member.rsplit('/').next().unwrap_or(member);
                format!(
                    "annotate {} with {{\n{}{member} {};\n}};",
                    target.entity(),
                    self.indent(1),
                    self.print_assignments(&annotations, 1)
                )
            }
        }
    }

    /// Annotations of a target: bare for one, compound for several
    fn print_assignments(&self, annotations: &[&Element], level: usize) -> String {
        match annotations {
            [single] => self.print_annotation(single, AnnotationForm::Bare, level),
            several => {
                let items: Vec<String> = several
                    .iter()
                    .map(|annotation| {
                        self.print_annotation(annotation, AnnotationForm::Compound, level + 1)
                    })
                    .collect();
                format!("@{}", self.print_block("(", ")", &items, level))
            }
        }
    }

    pub fn print_reference(&self, reference: &Reference) -> String {
        let mut text = String::from("using");
        if !reference.name.is_empty() {
            text.push(' ');
            text.push_str(&reference.name);
        }
        if let Some(alias) = &reference.alias {
            text.push_str(" as ");
            text.push_str(alias);
        }
        if let Some(uri) = &reference.uri {
            text.push_str(" from ");
            text.push_str(&quote(uri));
        }
        text.push(';');
        text
    }

    fn shorten_annotation_path(&self, path: &str) -> String {
        match path.split_once('@') {
            Some((navigation, term)) => format!("{navigation}@{}", self.aliases.shorten(term)),
            None => path.to_string(),
        }
    }
}

/// Single-quoted string literal
pub fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// `#Member` of an enum member written as `Type/Member`
pub fn enum_member(text: &str) -> String {
    let member = text.rsplit('/').next().unwrap_or(text);
    format!("#{member}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QUALIFIER;

    fn printer() -> Printer {
        Printer::new(&WriterConfiguration::default())
    }

    #[test]
    fn test_primitives() {
        let printer = printer();
        assert_eq!(printer.print_value(&Element::string("it's"), 0), "'it''s'");
        assert_eq!(
            printer.print_value(
                &Element::primitive(ElementKind::EnumMember, "UI.CriticalityType/Positive"),
                0
            ),
            "#Positive"
        );
        assert_eq!(
            printer.print_value(
                &Element::primitive(ElementKind::AnnotationPath, "@com.sap.vocabularies.UI.v1.FieldGroup#Main"),
                0
            ),
            "'@UI.FieldGroup#Main'"
        );
        assert_eq!(printer.print_flags("NS.Type/work NS.Type/cell"), "[ #work, #cell ]");
    }

    #[test]
    fn test_bare_annotation_with_record() {
        let element = Element::annotation("com.sap.vocabularies.UI.v1.HeaderInfo")
            .with_attribute(QUALIFIER, "Main")
            .with_element(
                Element::record()
                    .with_attribute(TYPE, "UI.HeaderInfoType")
                    .with_element(Element::property("TypeName", Element::string("Book"))),
            );
        insta::assert_snapshot!(printer().print_annotation(&element, AnnotationForm::Bare, 1), @r"
        @UI.HeaderInfo#Main : {
                $Type : 'UI.HeaderInfoType',
                TypeName : 'Book'
            }
        ");
    }

    #[test]
    fn test_embedded_annotations_promote_value() {
        let element = Element::annotation("Common.Text")
            .with_element(Element::primitive(ElementKind::Path, "title"))
            .with_element(
                Element::annotation("UI.TextArrangement")
                    .with_element(Element::primitive(ElementKind::EnumMember, "UI.TextArrangementType/TextOnly")),
            );
        assert_eq!(
            printer().print_annotation(&element, AnnotationForm::Compound, 0),
            "Common.Text : {\n    $value : title,\n    ![@UI.TextArrangement] : #TextOnly\n}"
        );
    }

    #[test]
    fn test_targets() {
        let printer = printer();
        let entity = Target::new("Books").with_term(
            Element::annotation("UI.Hidden").with_element(Element::primitive(ElementKind::Bool, "true")),
        );
        assert_eq!(printer.print_target(&entity), "annotate Books with @UI.Hidden : true;");

        let element = Target::new("Books/title")
            .with_term(Element::annotation("Common.Label").with_element(Element::string("Title")))
            .with_term(Element::annotation("UI.Hidden"));
        assert_eq!(
            printer.print_target(&element),
            "annotate Books with {\n    title @(\n        Common.Label : 'Title',\n        UI.Hidden\n    );\n};"
        );
    }

    #[test]
    fn test_reference() {
        let reference = Reference {
            name: "CatalogService".into(),
            alias: None,
            uri: Some("../srv/cat-service".into()),
            range: None,
        };
        assert_eq!(
            printer().print_reference(&reference),
            "using CatalogService from '../srv/cat-service';"
        );
    }
}

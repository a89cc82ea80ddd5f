//! Recursive descent parser producing both trees at once
//!
//! Covers what annotation files use: `using` declarations and `annotate`
//! statements with bare, compound and grouped annotations, element blocks,
//! records, collections, embedded annotations and the usual literals.

use cds_edit_core::cst::{
    Annotation, AnnotationGroup, AnnotationGroupItems, Assignment, CdsDocument, Collection,
    Identifier, Path, Primitive, PrimitiveKind, Record, RecordEntry, RecordProperty, Target,
    TargetKind, UsingDeclaration, Value,
};
use cds_edit_core::model::{self, AnnotationFile, Element, ElementKind, Reference, PROPERTY, QUALIFIER, TYPE};
use cds_edit_core::{IdentifierKind, LineIndex, Range, VocabularyAliases};

use crate::ParseError;
use crate::lexer::{Kind, Lexeme};

pub struct Parser<'l> {
    lexemes: &'l mut [Lexeme],
    /// Indices of the code lexemes
    code: Vec<usize>,
    cursor: usize,
    aliases: VocabularyAliases,
}

/// Annotations written after a target name
#[derive(Default)]
struct Assignments {
    items: Vec<Assignment>,
    compound: Option<Range>,
    terms: Vec<Element>,
}

impl<'l> Parser<'l> {
    pub fn new(lexemes: &'l mut [Lexeme], aliases: VocabularyAliases) -> Self {
        let code = lexemes
            .iter()
            .enumerate()
            .filter(|(_, lexeme)| !lexeme.kind.is_comment())
            .map(|(index, _)| index)
            .collect();
        Self {
            lexemes,
            code,
            cursor: 0,
            aliases,
        }
    }

    pub fn parse(mut self, uri: &str, text: &str) -> Result<(CdsDocument, AnnotationFile), ParseError> {
        let range = Range::new(Default::default(), LineIndex::new(text).end());
        let mut document = CdsDocument {
            uri: uri.to_string(),
            range,
            usings: Vec::new(),
            targets: Vec::new(),
        };
        let mut file = AnnotationFile {
            uri: uri.to_string(),
            range: Some(range),
            references: Vec::new(),
            targets: Vec::new(),
        };

        while let Some(lexeme) = self.peek() {
            if lexeme.is_keyword("using") {
                let (using, reference) = self.using()?;
                document.usings.push(using);
                file.references.push(reference);
            } else if lexeme.is_keyword("annotate") {
                for (target, abstract_target) in self.annotate()? {
                    document.targets.push(target);
                    file.targets.push(abstract_target);
                }
            } else {
                return Err(self.error(format!("unexpected '{}'", lexeme.text)));
            }
        }
        Ok((document, file))
    }

    fn peek(&self) -> Option<&Lexeme> {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Lexeme> {
        self.code
            .get(self.cursor + ahead)
            .map(|&index| &self.lexemes[index])
    }

    fn at(&self, punctuation: &str) -> bool {
        self.peek().is_some_and(|lexeme| lexeme.is(punctuation))
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.peek().is_some_and(|lexeme| lexeme.is_keyword(keyword))
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        let position = self
            .peek()
            .or_else(|| self.code.last().map(|&index| &self.lexemes[index]))
            .map(|lexeme| lexeme.range.start)
            .unwrap_or_default();
        ParseError::new(message, position)
    }

    fn bump(&mut self) -> Result<&mut Lexeme, ParseError> {
        let Some(&index) = self.code.get(self.cursor) else {
            return Err(self.error("unexpected end of file"));
        };
        self.cursor += 1;
        Ok(&mut self.lexemes[index])
    }

    fn expect(&mut self, punctuation: &str) -> Result<Range, ParseError> {
        if !self.at(punctuation) {
            let found = self.peek().map(|lexeme| lexeme.text.clone()).unwrap_or_default();
            return Err(self.error(format!("expected '{punctuation}', found '{found}'")));
        }
        Ok(self.bump()?.range)
    }

    fn identifier(&mut self, kind: IdentifierKind) -> Result<Identifier, ParseError> {
        if self.peek().is_none_or(|lexeme| lexeme.kind != Kind::Identifier) {
            return Err(self.error("expected an identifier"));
        }
        let lexeme = self.bump()?;
        lexeme.identifier = Some(kind);
        Ok(Identifier {
            text: lexeme.text.clone(),
            range: lexeme.range,
        })
    }

    /// Dotted name
    fn path(&mut self, kind: IdentifierKind) -> Result<Path, ParseError> {
        let mut segments = vec![self.identifier(kind)?];
        while self.at(".") && self.peek_at(1).is_some_and(|next| next.kind == Kind::Identifier) {
            self.bump()?;
            segments.push(self.identifier(kind)?);
        }
        let range = Range::new(segments[0].range.start, segments[segments.len() - 1].range.end);
        Ok(Path { range, segments })
    }

    fn using(&mut self) -> Result<(UsingDeclaration, Reference), ParseError> {
        let start = self.bump()?.range.start;
        let name = if self.peek().is_some_and(|lexeme| lexeme.kind == Kind::Identifier) {
            Some(self.path(IdentifierKind::Entity)?)
        } else {
            None
        };
        let mut alias = None;
        if self.at_keyword("as") {
            self.bump()?;
            alias = Some(self.identifier(IdentifierKind::Other)?);
        }
        let mut from = None;
        if self.at_keyword("from") {
            self.bump()?;
            let (primitive, _) = self.primitive()?;
            from = Some(primitive);
        }
        let end = self.expect(";")?.end;
        let range = Range::new(start, end);
        let reference = Reference {
            name: name.as_ref().map(Path::text).unwrap_or_default(),
            alias: alias.as_ref().map(|alias| alias.text.clone()),
            uri: from.as_ref().map(|from| unquote(&from.text)),
            range: Some(range),
        };
        Ok((
            UsingDeclaration {
                range,
                name,
                alias,
                from,
            },
            reference,
        ))
    }

    fn annotate(&mut self) -> Result<Vec<(Target, model::Target)>, ParseError> {
        self.bump()?;
        let name = self.path(IdentifierKind::Entity)?;
        let entity = name.text();
        if self.at_keyword("with") {
            self.bump()?;
        }
        let assignments = self.assignments()?;

        let mut targets = Vec::new();
        let has_members = self.at("{");
        if !assignments.items.is_empty() || !has_members {
            targets.push(target(TargetKind::Entity, entity.clone(), name.range, assignments));
        }
        if has_members {
            self.bump()?;
            while !self.at("}") {
                let member = self.identifier(IdentifierKind::Element)?;
                let assignments = self.assignments()?;
                self.expect(";")?;
                targets.push(target(
                    TargetKind::Element,
                    format!("{entity}/{}", member.text),
                    member.range,
                    assignments,
                ));
            }
            self.expect("}")?;
        }
        self.expect(";")?;
        Ok(targets)
    }

    fn assignments(&mut self) -> Result<Assignments, ParseError> {
        let mut assignments = Assignments::default();
        while self.at("@") {
            let at = self.bump()?.range;
            if !self.at("(") {
                let (assignment, element) = self.assignment(Some(at))?;
                assignments.items.push(assignment);
                assignments.terms.extend(element);
                continue;
            }
            self.bump()?;
            while !self.at(")") {
                let (assignment, element) = self.assignment(None)?;
                assignments.items.push(assignment);
                assignments.terms.extend(element);
                if !self.at(",") {
                    break;
                }
                self.bump()?;
            }
            let close = self.expect(")")?;
            let compound = Range::new(at.start, close.end);
            assignments.compound = Some(match assignments.compound {
                Some(existing) => existing.union(&compound),
                None => compound,
            });
        }
        Ok(assignments)
    }

    /// Annotation or annotation group, returning the abstract annotations
    fn assignment(&mut self, at: Option<Range>) -> Result<(Assignment, Vec<Element>), ParseError> {
        let term = self.path(IdentifierKind::Term)?;
        let is_group = term.segments.len() == 1
            && self.aliases.is_alias(&term.text())
            && self.at(":")
            && self.peek_at(1).is_some_and(|next| next.is("{"));
        if !is_group {
            let (annotation, element) = self.annotation(at, term, None, false)?;
            return Ok((Assignment::Annotation(annotation), vec![element]));
        }

        let colon = self.expect(":")?;
        let open = self.expect("{")?;
        let group_name = term.text();
        let mut items = Vec::new();
        let mut elements = Vec::new();
        while !self.at("}") {
            let item_term = self.path(IdentifierKind::Term)?;
            let (annotation, element) = self.annotation(None, item_term, Some(&group_name), false)?;
            items.push(annotation);
            elements.push(element);
            if !self.at(",") {
                break;
            }
            self.bump()?;
        }
        let close = self.expect("}")?;
        let group = AnnotationGroup {
            range: Range::new(term.range.start, close.end),
            at,
            name: Identifier {
                text: group_name,
                range: term.range,
            },
            colon,
            items: AnnotationGroupItems {
                range: Range::new(open.start, close.end),
                items,
            },
        };
        Ok((Assignment::Group(group), elements))
    }

    /// Rest of an annotation after its term
    fn annotation(
        &mut self,
        at: Option<Range>,
        term: Path,
        group: Option<&str>,
        embedded: bool,
    ) -> Result<(Annotation, Element), ParseError> {
        let qualifier = self.qualifier()?;
        let head_end = qualifier
            .as_ref()
            .map(|qualifier| qualifier.range.end)
            .unwrap_or(term.range.end);
        let (colon, value) = self.optional_value()?;
        let end = value.as_ref().map(|(value, _)| value.range().end).unwrap_or(head_end);
        let range = Range::new(term.range.start, end);

        let full_term = match group {
            Some(group) => format!("{group}.{}", term.text()),
            None => term.text(),
        };
        let (vocabulary_term, flattened) = self.split_term(&full_term);
        let element = with_qualifier(Element::annotation(vocabulary_term).with_range(range), &qualifier);
        let (value, element) = annotation_value(element, value, &flattened, range);

        Ok((
            Annotation {
                range,
                at,
                term,
                qualifier,
                colon,
                value,
                embedded,
            },
            element,
        ))
    }

    fn qualifier(&mut self) -> Result<Option<Identifier>, ParseError> {
        if !self.at("#") {
            return Ok(None);
        }
        let hash = self.bump()?.range;
        let name = self.identifier(IdentifierKind::Other)?;
        Ok(Some(Identifier {
            text: format!("#{}", name.text),
            range: Range::new(hash.start, name.range.end),
        }))
    }

    fn optional_value(&mut self) -> Result<(Option<Range>, Option<(Value, Element)>), ParseError> {
        if !self.at(":") {
            return Ok((None, None));
        }
        let colon = self.bump()?.range;
        Ok((Some(colon), Some(self.value()?)))
    }

    fn value(&mut self) -> Result<(Value, Element), ParseError> {
        if self.at("{") {
            return self.record();
        }
        if self.at("[") {
            return self.collection();
        }
        let (primitive, element) = self.primitive()?;
        Ok((Value::Primitive(primitive), element))
    }

    fn record(&mut self) -> Result<(Value, Element), ParseError> {
        let open = self.bump()?.range;
        let mut entries = Vec::new();
        let mut children = Vec::new();
        let mut record_type = None;
        while !self.at("}") {
            if self.at("!") {
                let bang = self.bump()?.range;
                self.expect("[")?;
                self.expect("@")?;
                let term = self.path(IdentifierKind::Term)?;
                let qualifier = self.qualifier()?;
                let close = self.expect("]")?;
                let (colon, value) = self.optional_value()?;
                let end = value.as_ref().map(|(value, _)| value.range().end).unwrap_or(close.end);
                let range = Range::new(bang.start, end);

                let (vocabulary_term, flattened) = self.split_term(&term.text());
                let element =
                    with_qualifier(Element::annotation(vocabulary_term).with_range(range), &qualifier);
                let (value, element) = annotation_value(element, value, &flattened, range);
                children.push(element);
                entries.push(RecordEntry::Annotation(Annotation {
                    range,
                    at: None,
                    term,
                    qualifier,
                    colon,
                    value,
                    embedded: true,
                }));
            } else {
                let name = self.path(IdentifierKind::Property)?;
                let (colon, value) = self.optional_value()?;
                let end = value.as_ref().map(|(value, _)| value.range().end).unwrap_or(name.range.end);
                let range = Range::new(name.range.start, end);
                let (value, value_element) = match value {
                    Some((value, element)) => (Some(value), Some(element)),
                    None => (None, None),
                };
                if name.text() == "$Type" {
                    if let Some(Value::Primitive(primitive)) = &value {
                        record_type = Some((unquote(&primitive.text), primitive.range));
                    }
                } else {
                    let names: Vec<String> =
                        name.segments.iter().map(|segment| segment.text.clone()).collect();
                    children.push(property_element(&names, value_element, range));
                }
                entries.push(RecordEntry::Property(RecordProperty {
                    range,
                    name,
                    colon,
                    value,
                }));
            }
            if !self.at(",") {
                break;
            }
            self.bump()?;
        }
        let close = self.expect("}")?;
        let range = Range::new(open.start, close.end);

        let mut element = Element::record().with_range(range);
        if let Some((record_type, type_range)) = record_type {
            element = element.with_attribute(TYPE, record_type);
            if let Some(attribute) = element.attributes.get_mut(TYPE) {
                attribute.range = Some(type_range);
            }
        }
        for child in children {
            element = element.with_element(child);
        }
        Ok((Value::Record(Record { range, entries }), element))
    }

    /// Vocabulary term and the property names flattened into it
    ///
    /// `UI.HeaderInfo.Title.Value` is the term `UI.HeaderInfo` with the
    /// record path `Title.Value`.
    fn split_term(&self, term: &str) -> (String, Vec<String>) {
        let shortened = self.aliases.shorten(term);
        let segments: Vec<&str> = shortened.split('.').collect();
        if segments.len() <= 2 || !self.aliases.is_alias(segments[0]) {
            return (term.to_string(), Vec::new());
        }
        let names = segments[2..].iter().map(|name| name.to_string()).collect();
        (segments[..2].join("."), names)
    }

    fn collection(&mut self) -> Result<(Value, Element), ParseError> {
        let open = self.bump()?.range;
        let mut items = Vec::new();
        let mut element = Element::collection();
        while !self.at("]") {
            let (value, child) = self.value()?;
            items.push(value);
            element = element.with_element(child);
            if !self.at(",") {
                break;
            }
            self.bump()?;
        }
        let close = self.expect("]")?;
        let range = Range::new(open.start, close.end);
        Ok((Value::Collection(Collection { range, items }), element.with_range(range)))
    }

    fn primitive(&mut self) -> Result<(Primitive, Element), ParseError> {
        let Some(lexeme) = self.peek() else {
            return Err(self.error("expected a value"));
        };
        let (lexeme_kind, is_hash, found) = (lexeme.kind, lexeme.is("#"), lexeme.text.clone());
        let (kind, element_kind, text, range, value) = match lexeme_kind {
            Kind::String => {
                let lexeme = self.bump()?;
                let multi_line = lexeme.text.starts_with('`');
                (
                    if multi_line {
                        PrimitiveKind::MultiLineString
                    } else {
                        PrimitiveKind::String
                    },
                    ElementKind::String,
                    lexeme.text.clone(),
                    lexeme.range,
                    unquote(&lexeme.text),
                )
            }
            Kind::Number => {
                let lexeme = self.bump()?;
                let element_kind = if lexeme.text.contains('.') {
                    ElementKind::Decimal
                } else {
                    ElementKind::Int
                };
                (
                    PrimitiveKind::Number,
                    element_kind,
                    lexeme.text.clone(),
                    lexeme.range,
                    lexeme.text.clone(),
                )
            }
            Kind::Punctuation if is_hash => {
                let hash = self.bump()?.range;
                let member = self.identifier(IdentifierKind::Other)?;
                (
                    PrimitiveKind::Enum,
                    ElementKind::EnumMember,
                    format!("#{}", member.text),
                    Range::new(hash.start, member.range.end),
                    member.text,
                )
            }
            Kind::Identifier => {
                let path = self.path(IdentifierKind::Other)?;
                let text = path.text();
                let (kind, element_kind) = match text.as_str() {
                    "true" | "false" => (PrimitiveKind::Boolean, ElementKind::Bool),
                    "null" => (PrimitiveKind::Null, ElementKind::Null),
                    _ => (PrimitiveKind::Path, ElementKind::Path),
                };
                (kind, element_kind, text.clone(), path.range, text)
            }
            _ => return Err(self.error(format!("unexpected '{found}' in value"))),
        };
        let element = match element_kind {
            ElementKind::Null => Element::new(ElementKind::Null),
            kind => Element::primitive(kind, value),
        };
        Ok((
            Primitive { range, kind, text },
            element.with_range(range),
        ))
    }
}

fn target(kind: TargetKind, name: String, name_range: Range, assignments: Assignments) -> (Target, model::Target) {
    let end = assignments
        .items
        .last()
        .map(|assignment| assignment.range().end)
        .unwrap_or(name_range.end);
    let range = Range::new(name_range.start, end);
    let mut abstract_target = model::Target::new(name.clone());
    abstract_target.range = Some(range);
    abstract_target.name_range = Some(name_range);
    abstract_target.terms = assignments.terms;
    (
        Target {
            kind,
            name,
            name_range,
            range,
            compound: assignments.compound,
            assignments: assignments.items,
        },
        abstract_target,
    )
}

fn with_qualifier(element: Element, qualifier: &Option<Identifier>) -> Element {
    let Some(qualifier) = qualifier else {
        return element;
    };
    let mut element = element.with_attribute(QUALIFIER, qualifier.text.trim_start_matches('#'));
    if let Some(attribute) = element.attributes.get_mut(QUALIFIER) {
        attribute.range = Some(qualifier.range);
    }
    element
}

/// Attach the abstract value to an annotation element
///
/// A flattened term gets the records its dotted names stand for; they have
/// no source of their own and share the range of the annotation.
fn annotation_value(
    mut element: Element,
    value: Option<(Value, Element)>,
    flattened: &[String],
    range: Range,
) -> (Option<Value>, Element) {
    let (value, value_element) = match value {
        Some((value, value_element)) => (Some(value), Some(value_element)),
        None => (None, None),
    };
    if !flattened.is_empty() {
        let record = Element::record()
            .with_range(range)
            .with_element(property_element(flattened, value_element, range));
        return (value, element.with_element(record));
    }
    if let (Some(value), Some(value_element)) = (&value, value_element) {
        element
            .content
            .extend(promoted(value, value_element).into_iter().map(model::Node::Element));
    }
    (value, element)
}

/// Abstract content of an annotation value; a record holding `$value` is
/// unwrapped into the value and the embedded annotations next to it
fn promoted(value: &Value, element: Element) -> Vec<Element> {
    let is_promoted = matches!(value, Value::Record(record) if record.value_entry().is_some());
    if !is_promoted {
        return vec![element];
    }
    element
        .content
        .into_iter()
        .filter_map(|node| match node {
            model::Node::Element(child) if child.kind() == ElementKind::PropertyValue => {
                if child.attribute(PROPERTY) == Some("$value") {
                    child.elements().next().cloned()
                } else {
                    None
                }
            }
            model::Node::Element(child) => Some(child),
            model::Node::Text(_) => None,
        })
        .collect()
}

/// Property value, nested once per segment of a dotted name
fn property_element(names: &[String], value: Option<Element>, range: Range) -> Element {
    let Some((first, rest)) = names.split_first() else {
        return Element::record();
    };
    let inner = if rest.is_empty() {
        value
    } else {
        Some(
            Element::record()
                .with_range(range)
                .with_element(property_element(rest, value, range)),
        )
    };
    let mut element = Element::new(ElementKind::PropertyValue)
        .with_attribute(PROPERTY, first.clone())
        .with_range(range);
    if let Some(inner) = inner {
        element = element.with_element(inner);
    }
    element
}

/// Text of a string literal without quotes
pub fn unquote(text: &str) -> String {
    if let Some(inner) = text.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')) {
        return inner.replace("''", "'");
    }
    if let Some(inner) = text.strip_prefix('`').and_then(|rest| rest.strip_suffix('`')) {
        return inner.to_string();
    }
    text.to_string()
}

//! Abstract to concrete pointer translation on parsed documents

use cds_edit_core::model::{Element, Node};
use cds_edit_core::{ErrorKind, Pointer, TranslatedPointer, WriterConfiguration, translate};
use cds_edit_test::{document, pointer};

const GROUPED: &str = "annotate Books with @UI : {
    LineItem#Main : [
        { $Type : 'UI.DataField', Value : title }
    ],
    Hidden
};";

fn translated(text: &str, abstract_pointer: &str) -> TranslatedPointer {
    let document = document(text);
    let aliases = WriterConfiguration::default().aliases();
    translate(&pointer(abstract_pointer), &document.ast, &document.cst, &aliases).unwrap()
}

fn concrete(text: &str, abstract_pointer: &str) -> String {
    translated(text, abstract_pointer).pointer.to_string()
}

#[test]
fn test_group_items() {
    assert_eq!(
        concrete(GROUPED, "/targets/0/terms/1"),
        "/targets/0/assignments/0/items/items/1"
    );
}

#[test]
fn test_record_property_in_group_item() {
    assert_eq!(
        concrete(GROUPED, "/targets/0/terms/0/content/0/content/0/content/0"),
        "/targets/0/assignments/0/items/items/0/value/items/0/properties/1"
    );
}

#[test]
fn test_attributes() {
    assert_eq!(
        concrete(GROUPED, "/targets/0/terms/0/attributes/Qualifier"),
        "/targets/0/assignments/0/items/items/0/qualifier"
    );
    assert_eq!(
        concrete(GROUPED, "/targets/0/terms/0/content/0/content/0/attributes/Type"),
        "/targets/0/assignments/0/items/items/0/value/items/0/properties/0/value"
    );
}

#[test]
fn test_element_targets() {
    let text = "annotate Books with {
    title @Common.Label : 'Title';
    stock @UI.Hidden;
};";
    assert_eq!(concrete(text, "/targets/1/terms/0"), "/targets/1/assignments/0");
    assert_eq!(
        concrete(text, "/targets/0/terms/0/content/0"),
        "/targets/0/assignments/0/value"
    );
}

#[test]
fn test_root_pointer() {
    assert_eq!(concrete("annotate Books with @UI.Hidden;", ""), "");
}

#[test]
fn test_unknown_node() {
    let document = document(GROUPED);
    let aliases = WriterConfiguration::default().aliases();
    let err = translate(&pointer("/targets/0/terms/7"), &document.ast, &document.cst, &aliases)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PointerResolution);
}

#[test]
fn test_flattened_term() {
    let text = "annotate Books with @UI.HeaderInfo.TypeName : 'Book';";
    let document = document(text);
    assert_eq!(document.ast.targets[0].terms[0].term(), Some("UI.HeaderInfo"));

    let value = translated(text, "/targets/0/terms/0/content/0/content/0/content/0");
    assert_eq!(value.pointer.to_string(), "/targets/0/assignments/0/value");
    assert!(value.contains_flattened_nodes);
    assert!(!value.collapsed);

    let record = translated(text, "/targets/0/terms/0/content/0");
    assert_eq!(record.pointer.to_string(), "/targets/0/assignments/0");
    assert!(record.contains_flattened_nodes);
    assert!(record.collapsed);
}

#[test]
fn test_flattened_property() {
    let text = "annotate Books with @UI.LineItem : [ { Title.Value : title } ];";
    let value = translated(
        text,
        "/targets/0/terms/0/content/0/content/0/content/0/content/0/content/0/content/0",
    );
    assert_eq!(
        value.pointer.to_string(),
        "/targets/0/assignments/0/value/items/0/properties/0/value"
    );
    assert!(value.contains_flattened_nodes);
    assert!(!value.collapsed);

    let property = translated(text, "/targets/0/terms/0/content/0/content/0/content/0");
    assert_eq!(
        property.pointer.to_string(),
        "/targets/0/assignments/0/value/items/0/properties/0"
    );
    assert!(!property.contains_flattened_nodes);
}

const EVERYTHING: &str = "using CatalogService from '../srv/cat-service';

annotate CatalogService.Books with @(
    UI.HeaderInfo.TypeName : 'Book',
    UI.LineItem#Main : [
        { $Type : 'UI.DataField', Value : title, ![@UI.Importance] : #High },
        { $Type : 'UI.DataField', Title.Value : stock }
    ]
) {
    title @Common.Text : { $value : descr, ![@UI.TextArrangement] : #TextOnly };
    stock @UI : { Hidden, Identification : [ { Value : stock } ] };
};";

fn element_pointers(element: &Element, at: Pointer, out: &mut Vec<Pointer>) {
    if element.range.is_some() {
        out.push(at.clone());
    }
    for (index, node) in element.content.iter().enumerate() {
        if let Node::Element(child) = node {
            element_pointers(child, at.join(&format!("content/{index}")), out);
        }
    }
}

#[test]
fn test_every_node_lands_on_a_covering_node() {
    let document = document(EVERYTHING);
    let aliases = WriterConfiguration::default().aliases();

    let mut pointers = vec![pointer("/references/0")];
    for (t, target) in document.ast.targets.iter().enumerate() {
        pointers.push(pointer(&format!("/targets/{t}")));
        for (a, term) in target.terms.iter().enumerate() {
            element_pointers(term, pointer(&format!("/targets/{t}/terms/{a}")), &mut pointers);
        }
    }
    assert!(pointers.len() >= 25);

    for abstract_pointer in &pointers {
        let expected = document.ast.resolve(abstract_pointer).and_then(|node| node.range()).unwrap();
        let result = translate(abstract_pointer, &document.ast, &document.cst, &aliases)
            .unwrap_or_else(|err| panic!("{abstract_pointer}: {err}"));
        let node = document.cst.resolve(&result.pointer).unwrap();
        assert!(
            node.range().contains(&expected),
            "{abstract_pointer} -> {} does not cover {expected}",
            result.pointer
        );
    }
}

//! Batch optimization on concrete pointers

use cds_edit_core::model::{Element, ElementKind};
use cds_edit_core::{Operation, optimize};
use cds_edit_test::{document, pointer};

fn delete_annotation(at: &str) -> Operation {
    Operation::DeleteAnnotation { pointer: pointer(at) }
}

#[test]
fn test_emptied_record_removes_annotation() {
    let text = "annotate Books with @UI.HeaderInfo : { TypeName : 'Book' }
    @UI.Hidden;";
    let document = document(text);
    let operations = optimize(
        &document.cst,
        vec![Operation::DeleteRecordProperty {
            pointer: pointer("/targets/0/assignments/0/value/properties/0"),
        }],
    );
    assert_eq!(operations, vec![delete_annotation("/targets/0/assignments/0")]);
}

const GROUP: &str = "annotate Books with @UI : {
    Hidden : true,
    Label : 'x'
};";

#[test]
fn test_emptied_group_removes_target() {
    let document = document(GROUP);
    let operations = optimize(
        &document.cst,
        vec![
            delete_annotation("/targets/0/assignments/0/items/items/0"),
            delete_annotation("/targets/0/assignments/0/items/items/1"),
        ],
    );
    assert_eq!(
        operations,
        vec![Operation::DeleteTarget {
            pointer: pointer("/targets/0")
        }]
    );
}

#[test]
fn test_emptied_group_next_to_other_annotations() {
    let text = "annotate Books with @UI : {
    Hidden : true,
    Label : 'x'
} @Common.Label : 'Books';";
    let document = document(text);
    let operations = optimize(
        &document.cst,
        vec![
            delete_annotation("/targets/0/assignments/0/items/items/1"),
            delete_annotation("/targets/0/assignments/0/items/items/0"),
        ],
    );
    assert_eq!(
        operations,
        vec![Operation::DeleteAnnotationGroup {
            pointer: pointer("/targets/0/assignments/0")
        }]
    );
}

#[test]
fn test_bubbling_ignores_submission_order() {
    let document = document(GROUP);
    let forward = vec![
        delete_annotation("/targets/0/assignments/0/items/items/0"),
        delete_annotation("/targets/0/assignments/0/items/items/1"),
    ];
    let mut backward = forward.clone();
    backward.reverse();
    assert_eq!(
        optimize(&document.cst, forward),
        optimize(&document.cst, backward)
    );
}

#[test]
fn test_pending_insert_blocks_bubbling() {
    let document = document(GROUP);
    let insert = Operation::InsertAnnotation {
        pointer: pointer("/targets/0/assignments/0/items"),
        index: None,
        element: Element::annotation("UI.Importance"),
    };
    let operations = optimize(
        &document.cst,
        vec![
            delete_annotation("/targets/0/assignments/0/items/items/0"),
            delete_annotation("/targets/0/assignments/0/items/items/1"),
            insert.clone(),
        ],
    );
    assert_eq!(operations.len(), 3);
    assert_eq!(operations[0], insert);
}

#[test]
fn test_insert_and_delete_fold_into_replace() {
    let document = document("annotate Books with @UI.Hidden;");
    let element = Element::annotation("Common.Label").with_element(Element::string("Books"));
    let operations = optimize(
        &document.cst,
        vec![
            Operation::InsertAnnotation {
                pointer: pointer("/targets/0"),
                index: Some(0),
                element: element.clone(),
            },
            delete_annotation("/targets/0/assignments/0"),
        ],
    );
    assert_eq!(
        operations,
        vec![Operation::ReplaceNode {
            pointer: pointer("/targets/0/assignments/0"),
            element,
        }]
    );
}

#[test]
fn test_insert_into_bare_target_converts_to_compound() {
    let document = document("annotate Books with @UI.Hidden;");
    let insert = Operation::InsertAnnotation {
        pointer: pointer("/targets/0"),
        index: None,
        element: Element::annotation("Common.Label"),
    };
    let operations = optimize(&document.cst, vec![insert.clone()]);
    assert_eq!(
        operations,
        vec![
            insert,
            Operation::ConvertToCompoundAnnotation {
                pointer: pointer("/targets/0"),
                unnecessary: false,
            },
        ]
    );
}

#[test]
fn test_shadowed_operations_are_dropped() {
    let document = document("annotate Books with @UI.LineItem : [ a, b ]\n    @UI.Hidden;");
    let operations = optimize(
        &document.cst,
        vec![
            Operation::UpdatePrimitiveValue {
                pointer: pointer("/targets/0/assignments/0/value/items/0"),
                element: Element::primitive(ElementKind::Path, "c"),
            },
            delete_annotation("/targets/0/assignments/0"),
            delete_annotation("/targets/0/assignments/0"),
        ],
    );
    assert_eq!(operations, vec![delete_annotation("/targets/0/assignments/0")]);
}

#[test]
fn test_insert_into_empty_collection_is_anchored() {
    let document = document("annotate Books with @UI.LineItem : [];");
    let operations = optimize(
        &document.cst,
        vec![Operation::InsertPrimitiveValue {
            pointer: pointer("/targets/0/assignments/0/value"),
            index: Some(4),
            element: Element::primitive(ElementKind::Path, "title"),
        }],
    );
    assert_eq!(operations[0].index(), Some(0));
}

//! Text produced for single operations and small batches

use cds_edit_core::model::{Element, ElementKind, Reference, TYPE, Target};
use cds_edit_core::{Operation, Pointer};
use cds_edit_test::{apply, pointer, text_edits};
use insta::assert_snapshot;

fn data_field(path: &str) -> Element {
    Element::record()
        .with_attribute(TYPE, "UI.DataField")
        .with_element(Element::property(
            "Value",
            Element::primitive(ElementKind::Path, path),
        ))
}

#[test]
fn test_insert_record_into_empty_collection() {
    let result = apply(
        "annotate Books with @UI.LineItem : [];",
        vec![Operation::InsertRecord {
            pointer: pointer("/targets/0/terms/0/content/0"),
            index: Some(0),
            element: data_field("title"),
        }],
    )
    .unwrap();
    assert_snapshot!(result, @r"
    annotate Books with @UI.LineItem : [
        {
            $Type : 'UI.DataField',
            Value : title
        }
    ];
    ");
}

#[test]
fn test_set_flags_replaces_collection() {
    let result = apply(
        "annotate Contacts with @Communication.Contact.tel.type : [ #work, #fax ];",
        vec![Operation::SetFlags {
            pointer: pointer("/targets/0/terms/0/content/0/content/0/content/0/content/0/content/0"),
            value: "NS.Type/work NS.Type/cell".into(),
        }],
    )
    .unwrap();
    assert_eq!(
        result,
        "annotate Contacts with @Communication.Contact.tel.type : [ #work, #cell ];"
    );
}

#[test]
fn test_set_flags_on_single_value_is_skipped() {
    let edits = text_edits(
        "annotate Contacts with @Flags : #work;",
        vec![Operation::SetFlags {
            pointer: pointer("/targets/0/terms/0/content/0"),
            value: "NS.Type/work NS.Type/cell".into(),
        }],
    )
    .unwrap();
    assert!(edits.is_empty());
}

#[test]
fn test_move_keeps_trailing_comments() {
    let text = "annotate Books with @UI.LineItem : [
    a, // first
    b // second
];";
    let result = apply(
        text,
        vec![Operation::MoveCollectionValue {
            pointer: pointer("/targets/0/terms/0/content/0"),
            index: Some(0),
            from_pointers: vec![pointer("/targets/0/terms/0/content/0/content/1")],
        }],
    )
    .unwrap();
    assert_snapshot!(result, @r"
    annotate Books with @UI.LineItem : [
        b, // second
        a // first
    ];
    ");
}

#[test]
fn test_move_leaves_other_items_editable() {
    let text = "annotate Books with @UI.LineItem : [
    'a',
    'b',
    'c'
];";
    let result = apply(
        text,
        vec![
            Operation::MoveCollectionValue {
                pointer: pointer("/targets/0/terms/0/content/0"),
                index: Some(0),
                from_pointers: vec![pointer("/targets/0/terms/0/content/0/content/2")],
            },
            Operation::UpdatePrimitiveValue {
                pointer: pointer("/targets/0/terms/0/content/0/content/1"),
                element: Element::string("B"),
            },
        ],
    )
    .unwrap();
    assert_snapshot!(result, @r"
    annotate Books with @UI.LineItem : [
        'c',
        'a',
        'B'
    ];
    ");
}

#[test]
fn test_move_inline_item_to_end() {
    let result = apply(
        "annotate Books with @UI.Flags : [ a, b, c ];",
        vec![Operation::MoveCollectionValue {
            pointer: pointer("/targets/0/terms/0/content/0"),
            index: None,
            from_pointers: vec![pointer("/targets/0/terms/0/content/0/content/0")],
        }],
    )
    .unwrap();
    assert_eq!(result, "annotate Books with @UI.Flags : [ b, c, a ];");
}

#[test]
fn test_insert_converts_to_compound() {
    let result = apply(
        "annotate Books with @UI.Hidden;",
        vec![Operation::InsertAnnotation {
            pointer: pointer("/targets/0"),
            index: None,
            element: Element::annotation("Common.Label").with_element(Element::string("Books")),
        }],
    )
    .unwrap();
    assert_snapshot!(result, @r"
    annotate Books with @(
        UI.Hidden,
        Common.Label : 'Books'
    );
    ");
}

#[test]
fn test_insert_and_delete_become_replacement() {
    let result = apply(
        "annotate Books with @UI.Hidden;",
        vec![
            Operation::InsertAnnotation {
                pointer: pointer("/targets/0"),
                index: Some(0),
                element: Element::annotation("Common.Label").with_element(Element::string("Books")),
            },
            Operation::DeleteAnnotation {
                pointer: pointer("/targets/0/terms/0"),
            },
        ],
    )
    .unwrap();
    assert_eq!(result, "annotate Books with @Common.Label : 'Books';");
}

#[test]
fn test_insert_into_group() {
    let text = "annotate Books with @UI : {
    Hidden : true
};";
    let result = apply(
        text,
        vec![Operation::InsertAnnotation {
            pointer: pointer("/targets/0"),
            index: None,
            element: Element::annotation("com.sap.vocabularies.UI.v1.Label")
                .with_element(Element::string("x")),
        }],
    )
    .unwrap();
    assert_snapshot!(result, @r"
    annotate Books with @UI : {
        Hidden : true,
        Label : 'x'
    };
    ");
}

#[test]
fn test_insert_property_into_inline_record() {
    let result = apply(
        "annotate Books with @UI.HeaderInfo : { TypeName : 'Book' };",
        vec![Operation::InsertRecordProperty {
            pointer: pointer("/targets/0/terms/0/content/0"),
            index: None,
            element: Element::property("TypeNamePlural", Element::string("Books")),
        }],
    )
    .unwrap();
    assert_eq!(
        result,
        "annotate Books with @UI.HeaderInfo : { TypeName : 'Book', TypeNamePlural : 'Books' };"
    );
}

#[test]
fn test_repeated_appends_after_trailing_comment() {
    let text = "annotate Books with @UI.HeaderInfo : {
    TypeName : 'Book' // note
};";
    let result = apply(
        text,
        vec![
            Operation::InsertRecordProperty {
                pointer: pointer("/targets/0/terms/0/content/0"),
                index: None,
                element: Element::property("A", Element::string("x")),
            },
            Operation::InsertRecordProperty {
                pointer: pointer("/targets/0/terms/0/content/0"),
                index: None,
                element: Element::property("B", Element::string("y")),
            },
        ],
    )
    .unwrap();
    assert_snapshot!(result, @r"
    annotate Books with @UI.HeaderInfo : {
        TypeName : 'Book', // note
        A : 'x',
        B : 'y'
    };
    ");
}

#[test]
fn test_update_value_below_flattened_property() {
    let result = apply(
        "annotate Books with @UI.HeaderInfo : { TypeName : 'B', Title.Value : title };",
        vec![Operation::UpdatePrimitiveValue {
            pointer: pointer("/targets/0/terms/0/content/0/content/1/content/0/content/0/content/0"),
            element: Element::primitive(ElementKind::Path, "descr"),
        }],
    )
    .unwrap();
    assert_eq!(
        result,
        "annotate Books with @UI.HeaderInfo : { TypeName : 'B', Title.Value : descr };"
    );
}

#[test]
fn test_update_value_of_flattened_term() {
    let text = "annotate Books with @UI.HeaderInfo.TypeName : 'Book';";
    let result = apply(
        text,
        vec![Operation::UpdatePrimitiveValue {
            pointer: pointer("/targets/0/terms/0/content/0/content/0/content/0"),
            element: Element::string("Title"),
        }],
    )
    .unwrap();
    assert_eq!(result, "annotate Books with @UI.HeaderInfo.TypeName : 'Title';");

    let err = text_edits(
        text,
        vec![Operation::ReplaceNode {
            pointer: pointer("/targets/0/terms/0/content/0"),
            element: Element::record(),
        }],
    )
    .unwrap_err();
    assert_eq!(err.kind(), cds_edit_core::ErrorKind::UnsupportedOperation);
}

#[test]
fn test_embedded_annotation_promotes_value() {
    let result = apply(
        "annotate Books with @Common.Text : title;",
        vec![Operation::InsertEmbeddedAnnotation {
            pointer: pointer("/targets/0/terms/0"),
            index: None,
            element: Element::annotation("UI.TextArrangement").with_element(Element::primitive(
                ElementKind::EnumMember,
                "UI.TextArrangementType/TextOnly",
            )),
        }],
    )
    .unwrap();
    assert_snapshot!(result, @r"
    annotate Books with @Common.Text : {
        $value : title,
        ![@UI.TextArrangement] : #TextOnly
    };
    ");
}

#[test]
fn test_qualifier_and_value_updates() {
    let result = apply(
        "annotate Books with @UI.LineItem : []\n    @Common.Label : 'Old';",
        vec![
            Operation::InsertQualifier {
                pointer: pointer("/targets/0/terms/0"),
                value: "Main".into(),
            },
            Operation::UpdatePrimitiveValue {
                pointer: pointer("/targets/0/terms/1/content/0"),
                element: Element::string("It's new"),
            },
        ],
    )
    .unwrap();
    assert_eq!(
        result,
        "annotate Books with @UI.LineItem#Main : []\n    @Common.Label : 'It''s new';"
    );
}

#[test]
fn test_replace_text_keeps_backticks() {
    let result = apply(
        "annotate Books with @Core.Description : `old`;",
        vec![Operation::ReplaceTextValue {
            pointer: pointer("/targets/0/terms/0/content/0"),
            text: "new".into(),
        }],
    )
    .unwrap();
    assert_eq!(result, "annotate Books with @Core.Description : `new`;");
}

#[test]
fn test_insert_target_and_reference() {
    let text = "using CatalogService from '../srv/cat-service';

annotate Books with @UI.Hidden;";
    let result = apply(
        text,
        vec![
            Operation::InsertTarget {
                pointer: Pointer::root(),
                index: None,
                target: Target::new("Authors").with_term(
                    Element::annotation("UI.Hidden")
                        .with_element(Element::primitive(ElementKind::Bool, "true")),
                ),
            },
            Operation::InsertReference {
                pointer: Pointer::root(),
                reference: Reference {
                    name: "db".into(),
                    alias: None,
                    uri: Some("../db/schema".into()),
                    range: None,
                },
            },
        ],
    )
    .unwrap();
    assert_snapshot!(result, @r"
    using CatalogService from '../srv/cat-service';
    using db from '../db/schema';

    annotate Books with @UI.Hidden;

    annotate Authors with @UI.Hidden : true;
    ");
}

#[test]
fn test_value_insert_into_filled_annotation() {
    let err = text_edits(
        "annotate Books with @UI.LineItem : [];",
        vec![Operation::InsertPrimitiveValue {
            pointer: pointer("/targets/0/terms/0"),
            index: None,
            element: Element::string("x"),
        }],
    )
    .unwrap_err();
    assert_eq!(err.kind(), cds_edit_core::ErrorKind::UnsupportedOperation);
}

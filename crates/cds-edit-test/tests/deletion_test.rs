//! Deletions: separators, comments and emptied statements

use cds_edit_core::Operation;
use cds_edit_test::{apply, pointer};

fn delete_value(at: &str) -> Operation {
    Operation::DeletePrimitiveValue { pointer: pointer(at) }
}

#[test]
fn test_inline_items_leave_no_dangling_comma() {
    let text = "annotate Books with @UI.Flags : [ a, b, c ];";
    let last = apply(text, vec![delete_value("/targets/0/terms/0/content/0/content/2")]).unwrap();
    assert_eq!(last, "annotate Books with @UI.Flags : [ a, b ];");

    let first = apply(text, vec![delete_value("/targets/0/terms/0/content/0/content/0")]).unwrap();
    assert_eq!(first, "annotate Books with @UI.Flags : [ b, c ];");

    let both = apply(
        text,
        vec![
            delete_value("/targets/0/terms/0/content/0/content/2"),
            delete_value("/targets/0/terms/0/content/0/content/0"),
        ],
    )
    .unwrap();
    assert_eq!(both, "annotate Books with @UI.Flags : [ b ];");
}

#[test]
fn test_repeated_deletion_is_idempotent() {
    let text = "annotate Books with @UI.Flags : [ a, b, c ];";
    let once = apply(text, vec![delete_value("/targets/0/terms/0/content/0/content/1")]).unwrap();
    let twice = apply(
        text,
        vec![
            delete_value("/targets/0/terms/0/content/0/content/1"),
            delete_value("/targets/0/terms/0/content/0/content/1"),
        ],
    )
    .unwrap();
    assert_eq!(once, "annotate Books with @UI.Flags : [ a, c ];");
    assert_eq!(once, twice);
}

#[test]
fn test_comments_go_with_their_items() {
    let text = "annotate Books with @UI.LineItem : [
    // first
    a,
    b // second
];";
    let without_last =
        apply(text, vec![delete_value("/targets/0/terms/0/content/0/content/1")]).unwrap();
    assert_eq!(
        without_last,
        "annotate Books with @UI.LineItem : [\n    // first\n    a\n];"
    );

    let without_first =
        apply(text, vec![delete_value("/targets/0/terms/0/content/0/content/0")]).unwrap();
    assert_eq!(
        without_first,
        "annotate Books with @UI.LineItem : [\n    b // second\n];"
    );
}

#[test]
fn test_emptied_multiline_collection_closes_up() {
    let text = "annotate Books with @UI.LineItem : [
    a,
    b
];";
    let result = apply(
        text,
        vec![
            delete_value("/targets/0/terms/0/content/0/content/0"),
            delete_value("/targets/0/terms/0/content/0/content/1"),
        ],
    )
    .unwrap();
    assert_eq!(result, "annotate Books with @UI.LineItem : [];");
}

#[test]
fn test_bare_annotation_takes_its_at() {
    let text = "annotate Books with @UI.Hidden
    @Common.Label : 'Title';";
    let result = apply(
        text,
        vec![Operation::DeleteAnnotation {
            pointer: pointer("/targets/0/terms/0"),
        }],
    )
    .unwrap();
    assert_eq!(result, "annotate Books with\n    @Common.Label : 'Title';");
}

#[test]
fn test_last_compound_item() {
    let text = "annotate Books with @(
    UI.Hidden,
    Common.Label : 'x'
);";
    let result = apply(
        text,
        vec![Operation::DeleteAnnotation {
            pointer: pointer("/targets/0/terms/1"),
        }],
    )
    .unwrap();
    assert_eq!(result, "annotate Books with @(\n    UI.Hidden\n);");
}

#[test]
fn test_delete_whole_statement() {
    let text = "annotate Books with @UI.Hidden;\nannotate Authors with @UI.Hidden;\n";
    let result = apply(
        text,
        vec![Operation::DeleteTarget {
            pointer: pointer("/targets/0"),
        }],
    )
    .unwrap();
    assert_eq!(result, "annotate Authors with @UI.Hidden;\n");
}

#[test]
fn test_emptied_record_removes_annotation() {
    let text = "annotate Books with @UI.HeaderInfo : { TypeName : 'Book' }
    @UI.Hidden;";
    let result = apply(
        text,
        vec![Operation::DeleteRecordProperty {
            pointer: pointer("/targets/0/terms/0/content/0/content/0"),
        }],
    )
    .unwrap();
    assert_eq!(result, "annotate Books with\n    @UI.Hidden;");
}

#[test]
fn test_delete_qualifier() {
    let result = apply(
        "annotate Books with @UI.LineItem#Main : [];",
        vec![Operation::DeleteQualifier {
            pointer: pointer("/targets/0/terms/0/attributes/Qualifier"),
        }],
    )
    .unwrap();
    assert_eq!(result, "annotate Books with @UI.LineItem : [];");
}

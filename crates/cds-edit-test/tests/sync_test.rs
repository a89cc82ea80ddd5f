//! Synchronization and batch application through the service

use std::sync::Arc;

use cds_edit_core::model::{Element, ElementKind, Target};
use cds_edit_core::{
    AnnotationService, ErrorKind, FileChange, Operation, Pointer, ProjectLayout, SyncOutcome,
    WriterConfiguration, apply_text_edits,
};
use cds_edit_test::{FixtureCompiler, FixtureImports, pointer};

const APP: &str = "file:///p/app/annotations.cds";
const SOURCE: &str = "annotate Books with @UI.Hidden;";

fn service(compiler: FixtureCompiler, imports: FixtureImports) -> AnnotationService {
    AnnotationService::new(
        WriterConfiguration::default(),
        Arc::new(compiler),
        Arc::new(imports),
    )
}

fn hidden_target(name: &str) -> Operation {
    Operation::InsertTarget {
        pointer: Pointer::root(),
        index: None,
        target: Target::new(name).with_term(
            Element::annotation("UI.Hidden").with_element(Element::primitive(ElementKind::Bool, "true")),
        ),
    }
}

#[tokio::test]
async fn test_apply_adds_missing_reference() {
    let mut service = service(
        FixtureCompiler::new().with_source(APP, SOURCE),
        FixtureImports::new().define("CatalogService", "file:///p/srv/cat-service.cds"),
    );
    let outcome = service.synchronize(&[APP.to_string()]).await.unwrap();
    assert_eq!(outcome, SyncOutcome::Synchronized(1));

    let edit = service
        .apply(vec![FileChange {
            uri: APP.into(),
            operations: vec![hidden_target("CatalogService.Authors")],
        }])
        .await
        .unwrap();
    let result = apply_text_edits(SOURCE, edit.edits_for(APP)).unwrap();
    assert!(result.starts_with("using CatalogService from '../srv/cat-service';\n"));
    assert!(result.ends_with("annotate CatalogService.Authors with @UI.Hidden : true;"));
}

#[tokio::test]
async fn test_visible_definition_needs_no_reference() {
    let text = "using CatalogService from '../srv/cat-service';\nannotate Books with @UI.Hidden;";
    let mut service = service(
        FixtureCompiler::new().with_source(APP, text),
        FixtureImports::new().define("CatalogService", "file:///p/srv/cat-service.cds"),
    );
    service.synchronize(&[APP.to_string()]).await.unwrap();

    let edit = service
        .apply(vec![FileChange {
            uri: APP.into(),
            operations: vec![hidden_target("CatalogService.Authors")],
        }])
        .await
        .unwrap();
    let result = apply_text_edits(text, edit.edits_for(APP)).unwrap();
    assert_eq!(result.matches("using").count(), 1);
}

#[tokio::test]
async fn test_failed_compilation_keeps_store() {
    let mut service = service(
        FixtureCompiler::new().with_source(APP, "annotate Books with @;"),
        FixtureImports::new(),
    );
    let outcome = service.synchronize(&[APP.to_string()]).await.unwrap();
    let SyncOutcome::Failed(diagnostics) = outcome else {
        panic!("expected a failed synchronization");
    };
    assert!(diagnostics.contains_key(APP));
    assert!(service.store().is_empty());
}

#[tokio::test]
async fn test_ghost_documents_are_read_only() {
    let mut service = service(
        FixtureCompiler::new().with_ghost(APP, SOURCE),
        FixtureImports::new(),
    );
    service.synchronize(&[APP.to_string()]).await.unwrap();
    let err = service
        .apply(vec![FileChange {
            uri: APP.into(),
            operations: vec![Operation::DeleteAnnotation {
                pointer: pointer("/targets/0/terms/0"),
            }],
        }])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Document);
}

#[tokio::test]
async fn test_unknown_document() {
    let service = service(FixtureCompiler::new(), FixtureImports::new());
    let err = service
        .apply(vec![FileChange {
            uri: APP.into(),
            operations: vec![hidden_target("Authors")],
        }])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Document);
}

#[tokio::test]
async fn test_reference_across_isolated_units_fails() {
    let admin = "file:///p/app/admin/annotations.cds";
    let config = WriterConfiguration {
        project: Some(ProjectLayout {
            isolated_roots: vec!["file:///p/app/admin".into(), "file:///p/app/browse".into()],
        }),
        ..WriterConfiguration::default()
    };
    let mut service = AnnotationService::new(
        config,
        Arc::new(FixtureCompiler::new().with_source(admin, SOURCE)),
        Arc::new(FixtureImports::new().define("BrowseService", "file:///p/app/browse/service.cds")),
    );
    service.synchronize(&[admin.to_string()]).await.unwrap();
    let err = service
        .apply(vec![FileChange {
            uri: admin.into(),
            operations: vec![hidden_target("BrowseService.Books")],
        }])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CrossBoundaryReference);
}

#[tokio::test]
async fn test_changes_for_one_uri_are_merged() {
    let mut service = service(
        FixtureCompiler::new().with_source(APP, SOURCE),
        FixtureImports::new(),
    );
    service.synchronize(&[APP.to_string()]).await.unwrap();
    let edit = service
        .apply(vec![
            FileChange {
                uri: APP.into(),
                operations: vec![hidden_target("Authors")],
            },
            FileChange {
                uri: APP.into(),
                operations: vec![hidden_target("Orders")],
            },
        ])
        .await
        .unwrap();
    assert_eq!(edit.changes.len(), 1);
    let result = apply_text_edits(SOURCE, edit.edits_for(APP)).unwrap();
    assert!(result.contains("annotate Authors with @UI.Hidden : true;"));
    assert!(result.contains("annotate Orders with @UI.Hidden : true;"));
}

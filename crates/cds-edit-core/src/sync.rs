//! Document synchronization and batch application
//!
//! The parser lives outside this crate: a [`CompilerService`] turns files
//! into token streams and trees, and the [`DocumentStore`] keeps the
//! resulting [`Document`]s until the next synchronization. The
//! [`AnnotationService`] applies batches of operations against the store,
//! adding the `using` declarations inserted targets need.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::change::Operation;
use crate::config::{ProjectLayout, WriterConfiguration};
use crate::cst::CdsDocument;
use crate::document::Document;
use crate::model::{AnnotationFile, Reference};
use crate::pointer::Pointer;
use crate::text::{Range, WorkspaceEdit};
use crate::token::{RawToken, TokenStream};
use crate::writer::Writer;
use crate::{CdsEditError, Result, ResultExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
    pub severity: Severity,
}

/// Compiler output for one file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFile {
    pub uri: String,
    pub text: String,
    pub tokens: Vec<RawToken>,
    pub cst: CdsDocument,
    pub ast: AnnotationFile,
    #[serde(default)]
    pub ghost: bool,
}

impl From<ParsedFile> for Document {
    fn from(file: ParsedFile) -> Self {
        let document = Document::new(
            file.uri,
            file.text,
            TokenStream::from_raw(file.tokens),
            file.cst,
            file.ast,
        );
        if file.ghost {
            document.into_ghost()
        } else {
            document
        }
    }
}

#[derive(Debug, Clone)]
pub enum CompileOutput {
    Parsed(Vec<ParsedFile>),
    /// Diagnostics per uri
    Failed(IndexMap<String, Vec<Diagnostic>>),
}

#[async_trait]
pub trait CompilerService: Send + Sync {
    async fn compile(&self, uris: &[String]) -> Result<CompileOutput>;
}

/// Finds the file defining a name
#[async_trait]
pub trait ImportResolver: Send + Sync {
    /// Uri of the file defining `name`, as seen from the file `from`
    async fn resolve(&self, name: &str, from: &str) -> Result<Option<String>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Synchronized(usize),
    Failed(IndexMap<String, Vec<Diagnostic>>),
}

/// Documents of the last successful synchronization
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: HashMap<String, Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `uris` and replace the whole store with the result
    ///
    /// A failed compilation leaves the store untouched.
    pub async fn synchronize(
        &mut self,
        compiler: &dyn CompilerService,
        uris: &[String],
    ) -> Result<SyncOutcome> {
        match compiler.compile(uris).await? {
            CompileOutput::Parsed(files) => {
                self.documents = files
                    .into_iter()
                    .map(|file| (file.uri.clone(), Document::from(file)))
                    .collect();
                tracing::info!(documents = self.documents.len(), "synchronized documents");
                Ok(SyncOutcome::Synchronized(self.documents.len()))
            }
            CompileOutput::Failed(diagnostics) => {
                tracing::warn!(files = diagnostics.len(), "compilation failed");
                Ok(SyncOutcome::Failed(diagnostics))
            }
        }
    }

    pub fn get(&self, uri: &str) -> Option<&Document> {
        self.documents.get(uri)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Adds the `using` declarations inserted targets depend on
pub struct ReferenceResolver {
    layout: ProjectLayout,
    resolver: Arc<dyn ImportResolver>,
}

impl ReferenceResolver {
    pub fn new(layout: ProjectLayout, resolver: Arc<dyn ImportResolver>) -> Self {
        Self { layout, resolver }
    }

    /// `insert-reference` operations for every inserted target whose
    /// definition is not visible in the document yet
    pub async fn missing_references(
        &self,
        document: &Document,
        operations: &[Operation],
    ) -> Result<Vec<Operation>> {
        let mut seen = HashSet::new();
        let mut references = Vec::new();
        for operation in operations {
            let Operation::InsertTarget { target, .. } = operation else {
                continue;
            };
            let entity = target.entity();
            let root = entity.split('.').next().unwrap_or(entity);
            if is_visible(&document.ast, entity, root) {
                continue;
            }
            let resolved = self.resolver.resolve(root, &document.uri).await;
            let Some(uri) = resolved.log_and_continue().flatten() else {
                tracing::debug!(name = root, "no definition found, no reference added");
                continue;
            };
            if uri == document.uri || !seen.insert(uri.clone()) {
                continue;
            }
            if self.layout.crosses_boundary(&document.uri, &uri) {
                return Err(CdsEditError::cross_boundary(document.uri.clone(), uri));
            }
            references.push(Operation::InsertReference {
                pointer: Pointer::root(),
                reference: Reference {
                    name: root.to_string(),
                    alias: None,
                    uri: Some(relative_path(&document.uri, &uri)),
                    range: None,
                },
            });
        }
        Ok(references)
    }
}

fn is_visible(file: &AnnotationFile, entity: &str, root: &str) -> bool {
    file.references.iter().any(|reference| {
        reference.name == entity
            || reference.name == root
            || entity.starts_with(&format!("{}.", reference.name))
            || reference.alias.as_deref() == Some(root)
    })
}

/// Import path of `to` relative to the directory of `from`, without the
/// `.cds` extension
fn relative_path(from: &str, to: &str) -> String {
    let from_dir: Vec<&str> = match from.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let to = to.strip_suffix(".cds").unwrap_or(to);
    let to_parts: Vec<&str> = to.split('/').collect();
    let common = from_dir
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();
    let ups = from_dir.len() - common;
    let rest = to_parts[common..].join("/");
    if ups == 0 {
        format!("./{rest}")
    } else {
        format!("{}{rest}", "../".repeat(ups))
    }
}

/// Operations for one file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    pub uri: String,
    pub operations: Vec<Operation>,
}

/// Entry point for applying batches of operations
pub struct AnnotationService {
    store: DocumentStore,
    config: WriterConfiguration,
    compiler: Arc<dyn CompilerService>,
    references: ReferenceResolver,
}

impl AnnotationService {
    pub fn new(
        config: WriterConfiguration,
        compiler: Arc<dyn CompilerService>,
        imports: Arc<dyn ImportResolver>,
    ) -> Self {
        let references = ReferenceResolver::new(config.project(), imports);
        Self {
            store: DocumentStore::new(),
            config,
            compiler,
            references,
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn config(&self) -> &WriterConfiguration {
        &self.config
    }

    pub async fn synchronize(&mut self, uris: &[String]) -> Result<SyncOutcome> {
        self.store.synchronize(self.compiler.as_ref(), uris).await
    }

    /// Text edits for a batch, grouped by uri
    ///
    /// Any fatal error aborts the whole batch; no partial result is returned.
    pub async fn apply(&self, changes: Vec<FileChange>) -> Result<WorkspaceEdit> {
        let mut by_uri: IndexMap<String, Vec<Operation>> = IndexMap::new();
        for change in changes {
            by_uri
                .entry(change.uri)
                .or_default()
                .extend(change.operations);
        }

        let mut edit = WorkspaceEdit::default();
        for (uri, operations) in by_uri {
            let document = self
                .store
                .get(&uri)
                .ok_or_else(|| CdsEditError::DocumentNotFound { uri: uri.clone() })?;
            let references = self
                .references
                .missing_references(document, &operations)
                .await?;

            let mut writer = Writer::new(document, self.config.clone());
            for operation in references.into_iter().chain(operations) {
                writer.add_change(operation)?;
            }
            let edits = writer.get_text_edits()?;
            tracing::info!(uri = %uri, edits = edits.len(), "applied batch");
            edit.changes.insert(uri, edits);
        }
        Ok(edit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path("file:///p/app/annotations.cds", "file:///p/srv/service.cds"),
            "../srv/service"
        );
        assert_eq!(
            relative_path("file:///p/app/annotations.cds", "file:///p/app/common.cds"),
            "./common"
        );
    }

    #[test]
    fn test_visible_through_namespace_or_alias() {
        let mut file = AnnotationFile::default();
        file.references.push(Reference {
            name: "my.bookshop".into(),
            alias: Some("db".into()),
            uri: None,
            range: None,
        });
        assert!(is_visible(&file, "my.bookshop.Books", "my"));
        assert!(is_visible(&file, "db.Books", "db"));
        assert!(!is_visible(&file, "CatalogService.Books", "CatalogService"));
    }
}

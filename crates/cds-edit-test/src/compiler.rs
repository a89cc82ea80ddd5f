//! In-memory compiler and import resolver

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use cds_edit_core::{
    CdsEditError, CompileOutput, CompilerService, Diagnostic, ImportResolver, Result, Severity,
    WriterConfiguration,
};
use indexmap::IndexMap;

use crate::parse_file;

/// Compiles source texts kept in memory
#[derive(Debug, Default)]
pub struct FixtureCompiler {
    sources: RwLock<HashMap<String, String>>,
    /// Uris compiled as read-only views
    ghosts: RwLock<Vec<String>>,
    config: WriterConfiguration,
}

impl FixtureCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(self, uri: impl Into<String>, text: impl Into<String>) -> Self {
        self.set_source(uri, text);
        self
    }

    pub fn with_ghost(self, uri: impl Into<String>, text: impl Into<String>) -> Self {
        let uri = uri.into();
        if let Ok(mut ghosts) = self.ghosts.write() {
            ghosts.push(uri.clone());
        }
        self.with_source(uri, text)
    }

    /// Replace the text of a file, as an editor would
    pub fn set_source(&self, uri: impl Into<String>, text: impl Into<String>) {
        if let Ok(mut sources) = self.sources.write() {
            sources.insert(uri.into(), text.into());
        }
    }
}

#[async_trait]
impl CompilerService for FixtureCompiler {
    async fn compile(&self, uris: &[String]) -> Result<CompileOutput> {
        let sources = self
            .sources
            .read()
            .map_err(|_| CdsEditError::compiler_error("source table poisoned"))?;
        let ghosts = self
            .ghosts
            .read()
            .map_err(|_| CdsEditError::compiler_error("ghost table poisoned"))?;

        let mut parsed = Vec::new();
        let mut failed: IndexMap<String, Vec<Diagnostic>> = IndexMap::new();
        for uri in uris {
            let Some(text) = sources.get(uri) else {
                return Err(CdsEditError::compiler_error(format!("unknown file {uri}")));
            };
            match parse_file(uri, text, &self.config) {
                Ok(mut file) => {
                    file.ghost = ghosts.contains(uri);
                    parsed.push(file);
                }
                Err(error) => {
                    let position = error.position;
                    failed.entry(uri.clone()).or_default().push(Diagnostic {
                        message: error.message,
                        range: Some(cds_edit_core::Range::empty(position)),
                        severity: Severity::Error,
                    });
                }
            }
        }
        if failed.is_empty() {
            Ok(CompileOutput::Parsed(parsed))
        } else {
            Ok(CompileOutput::Failed(failed))
        }
    }
}

/// Resolves names from a fixed table
#[derive(Debug, Default)]
pub struct FixtureImports {
    definitions: HashMap<String, String>,
}

impl FixtureImports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(mut self, name: impl Into<String>, uri: impl Into<String>) -> Self {
        self.definitions.insert(name.into(), uri.into());
        self
    }
}

#[async_trait]
impl ImportResolver for FixtureImports {
    async fn resolve(&self, name: &str, _from: &str) -> Result<Option<String>> {
        Ok(self.definitions.get(name).cloned())
    }
}

//! A synchronized annotation document

use crate::cst::CdsDocument;
use crate::model::{AnnotationFile, TargetIndex};
use crate::text::LineIndex;
use crate::token::TokenStream;

/// Everything the writer needs to know about one file
///
/// Built once per synchronization from the compiler output; the target index
/// is derived from the abstract tree.
#[derive(Debug, Clone)]
pub struct Document {
    pub uri: String,
    pub lines: LineIndex,
    pub tokens: TokenStream,
    pub cst: CdsDocument,
    pub ast: AnnotationFile,
    pub targets: TargetIndex,
    /// Synthesized view of annotations defined elsewhere, never edited
    pub ghost: bool,
}

impl Document {
    pub fn new(
        uri: impl Into<String>,
        text: impl Into<String>,
        tokens: TokenStream,
        cst: CdsDocument,
        ast: AnnotationFile,
    ) -> Self {
        let targets = TargetIndex::build(&ast);
        Self {
            uri: uri.into(),
            lines: LineIndex::new(text),
            tokens,
            cst,
            ast,
            targets,
            ghost: false,
        }
    }

    pub fn into_ghost(mut self) -> Self {
        self.ghost = true;
        self
    }

    pub fn text(&self) -> &str {
        self.lines.text()
    }
}

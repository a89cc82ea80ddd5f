//! CDS Edit Core
//!
//! Formatting-preserving edit synthesis for CDS annotation files.
//! Structured operations addressed against the abstract annotation tree are
//! converted to concrete syntax tree pointers, optimized as a batch, and
//! turned into minimal text edits that keep comments and layout intact.

pub mod change;
pub mod config;
pub mod cst; // Concrete syntax tree handed over by the parser
pub mod deletion;
pub mod document;
pub mod error;
pub mod model; // Abstract annotation tree
pub mod optimize;
pub mod pointer;
pub mod printer;
pub mod result;
pub mod sync;
pub mod text;
pub mod token;
pub mod translate;
pub mod writer;

// Re-export commonly used types
pub use change::{ChangeCommand, Operation};
pub use config::{ConfigLoader, IndentStyle, ProjectLayout, VocabularyAliases, WriterConfiguration};
pub use document::Document;
pub use error::{CdsEditError, ErrorKind};
pub use optimize::optimize;
pub use pointer::Pointer;
pub use printer::{AnnotationForm, Printer};
pub use result::{Result, ResultExt};
pub use sync::{
    AnnotationService, CompileOutput, CompilerService, Diagnostic, DocumentStore, FileChange,
    ImportResolver, ParsedFile, ReferenceResolver, Severity, SyncOutcome,
};
pub use text::{
    LineIndex, Position, Range, TextEdit, WorkspaceEdit, apply_text_edits, render_diff,
};
pub use token::{IdentifierKind, RawToken, Token, TokenKind, TokenStream};
pub use translate::{TranslatedPointer, translate};
pub use writer::Writer;

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cds_edit=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

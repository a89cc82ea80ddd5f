//! CDS Edit Test
//!
//! Fixture front end for exercising the edit synthesizer on real text:
//! - a tokenizer and parser for the annotation subset of CDS
//! - an in-memory compiler and import resolver for the synchronizer
//! - helpers running a batch of operations against a source text

pub mod compiler;
pub mod lexer;
pub mod parser;

pub use compiler::{FixtureCompiler, FixtureImports};

use cds_edit_core::token::RawToken;
use cds_edit_core::{
    Document, Operation, ParsedFile, Pointer, Position, Result, TextEdit, WriterConfiguration,
    Writer, apply_text_edits,
};
use thiserror::Error;

use parser::Parser;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} at {position}")]
pub struct ParseError {
    pub message: String,
    pub position: Position,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Tokens and both trees of a source text
pub fn parse_file(uri: &str, text: &str, config: &WriterConfiguration) -> std::result::Result<ParsedFile, ParseError> {
    let mut lexemes = lexer::tokenize(text)?;
    let (cst, ast) = Parser::new(&mut lexemes, config.aliases()).parse(uri, text)?;
    let tokens = lexemes
        .iter()
        .map(|lexeme| RawToken::Span(lexeme.to_raw()))
        .collect();
    Ok(ParsedFile {
        uri: uri.to_string(),
        text: text.to_string(),
        tokens,
        cst,
        ast,
        ghost: false,
    })
}

/// Parse a source text into a document, panicking on syntax errors
pub fn document(text: &str) -> Document {
    match parse_file("file:///app/annotations.cds", text, &WriterConfiguration::default()) {
        Ok(file) => Document::from(file),
        Err(error) => panic!("fixture does not parse: {error}"),
    }
}

/// Shorthand for a pointer literal
pub fn pointer(text: &str) -> Pointer {
    match Pointer::parse(text) {
        Ok(pointer) => pointer,
        Err(error) => panic!("invalid pointer literal: {error}"),
    }
}

/// Text edits of a batch run against `text` with the default configuration
pub fn text_edits(text: &str, operations: Vec<Operation>) -> Result<Vec<TextEdit>> {
    let document = document(text);
    let mut writer = Writer::new(&document, WriterConfiguration::default());
    for operation in operations {
        writer.add_change(operation)?;
    }
    writer.get_text_edits()
}

/// Source text after applying a batch to `text`
pub fn apply(text: &str, operations: Vec<Operation>) -> Result<String> {
    let edits = text_edits(text, operations)?;
    apply_text_edits(text, &edits)
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

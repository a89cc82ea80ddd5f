//! Error types and handling for annotation edit synthesis

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for edit synthesis operations
#[derive(Debug, Error)]
pub enum CdsEditError {
    /// An abstract pointer does not resolve to a concrete node
    #[error("Cannot resolve pointer '{pointer}': {reason}")]
    PointerResolution { pointer: String, reason: String },

    /// The operation payload does not fit the node it resolved to
    #[error("Unsupported '{operation}' operation: {reason}")]
    UnsupportedOperation { operation: String, reason: String },

    /// The writer cannot decide how to express the operation; it is skipped
    #[error("Ambiguous '{operation}' operation skipped: {reason}")]
    AmbiguousWriterCase { operation: String, reason: String },

    /// Applying the batch would need an import across an isolation boundary
    #[error("Reference from '{from}' to '{to}' crosses an isolation boundary")]
    CrossBoundaryReference { from: String, to: String },

    /// Ghost documents are synthesized views and never edited
    #[error("Document '{uri}' is read-only")]
    ReadOnlyDocument { uri: String },

    /// The batch names a document the store does not know
    #[error("Document not found: {uri}")]
    DocumentNotFound { uri: String },

    /// The external compiler failed to produce a result
    #[error("Compiler error: {message}")]
    Compiler { message: String },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Serialization of operations or configuration
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Text edits cannot be applied to the given text
    #[error("Invalid text edit: {message}")]
    InvalidEdit { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Broken writer invariant
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PointerResolution,
    UnsupportedOperation,
    AmbiguousWriterCase,
    CrossBoundaryReference,
    Document,
    Compiler,
    Config,
    Serialization,
    Edit,
    Io,
    Internal,
}

impl CdsEditError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CdsEditError::PointerResolution { .. } => ErrorKind::PointerResolution,
            CdsEditError::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            CdsEditError::AmbiguousWriterCase { .. } => ErrorKind::AmbiguousWriterCase,
            CdsEditError::CrossBoundaryReference { .. } => ErrorKind::CrossBoundaryReference,
            CdsEditError::ReadOnlyDocument { .. } | CdsEditError::DocumentNotFound { .. } => {
                ErrorKind::Document
            }
            CdsEditError::Compiler { .. } => ErrorKind::Compiler,
            CdsEditError::Config { .. } => ErrorKind::Config,
            CdsEditError::Serialization(_) => ErrorKind::Serialization,
            CdsEditError::InvalidEdit { .. } => ErrorKind::Edit,
            CdsEditError::Io { .. } => ErrorKind::Io,
            CdsEditError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Check if the batch can go on after this error.
    ///
    /// Only ambiguous writer cases are recoverable: the offending operation
    /// is skipped and the remaining operations still produce edits.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::AmbiguousWriterCase)
    }

    /// Create a pointer resolution error
    pub fn pointer_resolution(pointer: impl ToString, reason: impl Into<String>) -> Self {
        Self::PointerResolution {
            pointer: pointer.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create an ambiguous writer case
    pub fn ambiguous(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AmbiguousWriterCase {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a cross boundary reference error
    pub fn cross_boundary(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::CrossBoundaryReference {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a compiler error
    pub fn compiler_error(message: impl Into<String>) -> Self {
        Self::Compiler {
            message: message.into(),
        }
    }

    /// Create an invalid edit error
    pub fn invalid_edit(message: impl Into<String>) -> Self {
        Self::InvalidEdit {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CdsEditError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_ambiguous_cases_are_recoverable() {
        assert!(CdsEditError::ambiguous("set-flags", "single enum").is_recoverable());
        assert!(!CdsEditError::pointer_resolution("/targets/0", "missing").is_recoverable());
        assert!(!CdsEditError::cross_boundary("app/a.cds", "app2/b.cds").is_recoverable());
        assert!(!CdsEditError::unsupported("insert-record", "scalar slot").is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = CdsEditError::pointer_resolution("/targets/3", "no target contains the node");
        assert_eq!(
            err.to_string(),
            "Cannot resolve pointer '/targets/3': no target contains the node"
        );
        assert_eq!(err.kind(), ErrorKind::PointerResolution);

        let err = CdsEditError::ReadOnlyDocument {
            uri: "file:///ghost.cds".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Document);
    }
}

//! Error types for FlatDB
//!
//! This module defines all error types used throughout the storage and query engine.

use std::fmt;
use thiserror::Error;

/// The main error type for FlatDB
#[derive(Error, Debug)]
pub enum Error {
    // ========== Lexer Errors ==========
    #[error("Lexer error: unexpected character '{0}' at position {1}")]
    UnexpectedCharacter(char, usize),

    #[error("Lexer error: unterminated string literal starting at position {0}")]
    UnterminatedString(usize),

    // ========== Parser Errors ==========
    #[error("Parse error: unexpected token '{found}', expected {expected}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Predicate error: malformed condition '{0}', expected column = value")]
    MalformedPredicate(String),

    // ========== Schema Errors ==========
    #[error("Schema error: {0}")]
    InvalidSchema(String),

    #[error("Schema error: table '{0}' not found")]
    TableNotFound(String),

    #[error("Schema error: column '{0}' not found in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("Schema error: table '{table}' expects {expected} values, got {found}")]
    ArityMismatch {
        table: String,
        expected: usize,
        found: usize,
    },

    // ========== Storage Errors ==========
    #[error("Storage error: malformed segment '{path}': {reason}")]
    MalformedSegment { path: String, reason: String },

    #[error("Storage error: segment {segment} of table '{table}' failed: {source}")]
    SegmentFailed {
        table: String,
        segment: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("Storage error: corrupted primary key sequence '{0}'")]
    CorruptedSequence(String),

    // ========== I/O Errors ==========
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    // ========== Execution Errors ==========
    #[error("Execution error: operation cancelled")]
    Cancelled,
}

/// Coarse classification of an [`Error`], used by callers to decide how to
/// report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown table or column, arity mismatch, invalid schema file
    SchemaViolation,
    /// Unreadable or corrupt segment / sequence file
    MalformedSegment,
    /// Unparsable command or WHERE term
    PredicateSyntax,
    /// Filesystem error opening, creating, or writing
    IoFailure,
    /// Operation interrupted between segments
    Cancelled,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnexpectedCharacter(..)
            | Error::UnterminatedString(_)
            | Error::UnexpectedToken { .. }
            | Error::MalformedPredicate(_) => ErrorKind::PredicateSyntax,
            Error::InvalidSchema(_)
            | Error::TableNotFound(_)
            | Error::ColumnNotFound(..)
            | Error::ArityMismatch { .. } => ErrorKind::SchemaViolation,
            Error::MalformedSegment { .. } | Error::CorruptedSequence(_) => {
                ErrorKind::MalformedSegment
            }
            Error::SegmentFailed { source, .. } => source.kind(),
            Error::IoError(_) => ErrorKind::IoFailure,
            Error::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Check if this error is a schema violation
    pub fn is_schema_violation(&self) -> bool {
        self.kind() == ErrorKind::SchemaViolation
    }

    pub(crate) fn malformed_segment(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Error::MalformedSegment {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::SchemaViolation => write!(f, "schema violation"),
            ErrorKind::MalformedSegment => write!(f, "malformed segment"),
            ErrorKind::PredicateSyntax => write!(f, "predicate syntax error"),
            ErrorKind::IoFailure => write!(f, "I/O failure"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result type alias for FlatDB operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TableNotFound("users".to_string());
        assert_eq!(err.to_string(), "Schema error: table 'users' not found");

        let err = Error::UnexpectedCharacter('@', 5);
        assert_eq!(
            err.to_string(),
            "Lexer error: unexpected character '@' at position 5"
        );
    }

    #[test]
    fn test_error_kind() {
        let err = Error::ArityMismatch {
            table: "users".to_string(),
            expected: 3,
            found: 2,
        };
        assert!(err.is_schema_violation());

        let err = Error::SegmentFailed {
            table: "users".to_string(),
            segment: 2,
            source: Box::new(Error::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            ))),
        };
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert!(err.to_string().contains("segment 2"));
    }
}

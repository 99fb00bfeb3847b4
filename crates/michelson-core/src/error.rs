//! Error types for the Michelson parser
//!
//! All fallible operations return `Result<T, Error>`.
//! Every failure carries the furthest source position the parser reached.

use serde::{Deserialize, Serialize};

/// Position in source text for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Span {
    /// Position of the first character of a buffer
    pub fn start() -> Self {
        Span {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Flavour of a syntax error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyntaxErrorKind {
    /// No grammar alternative matched
    Grammar,
    /// A sigil was present but the annotation body was malformed
    Annotation,
}

/// Parser error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Character that cannot start any token, or a malformed string/comment
    #[error("Lex error at {span}: {message}")]
    LexError { span: Span, message: String },

    /// Every alternative at a grammar choice point failed
    #[error("Syntax error at {span}: expected {}", expected.join(", "))]
    SyntaxError {
        span: Span,
        expected: Vec<String>,
        kind: SyntaxErrorKind,
    },

    /// Well-formed token with an invalid literal payload (odd-length hex)
    #[error("Literal format error at {span}: {message}")]
    LiteralFormatError { span: Span, message: String },

    /// Nesting went deeper than `ParseOptions::max_depth`
    #[error("Nesting depth limit of {limit} exceeded at {span}")]
    DepthLimitExceeded { span: Span, limit: usize },

    /// Invalid parse options document
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// AST could not be encoded for hashing
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Source position of the failure, if it has one
    pub fn span(&self) -> Option<Span> {
        match self {
            Error::LexError { span, .. }
            | Error::SyntaxError { span, .. }
            | Error::LiteralFormatError { span, .. }
            | Error::DepthLimitExceeded { span, .. } => Some(*span),
            Error::ConfigError(_) | Error::SerializationError(_) => None,
        }
    }

    /// Short machine-readable name of the error kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::LexError { .. } => "lex",
            Error::SyntaxError {
                kind: SyntaxErrorKind::Annotation,
                ..
            } => "annotation",
            Error::SyntaxError { .. } => "syntax",
            Error::LiteralFormatError { .. } => "literal",
            Error::DepthLimitExceeded { .. } => "depth",
            Error::ConfigError(_) => "config",
            Error::SerializationError(_) => "serialization",
        }
    }

    /// True for grammar failures, annotation format errors included
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, Error::SyntaxError { .. })
    }
}

/// Result type alias for parser operations
pub type Result<T> = std::result::Result<T, Error>;

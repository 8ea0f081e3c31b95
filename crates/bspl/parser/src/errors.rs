//! Parser error types

use bspl_types::ValidationError;

/// Errors that can occur while tokenizing, parsing or compiling a protocol
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum BsplError {
    #[error("Unexpected character '{ch}' at line {line}, column {col}")]
    Tokenize { ch: char, line: usize, col: usize },

    #[error("Line {line}: expected {expected} but found '{found}'")]
    Parse {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("Unexpected end of input: expected {0}")]
    UnexpectedEof(String),

    #[error("Invalid parameter definition {group:?}: {message}")]
    Param { group: Vec<String>, message: String },

    #[error("Line {line}: '{word}' is a reserved word and cannot be used as a name")]
    Reserved { word: String, line: usize },

    #[error("Line {line}: role '{role}' is declared more than once")]
    DuplicateRole { role: String, line: usize },

    #[error("Invalid lexer rules: {0}")]
    Rules(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{source} (after {consumed:?})")]
    Global {
        consumed: Vec<String>,
        source: Box<BsplError>,
    },
}

impl BsplError {
    /// The underlying failure, looking through the diagnostic wrapper
    pub fn cause(&self) -> &BsplError {
        match self {
            Self::Global { source, .. } => source.cause(),
            other => other,
        }
    }

    /// Token values consumed before the failure, when known
    pub fn consumed(&self) -> &[String] {
        match self {
            Self::Global { consumed, .. } => consumed,
            _ => &[],
        }
    }
}

/// Result type alias for parser operations
pub type BsplResult<T> = Result<T, BsplError>;

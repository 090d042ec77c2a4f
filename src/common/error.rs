//! Error types for pageforge.

use thiserror::Error;

/// Convenient Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A source position, 1-based, used to anchor lex/parse/semantic errors
/// to the offending token whenever one is derivable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// All possible errors raised while compiling or executing a statement.
#[derive(Debug, Error)]
pub enum Error {
    /// Illegal or unterminated lexeme.
    #[error("lex error at {position}: {message}")]
    Lex {
        message: String,
        position: Position,
        expected: Option<String>,
    },

    /// Unexpected token during parsing.
    #[error("parse error at {position}: {message}")]
    Parse {
        message: String,
        position: Position,
        expected: Option<String>,
    },

    /// Name resolution, arity, or type error during semantic analysis.
    #[error("semantic error: {message}")]
    Semantic {
        message: String,
        position: Option<Position>,
    },

    /// I/O failure, page overflow, or catalog conflict encountered while
    /// executing an already-validated plan.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// I/O failure from the disk manager.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A page's JSON envelope failed to serialize or deserialize.
    #[error("page encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl Error {
    pub fn lex(message: impl Into<String>, position: Position) -> Self {
        Error::Lex {
            message: message.into(),
            position,
            expected: None,
        }
    }

    pub fn lex_expected(message: impl Into<String>, position: Position, expected: impl Into<String>) -> Self {
        Error::Lex {
            message: message.into(),
            position,
            expected: Some(expected.into()),
        }
    }

    pub fn parse(message: impl Into<String>, position: Position) -> Self {
        Error::Parse {
            message: message.into(),
            position,
            expected: None,
        }
    }

    pub fn parse_expected(message: impl Into<String>, position: Position, expected: impl Into<String>) -> Self {
        Error::Parse {
            message: message.into(),
            position,
            expected: Some(expected.into()),
        }
    }

    pub fn semantic(message: impl Into<String>) -> Self {
        Error::Semantic {
            message: message.into(),
            position: None,
        }
    }

    pub fn semantic_at(message: impl Into<String>, position: Position) -> Self {
        Error::Semantic {
            message: message.into(),
            position: Some(position),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Error::Runtime(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_position() {
        let err = Error::lex("unterminated string", Position::new(3, 7));
        let text = format!("{}", err);
        assert!(text.contains("line 3, column 7"));
        assert!(text.contains("unterminated string"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_semantic_without_position() {
        let err = Error::semantic("table 'ghost' does not exist");
        assert_eq!(format!("{}", err), "semantic error: table 'ghost' does not exist");
    }
}

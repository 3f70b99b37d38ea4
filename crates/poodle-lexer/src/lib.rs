//! Poodle Lexer
//!
//! Tokenizes `.poo` template sources into a stream of located tokens.
//! Handles indentation-based structure, tag lines, class/ID shortcuts,
//! attribute lists, inline text with `@` interpolation, comments, keywords,
//! and block Go code. Embedded Go expressions are delimited with the
//! sub-lexer in [`goscan`].
//!
//! # Example
//!
//! ```
//! use poodle_lexer::{Scanner, TokenKind};
//!
//! let tokens = Scanner::tokenize("", "empty.poo").unwrap();
//! assert_eq!(tokens.len(), 1); // Just EOF
//! assert_eq!(tokens[0].kind, TokenKind::Eof);
//! ```

pub mod goscan;
pub mod scanner;
pub mod token;

pub use scanner::Scanner;
pub use token::{is_void_element, Location, Situated, Token, TokenKind};

/// Lexer error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} at {location}")]
pub struct LexerError {
    pub kind: LexerErrorKind,
    pub location: Location,
}

/// The failure cases the scanner can hit.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexerErrorKind {
    #[error("mixed tabs and spaces in indentation")]
    MixedIndentation,

    #[error("unexpected indentation")]
    UnexpectedIndentation,

    #[error("expected {expected}, found {found:?}")]
    UnexpectedChar { found: char, expected: String },

    #[error("unexpected end of file, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("expected a Go expression")]
    ExpectedExpression,

    #[error("scan Go code: {0}")]
    GoScan(String),
}

impl Situated for LexerError {
    fn location(&self) -> Location {
        self.location.clone()
    }

    fn message(&self) -> String {
        self.kind.to_string()
    }
}

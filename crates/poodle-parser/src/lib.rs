//! Poodle Parser
//!
//! Parses a token stream into an Abstract Syntax Tree. Includes are
//! resolved through a loader callback so the workspace can cache parsed
//! files and detect cycles; host-language expressions stay textual and are
//! re-emitted by the generator.

pub mod ast;
pub mod parser;

pub use ast::File;
pub use parser::Parser;

use poodle_lexer::{Location, Situated};

/// The error type include loaders may return.
pub type LoadError = Box<dyn std::error::Error + Send + Sync>;

/// Parser error with position information.
#[derive(Debug, thiserror::Error)]
#[error("{kind} at {location}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub location: Location,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("expected {expected}, found {got}")]
    UnexpectedToken { got: String, expected: String },

    #[error("unexpected indentation")]
    UnexpectedIndentation,

    #[error("unknown doctype {value:?}")]
    UnknownDoctype { value: String },

    #[error("unexpected else without a matching if")]
    ElseWithoutIf,

    #[error("include {path:?}: {source}")]
    Include {
        path: String,
        #[source]
        source: LoadError,
    },
}

impl Situated for ParseError {
    fn location(&self) -> Location {
        self.location.clone()
    }

    fn message(&self) -> String {
        self.kind.to_string()
    }
}

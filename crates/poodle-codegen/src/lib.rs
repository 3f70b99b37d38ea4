//! Poodle Code Generator
//!
//! Walks a parsed template and emits a Go source file whose exported
//! function renders the template into a `*bufio.Writer`. Mixin calls are
//! inlined at the call site with arity and recursion checks.
//!
//! ```text
//! File AST → generate() → Go source text
//! ```

mod generator;
mod output_writer;

pub use generator::generate;

use poodle_lexer::{Location, Situated};

/// Code generation options, passed explicitly from the driver.
#[derive(Debug, Clone)]
pub struct Options {
    /// Package name declared at the head of the generated file.
    pub package: String,
    /// Upper-case the first letter of the template function name.
    pub force_export: bool,
}

/// Code generation error with position information.
#[derive(Debug, thiserror::Error)]
#[error("{kind} at {location}")]
pub struct CodegenError {
    pub kind: CodegenErrorKind,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodegenErrorKind {
    #[error("mixin {name:?} not found")]
    MixinNotFound { name: String },

    #[error("recursive mixins are not allowed")]
    RecursiveMixin,

    #[error("mixin {name:?} needs {want} arguments but {got} were passed")]
    MixinArity {
        name: String,
        want: usize,
        got: usize,
    },
}

impl Situated for CodegenError {
    fn location(&self) -> Location {
        self.location.clone()
    }

    fn message(&self) -> String {
        self.kind.to_string()
    }
}

//! Poodle Editor Service
//!
//! The editor-facing side of the compiler: an open-document store plus the
//! adapter that turns pipeline errors into LSP diagnostics. The JSON-RPC
//! framing lives outside this crate; a language-server frontend calls
//! [`EditorService::open`] / [`EditorService::change`] and publishes
//! whatever diagnostics come back.

use std::collections::HashMap;
use std::path::PathBuf;

use lsp_types::{Diagnostic, DiagnosticSeverity, Position, Range, Url};
use poodle_lexer::{Scanner, TokenKind};
use poodle_workspace::Workspace;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid document uri scheme {scheme:?}")]
    InvalidScheme { scheme: String },

    #[error("document {uri} is not open")]
    NotOpen { uri: Url },

    #[error("document uri {uri} has no local path")]
    NoPath { uri: Url },
}

/// Tracks open documents and produces diagnostics for each change.
///
/// A fresh workspace is built per check so one document's includes never
/// contaminate another's cache.
#[derive(Default)]
pub struct EditorService {
    documents: HashMap<Url, String>,
}

impl EditorService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly opened document and check it. Only `file:` URIs
    /// are accepted.
    pub fn open(&mut self, uri: Url, text: String) -> Result<Vec<Diagnostic>, DocumentError> {
        if uri.scheme() != "file" {
            return Err(DocumentError::InvalidScheme {
                scheme: uri.scheme().to_string(),
            });
        }
        self.documents.insert(uri.clone(), text);
        self.check(&uri)
    }

    /// Replace a document's contents and re-check it.
    pub fn change(&mut self, uri: &Url, text: String) -> Result<Vec<Diagnostic>, DocumentError> {
        if !self.documents.contains_key(uri) {
            return Err(DocumentError::NotOpen { uri: uri.clone() });
        }
        self.documents.insert(uri.clone(), text);
        self.check(uri)
    }

    pub fn close(&mut self, uri: &Url) {
        self.documents.remove(uri);
    }

    fn check(&self, uri: &Url) -> Result<Vec<Diagnostic>, DocumentError> {
        let path: PathBuf = uri
            .to_file_path()
            .map_err(|()| DocumentError::NoPath { uri: uri.clone() })?;
        let dir = path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_default();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| DocumentError::NoPath { uri: uri.clone() })?;
        let contents = &self.documents[uri];

        // unsaved buffer contents stand in for the on-disk file; includes
        // still resolve against the document's directory
        let mut ws = Workspace::new(dir);
        match ws.load_with_contents(&file_name, contents) {
            Ok(_) => Ok(Vec::new()),
            Err(err) => Ok(vec![diagnostic_for(&err)]),
        }
    }
}

/// Map a load failure onto an LSP diagnostic. Positional errors get a
/// zero-width range at the failure location; anything else degrades to a
/// file-level diagnostic at the top of the document.
pub fn diagnostic_for(err: &poodle_workspace::Error) -> Diagnostic {
    let (range, message) = match err.location() {
        Some(loc) => {
            let pos = Position::new(loc.line as u32, loc.column as u32);
            (Range::new(pos, pos), err.message())
        }
        None => (Range::default(), err.to_string()),
    };
    Diagnostic {
        range,
        severity: Some(DiagnosticSeverity::ERROR),
        message,
        ..Default::default()
    }
}

/// The token-type legend [`semantic_tokens`] encodes against.
pub const SEMANTIC_TOKEN_TYPES: &[&str] = &["keyword", "string"];

/// Encode the lexer's view of a document as LSP semantic-token deltas
/// (line delta, start delta, length, type index, modifiers). Documents
/// that fail to lex highlight nothing.
pub fn semantic_tokens(contents: &str, file_name: &str) -> Vec<u32> {
    let Ok(tokens) = Scanner::tokenize(contents, file_name) else {
        return Vec::new();
    };

    let mut data = Vec::new();
    let mut prev_line = 0usize;
    let mut prev_col = 0usize;

    for tk in &tokens {
        let token_type: u32 = match tk.kind {
            TokenKind::Keyword | TokenKind::Identifier => 0,
            TokenKind::AttributeName | TokenKind::ClassName | TokenKind::QuotedString => 1,
            _ => continue,
        };

        let line_delta = tk.start.line - prev_line;
        let start_delta = if tk.start.line == prev_line {
            tk.start.column - prev_col
        } else {
            tk.start.column
        };
        data.extend([
            line_delta as u32,
            start_delta as u32,
            tk.contents.chars().count() as u32,
            token_type,
            0,
        ]);
        prev_line = tk.start.line;
        prev_col = tk.start.column;
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn file_uri(dir: &tempfile::TempDir, name: &str) -> Url {
        Url::from_file_path(dir.path().join(name)).unwrap()
    }

    #[test]
    fn test_valid_document_has_no_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = EditorService::new();
        let diags = service
            .open(file_uri(&dir, "ok.poo"), "div Hello".to_string())
            .unwrap();
        assert!(diags.is_empty());
    }

    #[test]
    fn test_parse_error_becomes_positioned_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = EditorService::new();
        let diags = service
            .open(
                file_uri(&dir, "bad.poo"),
                "div\ndoctype transitional".to_string(),
            )
            .unwrap();
        assert_eq!(diags.len(), 1);
        let diag = &diags[0];
        assert_eq!(diag.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diag.range.start.line, 1);
        assert_eq!(diag.range.start, diag.range.end);
        assert!(diag.message.contains("unknown doctype"));
    }

    #[test]
    fn test_change_rechecks_document() {
        let dir = tempfile::tempdir().unwrap();
        let uri = file_uri(&dir, "doc.poo");
        let mut service = EditorService::new();

        let diags = service
            .open(uri.clone(), "doctype nope".to_string())
            .unwrap();
        assert_eq!(diags.len(), 1);

        let diags = service.change(&uri, "doctype 5".to_string()).unwrap();
        assert!(diags.is_empty());
    }

    #[test]
    fn test_unsaved_buffer_wins_over_disk() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("doc.poo"), "doctype nope").unwrap();
        let mut service = EditorService::new();
        let diags = service
            .open(file_uri(&dir, "doc.poo"), "div Fixed".to_string())
            .unwrap();
        assert!(diags.is_empty());
    }

    #[test]
    fn test_include_resolves_against_document_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("partial.poo"), "span").unwrap();
        let mut service = EditorService::new();
        let diags = service
            .open(
                file_uri(&dir, "page.poo"),
                "include partial\ndiv".to_string(),
            )
            .unwrap();
        assert!(diags.is_empty(), "got: {diags:?}");
    }

    #[test]
    fn test_non_file_uri_rejected() {
        let mut service = EditorService::new();
        let uri = Url::parse("untitled:Untitled-1").unwrap();
        let err = service.open(uri, "div".to_string()).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::InvalidScheme { ref scheme } if scheme == "untitled"
        ));
    }

    #[test]
    fn test_change_requires_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = EditorService::new();
        let err = service
            .change(&file_uri(&dir, "ghost.poo"), "div".to_string())
            .unwrap_err();
        assert!(matches!(err, DocumentError::NotOpen { .. }));
    }

    #[test]
    fn test_non_positional_error_has_no_range() {
        let err = poodle_workspace::Error::Cycle {
            path: "a.poo".to_string(),
        };
        let diag = diagnostic_for(&err);
        assert_eq!(diag.range, Range::default());
        assert!(diag.message.contains("detected include cycle"));
    }

    #[test]
    fn test_semantic_tokens_deltas() {
        // div(href="x")
        //  -> div (type 0), href (type 1), "x" (type 1)
        let data = semantic_tokens("div(href=\"x\")", "doc.poo");
        assert_eq!(data.len(), 15);
        assert_eq!(&data[0..5], &[0, 0, 3, 0, 0]); // div
        assert_eq!(&data[5..10], &[0, 4, 4, 1, 0]); // href
        assert_eq!(&data[10..15], &[0, 5, 3, 1, 0]); // "x"
    }

    #[test]
    fn test_semantic_tokens_on_broken_source_is_empty() {
        assert!(semantic_tokens("div\n\t span", "doc.poo").is_empty());
    }
}

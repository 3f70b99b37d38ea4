//! Poodle Workspace
//!
//! Maps relative paths to parsed files. Loads are memoized: the same path
//! always returns the same shared `File`, so every `include` edge in a
//! file's transitive closure points at one parse. A per-load visiting set
//! catches include cycles, and all failures are wrapped with the stage
//! they happened in ("read file", "lex file", "parse file").

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use poodle_lexer::{Location, Scanner, Situated};
use poodle_parser::ast::File;
use poodle_parser::{LoadError, Parser};

/// A failure while loading a file, tagged with the pipeline stage.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("read file: {source}")]
    Read {
        #[source]
        source: std::io::Error,
    },

    #[error("lex file: {source}")]
    Lex {
        #[source]
        source: poodle_lexer::LexerError,
    },

    #[error("parse file: {source}")]
    Parse {
        #[source]
        source: poodle_parser::ParseError,
    },

    #[error("detected include cycle on {path:?}")]
    Cycle { path: String },
}

impl Error {
    /// The source position of the failure, when the stage has one.
    pub fn location(&self) -> Option<Location> {
        match self {
            Error::Lex { source } => Some(source.location()),
            Error::Parse { source } => Some(source.location()),
            Error::Read { .. } | Error::Cycle { .. } => None,
        }
    }

    /// The stage-local message without the position, for diagnostics.
    pub fn message(&self) -> String {
        match self {
            Error::Lex { source } => source.message(),
            Error::Parse { source } => source.message(),
            other => other.to_string(),
        }
    }
}

/// A root directory with a cache of parsed files.
///
/// One workspace serves one driver at a time; the editor service builds a
/// fresh workspace per document change instead of sharing one.
pub struct Workspace {
    root: PathBuf,
    parsed_files: HashMap<PathBuf, Rc<File>>,
    visiting: HashSet<PathBuf>,
    requested: Vec<String>,
    override_file: Option<(PathBuf, String)>,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            parsed_files: HashMap::new(),
            visiting: HashSet::new(),
            requested: Vec::new(),
            override_file: None,
        }
    }

    /// Load and parse the file at `rel` (relative to the workspace root),
    /// reusing the cached parse when one exists.
    pub fn load(&mut self, rel: &str) -> Result<Rc<File>, Error> {
        self.visiting.clear();
        self.requested.clear();
        self.load_inner(rel)
    }

    /// Like [`Workspace::load`], but reads `rel` from the given buffer
    /// instead of disk. Used for unsaved editor documents; includes still
    /// come from disk.
    pub fn load_with_contents(&mut self, rel: &str, contents: &str) -> Result<Rc<File>, Error> {
        self.visiting.clear();
        self.requested.clear();
        self.override_file = Some((self.root.join(rel), contents.to_string()));
        let result = self.load_inner(rel);
        self.override_file = None;
        result
    }

    /// Every relative path the most recent load traversed, in order.
    pub fn requested_files(&self) -> &[String] {
        &self.requested
    }

    fn load_inner(&mut self, rel: &str) -> Result<Rc<File>, Error> {
        let full = self.root.join(rel);
        self.requested.push(rel.to_string());

        if let Some(file) = self.parsed_files.get(&full) {
            return Ok(Rc::clone(file));
        }
        if self.visiting.contains(&full) {
            return Err(Error::Cycle {
                path: rel.to_string(),
            });
        }
        self.visiting.insert(full.clone());

        let contents = match &self.override_file {
            Some((path, contents)) if *path == full => contents.clone(),
            _ => std::fs::read_to_string(&full).map_err(|source| Error::Read { source })?,
        };

        let tokens = Scanner::tokenize(&contents, rel).map_err(|source| Error::Lex { source })?;

        // include paths are relative to the including file's directory
        let dir = Path::new(rel)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let file = Parser::parse(&tokens, |path: &str| {
            let resolved = if Path::new(path).is_absolute() {
                PathBuf::from(path)
            } else {
                dir.join(path)
            };
            let resolved = resolved.to_string_lossy().into_owned();
            self.load_inner(&resolved)
                .map_err(|e| Box::new(e) as LoadError)
        })
        .map_err(|source| Error::Parse { source })?;

        self.visiting.remove(&full);
        let file = Rc::new(file);
        self.parsed_files.insert(full, Rc::clone(&file));
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn workspace_with(files: &[(&str, &str)]) -> (tempfile::TempDir, Workspace) {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, contents).unwrap();
        }
        let ws = Workspace::new(dir.path());
        (dir, ws)
    }

    #[test]
    fn test_load_parses_file() {
        let (_dir, mut ws) = workspace_with(&[("index.poo", "div Hello")]);
        let file = ws.load("index.poo").unwrap();
        assert_eq!(file.name, "index");
        assert_eq!(file.nodes.len(), 1);
    }

    #[test]
    fn test_load_is_memoized() {
        let (_dir, mut ws) = workspace_with(&[("index.poo", "div")]);
        let first = ws.load("index.poo").unwrap();
        let second = ws.load("index.poo").unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_include_gets_same_instance() {
        let (_dir, mut ws) = workspace_with(&[
            ("page.poo", "include partial\ndiv"),
            ("partial.poo", "span Included"),
        ]);
        let page = ws.load("page.poo").unwrap();
        let partial = ws.load("partial.poo").unwrap();

        let poodle_parser::ast::Node::Include(inc) = &page.nodes[0] else {
            panic!("expected include node");
        };
        assert!(Rc::ptr_eq(&inc.file, &partial));
    }

    #[test]
    fn test_include_relative_to_including_file() {
        let (_dir, mut ws) = workspace_with(&[
            ("pages/home.poo", "include shared\ndiv"),
            ("pages/shared.poo", "span"),
        ]);
        ws.load("pages/home.poo").unwrap();
        let requested: Vec<String> = ws.requested_files().to_vec();
        assert!(requested
            .iter()
            .any(|p| p.replace('\\', "/") == "pages/shared.poo"));
    }

    #[test]
    fn test_requested_files_tracks_traversal() {
        let (_dir, mut ws) = workspace_with(&[
            ("a.poo", "include b\ndiv"),
            ("b.poo", "span"),
        ]);
        ws.load("a.poo").unwrap();
        assert_eq!(ws.requested_files().to_vec(), vec!["a.poo", "b.poo"]);

        // a fresh load resets the traversal
        ws.load("b.poo").unwrap();
        assert_eq!(ws.requested_files().to_vec(), vec!["b.poo"]);
    }

    #[test]
    fn test_include_cycle_detected() {
        let (_dir, mut ws) = workspace_with(&[
            ("a.poo", "include b"),
            ("b.poo", "include a"),
        ]);
        let err = ws.load("a.poo").unwrap_err();
        assert!(
            err.to_string().contains("detected include cycle on \"a.poo\""),
            "unexpected message: {err}"
        );
    }

    #[test]
    fn test_self_include_cycle() {
        let (_dir, mut ws) = workspace_with(&[("a.poo", "include a")]);
        let err = ws.load("a.poo").unwrap_err();
        assert!(err.to_string().contains("detected include cycle"));
    }

    #[test]
    fn test_diamond_include_is_not_a_cycle() {
        let (_dir, mut ws) = workspace_with(&[
            ("a.poo", "include b\ninclude c"),
            ("b.poo", "include d"),
            ("c.poo", "include d"),
            ("d.poo", "span"),
        ]);
        assert!(ws.load("a.poo").is_ok());
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let (_dir, mut ws) = workspace_with(&[]);
        let err = ws.load("nope.poo").unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
        assert!(err.to_string().starts_with("read file:"));
        assert!(err.location().is_none());
    }

    #[test]
    fn test_lex_error_is_wrapped_with_stage() {
        let (_dir, mut ws) = workspace_with(&[("bad.poo", "div\n\t span")]);
        let err = ws.load("bad.poo").unwrap_err();
        assert!(matches!(err, Error::Lex { .. }));
        assert!(err.to_string().starts_with("lex file:"));
        assert!(err.location().is_some());
    }

    #[test]
    fn test_parse_error_is_wrapped_with_stage() {
        let (_dir, mut ws) = workspace_with(&[("bad.poo", "doctype transitional")]);
        let err = ws.load("bad.poo").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().starts_with("parse file:"));
        let loc = err.location().unwrap();
        assert_eq!(loc.line, 0);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let (dir, mut ws) = workspace_with(&[("later.poo", "doctype transitional")]);
        assert!(ws.load("later.poo").is_err());
        fs::write(dir.path().join("later.poo"), "doctype 5").unwrap();
        assert!(ws.load("later.poo").is_ok());
    }

    #[test]
    fn test_load_with_contents_overrides_disk() {
        let (_dir, mut ws) = workspace_with(&[("doc.poo", "div OnDisk")]);
        let file = ws.load_with_contents("doc.poo", "div InBuffer").unwrap();
        let poodle_parser::ast::Node::Tag(tag) = &file.nodes[0] else {
            panic!("expected tag");
        };
        let poodle_parser::ast::Node::Text(text) = &tag.nodes[0] else {
            panic!("expected text");
        };
        assert!(
            matches!(&text.value, poodle_parser::ast::Value::Literal { contents, .. } if contents == "InBuffer")
        );
    }

    #[test]
    fn test_load_with_contents_still_reads_includes_from_disk() {
        let (_dir, mut ws) = workspace_with(&[
            ("doc.poo", "div"),
            ("partial.poo", "span"),
        ]);
        let file = ws
            .load_with_contents("doc.poo", "include partial\ndiv")
            .unwrap();
        assert!(matches!(
            &file.nodes[0],
            poodle_parser::ast::Node::Include(_)
        ));
    }
}

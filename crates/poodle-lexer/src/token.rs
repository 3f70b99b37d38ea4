use std::fmt;

/// A position in a source file, tracking line and column for error reporting.
/// Both are 0-based; `Display` renders them 1-based the way editors show them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line + 1, self.column + 1)
    }
}

/// Token classification for `.poo` source.
///
/// The set is closed: every token the scanner can emit is listed here, and
/// every stream ends with exactly one `Eof`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    NewLine,
    InlineText,
    ImportPath,

    ParenOpen,
    ParenClose,

    Equals,
    Dot,
    Comma,
    Plus,
    Hashtag,
    Colon,
    InterpolationStart,
    QuestionMark,
    ExclamationPoint,
    Pipe,

    CommentStart,
    CommentStartBuffered,
    CommentText,

    ClassName,
    Id,

    Keyword,
    AttributeName,
    QuotedString,

    GoExpr,
    GoBlock,

    Eof,
}

// Used in "expected X, found Y" reporting.
impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Identifier => "identifier",
            Self::NewLine => "newline",
            Self::InlineText => "inline text",
            Self::ImportPath => "import path",
            Self::ParenOpen => "parentheses open",
            Self::ParenClose => "parentheses close",
            Self::Equals => "equals",
            Self::Dot => "dot",
            Self::Comma => "comma",
            Self::Plus => "plus",
            Self::Hashtag => "hashtag",
            Self::Colon => "colon",
            Self::InterpolationStart => "interpolation start",
            Self::QuestionMark => "question mark",
            Self::ExclamationPoint => "exclamation point",
            Self::Pipe => "pipe",
            Self::CommentStart => "comment start",
            Self::CommentStartBuffered => "buffered comment start",
            Self::CommentText => "comment text",
            Self::ClassName => "class name",
            Self::Id => "ID",
            Self::Keyword => "keyword",
            Self::AttributeName => "attribute name",
            Self::QuotedString => "quoted string",
            Self::GoExpr => "Go expression",
            Self::GoBlock => "Go block",
            Self::Eof => "EOF",
        })
    }
}

/// A token produced by the scanner.
///
/// `depth` is the logical indentation level of the line that produced the
/// token; `contents` is the source text the token covers.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: Location,
    pub depth: usize,
    pub contents: String,
}

impl Token {
    pub fn new(kind: TokenKind, start: Location, depth: usize, contents: impl Into<String>) -> Self {
        Self {
            kind,
            start,
            depth,
            contents: contents.into(),
        }
    }
}

/// HTML5 void elements (self-closing, no children).
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Check if a tag name is an HTML5 void element.
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Positional-error capability shared by the pipeline stages.
///
/// Compiling drivers render errors as `{message} at {location}`; the editor
/// service uses the two halves separately to build a diagnostic.
pub trait Situated: std::error::Error {
    /// Where the failure occurred.
    fn location(&self) -> Location;

    /// The failure message without the trailing position.
    fn message(&self) -> String;
}

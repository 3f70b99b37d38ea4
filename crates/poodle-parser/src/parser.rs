//! Recursive-descent parser for `.poo` token streams.
//!
//! The parser walks depth-delimited blocks: a block reader consumes nodes
//! at exactly its target depth, hands shallower tokens back to the caller,
//! and rejects deeper ones. Includes are resolved through a loader callback
//! provided by the workspace.

use std::path::Path;
use std::rc::Rc;

use crate::ast::{
    Attribute, Comment, Doctype, File, GoBlock, GoStatement, Include, MixinArg, MixinCall,
    MixinDef, Node, StatementKeyword, Tag, Text, Value,
};
use crate::{LoadError, ParseError, ParseErrorKind};
use poodle_lexer::{is_void_element, Token, TokenKind};

/// `.poo` document parser.
///
/// Consumes an `Eof`-terminated token slice. Errors past the first are
/// accumulated internally so parsing can continue for editor diagnostics;
/// only the first error is returned.
pub struct Parser<'t, F> {
    tokens: &'t [Token],
    pos: usize,
    args: Vec<String>,
    imports: Vec<String>,
    errors: Vec<ParseError>,
    loader: F,
}

impl<'t, F> Parser<'t, F>
where
    F: FnMut(&str) -> Result<Rc<File>, LoadError>,
{
    /// Parse a token slice into a `File`, resolving includes with `loader`.
    pub fn parse(tokens: &'t [Token], loader: F) -> Result<File, ParseError> {
        assert!(
            matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof),
            "token stream must end with EOF"
        );

        let name = file_base_name(&tokens[0].start.file);
        let mut parser = Parser {
            tokens,
            pos: 0,
            args: Vec::new(),
            imports: Vec::new(),
            errors: Vec::new(),
            loader,
        };
        parser.parse_file(name)
    }

    fn parse_file(&mut self, name: String) -> Result<File, ParseError> {
        let mut nodes = Vec::new();
        let mut last_if: Option<usize> = None;

        loop {
            let tk = self.next().clone();
            match tk.kind {
                TokenKind::Eof => break,
                TokenKind::NewLine => continue,
                _ => {}
            }
            self.rewind();

            if tk.depth != 0 {
                self.errors.push(ParseError {
                    kind: ParseErrorKind::UnexpectedIndentation,
                    location: tk.start,
                });
                self.recover();
                continue;
            }

            match self.parse_node(0) {
                Ok(Some(node)) => {
                    if let Err(e) = chain_node(&mut nodes, &mut last_if, node) {
                        self.errors.push(e);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    self.errors.push(e);
                    self.recover();
                }
            }
        }

        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }

        Ok(File {
            name,
            nodes,
            args: std::mem::take(&mut self.args),
            imports: std::mem::take(&mut self.imports),
        })
    }

    /// Read the child block at exactly `depth`. Shallower tokens are handed
    /// back to the caller; deeper ones are an indentation error.
    fn parse_block(&mut self, depth: usize) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();
        let mut last_if: Option<usize> = None;

        loop {
            let tk = self.next().clone();
            match tk.kind {
                TokenKind::Eof => {
                    self.rewind();
                    break;
                }
                TokenKind::NewLine => continue,
                _ => {}
            }

            if tk.depth < depth {
                self.rewind();
                break;
            }
            if tk.depth > depth {
                return Err(ParseError {
                    kind: ParseErrorKind::UnexpectedIndentation,
                    location: tk.start,
                });
            }
            self.rewind();

            if let Some(node) = self.parse_node(depth)? {
                chain_node(&mut nodes, &mut last_if, node)?;
            }
        }

        Ok(nodes)
    }

    fn parse_node(&mut self, depth: usize) -> Result<Option<Node>, ParseError> {
        let tk = self.peek().clone();
        match tk.kind {
            TokenKind::Keyword => self.parse_keyword(depth),

            TokenKind::Identifier => {
                self.advance();
                self.parse_tag(depth, tk).map(Some)
            }

            // `.class` / `#id` at line start implies a div
            TokenKind::Dot | TokenKind::Hashtag => {
                let implicit = Token {
                    kind: TokenKind::Identifier,
                    start: tk.start.clone(),
                    depth: tk.depth,
                    contents: "div".to_string(),
                };
                self.parse_tag(depth, implicit).map(Some)
            }

            TokenKind::InterpolationStart => self.parse_interpolation(depth).map(Some),
            TokenKind::Pipe => self.parse_pipe_text().map(Some),
            TokenKind::Plus => self.parse_mixin_call().map(Some),

            TokenKind::CommentStart => {
                self.advance();
                if self.peek().kind == TokenKind::CommentText {
                    self.advance();
                }
                self.expect_line_end()?;
                Ok(None)
            }

            TokenKind::CommentStartBuffered => {
                self.advance();
                let text = if self.peek().kind == TokenKind::CommentText {
                    self.next().contents.clone()
                } else {
                    String::new()
                };
                self.expect_line_end()?;
                Ok(Some(Node::Comment(Comment {
                    pos: tk.start,
                    text,
                })))
            }

            _ => Err(self.unexpected(
                &tk,
                if depth == 0 {
                    "a valid top-level node"
                } else {
                    "a valid node"
                },
            )),
        }
    }

    // =========================================================================
    // Keywords
    // =========================================================================

    fn parse_keyword(&mut self, depth: usize) -> Result<Option<Node>, ParseError> {
        let kw = self.next().clone();
        match kw.contents.as_str() {
            "arg" => {
                let t = self.expect(TokenKind::InlineText, "an argument declaration")?;
                self.args.push(t.contents);
                self.expect_line_end()?;
                Ok(None)
            }

            "import" => {
                let t = self.expect(TokenKind::ImportPath, "an import path")?;
                self.imports.push(t.contents);
                self.expect_line_end()?;
                Ok(None)
            }

            "doctype" => {
                let t = self.expect(TokenKind::InlineText, "a doctype")?;
                // `5` is the only defined shorthand
                let value = match t.contents.as_str() {
                    "5" => "html".to_string(),
                    _ => {
                        return Err(ParseError {
                            kind: ParseErrorKind::UnknownDoctype { value: t.contents },
                            location: t.start,
                        });
                    }
                };
                self.expect_line_end()?;
                Ok(Some(Node::Doctype(Doctype {
                    pos: kw.start,
                    value,
                })))
            }

            "include" => self.parse_include(kw).map(Some),
            "mixin" => self.parse_mixin_def(depth, kw).map(Some),

            _ => Err(self.unexpected(&kw, "a known keyword")),
        }
    }

    fn parse_include(&mut self, kw: Token) -> Result<Node, ParseError> {
        let t = self.expect(TokenKind::ImportPath, "an include path")?;
        let mut path = t.contents.clone();
        if !path.contains('.') {
            path.push_str(".poo");
        }

        let file = (self.loader)(&path).map_err(|source| ParseError {
            kind: ParseErrorKind::Include {
                path: path.clone(),
                source,
            },
            location: t.start.clone(),
        })?;

        // the included file's parameters and imports become ours
        self.args.extend(file.args.iter().cloned());
        self.imports.extend(file.imports.iter().cloned());

        self.expect_line_end()?;
        Ok(Node::Include(Include {
            pos: kw.start,
            path,
            file,
        }))
    }

    // =========================================================================
    // Mixins
    // =========================================================================

    fn parse_mixin_def(&mut self, depth: usize, kw: Token) -> Result<Node, ParseError> {
        let name = self.expect(TokenKind::Identifier, "a mixin name")?;

        let mut args = Vec::new();
        if self.peek().kind == TokenKind::ParenOpen {
            self.advance();
            loop {
                match self.peek().kind {
                    TokenKind::ParenClose => {
                        self.advance();
                        break;
                    }
                    TokenKind::InlineText => {
                        let t = self.next().clone();
                        let mut parts = t.contents.split_whitespace();
                        let arg_name = parts.next().unwrap_or_default().to_string();
                        let typ = parts.collect::<Vec<_>>().join(" ");
                        args.push(MixinArg {
                            name: arg_name,
                            typ,
                        });
                        if self.peek().kind == TokenKind::Comma {
                            self.advance();
                        }
                    }
                    _ => {
                        let t = self.peek().clone();
                        return Err(self.unexpected(&t, "a mixin argument"));
                    }
                }
            }
        }

        self.expect_line_end()?;
        let nodes = self.parse_block(depth + 1)?;
        Ok(Node::MixinDef(MixinDef {
            pos: kw.start,
            name: name.contents,
            args,
            nodes,
        }))
    }

    fn parse_mixin_call(&mut self) -> Result<Node, ParseError> {
        let plus = self.next().clone();
        let name = self.expect(TokenKind::Identifier, "a mixin name")?;

        let mut args = Vec::new();
        if self.peek().kind == TokenKind::ParenOpen {
            self.advance();
            loop {
                match self.peek().kind {
                    TokenKind::ParenClose => {
                        self.advance();
                        break;
                    }
                    TokenKind::GoExpr => {
                        args.push(self.next().contents.clone());
                        if self.peek().kind == TokenKind::Comma {
                            self.advance();
                        }
                    }
                    _ => {
                        let t = self.peek().clone();
                        return Err(self.unexpected(&t, "a mixin argument"));
                    }
                }
            }
        }

        self.expect_line_end()?;
        Ok(Node::MixinCall(MixinCall {
            pos: plus.start,
            name: name.contents,
            args,
        }))
    }

    // =========================================================================
    // Statements, blocks, text
    // =========================================================================

    fn parse_interpolation(&mut self, depth: usize) -> Result<Node, ParseError> {
        let at = self.next().clone();

        match self.peek().kind {
            TokenKind::GoBlock => {
                let t = self.next().clone();
                self.expect_line_end()?;
                Ok(Node::GoBlock(GoBlock {
                    pos: at.start,
                    contents: t.contents,
                }))
            }

            TokenKind::Keyword => {
                let kw = self.next().clone();
                let keyword = match kw.contents.as_str() {
                    "if" => StatementKeyword::If,
                    "for" => StatementKeyword::For,
                    "else" => StatementKeyword::Else,
                    _ => return Err(self.unexpected(&kw, "if, else or for")),
                };
                let argument = if keyword == StatementKeyword::Else {
                    String::new()
                } else {
                    self.expect(TokenKind::GoExpr, "a Go expression")?.contents
                };
                self.expect_line_end()?;
                let nodes = self.parse_block(depth + 1)?;
                Ok(Node::GoStatement(GoStatement {
                    pos: at.start,
                    keyword,
                    argument,
                    nodes,
                    has_else: false,
                }))
            }

            // a bare `@expr` line is a text node
            TokenKind::ExclamationPoint | TokenKind::GoExpr => {
                let escape_html = if self.peek().kind == TokenKind::ExclamationPoint {
                    self.advance();
                    false
                } else {
                    true
                };
                let e = self.expect(TokenKind::GoExpr, "a Go expression")?;
                self.expect_line_end()?;
                Ok(Node::Text(Text {
                    pos: at.start,
                    value: Value::GoExpr {
                        pos: e.start,
                        contents: e.contents,
                        escape_html,
                    },
                }))
            }

            _ => {
                let t = self.peek().clone();
                Err(self.unexpected(&t, "a Go statement, block or expression"))
            }
        }
    }

    fn parse_pipe_text(&mut self) -> Result<Node, ParseError> {
        let pipe = self.next().clone();

        match self.peek().kind {
            // a lone pipe is an explicit line break in the output
            TokenKind::NewLine | TokenKind::Eof => {
                self.expect_line_end()?;
                Ok(Node::Text(Text {
                    pos: pipe.start.clone(),
                    value: Value::Literal {
                        pos: pipe.start,
                        contents: "\n".to_string(),
                    },
                }))
            }
            _ => {
                let value = self.parse_inline_value()?;
                self.expect_line_end()?;
                Ok(Node::Text(Text {
                    pos: pipe.start,
                    value,
                }))
            }
        }
    }

    /// Inline text pieces mixed with interpolated expressions, folded into
    /// a `Concat` chain.
    fn parse_inline_value(&mut self) -> Result<Value, ParseError> {
        let mut value: Option<Value> = None;

        loop {
            match self.peek().kind {
                TokenKind::InlineText => {
                    let t = self.next().clone();
                    value = Some(join_value(
                        value,
                        Value::Literal {
                            pos: t.start,
                            contents: t.contents,
                        },
                    ));
                }
                TokenKind::InterpolationStart => {
                    self.advance();
                    let escape_html = if self.peek().kind == TokenKind::ExclamationPoint {
                        self.advance();
                        false
                    } else {
                        true
                    };
                    let e = self.expect(TokenKind::GoExpr, "a Go expression")?;
                    value = Some(join_value(
                        value,
                        Value::GoExpr {
                            pos: e.start,
                            contents: e.contents,
                            escape_html,
                        },
                    ));
                }
                _ => break,
            }
        }

        value.ok_or_else(|| {
            let t = self.peek().clone();
            self.unexpected(&t, "inline text")
        })
    }

    // =========================================================================
    // Tags
    // =========================================================================

    fn parse_tag(&mut self, depth: usize, name_tk: Token) -> Result<Node, ParseError> {
        let pos = name_tk.start.clone();
        let name = name_tk.contents;

        let mut classes: Vec<String> = Vec::new();
        let mut id: Option<Token> = None;
        let mut attributes: Vec<Attribute> = Vec::new();
        let mut nodes: Vec<Node> = Vec::new();

        loop {
            match self.peek().kind {
                TokenKind::Dot => {
                    self.advance();
                    let c = self.expect(TokenKind::ClassName, "a class name")?;
                    classes.push(c.contents);
                }

                TokenKind::Hashtag => {
                    self.advance();
                    let i = self.expect(TokenKind::Id, "an ID")?;
                    if id.is_none() {
                        id = Some(i);
                    }
                }

                TokenKind::ParenOpen => {
                    self.advance();
                    self.parse_attributes(&mut attributes)?;
                }

                // `tag:` swallows the deeper lines as one literal text child
                TokenKind::Colon => {
                    let colon = self.next().clone();
                    if self.peek().kind == TokenKind::NewLine {
                        self.advance();
                    }
                    let mut lines = Vec::new();
                    while self.peek().kind == TokenKind::InlineText
                        && self.peek().depth == depth + 1
                    {
                        lines.push(self.next().contents.clone());
                        if self.peek().kind == TokenKind::NewLine {
                            self.advance();
                        }
                    }
                    nodes.push(Node::Text(Text {
                        pos: colon.start.clone(),
                        value: Value::Literal {
                            pos: colon.start,
                            contents: lines.join("\n"),
                        },
                    }));
                    break;
                }

                TokenKind::NewLine => {
                    self.advance();
                    let children = self.parse_block(depth + 1)?;
                    nodes.extend(children);
                    break;
                }

                TokenKind::Eof => break,

                TokenKind::InlineText | TokenKind::InterpolationStart => {
                    let value = self.parse_inline_value()?;
                    nodes.push(Node::Text(Text {
                        pos: value.position().clone(),
                        value,
                    }));
                }

                _ => {
                    let t = self.peek().clone();
                    return Err(self.unexpected(&t, "a tag suffix"));
                }
            }
        }

        // merge shortcut classes into an explicit class attribute
        if !classes.is_empty() {
            let joined = classes.join(" ");
            if let Some(attr) = attributes.iter_mut().find(|a| a.name == "class") {
                let old = attr.value.clone();
                attr.value = Value::concat(
                    old,
                    Value::Literal {
                        pos: attr.pos.clone(),
                        contents: format!(" {joined}"),
                    },
                );
            } else {
                attributes.push(Attribute {
                    pos: pos.clone(),
                    name: "class".to_string(),
                    value: Value::Literal {
                        pos: pos.clone(),
                        contents: joined,
                    },
                    condition: None,
                });
            }
        }

        // the id shortcut yields only when no explicit id attribute exists
        if let Some(id_tk) = id {
            if !attributes.iter().any(|a| a.name == "id") {
                attributes.push(Attribute {
                    pos: id_tk.start.clone(),
                    name: "id".to_string(),
                    value: Value::Literal {
                        pos: id_tk.start,
                        contents: id_tk.contents,
                    },
                    condition: None,
                });
            }
        }

        let self_closing = is_void_element(&name);
        if self_closing {
            nodes.clear();
        }

        Ok(Node::Tag(Tag {
            pos,
            name,
            attributes,
            nodes,
            self_closing,
        }))
    }

    fn parse_attributes(&mut self, attributes: &mut Vec<Attribute>) -> Result<(), ParseError> {
        loop {
            match self.peek().kind {
                TokenKind::ParenClose => {
                    self.advance();
                    return Ok(());
                }

                TokenKind::AttributeName => {
                    let name_tk = self.next().clone();

                    let mut condition = None;
                    if self.peek().kind == TokenKind::QuestionMark {
                        self.advance();
                        condition =
                            Some(self.expect(TokenKind::GoExpr, "a Go expression")?.contents);
                    }

                    let value = if self.peek().kind == TokenKind::Equals {
                        self.advance();
                        self.parse_attribute_value()?
                    } else {
                        // boolean attribute: the value is the name itself
                        Value::Literal {
                            pos: name_tk.start.clone(),
                            contents: name_tk.contents.clone(),
                        }
                    };

                    attributes.push(Attribute {
                        pos: name_tk.start,
                        name: name_tk.contents,
                        value,
                        condition,
                    });
                }

                _ => {
                    let t = self.peek().clone();
                    return Err(self.unexpected(&t, "an attribute name"));
                }
            }
        }
    }

    /// Quoted strings and bare expressions back to back concatenate.
    fn parse_attribute_value(&mut self) -> Result<Value, ParseError> {
        let mut value: Option<Value> = None;

        loop {
            match self.peek().kind {
                TokenKind::QuotedString => {
                    let t = self.next().clone();
                    value = Some(join_value(
                        value,
                        Value::Literal {
                            pos: t.start,
                            contents: strip_quotes(&t.contents),
                        },
                    ));
                }
                TokenKind::GoExpr => {
                    let t = self.next().clone();
                    value = Some(join_value(
                        value,
                        Value::GoExpr {
                            pos: t.start,
                            contents: t.contents,
                            escape_html: true,
                        },
                    ));
                }
                _ => break,
            }
        }

        value.ok_or_else(|| {
            let t = self.peek().clone();
            self.unexpected(&t, "an attribute value")
        })
    }

    // =========================================================================
    // Token navigation
    // =========================================================================

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn next(&mut self) -> &Token {
        let idx = self.pos.min(self.tokens.len() - 1);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        &self.tokens[idx]
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn rewind(&mut self) {
        assert!(
            self.pos > 0,
            "cannot rewind past the start of the token stream"
        );
        self.pos -= 1;
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        let tk = self.next().clone();
        if tk.kind != kind {
            return Err(self.unexpected(&tk, expected));
        }
        Ok(tk)
    }

    fn expect_line_end(&mut self) -> Result<(), ParseError> {
        match self.peek().kind {
            TokenKind::NewLine => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => {
                let t = self.peek().clone();
                Err(self.unexpected(&t, "end of line"))
            }
        }
    }

    fn unexpected(&self, tk: &Token, expected: &str) -> ParseError {
        let got = if tk.contents.is_empty() {
            tk.kind.to_string()
        } else {
            format!("{:?}", tk.contents)
        };
        ParseError {
            kind: ParseErrorKind::UnexpectedToken {
                got,
                expected: expected.to_string(),
            },
            location: tk.start.clone(),
        }
    }

    /// Skip to just past the next line break so parsing can continue after
    /// an error.
    fn recover(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Eof => break,
                TokenKind::NewLine => {
                    self.advance();
                    break;
                }
                _ => self.advance(),
            }
        }
    }
}

/// Append `node`, maintaining the pending-if chain: an `if` is remembered,
/// an immediately following `else` marks it, and any other node clears it.
fn chain_node(
    nodes: &mut Vec<Node>,
    last_if: &mut Option<usize>,
    node: Node,
) -> Result<(), ParseError> {
    match &node {
        Node::GoStatement(s) if s.keyword == StatementKeyword::Else => {
            let pos = s.pos.clone();
            let Some(idx) = last_if.take() else {
                return Err(ParseError {
                    kind: ParseErrorKind::ElseWithoutIf,
                    location: pos,
                });
            };
            if let Node::GoStatement(prev) = &mut nodes[idx] {
                prev.has_else = true;
            }
        }
        Node::GoStatement(s) if s.keyword == StatementKeyword::If => {
            *last_if = Some(nodes.len());
        }
        _ => {
            *last_if = None;
        }
    }
    nodes.push(node);
    Ok(())
}

fn join_value(acc: Option<Value>, piece: Value) -> Value {
    match acc {
        None => piece,
        Some(a) => Value::concat(a, piece),
    }
}

fn strip_quotes(s: &str) -> String {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

fn file_base_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

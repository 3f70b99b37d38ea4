use crate::goscan::{self, GoScanner, GoTokenKind};
use crate::token::{Location, Token, TokenKind};
use crate::{LexerError, LexerErrorKind};

/// The scanner's line-level states. Each `step` consumes input and returns
/// the next state; `None` means the terminal `Eof` token has been emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Indentation,
    LineStart,
    AfterTag,
    ClassName,
    Id,
    AttributeName,
    InlineValue,
}

/// `.poo` source scanner.
///
/// Tokenizes a whole source buffer eagerly into a vector of tokens ending
/// with exactly one `Eof`. Indentation may use tabs (one per level) or
/// spaces (the first indented line fixes the width of one level); the two
/// must not be mixed on a line.
pub struct Scanner {
    file_name: String,
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    start: usize,
    start_loc: Location,
    depth: usize,
    space_indent: Option<usize>,
    tokens: Vec<Token>,
}

impl Scanner {
    /// Create a new scanner for the given source.
    pub fn new(source: &str, file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            chars: source.chars().collect(),
            pos: 0,
            line: 0,
            column: 0,
            start: 0,
            start_loc: Location::new(file_name, 0, 0),
            depth: 0,
            space_indent: None,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire source into a vector of tokens.
    pub fn tokenize(source: &str, file_name: &str) -> Result<Vec<Token>, LexerError> {
        let mut scanner = Scanner::new(source, file_name);
        scanner.run()?;
        Ok(scanner.tokens)
    }

    fn run(&mut self) -> Result<(), LexerError> {
        let mut state = State::Indentation;
        while let Some(next) = self.step(state)? {
            state = next;
        }
        Ok(())
    }

    fn step(&mut self, state: State) -> Result<Option<State>, LexerError> {
        match state {
            State::Indentation => self.lex_indentation(),
            State::LineStart => self.lex_line_start(),
            State::AfterTag => self.lex_after_tag(),
            State::ClassName => self.lex_class_name(),
            State::Id => self.lex_id(),
            State::AttributeName => self.lex_attribute_name(),
            State::InlineValue => self.lex_inline_value(),
        }
    }

    // =========================================================================
    // Line structure
    // =========================================================================

    fn lex_indentation(&mut self) -> Result<Option<State>, LexerError> {
        self.depth = 0;
        let mut tabs = 0usize;
        let mut spaces = 0usize;

        loop {
            match self.peek() {
                None => {
                    self.discard();
                    self.emit(TokenKind::Eof);
                    return Ok(None);
                }
                Some(' ') => {
                    if tabs > 0 {
                        return Err(self.err_here(LexerErrorKind::MixedIndentation));
                    }
                    self.take();
                    spaces += 1;
                }
                Some('\t') => {
                    if spaces > 0 {
                        return Err(self.err_here(LexerErrorKind::MixedIndentation));
                    }
                    self.take();
                    tabs += 1;
                }
                Some('\n') | Some('\r') => {
                    self.take();
                    self.discard();
                    tabs = 0;
                    spaces = 0;
                }
                Some(_) => break,
            }
        }

        self.depth = self.resolve_depth(tabs, spaces)?;
        self.discard();
        Ok(Some(State::LineStart))
    }

    /// Turn an indentation run into a depth. The first space-indented line
    /// fixes the width of one level for the rest of the file.
    fn resolve_depth(&mut self, tabs: usize, spaces: usize) -> Result<usize, LexerError> {
        if tabs > 0 && spaces > 0 {
            return Err(self.err_here(LexerErrorKind::MixedIndentation));
        }
        if tabs > 0 {
            return Ok(tabs);
        }
        if spaces == 0 {
            return Ok(0);
        }
        let width = *self.space_indent.get_or_insert(spaces);
        if spaces % width != 0 {
            return Err(self.err_here(LexerErrorKind::UnexpectedIndentation));
        }
        Ok(spaces / width)
    }

    fn lex_line_start(&mut self) -> Result<Option<State>, LexerError> {
        let Some(c) = self.peek() else {
            self.discard();
            self.emit(TokenKind::Eof);
            return Ok(None);
        };

        match c {
            '@' => self.lex_interpolation_line(),
            '.' => {
                self.take();
                self.emit(TokenKind::Dot);
                Ok(Some(State::ClassName))
            }
            '#' => {
                self.take();
                self.emit(TokenKind::Hashtag);
                Ok(Some(State::Id))
            }
            '|' => self.lex_pipe(),
            '/' => self.lex_comment(),
            '+' => self.lex_mixin_call(),
            c if c.is_ascii_alphanumeric() => self.lex_identifier_line(),
            c => Err(self.unexpected(c, "a tag name")),
        }
    }

    /// Consume the line break (or end of input) that terminates the current
    /// line, emitting `NewLine` or the final `Eof`.
    fn finish_line(&mut self) -> Result<Option<State>, LexerError> {
        match self.peek() {
            None => {
                self.discard();
                self.emit(TokenKind::Eof);
                Ok(None)
            }
            Some('\n') | Some('\r') => {
                if self.peek() == Some('\r') {
                    self.take();
                }
                if self.peek() == Some('\n') {
                    self.take();
                }
                self.emit(TokenKind::NewLine);
                Ok(Some(State::Indentation))
            }
            Some(c) => Err(self.unexpected(c, "end of line")),
        }
    }

    // =========================================================================
    // Tags and suffixes
    // =========================================================================

    fn lex_identifier_line(&mut self) -> Result<Option<State>, LexerError> {
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            self.take();
        }

        let text: String = self.chars[self.start..self.pos].iter().collect();
        let is_keyword = text == "include"
            || (self.depth == 0 && matches!(text.as_str(), "arg" | "import" | "mixin" | "doctype"));

        if !is_keyword {
            self.emit(TokenKind::Identifier);
            return Ok(Some(State::AfterTag));
        }

        self.emit(TokenKind::Keyword);
        match text.as_str() {
            "arg" => self.lex_rest_of_line(TokenKind::InlineText, "an argument declaration"),
            "doctype" => self.lex_rest_of_line(TokenKind::InlineText, "a doctype"),
            "import" => self.lex_rest_of_line(TokenKind::ImportPath, "an import path"),
            "include" => self.lex_rest_of_line(TokenKind::ImportPath, "an include path"),
            "mixin" => self.lex_mixin_def(),
            _ => unreachable!("keyword table and dispatch are out of sync"),
        }
    }

    fn lex_after_tag(&mut self) -> Result<Option<State>, LexerError> {
        match self.peek() {
            None => {
                self.discard();
                self.emit(TokenKind::Eof);
                Ok(None)
            }
            Some(' ') | Some('\t') => {
                self.take();
                self.discard();
                Ok(Some(State::InlineValue))
            }
            Some('(') => {
                self.take();
                self.emit(TokenKind::ParenOpen);
                Ok(Some(State::AttributeName))
            }
            Some('.') => {
                self.take();
                self.emit(TokenKind::Dot);
                Ok(Some(State::ClassName))
            }
            Some('#') => {
                self.take();
                self.emit(TokenKind::Hashtag);
                Ok(Some(State::Id))
            }
            Some(':') => self.lex_block_text(),
            Some('\n') | Some('\r') => self.finish_line(),
            Some(c) => Err(self.unexpected(c, "a tag suffix")),
        }
    }

    fn lex_class_name(&mut self) -> Result<Option<State>, LexerError> {
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '-' || c == '_' => {}
            Some(c) => return Err(self.unexpected(c, "a CSS class name")),
            None => return Err(self.eof_err("a CSS class name")),
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            self.take();
        }
        self.emit(TokenKind::ClassName);
        Ok(Some(State::AfterTag))
    }

    fn lex_id(&mut self) -> Result<Option<State>, LexerError> {
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '-' || c == '_' => {}
            Some(c) => return Err(self.unexpected(c, "an ID")),
            None => return Err(self.eof_err("an ID")),
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            self.take();
        }
        self.emit(TokenKind::Id);
        Ok(Some(State::AfterTag))
    }

    /// A `:` suffix starts block text: every deeper-indented line that
    /// follows is raw text, one `InlineText` token per line.
    fn lex_block_text(&mut self) -> Result<Option<State>, LexerError> {
        self.take(); // ':'
        self.emit(TokenKind::Colon);
        let opening = self.depth;

        match self.peek() {
            None => {
                self.discard();
                self.emit(TokenKind::Eof);
                return Ok(None);
            }
            Some('\n') | Some('\r') => {}
            Some(c) => return Err(self.unexpected(c, "end of line")),
        }
        if self.peek() == Some('\r') {
            self.take();
        }
        if self.peek() == Some('\n') {
            self.take();
        }
        self.emit(TokenKind::NewLine);

        self.depth = opening + 1;
        loop {
            let (tabs, spaces, after) = self.measure_indent();
            match self.chars.get(after) {
                None => break,
                Some('\n') | Some('\r') => {
                    self.advance_by(after - self.pos);
                    if self.peek() == Some('\r') {
                        self.take();
                    }
                    if self.peek() == Some('\n') {
                        self.take();
                    }
                    self.discard();
                    continue;
                }
                Some(_) => {}
            }

            let line_depth = self.resolve_depth(tabs, spaces)?;
            if line_depth <= opening {
                break;
            }

            let strip = if tabs > 0 {
                opening + 1
            } else {
                (opening + 1) * self.space_indent.unwrap_or(1)
            };
            self.advance_by(strip);
            self.discard();
            while !matches!(self.peek(), None | Some('\n') | Some('\r')) {
                self.take();
            }
            self.emit(TokenKind::InlineText);

            if self.peek().is_none() {
                self.emit(TokenKind::Eof);
                return Ok(None);
            }
            if self.peek() == Some('\r') {
                self.take();
            }
            if self.peek() == Some('\n') {
                self.take();
            }
            self.emit(TokenKind::NewLine);
        }

        self.depth = opening;
        Ok(Some(State::Indentation))
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    fn lex_attribute_name(&mut self) -> Result<Option<State>, LexerError> {
        self.skip_ws_and_newlines();

        loop {
            match self.peek() {
                Some(c) if c.is_alphabetic() => self.take(),
                Some(c) if !self.is_empty() && (c == '-' || c.is_ascii_digit()) => self.take(),
                _ => break,
            };
        }

        if self.is_empty() {
            return self.lex_after_attributes();
        }
        self.emit(TokenKind::AttributeName);

        // optional `?condition`
        if self.peek() == Some('?') {
            self.take();
            self.emit(TokenKind::QuestionMark);
            self.lex_go_expr()?;
        }

        self.skip_ws();
        if self.peek() == Some('=') {
            self.take();
            self.emit(TokenKind::Equals);
            self.lex_attribute_value()?;
        }

        Ok(Some(State::AttributeName))
    }

    fn lex_after_attributes(&mut self) -> Result<Option<State>, LexerError> {
        match self.peek() {
            Some(')') => {
                self.take();
                self.emit(TokenKind::ParenClose);
                Ok(Some(State::AfterTag))
            }
            Some(c) => Err(self.unexpected(c, "an attribute name or ')'")),
            None => Err(self.eof_err("')'")),
        }
    }

    /// Value pieces after `=`: a quoted string, a bare Go expression, or
    /// several of either back to back.
    fn lex_attribute_value(&mut self) -> Result<(), LexerError> {
        self.skip_ws();

        let mut pieces = 0usize;
        loop {
            match self.peek() {
                Some('"') => {
                    self.read_quoted_string()?;
                    pieces += 1;
                }
                Some(')') | Some(' ') | Some('\t') | Some('\n') | Some('\r') | None => break,
                Some(_) => {
                    self.lex_go_expr()?;
                    pieces += 1;
                }
            }
        }

        if pieces == 0 {
            return Err(match self.peek() {
                Some(c) => self.unexpected(c, "an attribute value"),
                None => self.eof_err("an attribute value"),
            });
        }
        Ok(())
    }

    fn read_quoted_string(&mut self) -> Result<(), LexerError> {
        self.take(); // opening quote
        loop {
            match self.peek() {
                Some('"') => {
                    self.take();
                    break;
                }
                Some(c @ ('\n' | '\r')) => {
                    return Err(self.unexpected(c, "'\"'"));
                }
                None => return Err(self.eof_err("'\"'")),
                Some(_) => {
                    self.take();
                }
            }
        }
        // the quotes stay in the token contents
        self.emit(TokenKind::QuotedString);
        Ok(())
    }

    // =========================================================================
    // Text
    // =========================================================================

    fn lex_pipe(&mut self) -> Result<Option<State>, LexerError> {
        self.take(); // '|'
        self.emit(TokenKind::Pipe);
        match self.peek() {
            None | Some('\n') | Some('\r') => self.finish_line(),
            _ => {
                self.skip_ws();
                Ok(Some(State::InlineValue))
            }
        }
    }

    fn lex_inline_value(&mut self) -> Result<Option<State>, LexerError> {
        loop {
            match self.peek() {
                None => {
                    if !self.is_empty() {
                        self.emit(TokenKind::InlineText);
                    }
                    self.discard();
                    self.emit(TokenKind::Eof);
                    return Ok(None);
                }
                Some('\n') | Some('\r') => {
                    if !self.is_empty() {
                        self.emit(TokenKind::InlineText);
                    }
                    return self.finish_line();
                }
                Some('@') => {
                    if self.chars.get(self.pos + 1) == Some(&'@') {
                        // `@@` escapes a literal '@': the first joins the
                        // pending text, the second is dropped
                        self.take();
                        self.emit(TokenKind::InlineText);
                        self.take();
                        self.discard();
                        continue;
                    }
                    if !self.is_empty() {
                        self.emit(TokenKind::InlineText);
                    }
                    self.take();
                    self.emit(TokenKind::InterpolationStart);
                    if self.peek() == Some('!') {
                        self.take();
                        self.emit(TokenKind::ExclamationPoint);
                    }
                    self.lex_go_expr()?;
                }
                Some(_) => {
                    self.take();
                }
            }
        }
    }

    fn lex_comment(&mut self) -> Result<Option<State>, LexerError> {
        self.take(); // '/'
        match self.peek() {
            Some('/') => {
                self.take();
            }
            Some(c) => return Err(self.unexpected(c, "'/'")),
            None => return Err(self.eof_err("'/'")),
        }

        if self.peek() == Some('-') {
            self.take();
            self.emit(TokenKind::CommentStart);
        } else {
            self.emit(TokenKind::CommentStartBuffered);
        }

        self.skip_ws();
        while !matches!(self.peek(), None | Some('\n') | Some('\r')) {
            self.take();
        }
        let text: String = self.chars[self.start..self.pos].iter().collect();
        self.emit_with(TokenKind::CommentText, text.trim_end().to_string());
        self.finish_line()
    }

    // =========================================================================
    // Interpolation and Go code
    // =========================================================================

    fn lex_interpolation_line(&mut self) -> Result<Option<State>, LexerError> {
        self.take(); // '@'
        self.emit(TokenKind::InterpolationStart);

        match self.peek() {
            None => Err(self.eof_err("a Go expression or block")),
            Some('\n') | Some('\r') => self.lex_go_block(),
            Some('!') => {
                self.take();
                self.emit(TokenKind::ExclamationPoint);
                self.lex_go_expr()?;
                self.finish_line()
            }
            Some(_) => {
                let rest = &self.chars[self.pos..];
                let mut head = GoScanner::new(rest);
                let first = head.next_token().map_err(|e| self.goscan_error(e))?;
                let word: String = rest[first.start..first.end].iter().collect();

                if first.kind == GoTokenKind::Ident
                    && matches!(word.as_str(), "if" | "else" | "for")
                {
                    self.advance_by(first.start);
                    self.discard();
                    self.advance_by(first.end - first.start);
                    self.emit(TokenKind::Keyword);

                    if word == "else" {
                        self.skip_ws();
                        return self.finish_line();
                    }

                    self.skip_ws();
                    while !matches!(self.peek(), None | Some('\n') | Some('\r')) {
                        self.take();
                    }
                    if self.is_empty() {
                        return Err(self.err_here(LexerErrorKind::ExpectedExpression));
                    }
                    let text: String = self.chars[self.start..self.pos].iter().collect();
                    self.emit_with(TokenKind::GoExpr, text.trim_end().to_string());
                    self.finish_line()
                } else {
                    self.lex_go_expr()?;
                    self.finish_line()
                }
            }
        }
    }

    /// `@` alone on a line opens a host-code block: all deeper lines are
    /// collected, dedented one level past the opening depth, into one token.
    fn lex_go_block(&mut self) -> Result<Option<State>, LexerError> {
        let opening = self.depth;

        if self.peek() == Some('\r') {
            self.take();
        }
        if self.peek() == Some('\n') {
            self.take();
        }
        self.discard();
        let block_start = self.start_loc.clone();

        let mut content = String::new();
        loop {
            let (tabs, spaces, after) = self.measure_indent();
            match self.chars.get(after) {
                None => break,
                Some('\n') | Some('\r') => {
                    self.advance_by(after - self.pos);
                    if self.peek() == Some('\r') {
                        self.take();
                    }
                    if self.peek() == Some('\n') {
                        self.take();
                    }
                    content.push('\n');
                    continue;
                }
                Some(_) => {}
            }

            let line_depth = self.resolve_depth(tabs, spaces)?;
            if line_depth <= opening {
                break;
            }

            let strip = if tabs > 0 {
                opening + 1
            } else {
                (opening + 1) * self.space_indent.unwrap_or(1)
            };
            self.advance_by(strip);
            while !matches!(self.peek(), None | Some('\n') | Some('\r')) {
                if let Some(c) = self.take() {
                    content.push(c);
                }
            }
            if self.peek() == Some('\r') {
                self.take();
            }
            if self.peek() == Some('\n') {
                self.take();
            }
            content.push('\n');
        }

        self.start_loc = block_start;
        self.emit_with(TokenKind::GoBlock, content);
        self.emit_with(TokenKind::NewLine, "\n".to_string());
        Ok(Some(State::Indentation))
    }

    /// Let the embedded Go tokenizer find the end of the expression starting
    /// at the cursor, then emit it as one `GoExpr` token.
    fn lex_go_expr(&mut self) -> Result<(), LexerError> {
        let rest = &self.chars[self.pos..];
        let scan =
            goscan::scan_expression(rest).map_err(|e| self.goscan_error(e))?;
        let Some(scan) = scan else {
            return Err(self.err_here(LexerErrorKind::ExpectedExpression));
        };

        self.advance_by(scan.start);
        self.discard();
        self.advance_by(scan.end - scan.start);
        self.emit(TokenKind::GoExpr);
        Ok(())
    }

    // =========================================================================
    // Mixins
    // =========================================================================

    fn lex_mixin_def(&mut self) -> Result<Option<State>, LexerError> {
        self.skip_ws();
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.take();
        }
        if self.is_empty() {
            return Err(match self.peek() {
                Some(c) => self.unexpected(c, "a mixin name"),
                None => self.eof_err("a mixin name"),
            });
        }
        self.emit(TokenKind::Identifier);

        if self.peek() == Some('(') {
            self.take();
            self.emit(TokenKind::ParenOpen);
            self.skip_ws();
            if self.peek() == Some(')') {
                self.take();
                self.emit(TokenKind::ParenClose);
            } else {
                loop {
                    self.skip_ws();
                    while !matches!(
                        self.peek(),
                        None | Some(',') | Some(')') | Some('\n') | Some('\r')
                    ) {
                        self.take();
                    }
                    let arg: String = self.chars[self.start..self.pos].iter().collect();
                    let arg = arg.trim_end().to_string();
                    if arg.is_empty() {
                        return Err(match self.peek() {
                            Some(c) => self.unexpected(c, "a mixin argument"),
                            None => self.eof_err("a mixin argument"),
                        });
                    }
                    self.emit_with(TokenKind::InlineText, arg);

                    match self.peek() {
                        Some(',') => {
                            self.take();
                            self.emit(TokenKind::Comma);
                        }
                        Some(')') => {
                            self.take();
                            self.emit(TokenKind::ParenClose);
                            break;
                        }
                        Some(c) => return Err(self.unexpected(c, "',' or ')'")),
                        None => return Err(self.eof_err("',' or ')'")),
                    }
                }
            }
        }

        self.finish_line()
    }

    fn lex_mixin_call(&mut self) -> Result<Option<State>, LexerError> {
        self.take(); // '+'
        self.emit(TokenKind::Plus);

        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.take();
        }
        if self.is_empty() {
            return Err(match self.peek() {
                Some(c) => self.unexpected(c, "a mixin name"),
                None => self.eof_err("a mixin name"),
            });
        }
        self.emit(TokenKind::Identifier);

        if self.peek() == Some('(') {
            self.take();
            self.emit(TokenKind::ParenOpen);
            self.skip_ws();
            if self.peek() == Some(')') {
                self.take();
                self.emit(TokenKind::ParenClose);
            } else {
                loop {
                    self.lex_go_expr()?;
                    self.skip_ws();
                    match self.peek() {
                        Some(',') => {
                            self.take();
                            self.emit(TokenKind::Comma);
                            self.skip_ws();
                        }
                        Some(')') => {
                            self.take();
                            self.emit(TokenKind::ParenClose);
                            break;
                        }
                        Some(c) => return Err(self.unexpected(c, "',' or ')'")),
                        None => return Err(self.eof_err("',' or ')'")),
                    }
                }
            }
        }

        self.finish_line()
    }

    fn lex_rest_of_line(
        &mut self,
        kind: TokenKind,
        expected: &str,
    ) -> Result<Option<State>, LexerError> {
        self.skip_ws();
        while !matches!(self.peek(), None | Some('\n') | Some('\r')) {
            self.take();
        }
        if self.is_empty() {
            return Err(match self.peek() {
                Some(c) => self.unexpected(c, expected),
                None => self.eof_err(expected),
            });
        }
        let text: String = self.chars[self.start..self.pos].iter().collect();
        self.emit_with(kind, text.trim_end().to_string());
        self.finish_line()
    }

    // =========================================================================
    // Cursor helpers
    // =========================================================================

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn take(&mut self) -> Option<char> {
        let c = *self.chars.get(self.pos)?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.take();
        }
    }

    /// Count the indentation run at the cursor without consuming it.
    /// Returns (tabs, spaces, index of the first character past the run).
    fn measure_indent(&self) -> (usize, usize, usize) {
        let mut i = self.pos;
        let mut tabs = 0usize;
        let mut spaces = 0usize;
        loop {
            match self.chars.get(i) {
                Some('\t') => {
                    tabs += 1;
                    i += 1;
                }
                Some(' ') => {
                    spaces += 1;
                    i += 1;
                }
                _ => break,
            }
        }
        (tabs, spaces, i)
    }

    fn is_empty(&self) -> bool {
        self.pos == self.start
    }

    fn discard(&mut self) {
        self.start = self.pos;
        self.start_loc = Location::new(&self.file_name, self.line, self.column);
    }

    fn emit(&mut self, kind: TokenKind) {
        let contents: String = self.chars[self.start..self.pos].iter().collect();
        self.emit_with(kind, contents);
    }

    fn emit_with(&mut self, kind: TokenKind, contents: String) {
        self.tokens.push(Token {
            kind,
            start: self.start_loc.clone(),
            depth: self.depth,
            contents,
        });
        self.discard();
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.take();
        }
        self.discard();
    }

    fn skip_ws_and_newlines(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t') | Some('\n') | Some('\r')) {
            self.take();
        }
        self.discard();
    }

    // =========================================================================
    // Errors
    // =========================================================================

    fn err_here(&self, kind: LexerErrorKind) -> LexerError {
        LexerError {
            kind,
            location: Location::new(&self.file_name, self.line, self.column),
        }
    }

    fn unexpected(&self, found: char, expected: &str) -> LexerError {
        self.err_here(LexerErrorKind::UnexpectedChar {
            found,
            expected: expected.to_string(),
        })
    }

    fn eof_err(&self, expected: &str) -> LexerError {
        self.err_here(LexerErrorKind::UnexpectedEof {
            expected: expected.to_string(),
        })
    }

    /// Translate a sub-lexer error into file coordinates by offsetting with
    /// the cursor position the scan started at.
    fn goscan_error(&self, e: goscan::GoScanError) -> LexerError {
        let line = self.line + e.line;
        let column = if e.line == 0 {
            self.column + e.column
        } else {
            e.column
        };
        LexerError {
            kind: LexerErrorKind::GoScan(e.message),
            location: Location::new(&self.file_name, line, column),
        }
    }
}

//! Modal lexer for Django templates.
//!
//! Host text is lexed in [`LexMode::Content`], the inside of `{{ }}` and
//! `{% %}` in [`LexMode::Variable`] and [`LexMode::Tag`], and the bodies of
//! `{% comment %}` and `{% verbatim %}` in [`LexMode::Raw`]. Lexing is a pure
//! function of the text, the position and the mode, which is what lets the
//! incremental parser restart it at any segment boundary.

mod cursor;

use cursor::Cursor;
use dtl_syntax::Point;
pub use dtl_syntax::SyntaxKind;
use dtl_syntax::SyntaxKind::*;
use text_size::{TextRange, TextSize};

/// A tag whose body is not parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawKind {
    Comment,
    Verbatim,
}

impl RawKind {
    pub fn from_tag_name(name: &str) -> Option<Self> {
        match name {
            "comment" => Some(Self::Comment),
            "verbatim" => Some(Self::Verbatim),
            _ => None,
        }
    }

    pub const fn end_tag(self) -> &'static str {
        match self {
            Self::Comment => "endcomment",
            Self::Verbatim => "endverbatim",
        }
    }
}

/// Progress through the inside of a `{% %}` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagState {
    /// Nothing but whitespace seen after `{%`.
    Start,
    /// The tag name opens a raw block.
    Raw(RawKind),
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexMode {
    Content,
    Variable,
    Tag(TagState),
    Raw(RawKind),
}

impl LexMode {
    /// Tokens lexed in these modes start a new top-level segment.
    pub const fn is_boundary(self) -> bool {
        matches!(self, Self::Content | Self::Raw(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub range: TextRange,
    pub start: Point,
    /// Mode the token was lexed in.
    pub mode: LexMode,
    /// One past the last byte examined to produce the token.
    pub lookahead_end: TextSize,
}

impl Token {
    const EOF: Self = Self {
        kind: EOF,
        range: TextRange::empty(TextSize::new(0)),
        start: Point::ZERO,
        mode: LexMode::Content,
        lookahead_end: TextSize::new(0),
    };

    pub fn is_boundary(&self) -> bool {
        self.mode.is_boundary()
    }
}

#[derive(Clone)]
pub struct Tokenizer<'a> {
    cursor: Cursor<'a>,
    mode: LexMode,
    current: Token,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::at(text, TextSize::new(0), LexMode::Content, Point::ZERO)
    }

    /// Starts lexing at `offset` in `mode`. `point` is the position of
    /// `offset` and only feeds [`Token::start`].
    pub fn at(text: &'a str, offset: TextSize, mode: LexMode, point: Point) -> Self {
        let mut tokenizer =
            Self { cursor: Cursor::new(text, offset.into(), point), mode, current: Token::EOF };
        tokenizer.next_token();
        tokenizer
    }

    pub fn peek(&self) -> &Token {
        &self.current
    }

    pub fn next_token(&mut self) -> Token {
        let token = self.lex();
        std::mem::replace(&mut self.current, token)
    }

    fn lex(&mut self) -> Token {
        self.cursor.reset_examined();
        if matches!(self.mode, LexMode::Variable | LexMode::Tag(_)) && self.at_unterminated_end() {
            self.mode = LexMode::Content;
        }

        let start = self.cursor.pos();
        let point = self.cursor.point();
        let mode = self.mode;
        let kind = match mode {
            LexMode::Content => self.content(),
            LexMode::Raw(raw) => self.raw(raw),
            LexMode::Variable | LexMode::Tag(_) => self.inside(start),
        };

        Token {
            kind,
            range: TextRange::new(offset(start), offset(self.cursor.pos())),
            start: point,
            mode,
            lookahead_end: offset(self.cursor.examined()),
        }
    }

    /// A line break, the end of the text or a new opening delimiter ends a
    /// tag that is missing its closer.
    fn at_unterminated_end(&mut self) -> bool {
        match self.cursor.peek() {
            None | Some('\n' | '\r') => true,
            Some('{') => matches!(self.cursor.second(), Some('{' | '%' | '#')),
            Some(_) => false,
        }
    }

    fn content(&mut self) -> SyntaxKind {
        match self.cursor.peek() {
            None => EOF,
            Some('{') => match self.cursor.second() {
                Some('{') => {
                    self.bump_delimiter();
                    self.mode = LexMode::Variable;
                    VARIABLE_OPEN
                }
                Some('%') => {
                    self.bump_delimiter();
                    self.mode = LexMode::Tag(TagState::Start);
                    TAG_OPEN
                }
                Some('#') => self.comment(),
                _ => self.content_run(),
            },
            Some(_) => self.content_run(),
        }
    }

    fn bump_delimiter(&mut self) {
        self.cursor.advance();
        self.cursor.advance();
    }

    fn content_run(&mut self) -> SyntaxKind {
        self.cursor.advance();
        let mut from = self.cursor.pos();
        loop {
            let Some(brace) = self.cursor.find_from(from, "{") else {
                self.cursor.advance_to_end();
                break;
            };
            if let Some(b'{' | b'%' | b'#') = self.cursor.byte_at(brace + 1) {
                self.cursor.advance_to(brace);
                break;
            }
            from = brace + 1;
        }
        CONTENT
    }

    fn comment(&mut self) -> SyntaxKind {
        let body = self.cursor.pos() + 2;
        match self.cursor.find_from(body, "#}") {
            Some(end) => {
                self.cursor.advance_to(end + 2);
                COMMENT
            }
            None => {
                self.cursor.advance_to_end();
                UNKNOWN
            }
        }
    }

    fn raw(&mut self, raw: RawKind) -> SyntaxKind {
        let start = self.cursor.pos();
        let end = self.raw_end(start, raw.end_tag());
        self.mode = LexMode::Content;

        match end {
            Some(end) if end > start => {
                self.cursor.advance_to(end);
                RAW_TEXT
            }
            None if self.cursor.peek().is_some() => {
                self.cursor.advance_to_end();
                RAW_TEXT
            }
            _ => self.content(),
        }
    }

    /// Finds the `{%` of the first `{% <end_tag> ... %}` at or after `from`.
    fn raw_end(&mut self, mut from: usize, end_tag: &str) -> Option<usize> {
        loop {
            let open = self.cursor.find_from(from, "{%")?;
            let mut name = open + 2;
            while let Some(b' ' | b'\t') = self.cursor.byte_at(name) {
                name += 1;
            }
            if self.cursor.starts_with_at(name, end_tag) {
                let after = self.cursor.byte_at(name + end_tag.len());
                if !after.is_some_and(|byte| byte.is_ascii_alphanumeric() || byte == b'_') {
                    return Some(open);
                }
            }
            from = open + 2;
        }
    }

    fn inside(&mut self, start: usize) -> SyntaxKind {
        let Some(c) = self.cursor.advance() else {
            return EOF;
        };

        let kind = match c {
            c if is_inline_whitespace(c) => {
                self.cursor.advance_while(is_inline_whitespace);
                return WHITESPACE;
            }
            '}' if self.eat('}') => {
                self.mode = LexMode::Content;
                return VARIABLE_CLOSE;
            }
            '%' if self.eat('}') => {
                self.mode = match self.mode {
                    LexMode::Tag(TagState::Raw(raw)) => LexMode::Raw(raw),
                    _ => LexMode::Content,
                };
                return TAG_CLOSE;
            }
            '|' => PIPE,
            ':' => COLON,
            ',' => COMMA,
            '.' => DOT,
            '=' if self.eat('=') => OPERATOR,
            '=' => EQ,
            '!' if self.eat('=') => OPERATOR,
            '<' | '>' => {
                self.eat('=');
                OPERATOR
            }
            '"' | '\'' => self.string(c),
            '+' | '-' if self.cursor.peek().is_some_and(|c| c.is_ascii_digit()) => self.number(),
            '0'..='9' => self.number(),
            c if c.is_alphabetic() || c == '_' => self.word(start),
            _ => UNKNOWN,
        };

        if self.mode == LexMode::Tag(TagState::Start) {
            let raw = match kind {
                NAME => RawKind::from_tag_name(self.cursor.text_since(start)),
                _ => None,
            };
            self.mode = LexMode::Tag(raw.map_or(TagState::Plain, TagState::Raw));
        }

        kind
    }

    fn eat(&mut self, c: char) -> bool {
        if self.cursor.peek() == Some(c) {
            self.cursor.advance();
            true
        } else {
            false
        }
    }

    fn word(&mut self, start: usize) -> SyntaxKind {
        self.cursor.advance_while(|c| c.is_alphanumeric() || c == '_');

        match self.cursor.text_since(start) {
            "and" => AND_KW,
            "or" => OR_KW,
            "not" => NOT_KW,
            "in" => IN_KW,
            "is" => IS_KW,
            "True" | "False" => BOOLEAN,
            "None" => NONE,
            _ => NAME,
        }
    }

    fn number(&mut self) -> SyntaxKind {
        self.cursor.advance_while(|c| c.is_ascii_digit());
        if self.cursor.peek() == Some('.')
            && self.cursor.second().is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.advance();
            self.cursor.advance_while(|c| c.is_ascii_digit());
        }
        NUMBER
    }

    /// A string literal, or a lone `UNKNOWN` quote when the string does not
    /// close before the end of the line or the tag.
    fn string(&mut self, quote: char) -> SyntaxKind {
        let saved = self.cursor.clone();
        let closer = match self.mode {
            LexMode::Variable => '}',
            _ => '%',
        };

        loop {
            match self.cursor.peek() {
                None | Some('\n' | '\r') => break,
                Some(c) if c == quote => {
                    self.cursor.advance();
                    return STRING;
                }
                Some(c) if c == closer && self.cursor.second() == Some('}') => break,
                Some('\\') => {
                    self.cursor.advance();
                    if !matches!(self.cursor.peek(), None | Some('\n' | '\r')) {
                        self.cursor.advance();
                    }
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }

        self.cursor.rewind(&saved);
        UNKNOWN
    }
}

fn is_inline_whitespace(c: char) -> bool {
    c.is_whitespace() && c != '\n' && c != '\r'
}

fn offset(pos: usize) -> TextSize {
    TextSize::new(pos as u32)
}

/// Lexes the whole text, without the final `EOF`.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new(text);
    let mut tokens = Vec::new();
    while tokenizer.peek().kind != EOF {
        tokens.push(tokenizer.next_token());
    }
    tokens
}

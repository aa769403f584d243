//! Query tokenizer
//!
//! Turns raw query text into a flat token stream for the parser.
//!
//! Tokenization never fails: constructs the lexer cannot finish (an
//! unterminated string literal, a stray character) are emitted as
//! [`TokenKind::Invalid`] markers carrying their source position, so the
//! parser can report a precise error instead of the lexer guessing.
//!
//! Rules:
//! - Whitespace, including newlines, only separates tokens.
//! - `//` starts a comment that runs to end of line; comments are trivia
//!   and never reach the parser.
//! - Keywords and identifiers are case-insensitive; both are canonicalized
//!   to lowercase here so no later stage re-normalizes.
//! - String literals use matching `'` or `"` delimiters, no escapes.
//! - Identifiers may contain `-` after the first character, so enumerated
//!   values like `current-year` and `last-6-months` lex as one token.

use serde::Serialize;
use std::fmt;

/// Source position of a token, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Reserved words of the query language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Where,
    Show,
    View,
    Chart,
    Period,
    Size,
    And,
    Between,
    Format,
    As,
}

impl Keyword {
    /// Match a lowercased identifier against the keyword table.
    pub fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "where" => Some(Self::Where),
            "show" => Some(Self::Show),
            "view" => Some(Self::View),
            "chart" => Some(Self::Chart),
            "period" => Some(Self::Period),
            "size" => Some(Self::Size),
            "and" => Some(Self::And),
            "between" => Some(Self::Between),
            "format" => Some(Self::Format),
            "as" => Some(Self::As),
            _ => None,
        }
    }

    /// Canonical spelling used in error messages.
    pub fn canonical(&self) -> &'static str {
        match self {
            Self::Where => "WHERE",
            Self::Show => "SHOW",
            Self::View => "VIEW",
            Self::Chart => "CHART",
            Self::Period => "PERIOD",
            Self::Size => "SIZE",
            Self::And => "AND",
            Self::Between => "BETWEEN",
            Self::Format => "FORMAT",
            Self::As => "AS",
        }
    }
}

/// Why a token could not be lexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// A string literal with no closing delimiter before end of input.
    UnterminatedString,
    /// A character with no place in the grammar.
    UnexpectedChar,
}

/// What a token is.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Keyword(Keyword),
    /// Identifier, canonicalized to lowercase.
    Ident(String),
    Number(f64),
    /// String literal content, delimiters stripped, case preserved.
    Str(String),
    Comma,
    Equals,
    Invalid(InvalidReason),
    Eof,
}

impl TokenKind {
    /// Short human-readable description for "expected X, found Y" errors.
    pub fn describe(&self) -> String {
        match self {
            Self::Keyword(kw) => format!("keyword {}", kw.canonical()),
            Self::Ident(name) => format!("identifier '{}'", name),
            Self::Number(n) => format!("number {}", n),
            Self::Str(s) => format!("string \"{}\"", s),
            Self::Comma => "','".to_string(),
            Self::Equals => "'='".to_string(),
            Self::Invalid(InvalidReason::UnterminatedString) => "unterminated string".to_string(),
            Self::Invalid(InvalidReason::UnexpectedChar) => "unexpected character".to_string(),
            Self::Eof => "end of input".to_string(),
        }
    }
}

/// One lexed token with its original text and source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub position: Position,
}

impl Token {
    fn new(kind: TokenKind, lexeme: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            position,
        }
    }
}

/// Tokenize query text. Never fails; the stream always ends with an
/// [`TokenKind::Eof`] token carrying the final position.
pub fn tokenize(text: &str) -> Vec<Token> {
    Scanner::new(text).run()
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Scanner {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn run(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let position = Position::new(self.line, self.column);
            let Some(c) = self.peek() else {
                tokens.push(Token::new(TokenKind::Eof, "", position));
                return tokens;
            };
            let token = match c {
                ',' => {
                    self.advance();
                    Token::new(TokenKind::Comma, ",", position)
                }
                '=' => {
                    self.advance();
                    Token::new(TokenKind::Equals, "=", position)
                }
                '\'' | '"' => self.scan_string(position),
                c if c.is_ascii_digit() => self.scan_number(position),
                c if c.is_alphabetic() || c == '_' => self.scan_word(position),
                c => {
                    self.advance();
                    Token::new(
                        TokenKind::Invalid(InvalidReason::UnexpectedChar),
                        c.to_string(),
                        position,
                    )
                }
            };
            tokens.push(token);
        }
    }

    /// Skip whitespace and `//` comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn scan_string(&mut self, position: Position) -> Token {
        let quote = self.advance().unwrap_or('"');
        let mut content = String::new();
        while let Some(c) = self.peek() {
            self.advance();
            if c == quote {
                let lexeme = format!("{quote}{content}{quote}");
                return Token::new(TokenKind::Str(content), lexeme, position);
            }
            content.push(c);
        }
        // Ran off the end of the input without a closing delimiter.
        Token::new(
            TokenKind::Invalid(InvalidReason::UnterminatedString),
            format!("{quote}{content}"),
            position,
        )
    }

    fn scan_number(&mut self, position: Position) -> Token {
        let mut lexeme = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            lexeme.push('.');
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    lexeme.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }
        // Digits with at most one fraction part always parse.
        let value: f64 = lexeme.parse().unwrap_or(0.0);
        Token::new(TokenKind::Number(value), lexeme, position)
    }

    fn scan_word(&mut self, position: Position) -> Token {
        let mut lexeme = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let canonical = lexeme.to_lowercase();
        let kind = match Keyword::from_ident(&canonical) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Ident(canonical),
        };
        Token::new(kind, lexeme, position)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }
}

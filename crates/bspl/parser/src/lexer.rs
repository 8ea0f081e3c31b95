//! Lexer: tokenizes BSPL source text
//!
//! Produces the raw token table the grammar consumes after
//! normalization. Whitespace and newlines are kept as tokens; the
//! grammar is newline-sensitive and [`crate::normalize`] decides what
//! survives.

use crate::errors::{BsplError, BsplResult};
use serde::{Deserialize, Serialize};

/// A token produced by the lexer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The raw text of the token
    pub text: String,
    /// Line number (1-based)
    pub line: usize,
    /// Start offset within the line (0-based, inclusive)
    pub start: usize,
    /// End offset within the line (exclusive)
    pub end: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, start: usize) -> Self {
        let text = text.into();
        let end = start + text.chars().count();
        Self {
            kind,
            text,
            line,
            start,
            end,
        }
    }
}

/// Token types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Word,
    Arrow, // ->
    Colon,
    Comma,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Newline,
    Whitespace,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Word => write!(f, "word"),
            Self::Arrow => write!(f, "->"),
            Self::Colon => write!(f, ":"),
            Self::Comma => write!(f, ","),
            Self::OpenBrace => write!(f, "{{"),
            Self::CloseBrace => write!(f, "}}"),
            Self::OpenBracket => write!(f, "["),
            Self::CloseBracket => write!(f, "]"),
            Self::Newline => write!(f, "newline"),
            Self::Whitespace => write!(f, "whitespace"),
        }
    }
}

/// Rule set driving the lexer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexerRules {
    /// Characters besides ASCII alphanumerics allowed inside a word
    pub word_extra_chars: String,
    /// Line comment marker; the rest of the line is skipped
    pub comment_prefix: Option<String>,
}

impl Default for LexerRules {
    fn default() -> Self {
        Self {
            word_extra_chars: "_".into(),
            comment_prefix: Some("#".into()),
        }
    }
}

impl LexerRules {
    /// Load a rule set from JSON; omitted fields take their defaults
    pub fn from_json(json: &str) -> BsplResult<Self> {
        let rules: Self = serde_json::from_str(json).map_err(|e| BsplError::Rules(e.to_string()))?;
        rules.check()?;
        Ok(rules)
    }

    fn check(&self) -> BsplResult<()> {
        if let Some(c) = self
            .word_extra_chars
            .chars()
            .find(|c| c.is_whitespace() || "->:,{}[]".contains(*c))
        {
            return Err(BsplError::Rules(format!(
                "'{}' cannot be part of a word",
                c
            )));
        }
        if matches!(&self.comment_prefix, Some(prefix) if prefix.is_empty()) {
            return Err(BsplError::Rules("comment prefix cannot be empty".into()));
        }
        Ok(())
    }

    fn is_word_char(&self, c: char) -> bool {
        c.is_ascii_alphanumeric() || self.word_extra_chars.contains(c)
    }
}

/// Lexer for BSPL source
pub struct Lexer<'r> {
    input: Vec<char>,
    rules: &'r LexerRules,
    pos: usize,
    line: usize,
    col: usize,
}

impl<'r> Lexer<'r> {
    /// Create a new lexer from input text
    pub fn new(input: &str, rules: &'r LexerRules) -> Self {
        Self {
            input: input.chars().collect(),
            rules,
            pos: 0,
            line: 1,
            col: 0,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> BsplResult<Vec<Token>> {
        let mut tokens = Vec::new();

        while self.pos < self.input.len() {
            if self.at_comment() {
                self.skip_comment();
                continue;
            }
            let token = self.next_token()?;
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> BsplResult<Token> {
        let ch = self.input[self.pos];
        let line = self.line;
        let col = self.col;

        let single = |kind: TokenKind| Token::new(kind, ch.to_string(), line, col);

        let token = match ch {
            '\n' => {
                self.newline();
                return Ok(Token::new(TokenKind::Newline, "\n", line, col));
            }
            '\r' if self.peek_at(1) == Some('\n') => {
                self.advance();
                self.newline();
                return Ok(Token::new(TokenKind::Newline, "\n", line, col));
            }
            '{' => single(TokenKind::OpenBrace),
            '}' => single(TokenKind::CloseBrace),
            '[' => single(TokenKind::OpenBracket),
            ']' => single(TokenKind::CloseBracket),
            ':' => single(TokenKind::Colon),
            ',' => single(TokenKind::Comma),
            '-' if self.peek_at(1) == Some('>') => {
                self.advance();
                self.advance();
                return Ok(Token::new(TokenKind::Arrow, "->", line, col));
            }
            c if c.is_whitespace() => return Ok(self.read_whitespace()),
            c if self.rules.is_word_char(c) => return Ok(self.read_word()),
            _ => return Err(BsplError::Tokenize { ch, line, col }),
        };

        self.advance();
        Ok(token)
    }

    fn read_whitespace(&mut self) -> Token {
        let (line, col) = (self.line, self.col);
        let mut text = String::new();
        while let Some(c) = self.peek_at(0) {
            if c == '\n' || c == '\r' && self.peek_at(1) == Some('\n') || !c.is_whitespace() {
                break;
            }
            text.push(c);
            self.advance();
        }
        Token::new(TokenKind::Whitespace, text, line, col)
    }

    fn read_word(&mut self) -> Token {
        let (line, col) = (self.line, self.col);
        let mut text = String::new();
        while let Some(c) = self.peek_at(0) {
            if !self.rules.is_word_char(c) {
                break;
            }
            text.push(c);
            self.advance();
        }
        Token::new(TokenKind::Word, text, line, col)
    }

    fn at_comment(&self) -> bool {
        match &self.rules.comment_prefix {
            Some(prefix) => prefix
                .chars()
                .enumerate()
                .all(|(i, c)| self.peek_at(i) == Some(c)),
            None => false,
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek_at(0) {
            if c == '\n' || c == '\r' && self.peek_at(1) == Some('\n') {
                break;
            }
            self.advance();
        }
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            self.pos += 1;
            self.col += 1;
        }
    }

    fn newline(&mut self) {
        self.pos += 1;
        self.line += 1;
        self.col = 0;
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }
}

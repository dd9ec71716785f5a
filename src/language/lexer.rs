use crate::language::{
    errors::{LexError, ParseError, SyntaxError},
    span::{Location, Span},
    token::{Token, TokenKind},
};
use std::{collections::VecDeque, rc::Rc, str::Chars};

/// Lexes a whole input up front. The parser pulls tokens lazily through
/// [`Lexer`] instead; this is for tooling that wants the full stream.
pub fn tokenize(source: &str, file: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source, file);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.read_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

#[derive(Clone, Copy)]
struct Mark {
    offset: usize,
    line: usize,
    column: usize,
}

/// Streaming tokenizer with an on-demand lookahead buffer.
pub struct Lexer<'a> {
    src: &'a str,
    file: Rc<str>,
    chars: Chars<'a>,
    current: Option<char>,
    offset: usize,
    line: usize,
    column: usize,
    lookahead: VecDeque<Token>,
    exhausted: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str, file: &str) -> Self {
        let mut chars = src.chars();
        let current = chars.next();
        Self {
            src,
            file: Rc::from(file),
            chars,
            current,
            offset: 0,
            line: 1,
            column: 1,
            lookahead: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Consumes the next token. Running out of input here is a syntax error
    /// because the caller required a token.
    pub fn next(&mut self) -> Result<Token, ParseError> {
        self.fill(1)?;
        match self.lookahead.pop_front() {
            Some(token) => Ok(token),
            None => Err(SyntaxError::new("Unexpected end of input", self.current_location()).into()),
        }
    }

    /// Returns the `how_many`-th unconsumed token (1-based) without consuming
    /// it, or `None` when the input ends first.
    pub fn peek(&mut self, how_many: usize) -> Result<Option<&Token>, LexError> {
        let how_many = how_many.max(1);
        self.fill(how_many)?;
        Ok(self.lookahead.get(how_many - 1))
    }

    pub fn peek_kind(&mut self, how_many: usize) -> Result<Option<TokenKind>, LexError> {
        Ok(self.peek(how_many)?.map(|token| token.kind))
    }

    pub fn current_location(&self) -> Location {
        let width = self.current.map(char::len_utf8).unwrap_or(0);
        Location::new(
            self.file.clone(),
            self.line,
            self.column,
            Span::new(self.offset, self.offset + width),
        )
    }

    fn fill(&mut self, how_many: usize) -> Result<(), LexError> {
        while !self.exhausted && self.lookahead.len() < how_many {
            match self.read_token()? {
                Some(token) => self.lookahead.push_back(token),
                None => self.exhausted = true,
            }
        }
        Ok(())
    }

    fn bump(&mut self) -> Option<char> {
        if let Some(ch) = self.current {
            self.offset += ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.current = self.chars.next();
        self.current
    }

    fn mark(&self) -> Mark {
        Mark {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    fn location_from(&self, start: Mark) -> Location {
        let end = if self.offset > start.offset {
            self.offset
        } else {
            start.offset + self.current.map(char::len_utf8).unwrap_or(0)
        };
        Location::new(
            self.file.clone(),
            start.line,
            start.column,
            Span::new(start.offset, end),
        )
    }

    fn token(&self, kind: TokenKind, lexeme: impl Into<String>, start: Mark) -> Token {
        Token {
            kind,
            lexeme: lexeme.into(),
            location: self.location_from(start),
        }
    }

    fn read_token(&mut self) -> Result<Option<Token>, LexError> {
        while matches!(self.current, Some(ch) if ch.is_whitespace()) {
            self.bump();
        }
        let Some(ch) = self.current else {
            return Ok(None);
        };

        let start = self.mark();
        let token = match ch {
            ch if ch.is_ascii_alphabetic() => self.lex_identifier(start),
            ch if ch.is_ascii_digit() => self.lex_integer(start),
            '"' => self.lex_string(start)?,
            '+' => self.single(TokenKind::Plus, start),
            '-' => self.single(TokenKind::Minus, start),
            '*' => self.single(TokenKind::Star, start),
            '/' => self.single(TokenKind::Slash, start),
            '(' => self.single(TokenKind::LParen, start),
            ')' => self.single(TokenKind::RParen, start),
            '{' => self.single(TokenKind::LBrace, start),
            '}' => self.single(TokenKind::RBrace, start),
            ',' => self.single(TokenKind::Comma, start),
            ';' => self.single(TokenKind::Semi, start),
            '=' => self.one_or_two(TokenKind::Eq, TokenKind::EqEq, start),
            '<' => self.one_or_two(TokenKind::Lt, TokenKind::LtEq, start),
            '>' => self.one_or_two(TokenKind::Gt, TokenKind::GtEq, start),
            '&' => self.pair('&', TokenKind::AmpersandAmpersand, start)?,
            '|' => self.pair('|', TokenKind::PipePipe, start)?,
            '!' => self.pair('=', TokenKind::BangEq, start)?,
            other => {
                return Err(LexError::new(
                    format!("Unrecognized character '{}'", other),
                    self.location_from(start),
                ));
            }
        };

        tracing::trace!(
            kind = %token.kind,
            lexeme = %token.lexeme,
            line = token.location.line,
            column = token.location.column,
            "token"
        );
        Ok(Some(token))
    }

    fn lex_identifier(&mut self, start: Mark) -> Token {
        while matches!(self.current, Some(ch) if ch.is_ascii_alphanumeric()) {
            self.bump();
        }
        let slice = &self.src[start.offset..self.offset];
        let kind = TokenKind::keyword(slice).unwrap_or(TokenKind::Identifier);
        self.token(kind, slice, start)
    }

    fn lex_integer(&mut self, start: Mark) -> Token {
        while matches!(self.current, Some(ch) if ch.is_ascii_digit()) {
            self.bump();
        }
        let slice = &self.src[start.offset..self.offset];
        self.token(TokenKind::Integer, slice, start)
    }

    fn lex_string(&mut self, start: Mark) -> Result<Token, LexError> {
        let mut value = String::new();
        self.bump();
        loop {
            match self.current {
                None => {
                    return Err(LexError::new(
                        "Unterminated string literal",
                        self.location_from(start),
                    ));
                }
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    let escape_start = self.mark();
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('"') => '"',
                        Some(other) => {
                            self.bump();
                            return Err(LexError::new(
                                format!("Invalid escape sequence '\\{}'", other),
                                self.location_from(escape_start),
                            ));
                        }
                        None => {
                            return Err(LexError::new(
                                "Unterminated string literal",
                                self.location_from(start),
                            ));
                        }
                    };
                    value.push(escaped);
                    self.bump();
                }
                Some(ch) => {
                    value.push(ch);
                    self.bump();
                }
            }
        }
        Ok(self.token(TokenKind::String, value, start))
    }

    fn single(&mut self, kind: TokenKind, start: Mark) -> Token {
        self.bump();
        let slice = &self.src[start.offset..self.offset];
        self.token(kind, slice, start)
    }

    fn one_or_two(&mut self, one: TokenKind, two: TokenKind, start: Mark) -> Token {
        if self.bump() == Some('=') {
            self.bump();
            let slice = &self.src[start.offset..self.offset];
            self.token(two, slice, start)
        } else {
            let slice = &self.src[start.offset..self.offset];
            self.token(one, slice, start)
        }
    }

    /// `&&`, `||` and `!=` have no one-character fallback.
    fn pair(&mut self, second: char, kind: TokenKind, start: Mark) -> Result<Token, LexError> {
        let first = self.current.unwrap_or(second);
        if self.bump() == Some(second) {
            self.bump();
            let slice = &self.src[start.offset..self.offset];
            Ok(self.token(kind, slice, start))
        } else {
            Err(LexError::new(
                format!(
                    "Unrecognized character '{}' (expected '{}{}')",
                    first, first, second
                ),
                self.location_from(start),
            ))
        }
    }
}

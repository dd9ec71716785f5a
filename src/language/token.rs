use crate::language::span::Location;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub location: Location,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Integer,
    String,

    Var,
    If,
    Else,
    While,
    Function,

    Plus,
    Minus,
    Star,
    Slash,
    Eq,
    EqEq,
    BangEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AmpersandAmpersand,
    PipePipe,

    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semi,
}

impl TokenKind {
    pub fn keyword(ident: &str) -> Option<Self> {
        match ident {
            "var" => Some(TokenKind::Var),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "while" => Some(TokenKind::While),
            "function" => Some(TokenKind::Function),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Integer => "INTEGER_LITERAL",
            TokenKind::String => "STRING",
            TokenKind::Var => "VAR",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::While => "WHILE",
            TokenKind::Function => "FUNCTION",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "TIMES",
            TokenKind::Slash => "DIVIDE",
            TokenKind::Eq => "ASSIGN",
            TokenKind::EqEq => "IS_EQUAL",
            TokenKind::BangEq => "NOT_EQUAL",
            TokenKind::Lt => "LESS",
            TokenKind::LtEq => "LESS_EQUAL",
            TokenKind::Gt => "GREATER",
            TokenKind::GtEq => "GREATER_EQUAL",
            TokenKind::AmpersandAmpersand => "AND",
            TokenKind::PipePipe => "OR",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::Comma => "COMMA",
            TokenKind::Semi => "SEMICOLON",
        }
    }

    /// How the token reads in a "expected ..." hint.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Identifier => "an identifier",
            TokenKind::Integer => "an integer literal",
            TokenKind::String => "a string literal",
            TokenKind::Var => "'var'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::While => "'while'",
            TokenKind::Function => "'function'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Eq => "'='",
            TokenKind::EqEq => "'=='",
            TokenKind::BangEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::LtEq => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::GtEq => "'>='",
            TokenKind::AmpersandAmpersand => "'&&'",
            TokenKind::PipePipe => "'||'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Comma => "','",
            TokenKind::Semi => "';'",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}[{}]", self.location.line, self.location.column, self.kind, self.lexeme)
    }
}

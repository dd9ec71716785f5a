use crate::language::span::Location;
use miette::SourceSpan;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
#[error("{message}")]
pub struct LexError {
    pub message: String,
    pub location: Location,
}

impl LexError {
    pub fn new(message: impl Into<String>, location: Location) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    pub location: Location,
    pub help: Option<String>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, location: Location) -> Self {
        Self {
            message: message.into(),
            location,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Anything that can stop the front end: a bad character or a bad token.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

pub(crate) fn to_source_span(location: &Location) -> SourceSpan {
    (location.span.start, location.span.len().max(1)).into()
}

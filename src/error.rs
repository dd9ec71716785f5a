use crate::language::{
    errors::{LexError, ParseError, SyntaxError},
    span::Location,
};
use crate::runtime::error::RuntimeError;
use thiserror::Error;

/// Every way a run can fail, tagged with the phase that raised it.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    #[error("Lexical error: {0}")]
    Lexical(#[from] LexError),
    #[error("Syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] RuntimeError),
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Lex(err) => Error::Lexical(err),
            ParseError::Syntax(err) => Error::Syntax(err),
        }
    }
}

impl Error {
    pub fn kind_label(&self) -> &'static str {
        match self {
            Error::Lexical(_) => "Lexical error",
            Error::Syntax(_) => "Syntax error",
            Error::Evaluation(_) => "Evaluation error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Error::Lexical(err) => err.message.clone(),
            Error::Syntax(err) => err.message.clone(),
            Error::Evaluation(err) => err.kind.to_string(),
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            Error::Lexical(err) => &err.location,
            Error::Syntax(err) => &err.location,
            Error::Evaluation(err) => &err.location,
        }
    }
}

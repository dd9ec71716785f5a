use crate::{error::Error, language::errors::to_source_span};
use miette::{Diagnostic, NamedSource, Report, SourceSpan};
use std::path::Path;
use thiserror::Error;

/// A failed run rendered against the source that produced it.
#[derive(Debug, Error, Diagnostic, Clone)]
#[error("{kind}: {message}")]
pub struct SourceDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("{label}")]
    span: SourceSpan,
    #[help]
    help: Option<String>,
    kind: &'static str,
    message: String,
    label: String,
}

impl SourceDiagnostic {
    pub fn from_error(src: NamedSource<String>, err: &Error) -> Self {
        let (label, help) = match err {
            Error::Lexical(_) => ("not valid here", None),
            Error::Syntax(syntax) => ("unexpected here", syntax.help.clone()),
            Error::Evaluation(_) => ("failed here", None),
        };
        Self {
            src,
            span: to_source_span(err.location()),
            help,
            kind: err.kind_label(),
            message: err.message(),
            label: format!("{label} at {}", err.location()),
        }
    }
}

pub fn emit_error(path: &str, source: &str, err: &Error) {
    let src = NamedSource::new(path, source.to_string());
    let diagnostic = SourceDiagnostic::from_error(src, err);
    eprintln!("{:?}", Report::new(diagnostic));
}

pub fn report_io_error(path: &Path, error: &std::io::Error) {
    eprintln!("Failed to access {}: {}", path.display(), error);
}

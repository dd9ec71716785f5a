use std::fmt;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Where a token or node starts in its source file.
///
/// Lines and columns are 1-based. The span is kept alongside so diagnostics
/// can underline the offending text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub file: Rc<str>,
    pub line: usize,
    pub column: usize,
    pub span: Span,
}

impl Location {
    pub fn new(file: Rc<str>, line: usize, column: usize, span: Span) -> Self {
        Self {
            file,
            line,
            column,
            span,
        }
    }

    /// A location for values created outside any source text.
    pub fn synthetic() -> Self {
        Self::new(Rc::from("<builtin>"), 0, 0, Span::default())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

use crate::language::span::Location;
use crate::runtime::value::ValueKind;
use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum RuntimeErrorKind {
    #[error("Reference to undefined name '{name}'")]
    UndefinedName { name: String },
    #[error("Variable '{name}' already defined")]
    Redefinition { name: String },
    #[error("Non-numeric operand to '{op}': found {found}")]
    NonNumericOperand { op: &'static str, found: ValueKind },
    #[error("Condition must be numeric, found {found}")]
    NonNumericCondition { found: ValueKind },
    #[error("Attempt to divide by zero")]
    DivisionByZero,
    #[error("Integer literal '{text}' is out of range")]
    IntegerLiteral { text: String },
    #[error("Function '{name}' requires {expected} arguments but received {received}")]
    ArityMismatch {
        name: String,
        expected: usize,
        received: usize,
    },
    #[error("Built-in '{name}' expects {expected} argument(s) but received {received}")]
    BuiltinArity {
        name: &'static str,
        expected: usize,
        received: usize,
    },
    #[error("Argument {position} of built-in '{name}' must be {expected}, found {found}")]
    BuiltinArgument {
        name: &'static str,
        position: usize,
        expected: ValueKind,
        found: ValueKind,
    },
    #[error("Array index out of bounds: {index} (length {len})")]
    IndexOutOfBounds { index: i64, len: usize },
    #[error("Cannot pop from an empty array")]
    EmptyArray,
    #[error("Substring range {start}..{end} is invalid for a string of length {len}")]
    SubstringRange { start: i64, end: i64, len: usize },
    #[error("'{name}' is {kind}, which cannot be called")]
    NotCallable { name: String, kind: ValueKind },
    #[error("Maximum call depth of {limit} exceeded")]
    CallDepthExceeded { limit: usize },
    #[error("Failed to read input: {message}")]
    Input { message: String },
    #[error("Failed to write output: {message}")]
    Output { message: String },
}

/// An evaluation failure and the node or call site it happened at.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{kind}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub location: Location,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, location: Location) -> Self {
        Self { kind, location }
    }
}

impl RuntimeErrorKind {
    pub fn at(self, location: &Location) -> RuntimeError {
        RuntimeError::new(self, location.clone())
    }
}

use crate::language::ast::{Block, FunctionDef, Identifier};
use crate::runtime::builtins::Intrinsic;
use crate::runtime::environment::ScopeId;
use crate::stack::ensure_sufficient_stack;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

thread_local! {
    static LIVE_REPRESENTATIONS: Cell<usize> = const { Cell::new(0) };
}

/// Number of function, array and string representations currently alive on
/// this thread.
pub fn live_representations() -> usize {
    LIVE_REPRESENTATIONS.with(Cell::get)
}

fn track_alloc() {
    LIVE_REPRESENTATIONS.with(|count| count.set(count.get() + 1));
}

fn track_free() {
    LIVE_REPRESENTATIONS.with(|count| count.set(count.get().saturating_sub(1)));
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Function,
    Intrinsic,
    Array,
    String,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ValueKind::Int => "an integer",
            ValueKind::Function => "a function",
            ValueKind::Intrinsic => "an intrinsic function",
            ValueKind::Array => "an array",
            ValueKind::String => "a string",
        };
        f.write_str(text)
    }
}

/// A runtime value. Integers are stored inline; everything else shares a
/// reference-counted representation, so copying a value aliases it.
#[derive(Clone)]
pub enum Value {
    Int(i64),
    Intrinsic(&'static Intrinsic),
    Function(Rc<FunctionRep>),
    Array(Rc<ArrayRep>),
    String(Rc<StringRep>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Int(0)
    }
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(ArrayRep::new(items)))
    }

    pub fn string(text: impl Into<String>) -> Self {
        Value::String(Rc::new(StringRep::new(text)))
    }

    pub fn function(def: Rc<FunctionDef>, closure: ScopeId) -> Self {
        Value::Function(Rc::new(FunctionRep::new(def, closure)))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Intrinsic(_) => ValueKind::Intrinsic,
            Value::Function(_) => ValueKind::Function,
            Value::Array(_) => ValueKind::Array,
            Value::String(_) => ValueKind::String,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Strong count of the shared representation; `None` for integers and
    /// intrinsics, which have none.
    pub fn ref_count(&self) -> Option<usize> {
        match self {
            Value::Function(rep) => Some(Rc::strong_count(rep)),
            Value::Array(rep) => Some(Rc::strong_count(rep)),
            Value::String(rep) => Some(Rc::strong_count(rep)),
            Value::Int(_) | Value::Intrinsic(_) => None,
        }
    }

    pub fn shares_representation(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::String(a), Value::String(b)) => Rc::ptr_eq(a, b),
            (Value::Intrinsic(a), Value::Intrinsic(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{value}"),
            Value::Intrinsic(_) => write!(f, "<intrinsic function>"),
            Value::Function(rep) => write!(f, "<function {}>", rep.name()),
            Value::Array(rep) => write_array(f, rep, &mut Vec::new()),
            Value::String(rep) => f.write_str(rep.as_str()),
        }
    }
}

/// Writes `rep` as `[a, b, ...]`. `open` holds the arrays currently being
/// written further up; meeting one of them again prints `[...]`.
fn write_array(
    f: &mut fmt::Formatter<'_>,
    rep: &Rc<ArrayRep>,
    open: &mut Vec<*const ArrayRep>,
) -> fmt::Result {
    let ptr = Rc::as_ptr(rep);
    if open.contains(&ptr) {
        return f.write_str("[...]");
    }
    open.push(ptr);
    f.write_str("[")?;
    for (idx, value) in rep.items.borrow().iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        match value {
            Value::Array(inner) => {
                ensure_sufficient_stack(|| write_array(f, inner, open))?;
            }
            other => write!(f, "{other}")?,
        }
    }
    open.pop();
    f.write_str("]")
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(value) => f.debug_tuple("Int").field(value).finish(),
            Value::Intrinsic(intrinsic) => f.debug_tuple("Intrinsic").field(&intrinsic.name).finish(),
            Value::Function(rep) => f.debug_tuple("Function").field(&rep.name()).finish(),
            Value::Array(rep) => f.debug_tuple("Array").field(&rep.len()).finish(),
            Value::String(rep) => f.debug_tuple("String").field(&rep.as_str()).finish(),
        }
    }
}

/// A user function: its definition plus the scope it closes over.
pub struct FunctionRep {
    def: Rc<FunctionDef>,
    closure: ScopeId,
}

impl FunctionRep {
    pub fn new(def: Rc<FunctionDef>, closure: ScopeId) -> Self {
        track_alloc();
        Self { def, closure }
    }

    pub fn name(&self) -> &str {
        &self.def.name.name
    }

    pub fn params(&self) -> &[Identifier] {
        &self.def.params
    }

    pub fn arity(&self) -> usize {
        self.def.params.len()
    }

    pub fn body(&self) -> &Block {
        &self.def.body
    }

    pub fn closure(&self) -> ScopeId {
        self.closure
    }
}

impl Drop for FunctionRep {
    fn drop(&mut self) {
        track_free();
    }
}

/// Mutable, shared element storage. Every alias of an array sees the same
/// elements.
pub struct ArrayRep {
    items: RefCell<Vec<Value>>,
}

impl ArrayRep {
    pub fn new(items: Vec<Value>) -> Self {
        track_alloc();
        Self {
            items: RefCell::new(items),
        }
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    fn slot(&self, index: i64) -> Option<usize> {
        usize::try_from(index).ok().filter(|idx| *idx < self.len())
    }

    pub fn get(&self, index: i64) -> Option<Value> {
        let idx = self.slot(index)?;
        self.items.borrow().get(idx).cloned()
    }

    /// Replaces the element at `index`, handing back the previous one so
    /// the caller controls when it is released.
    pub fn set(&self, index: i64, value: Value) -> Option<Value> {
        let idx = self.slot(index)?;
        let mut items = self.items.borrow_mut();
        Some(std::mem::replace(&mut items[idx], value))
    }

    pub fn push(&self, value: Value) {
        self.items.borrow_mut().push(value);
    }

    pub fn pop(&self) -> Option<Value> {
        self.items.borrow_mut().pop()
    }
}

impl Drop for ArrayRep {
    fn drop(&mut self) {
        track_free();
    }
}

/// Immutable text. Lengths and offsets count characters.
pub struct StringRep {
    text: Box<str>,
}

impl StringRep {
    pub fn new(text: impl Into<String>) -> Self {
        track_alloc();
        Self {
            text: text.into().into_boxed_str(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Characters in `[start, end)`, or `None` unless
    /// `0 <= start <= end <= char_len`.
    pub fn substr(&self, start: i64, end: i64) -> Option<String> {
        let start = usize::try_from(start).ok()?;
        let end = usize::try_from(end).ok()?;
        if start > end || end > self.char_len() {
            return None;
        }
        Some(self.text.chars().skip(start).take(end - start).collect())
    }

    pub fn concat(&self, other: &StringRep) -> String {
        let mut joined = String::with_capacity(self.text.len() + other.text.len());
        joined.push_str(&self.text);
        joined.push_str(&other.text);
        joined
    }
}

impl Drop for StringRep {
    fn drop(&mut self) {
        track_free();
    }
}

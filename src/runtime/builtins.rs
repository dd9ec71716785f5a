use crate::language::span::Location;
use crate::runtime::{
    error::{RuntimeError, RuntimeErrorKind, RuntimeResult},
    interpreter::Interpreter,
    value::{ArrayRep, Value, ValueKind},
};
use std::fmt;

pub type NativeFn = fn(&mut Interpreter, &[Value], &Location) -> RuntimeResult<Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Param {
    Any,
    Kind(ValueKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signature {
    Fixed(&'static [Param]),
    Variadic,
}

/// A built-in function. Arguments are checked against `signature` before
/// `call` runs.
pub struct Intrinsic {
    pub name: &'static str,
    pub signature: Signature,
    call: NativeFn,
}

impl fmt::Debug for Intrinsic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Intrinsic")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish()
    }
}

const INT: Param = Param::Kind(ValueKind::Int);
const ARRAY: Param = Param::Kind(ValueKind::Array);
const STRING: Param = Param::Kind(ValueKind::String);

pub static INTRINSICS: [Intrinsic; 12] = [
    Intrinsic {
        name: "print",
        signature: Signature::Fixed(&[Param::Any]),
        call: print,
    },
    Intrinsic {
        name: "println",
        signature: Signature::Fixed(&[Param::Any]),
        call: println,
    },
    Intrinsic {
        name: "readint",
        signature: Signature::Fixed(&[]),
        call: readint,
    },
    Intrinsic {
        name: "mkarr",
        signature: Signature::Variadic,
        call: mkarr,
    },
    Intrinsic {
        name: "len",
        signature: Signature::Fixed(&[ARRAY]),
        call: len,
    },
    Intrinsic {
        name: "get",
        signature: Signature::Fixed(&[ARRAY, INT]),
        call: get,
    },
    Intrinsic {
        name: "set",
        signature: Signature::Fixed(&[ARRAY, INT, Param::Any]),
        call: set,
    },
    Intrinsic {
        name: "push",
        signature: Signature::Fixed(&[ARRAY, Param::Any]),
        call: push,
    },
    Intrinsic {
        name: "pop",
        signature: Signature::Fixed(&[ARRAY]),
        call: pop,
    },
    Intrinsic {
        name: "substr",
        signature: Signature::Fixed(&[STRING, INT, INT]),
        call: substr,
    },
    Intrinsic {
        name: "strcat",
        signature: Signature::Fixed(&[STRING, STRING]),
        call: strcat,
    },
    Intrinsic {
        name: "strlen",
        signature: Signature::Fixed(&[STRING]),
        call: strlen,
    },
];

pub fn lookup(name: &str) -> Option<&'static Intrinsic> {
    INTRINSICS.iter().find(|intrinsic| intrinsic.name == name)
}

pub fn names() -> impl Iterator<Item = &'static str> {
    INTRINSICS.iter().map(|intrinsic| intrinsic.name)
}

impl Intrinsic {
    pub fn invoke(
        &self,
        interp: &mut Interpreter,
        args: &[Value],
        location: &Location,
    ) -> RuntimeResult<Value> {
        self.check_args(args, location)?;
        tracing::debug!(intrinsic = self.name, args = args.len(), "call intrinsic");
        (self.call)(interp, args, location)
    }

    pub fn check_args(&self, args: &[Value], location: &Location) -> RuntimeResult<()> {
        let Signature::Fixed(params) = self.signature else {
            return Ok(());
        };
        if params.len() != args.len() {
            return Err(RuntimeErrorKind::BuiltinArity {
                name: self.name,
                expected: params.len(),
                received: args.len(),
            }
            .at(location));
        }
        for (idx, (param, arg)) in params.iter().zip(args).enumerate() {
            if let Param::Kind(expected) = *param {
                if arg.kind() != expected {
                    return Err(self.mismatch(idx, expected, arg, location));
                }
            }
        }
        Ok(())
    }

    fn mismatch(
        &self,
        idx: usize,
        expected: ValueKind,
        found: &Value,
        location: &Location,
    ) -> RuntimeError {
        RuntimeErrorKind::BuiltinArgument {
            name: self.name,
            position: idx + 1,
            expected,
            found: found.kind(),
        }
        .at(location)
    }
}

// Natives only run after `check_args`, so the argument shapes below always
// match. The fallback arm reports what was actually received.
fn malformed(name: &'static str, expected: usize, args: &[Value], location: &Location) -> RuntimeError {
    RuntimeErrorKind::BuiltinArity {
        name,
        expected,
        received: args.len(),
    }
    .at(location)
}

fn print(interp: &mut Interpreter, args: &[Value], location: &Location) -> RuntimeResult<Value> {
    let [value] = args else {
        return Err(malformed("print", 1, args, location));
    };
    interp.write_output(&value.to_string(), location)?;
    Ok(Value::Int(0))
}

fn println(interp: &mut Interpreter, args: &[Value], location: &Location) -> RuntimeResult<Value> {
    let [value] = args else {
        return Err(malformed("println", 1, args, location));
    };
    interp.write_output(&format!("{value}\n"), location)?;
    Ok(Value::Int(0))
}

fn readint(interp: &mut Interpreter, _args: &[Value], location: &Location) -> RuntimeResult<Value> {
    interp.read_int(location).map(Value::Int)
}

fn mkarr(_interp: &mut Interpreter, args: &[Value], _location: &Location) -> RuntimeResult<Value> {
    Ok(Value::array(args.to_vec()))
}

fn len(_interp: &mut Interpreter, args: &[Value], location: &Location) -> RuntimeResult<Value> {
    let [Value::Array(array)] = args else {
        return Err(malformed("len", 1, args, location));
    };
    Ok(Value::Int(array.len() as i64))
}

fn get(_interp: &mut Interpreter, args: &[Value], location: &Location) -> RuntimeResult<Value> {
    let [Value::Array(array), Value::Int(index)] = args else {
        return Err(malformed("get", 2, args, location));
    };
    array.get(*index).ok_or_else(|| out_of_bounds(array, *index, location))
}

fn set(_interp: &mut Interpreter, args: &[Value], location: &Location) -> RuntimeResult<Value> {
    let [Value::Array(array), Value::Int(index), value] = args else {
        return Err(malformed("set", 3, args, location));
    };
    match array.set(*index, value.clone()) {
        Some(_previous) => Ok(value.clone()),
        None => Err(out_of_bounds(array, *index, location)),
    }
}

fn push(_interp: &mut Interpreter, args: &[Value], location: &Location) -> RuntimeResult<Value> {
    let [Value::Array(array), value] = args else {
        return Err(malformed("push", 2, args, location));
    };
    array.push(value.clone());
    Ok(value.clone())
}

fn pop(_interp: &mut Interpreter, args: &[Value], location: &Location) -> RuntimeResult<Value> {
    let [Value::Array(array)] = args else {
        return Err(malformed("pop", 1, args, location));
    };
    array
        .pop()
        .ok_or_else(|| RuntimeErrorKind::EmptyArray.at(location))
}

fn substr(_interp: &mut Interpreter, args: &[Value], location: &Location) -> RuntimeResult<Value> {
    let [Value::String(text), Value::Int(start), Value::Int(end)] = args else {
        return Err(malformed("substr", 3, args, location));
    };
    let (start, end) = (*start, *end);
    match text.substr(start, end) {
        Some(slice) => Ok(Value::string(slice)),
        None => Err(RuntimeErrorKind::SubstringRange {
            start,
            end,
            len: text.char_len(),
        }
        .at(location)),
    }
}

fn strcat(_interp: &mut Interpreter, args: &[Value], location: &Location) -> RuntimeResult<Value> {
    let [Value::String(left), Value::String(right)] = args else {
        return Err(malformed("strcat", 2, args, location));
    };
    Ok(Value::string(left.concat(right)))
}

fn strlen(_interp: &mut Interpreter, args: &[Value], location: &Location) -> RuntimeResult<Value> {
    let [Value::String(text)] = args else {
        return Err(malformed("strlen", 1, args, location));
    };
    Ok(Value::Int(text.char_len() as i64))
}

fn out_of_bounds(
    array: &ArrayRep,
    index: i64,
    location: &Location,
) -> RuntimeError {
    RuntimeErrorKind::IndexOutOfBounds {
        index,
        len: array.len(),
    }
    .at(location)
}

use crate::{
    config::RunConfig,
    error::Error,
    language::parser::parse_source,
    runtime::{Interpreter, RuntimeError, Value},
};
use std::cell::RefCell;
use std::io::{self, Cursor, Write};
use std::rc::Rc;

mod programs;

/// In-memory output sink whose contents stay readable after the
/// interpreter that wrote them is gone.
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct Outcome {
    result: Result<Value, Error>,
    output: String,
}

fn run_full(source: &str, input: &str, config: RunConfig) -> Outcome {
    let sink = SharedBuffer::default();
    let result = parse_source(source, "test.tly")
        .map_err(Error::from)
        .and_then(|unit| {
            let mut interpreter = Interpreter::new(unit)
                .with_config(config)
                .with_output(sink.clone())
                .with_input(Cursor::new(input.to_string()));
            interpreter.run().map_err(Error::from)
        });
    Outcome {
        result,
        output: sink.contents(),
    }
}

fn run(source: &str) -> Outcome {
    run_full(source, "", RunConfig::default())
}

/// Output of a program that is expected to succeed.
fn output_of(source: &str) -> String {
    let outcome = run(source);
    if let Err(err) = &outcome.result {
        panic!("program failed: {err}\noutput so far: {}", outcome.output);
    }
    outcome.output
}

fn value_of(source: &str) -> Value {
    match run(source).result {
        Ok(value) => value,
        Err(err) => panic!("program failed: {err}"),
    }
}

fn runtime_error(outcome: &Outcome) -> &RuntimeError {
    match &outcome.result {
        Err(Error::Evaluation(err)) => err,
        Err(other) => panic!("expected an evaluation error, got {other}"),
        Ok(value) => panic!("expected an evaluation error, got {value}"),
    }
}

/// Runs without the pre-pass so the evaluator's own checks are exercised.
fn run_unchecked(source: &str) -> Outcome {
    run_full(
        source,
        "",
        RunConfig {
            analyze: false,
            ..RunConfig::default()
        },
    )
}

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod language;
pub mod runtime;
mod stack;

#[cfg(test)]
mod tests;

use std::sync::Once;

pub use config::{Command, RunConfig};
pub use error::Error;
use crate::language::parser::parse_source;
use crate::runtime::{Interpreter, Value};

static TRACING_INIT: Once = Once::new();

/// Installs a stderr subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}

/// Parses `source` and wraps it in an interpreter wired to stdin/stdout.
pub fn load(source: &str, file: &str, config: RunConfig) -> Result<Interpreter, Error> {
    let unit = parse_source(source, file)?;
    Ok(Interpreter::new(unit).with_config(config))
}

/// Parses, analyzes (unless disabled) and executes `source`.
pub fn run_source(source: &str, file: &str, config: RunConfig) -> Result<Value, Error> {
    let mut interpreter = load(source, file, config)?;
    Ok(interpreter.run()?)
}

use std::env;
use std::fmt;

pub const DEFAULT_MAX_CALL_DEPTH: usize = 1000;

pub const USAGE: &str = "Usage: tally [run|check|ast|tokens] <filename.tly>";

/// Knobs for a single interpreter run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// Run the name-resolution pre-pass before executing.
    pub analyze: bool,
    /// Deepest chain of nested user function calls allowed.
    pub max_call_depth: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            analyze: true,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl RunConfig {
    /// Reads `TALLY_SKIP_ANALYZE` and `TALLY_MAX_CALL_DEPTH`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let skip_analyze = lookup("TALLY_SKIP_ANALYZE")
            .map(|value| is_truthy(&value))
            .unwrap_or(false);
        let max_call_depth = match lookup("TALLY_MAX_CALL_DEPTH") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => depth,
                _ => {
                    tracing::warn!(value = %raw, "ignoring invalid TALLY_MAX_CALL_DEPTH");
                    defaults.max_call_depth
                }
            },
            None => defaults.max_call_depth,
        };
        Self {
            analyze: !skip_analyze,
            max_call_depth,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Run,
    Check,
    Ast,
    Tokens,
}

impl Command {
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "run" => Some(Command::Run),
            "check" => Some(Command::Check),
            "ast" => Some(Command::Ast),
            "tokens" => Some(Command::Tokens),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            Command::Run => "run",
            Command::Check => "check",
            Command::Ast => "ast",
            Command::Tokens => "tokens",
        };
        f.write_str(word)
    }
}

//! Stack growth for the recursive parts of the pipeline.
//!
//! The parser, the pre-pass and the evaluator all recurse over the program.
//! Wrapping each recursive step in [`ensure_sufficient_stack`] lets deep
//! nesting and long call chains run on an ordinary thread stack.

/// Below this much remaining stack, a new segment is allocated.
const RED_ZONE: usize = 100 * 1024;

/// Size of each newly allocated stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

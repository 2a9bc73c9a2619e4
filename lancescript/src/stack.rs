//! Native stack growth for the recursive parser and evaluator

/// Remaining stack below which a new segment is allocated
const STACK_RED_ZONE: usize = 128 * 1024; // 128KB
/// Size of each newly allocated segment
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // 4MB

/// Run `f`, first growing the stack when little of it is left
#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, f)
}

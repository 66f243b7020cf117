//! Nested scopes: discard every node created inside a region in one step.
//!
//! A scope records the tape length and arena marks when it opens. Closing it
//! truncates the tape and releases the arenas back to those marks, so the
//! outer computation sees exactly the nodes it had before. Scopes nest in
//! LIFO order on the thread's context.
//!
//! ```
//! use wombat::{nested, tape_len, Var};
//!
//! let x = Var::new(2.0_f64);
//! let before = tape_len::<f64>();
//! let g = nested::<f64, _>(|| {
//!     let y = x * x;
//!     y.grad(&[x]).unwrap()[0]
//! });
//! assert_eq!(g, 4.0);
//! assert_eq!(tape_len::<f64>(), before);
//! ```

use std::marker::PhantomData;

use crate::context::{with_context, ContextThreadLocal};
use crate::error::Result;

/// Open a nested scope on the active context.
pub fn start_nested<F: ContextThreadLocal>() {
    with_context::<F, _>(|c| c.start_nested())
}

/// Close the innermost nested scope on the active context.
///
/// Fails with `NoNestedContext` if no scope is open.
pub fn recover_memory_nested<F: ContextThreadLocal>() -> Result<()> {
    with_context::<F, _>(|c| c.recover_memory_nested())
}

/// Number of open nested scopes on the active context.
pub fn nested_depth<F: ContextThreadLocal>() -> usize {
    with_context::<F, _>(|c| c.nested_depth())
}

/// RAII nested scope.
///
/// Opens a scope on creation and closes it on drop, whether the enclosing
/// code returns normally, bails out with `?` or unwinds. Variables created
/// while the scope is open must not be used after it is dropped: they become
/// stale and any use is reported as [`AdError::StaleVariable`] or panics.
///
/// [`AdError::StaleVariable`]: crate::AdError::StaleVariable
#[must_use = "the scope closes as soon as the guard is dropped"]
pub struct NestedScope<F: ContextThreadLocal> {
    depth: usize,
    // Tied to the thread that opened it.
    _marker: PhantomData<*const F>,
}

impl<F: ContextThreadLocal> NestedScope<F> {
    /// Open a scope on the active context.
    pub fn new() -> Self {
        let depth = with_context::<F, _>(|c| {
            let depth = c.nested_depth();
            c.start_nested();
            depth
        });
        NestedScope {
            depth,
            _marker: PhantomData,
        }
    }

    /// Number of scopes that were open before this one.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl<F: ContextThreadLocal> Default for NestedScope<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ContextThreadLocal> Drop for NestedScope<F> {
    fn drop(&mut self) {
        with_context::<F, _>(|c| {
            let open = c.nested_depth();
            if open > self.depth + 1 {
                log::warn!(
                    "nested scope at depth {} dropped with {} inner scope(s) still open; closing them",
                    self.depth + 1,
                    open - self.depth - 1
                );
            }
            c.recover_nested_to(self.depth);
        })
    }
}

/// Run `f` inside a fresh [`NestedScope`].
///
/// Everything `f` records is discarded when it returns, so the result should
/// hold plain values rather than `Var`s.
pub fn nested<F: ContextThreadLocal, R>(f: impl FnOnce() -> R) -> R {
    let _scope = NestedScope::<F>::new();
    f()
}

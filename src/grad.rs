//! Gradient driver over the thread-local context.
//!
//! These are thin wrappers around the [`Context`](crate::Context) methods of
//! the same names for code that works with `Var`s directly instead of going
//! through the closure API in [`api`](crate::api).

use crate::context::{with_context, ContextThreadLocal};
use crate::error::Result;
use crate::var::Var;

/// Gradient of `output` with respect to each of `inputs`.
///
/// Adjoints over the swept range are zeroed first, so repeated calls do not
/// accumulate. Fails with `StaleVariable` if any handle refers to a
/// discarded node.
///
/// ```
/// use wombat::{grad, Var};
///
/// let x = Var::new(10.0_f64);
/// let y = Var::new(-2.0);
/// let f = x / y;
/// assert_eq!(f.value(), -5.0);
/// assert_eq!(grad(f, &[x, y]).unwrap(), vec![-0.5, -2.5]);
/// ```
pub fn grad<F: ContextThreadLocal>(output: Var<F>, inputs: &[Var<F>]) -> Result<Vec<F>> {
    with_context(|c| c.grad(output, inputs))
}

/// Seed every `(output, adjoint)` pair, sweep once and read the adjoints of
/// `inputs`: a vector-Jacobian product.
pub fn grad_seeded<F: ContextThreadLocal>(
    seeds: &[(Var<F>, F)],
    inputs: &[Var<F>],
) -> Result<Vec<F>> {
    with_context(|c| c.grad_seeded(seeds, inputs))
}

/// Propagate from `output` over the whole tape.
pub fn backward<F: ContextThreadLocal>(output: Var<F>) -> Result<()> {
    with_context(|c| c.backward(output))
}

/// `J[i][j] = ∂dependents[i]/∂independents[j]`, one backward pass per row.
pub fn jacobian_of<F: ContextThreadLocal>(
    dependents: &[Var<F>],
    independents: &[Var<F>],
) -> Result<Vec<Vec<F>>> {
    with_context(|c| c.jacobian_of(dependents, independents))
}

/// Zero every adjoint on the active context.
pub fn set_zero_all_adjoints<F: ContextThreadLocal>() {
    with_context::<F, _>(|c| c.set_zero_all_adjoints())
}

/// Zero the adjoints of nodes in the innermost nested scope.
pub fn set_zero_all_adjoints_nested<F: ContextThreadLocal>() {
    with_context::<F, _>(|c| c.set_zero_all_adjoints_nested())
}

//! Closure-based entry points.
//!
//! Each function creates its input variables, evaluates the closure and runs
//! the backward pass inside its own [`NestedScope`], so it leaves the
//! thread's context exactly as it found it and can be called from inside an
//! outer computation.

use crate::check::check_matching_sizes;
use crate::context::{with_context, ContextThreadLocal};
use crate::error::Result;
use crate::nested::NestedScope;
use crate::var::Var;

fn inputs_for<F: ContextThreadLocal>(x: &[F]) -> Vec<Var<F>> {
    with_context(|c| x.iter().map(|&val| c.push_leaf(val)).collect())
}

/// Value and gradient of a scalar function `f : R^n → R`.
///
/// ```
/// let (fx, g) = wombat::gradient(|x: &[wombat::Var<f64>]| {
///     x[0] * x[0] + x[1] * x[1]
/// }, &[3.0, 4.0]).unwrap();
/// assert_eq!(fx, 25.0);
/// assert!((g[0] - 6.0).abs() < 1e-10);
/// assert!((g[1] - 8.0).abs() < 1e-10);
/// ```
pub fn gradient<F: ContextThreadLocal>(
    f: impl FnOnce(&[Var<F>]) -> Var<F>,
    x: &[F],
) -> Result<(F, Vec<F>)> {
    try_gradient(|v| Ok(f(v)), x)
}

/// Like [`gradient`] for a closure that can fail. On error the scope is
/// recovered before the error is returned.
pub fn try_gradient<F: ContextThreadLocal>(
    f: impl FnOnce(&[Var<F>]) -> Result<Var<F>>,
    x: &[F],
) -> Result<(F, Vec<F>)> {
    let _scope = NestedScope::<F>::new();
    let inputs = inputs_for(x);
    let output = f(&inputs)?;
    let g = with_context(|c| c.grad(output, &inputs))?;
    Ok((output.value(), g))
}

/// Values and full Jacobian of `f : R^n → R^m`, one backward pass per output.
///
/// Returns `(f(x), J)` where `J[i][j] = ∂f_i/∂x_j`.
pub fn jacobian<F: ContextThreadLocal>(
    f: impl FnOnce(&[Var<F>]) -> Vec<Var<F>>,
    x: &[F],
) -> Result<(Vec<F>, Vec<Vec<F>>)> {
    let _scope = NestedScope::<F>::new();
    let inputs = inputs_for(x);
    let outputs = f(&inputs);
    let values = outputs.iter().map(|o| o.value()).collect();
    let jac = with_context(|c| c.jacobian_of(&outputs, &inputs))?;
    Ok((values, jac))
}

/// Vector-Jacobian product (reverse mode): `(f(x), wᵀ·J)`.
///
/// Fails with `SizeMismatch` if `w` does not have one weight per output.
pub fn vjp<F: ContextThreadLocal>(
    f: impl FnOnce(&[Var<F>]) -> Vec<Var<F>>,
    x: &[F],
    w: &[F],
) -> Result<(Vec<F>, Vec<F>)> {
    let _scope = NestedScope::<F>::new();
    let inputs = inputs_for(x);
    let outputs = f(&inputs);
    check_matching_sizes("vjp", outputs.len(), w.len())?;

    let values = outputs.iter().map(|o| o.value()).collect();
    let seeds: Vec<(Var<F>, F)> = outputs.iter().copied().zip(w.iter().copied()).collect();
    let g = with_context(|c| c.grad_seeded(&seeds, &inputs))?;
    Ok((values, g))
}

/// Value and gradient at many points in parallel.
///
/// Each rayon worker records into its own thread-local context; no variable
/// crosses a thread boundary.
#[cfg(feature = "parallel")]
pub fn gradient_par<F, G>(f: G, points: &[&[F]]) -> Result<Vec<(F, Vec<F>)>>
where
    F: ContextThreadLocal,
    G: Fn(&[Var<F>]) -> Var<F> + Sync,
{
    use rayon::prelude::*;

    points.par_iter().map(|x| gradient(&f, x)).collect()
}

//! Splicing externally computed results into the graph.
//!
//! A collaborator that computes `f(operands)` and its partials by other means
//! (an ODE solver, a nested inner gradient, a closed form) records the result
//! as a single node. The backward pass then treats it like any built-in
//! operation.

use crate::check::check_matching_sizes;
use crate::context::{with_context, ContextThreadLocal};
use crate::error::Result;
use crate::node::CustomPartials;
use crate::var::Var;

/// Record `value` as a function of `operands` with known partials:
/// `∂value/∂operands[i] = gradients[i]`.
///
/// The only check is that the two slices have the same length.
///
/// ```
/// use wombat::{grad, precomputed_gradients, Var};
///
/// let x = Var::new(3.0_f64);
/// let y = Var::new(4.0);
/// // x * y, with partials supplied by hand
/// let z = precomputed_gradients(12.0, &[x, y], &[4.0, 3.0]).unwrap();
/// assert_eq!(grad(z, &[x, y]).unwrap(), vec![4.0, 3.0]);
/// ```
pub fn precomputed_gradients<F: ContextThreadLocal>(
    value: F,
    operands: &[Var<F>],
    gradients: &[F],
) -> Result<Var<F>> {
    check_matching_sizes("precomputed_gradients", operands.len(), gradients.len())?;
    Ok(with_context(|c| {
        c.push_nary(value, operands.iter().copied(), gradients.iter().copied())
    }))
}

/// Record `value` as a function of `operands` whose partials are produced
/// by `partials` during the backward pass, from the operand values and the
/// result.
///
/// ```
/// use wombat::{custom_op, grad, Var};
///
/// let x = Var::new(2.0_f64);
/// // exp(x), differentiated from its own result
/// let y = custom_op(2.0_f64.exp(), &[x], |_: &[f64], r: f64, out: &mut [f64]| {
///     out[0] = r;
/// });
/// assert_eq!(grad(y, &[x]).unwrap()[0], 2.0_f64.exp());
/// ```
pub fn custom_op<F, P>(value: F, operands: &[Var<F>], partials: P) -> Var<F>
where
    F: ContextThreadLocal,
    P: CustomPartials<F> + 'static,
{
    with_context(|c| c.push_custom(value, operands.iter().copied(), Box::new(partials)))
}

//! Scalar special functions with hand-derived partials.

use crate::check::{check_bounded, check_not_nan};
use crate::context::{with_context, ContextThreadLocal};
use crate::error::Result;
use crate::var::{unary, Var};

/// Log of a two-component mixture:
/// `ln(θ·exp(λ₁) + (1 − θ)·exp(λ₂))`.
///
/// `theta` must lie in `[0, 1]`; neither `lambda` may be `NaN`. The larger
/// `lambda` is factored out of the exponentials.
///
/// ```
/// use wombat::{log_mix, Var};
///
/// let theta = Var::new(0.3_f64);
/// let l1 = Var::new(-1.0);
/// let l2 = Var::new(-2.0);
/// let m = log_mix(theta, l1, l2).unwrap();
/// let expected = (0.3 * (-1.0_f64).exp() + 0.7 * (-2.0_f64).exp()).ln();
/// assert!((m.value() - expected).abs() < 1e-12);
/// ```
pub fn log_mix<F: ContextThreadLocal>(
    theta: Var<F>,
    lambda1: Var<F>,
    lambda2: Var<F>,
) -> Result<Var<F>> {
    check_bounded("log_mix", "theta", theta.value, F::zero(), F::one())?;
    check_not_nan("log_mix", "lambda1", lambda1.value)?;
    check_not_nan("log_mix", "lambda2", lambda2.value)?;

    let t = theta.value;
    let (l1, l2) = (lambda1.value, lambda2.value);
    let one = F::one();

    let (value, partials) = if l1 > l2 {
        let d = (l2 - l1).exp();
        let denom = t + (one - t) * d;
        (
            l1 + denom.ln(),
            [(one - d) / denom, t / denom, (one - t) * d / denom],
        )
    } else {
        let d = (l1 - l2).exp();
        let denom = (one - t) + t * d;
        (
            l2 + denom.ln(),
            [(d - one) / denom, t * d / denom, (one - t) / denom],
        )
    };

    Ok(with_context(|c| {
        c.push_nary(value, [theta, lambda1, lambda2], partials)
    }))
}

/// Logistic sigmoid `1 / (1 + exp(−x))`.
pub fn inv_logit<F: ContextThreadLocal>(x: Var<F>) -> Var<F> {
    let v = logistic(x.value);
    unary(x, v, v * (F::one() - v))
}

/// `ln(1 + exp(x))` without overflow for large `x`.
pub fn log1p_exp<F: ContextThreadLocal>(x: Var<F>) -> Var<F> {
    let a = x.value;
    let value = if a > F::zero() {
        a + (-a).exp().ln_1p()
    } else {
        a.exp().ln_1p()
    };
    unary(x, value, logistic(a))
}

fn logistic<F: ContextThreadLocal>(a: F) -> F {
    if a >= F::zero() {
        F::one() / (F::one() + (-a).exp())
    } else {
        let e = a.exp();
        e / (F::one() + e)
    }
}

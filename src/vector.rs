//! Reductions over slices of variables.
//!
//! Each function records a single node over all of its operands, with the
//! partials computed during the forward evaluation, instead of a chain of
//! binary nodes.

use crate::check::{check_matching_sizes, check_nonzero_size};
use crate::context::{with_context, ContextThreadLocal};
use crate::error::Result;
use crate::float::lit;
use crate::var::Var;

fn record<F: ContextThreadLocal>(value: F, operands: &[Var<F>], partials: Vec<F>) -> Var<F> {
    with_context(|c| c.push_nary(value, operands.iter().copied(), partials))
}

fn count<F: ContextThreadLocal>(n: usize) -> F {
    lit(n as f64)
}

/// `Σ v_i`. The sum of an empty slice is 0.
pub fn sum<F: ContextThreadLocal>(v: &[Var<F>]) -> Var<F> {
    let value = v.iter().fold(F::zero(), |acc, x| acc + x.value);
    with_context(|c| c.push_nary(value, v.iter().copied(), v.iter().map(|_| F::one())))
}

/// `Σ v_i / n`. Fails on an empty slice.
pub fn mean<F: ContextThreadLocal>(v: &[Var<F>]) -> Result<Var<F>> {
    check_nonzero_size("mean", "v", v.len())?;
    let n = count::<F>(v.len());
    let value = v.iter().fold(F::zero(), |acc, x| acc + x.value) / n;
    let inv = F::one() / n;
    Ok(with_context(|c| {
        c.push_nary(value, v.iter().copied(), v.iter().map(|_| inv))
    }))
}

/// `Σ a_i b_i`.
pub fn dot_product<F: ContextThreadLocal>(a: &[Var<F>], b: &[Var<F>]) -> Result<Var<F>> {
    check_matching_sizes("dot_product", a.len(), b.len())?;
    let value = a
        .iter()
        .zip(b)
        .fold(F::zero(), |acc, (x, y)| acc + x.value * y.value);
    let partials: Vec<F> = b.iter().chain(a).map(|x| x.value).collect();
    Ok(with_context(|c| {
        c.push_nary(value, a.iter().chain(b).copied(), partials)
    }))
}

/// `Σ a_i b_i` with constant `b`.
pub fn dot_product_vd<F: ContextThreadLocal>(a: &[Var<F>], b: &[F]) -> Result<Var<F>> {
    check_matching_sizes("dot_product", a.len(), b.len())?;
    let value = a
        .iter()
        .zip(b)
        .fold(F::zero(), |acc, (x, &y)| acc + x.value * y);
    Ok(record(value, a, b.to_vec()))
}

/// `Σ v_i²`.
pub fn dot_self<F: ContextThreadLocal>(v: &[Var<F>]) -> Var<F> {
    let two = lit::<F>(2.0);
    let value = v.iter().fold(F::zero(), |acc, x| acc + x.value * x.value);
    record(value, v, v.iter().map(|x| two * x.value).collect())
}

/// `Σ (a_i - b_i)²`.
pub fn squared_distance<F: ContextThreadLocal>(a: &[Var<F>], b: &[Var<F>]) -> Result<Var<F>> {
    check_matching_sizes("squared_distance", a.len(), b.len())?;
    let two = lit::<F>(2.0);
    let diffs: Vec<F> = a.iter().zip(b).map(|(x, y)| x.value - y.value).collect();
    let value = diffs.iter().fold(F::zero(), |acc, &d| acc + d * d);
    let partials: Vec<F> = diffs
        .iter()
        .map(|&d| two * d)
        .chain(diffs.iter().map(|&d| -two * d))
        .collect();
    Ok(with_context(|c| {
        c.push_nary(value, a.iter().chain(b).copied(), partials)
    }))
}

/// `Σ (a_i - b_i)²` with constant `b`.
pub fn squared_distance_vd<F: ContextThreadLocal>(a: &[Var<F>], b: &[F]) -> Result<Var<F>> {
    check_matching_sizes("squared_distance", a.len(), b.len())?;
    let two = lit::<F>(2.0);
    let diffs: Vec<F> = a.iter().zip(b).map(|(x, &y)| x.value - y).collect();
    let value = diffs.iter().fold(F::zero(), |acc, &d| acc + d * d);
    Ok(record(value, a, diffs.iter().map(|&d| two * d).collect()))
}

/// Euclidean distance. `NaN` elements are not rejected; they propagate.
pub fn distance<F: ContextThreadLocal>(a: &[Var<F>], b: &[Var<F>]) -> Result<Var<F>> {
    check_matching_sizes("distance", a.len(), b.len())?;
    let diffs: Vec<F> = a.iter().zip(b).map(|(x, y)| x.value - y.value).collect();
    let value = diffs.iter().fold(F::zero(), |acc, &d| acc + d * d).sqrt();
    let partials: Vec<F> = diffs
        .iter()
        .map(|&d| d / value)
        .chain(diffs.iter().map(|&d| -d / value))
        .collect();
    Ok(with_context(|c| {
        c.push_nary(value, a.iter().chain(b).copied(), partials)
    }))
}

/// Sample variance, normalised by `n - 1`.
///
/// Fails on an empty slice. A single element has variance exactly 0.
pub fn variance<F: ContextThreadLocal>(v: &[Var<F>]) -> Result<Var<F>> {
    check_nonzero_size("variance", "v", v.len())?;
    if v.len() == 1 {
        return Ok(Var::new(F::zero()));
    }
    let n = count::<F>(v.len());
    let mean = v.iter().fold(F::zero(), |acc, x| acc + x.value) / n;
    let dof = n - F::one();
    let devs: Vec<F> = v.iter().map(|x| x.value - mean).collect();
    let value = devs.iter().fold(F::zero(), |acc, &d| acc + d * d) / dof;
    let two_over_dof = lit::<F>(2.0) / dof;
    Ok(record(value, v, devs.iter().map(|&d| two_over_dof * d).collect()))
}

/// Sample standard deviation, normalised by `n - 1`.
///
/// Fails on an empty slice. A single element gives exactly 0.
pub fn sd<F: ContextThreadLocal>(v: &[Var<F>]) -> Result<Var<F>> {
    check_nonzero_size("sd", "v", v.len())?;
    if v.len() == 1 {
        return Ok(Var::new(F::zero()));
    }
    let n = count::<F>(v.len());
    let mean = v.iter().fold(F::zero(), |acc, x| acc + x.value) / n;
    let dof = n - F::one();
    let devs: Vec<F> = v.iter().map(|x| x.value - mean).collect();
    let value = (devs.iter().fold(F::zero(), |acc, &d| acc + d * d) / dof).sqrt();
    // Zero spread: zero partials rather than 0 / 0.
    if value == F::zero() {
        return Ok(record(value, v, vec![F::zero(); v.len()]));
    }
    let scale = F::one() / (dof * value);
    Ok(record(value, v, devs.iter().map(|&d| d * scale).collect()))
}

/// `ln Σ exp(v_i)`, evaluated with the maximum factored out.
///
/// An empty slice gives `-∞`.
pub fn log_sum_exp<F: ContextThreadLocal>(v: &[Var<F>]) -> Var<F> {
    if v.is_empty() {
        return Var::new(F::neg_infinity());
    }
    let max = v.iter().fold(F::neg_infinity(), |m, x| m.max(x.value));
    let value = if max.is_infinite() {
        max
    } else {
        max + v
            .iter()
            .fold(F::zero(), |acc, x| acc + (x.value - max).exp())
            .ln()
    };
    record(value, v, v.iter().map(|x| (x.value - value).exp()).collect())
}

use std::fmt::{Debug, Display};

use num_traits::{Float as NumFloat, FloatConst, FromPrimitive};

/// Marker trait for base floating-point types (`f32`, `f64`).
///
/// Bundles the numeric and utility traits needed throughout wombat.
/// Only primitive float types implement this; `Var` does not.
pub trait Float:
    NumFloat + FloatConst + FromPrimitive + Copy + Send + Sync + Default + Debug + Display + 'static
{
    /// Widen to `f64` for error reporting.
    fn to_f64_lossy(self) -> f64;
}

impl Float for f32 {
    #[inline]
    fn to_f64_lossy(self) -> f64 {
        f64::from(self)
    }
}

impl Float for f64 {
    #[inline]
    fn to_f64_lossy(self) -> f64 {
        self
    }
}

/// Convert an `f64` literal into `F`. Exact for `f64`, rounded for `f32`.
#[inline]
pub(crate) fn lit<F: Float>(x: f64) -> F {
    F::from_f64(x).unwrap_or_else(F::nan)
}

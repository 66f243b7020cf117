use std::fmt::{self, Display};

use crate::context::{with_context, ContextThreadLocal};
use crate::error::Result;
use crate::Float;

/// Reverse-mode AD variable.
///
/// A value, its tape position and the epoch stamp of the scope that created
/// it: 16 bytes for `f64`. `Copy` because the node it refers to lives in the
/// thread-local context, not inside this struct. Every `Var`, including
/// literals mixed into arithmetic, has a node of its own.
#[derive(Clone, Copy, Debug)]
pub struct Var<F: Float> {
    pub(crate) value: F,
    pub(crate) index: u32,
    pub(crate) epoch: u32,
}

impl<F: Float> Var<F> {
    #[inline]
    pub(crate) fn from_parts(value: F, index: u32, epoch: u32) -> Self {
        Var {
            value,
            index,
            epoch,
        }
    }

    /// Numeric value.
    #[inline]
    pub fn value(&self) -> F {
        self.value
    }

    /// Alias for [`value`](Self::value).
    #[inline]
    pub fn val(&self) -> F {
        self.value
    }

    /// Tape position (creation index) of the node.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl<F: ContextThreadLocal> Var<F> {
    /// Record an independent input on the active context.
    #[inline]
    pub fn new(value: F) -> Self {
        with_context(|c| c.push_leaf(value))
    }

    /// Current adjoint, as left by the last gradient call.
    ///
    /// # Panics
    ///
    /// Panics if the node was discarded by a scope recovery.
    pub fn adjoint(&self) -> F {
        match self.try_adjoint() {
            Ok(a) => a,
            Err(e) => panic!("{e}"),
        }
    }

    /// Current adjoint, or `StaleVariable` if the node was discarded.
    pub fn try_adjoint(&self) -> Result<F> {
        with_context(|c| c.adjoint(*self))
    }

    /// Whether the node behind this handle is still live.
    pub fn is_live(&self) -> bool {
        with_context(|c| c.is_live(*self))
    }

    /// Gradient of `self` with respect to `inputs`.
    pub fn grad(&self, inputs: &[Var<F>]) -> Result<Vec<F>> {
        with_context(|c| c.grad(*self, inputs))
    }

    /// Propagate from `self` over the whole tape. Afterwards every live
    /// variable's [`adjoint`](Self::adjoint) is `∂self/∂var`.
    pub fn backward(&self) -> Result<()> {
        with_context(|c| c.backward(*self))
    }
}

/// Record a unary elemental on the active context.
#[inline]
pub(crate) fn unary<F: ContextThreadLocal>(x: Var<F>, value: F, partial: F) -> Var<F> {
    with_context(|c| c.push_unary(value, x, partial))
}

/// Record a binary elemental on the active context.
#[inline]
pub(crate) fn binary<F: ContextThreadLocal>(
    x: Var<F>,
    y: Var<F>,
    value: F,
    dx: F,
    dy: F,
) -> Var<F> {
    with_context(|c| c.push_binary(value, x, dx, y, dy))
}

impl<F: Float> Display for Var<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<F: ContextThreadLocal> Default for Var<F> {
    fn default() -> Self {
        Var::new(F::zero())
    }
}

impl From<f64> for Var<f64> {
    #[inline]
    fn from(value: f64) -> Self {
        Var::new(value)
    }
}

impl From<f32> for Var<f32> {
    #[inline]
    fn from(value: f32) -> Self {
        Var::new(value)
    }
}

//! Argument validation shared by the vector and special functions.
//!
//! Every check runs before anything is recorded, so a failed call leaves the
//! context untouched.

use crate::error::{AdError, Result};
use crate::float::Float;

/// Two containers must have the same length.
pub fn check_matching_sizes(op: &'static str, left: usize, right: usize) -> Result<()> {
    if left != right {
        return Err(AdError::SizeMismatch { op, left, right });
    }
    Ok(())
}

/// A container must hold at least one element.
pub fn check_nonzero_size(op: &'static str, what: &'static str, size: usize) -> Result<()> {
    if size == 0 {
        return Err(AdError::ZeroSize { op, what });
    }
    Ok(())
}

/// `x` must not be `NaN`.
pub fn check_not_nan<F: Float>(op: &'static str, what: &'static str, x: F) -> Result<()> {
    if x.is_nan() {
        return Err(AdError::NotANumber { op, what });
    }
    Ok(())
}

/// `x` must lie in `[low, high]`. `NaN` fails.
pub fn check_bounded<F: Float>(
    op: &'static str,
    what: &'static str,
    x: F,
    low: F,
    high: F,
) -> Result<()> {
    if !(low <= x && x <= high) {
        return Err(AdError::OutOfDomain {
            op,
            what,
            value: x.to_f64_lossy(),
            expected: format!("in the interval [{low}, {high}]"),
        });
    }
    Ok(())
}

//! Dense row-major matrices of variables and the products over them.
//!
//! Every output entry of a product is a single dot-product node over the
//! row and column it combines, so an `m × n` by `n × p` product records
//! `m · p` nodes rather than `m · p · (2n - 1)` binary ones.

use std::ops::Index;

use crate::check::check_matching_sizes;
use crate::context::ContextThreadLocal;
use crate::error::Result;
use crate::float::Float;
use crate::var::Var;
use crate::vector::dot_product;

/// Row-major `rows × cols` matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Copy> Matrix<T> {
    /// Wrap `data` laid out row by row. Fails with `SizeMismatch` unless
    /// `data.len() == rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        check_matching_sizes("Matrix::new", data.len(), rows * cols)?;
        Ok(Matrix { rows, cols, data })
    }

    /// Build entry `(i, j)` as `f(i, j)`, row by row.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Matrix { rows, cols, data }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Entries in row-major order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Row `i` as a contiguous slice.
    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Column `j`, copied out.
    pub fn col(&self, j: usize) -> Vec<T> {
        (0..self.rows).map(|i| self.data[i * self.cols + j]).collect()
    }

    /// Apply `f` to every entry, keeping the shape.
    pub fn map<U>(&self, f: impl FnMut(T) -> U) -> Matrix<U> {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().copied().map(f).collect(),
        }
    }
}

impl<F: Float> Matrix<F> {
    /// `rows × cols` matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![F::zero(); rows * cols],
        }
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        assert!(j < self.cols, "column {j} out of range for {} columns", self.cols);
        &self.data[i * self.cols + j]
    }
}

impl<F: ContextThreadLocal> Matrix<F> {
    /// Record every entry as an independent input.
    pub fn to_vars(&self) -> Matrix<Var<F>> {
        self.map(Var::new)
    }
}

impl<F: ContextThreadLocal> Matrix<Var<F>> {
    /// Plain values of every entry.
    pub fn values(&self) -> Matrix<F> {
        self.map(|v| v.value())
    }
}

fn check_same_shape<T, U>(op: &'static str, a: &Matrix<T>, b: &Matrix<U>) -> Result<()> {
    check_matching_sizes(op, a.rows, b.rows)?;
    check_matching_sizes(op, a.cols, b.cols)
}

/// Matrix product `a · b`.
///
/// Fails with `SizeMismatch` unless `a.cols() == b.rows()`.
///
/// ```
/// use wombat::{grad, multiply, Matrix};
///
/// let a = Matrix::new(1, 2, vec![1.0_f64, 2.0]).unwrap().to_vars();
/// let b = Matrix::new(2, 1, vec![3.0_f64, 4.0]).unwrap().to_vars();
/// let c = multiply(&a, &b).unwrap();
/// assert_eq!(c[(0, 0)].value(), 11.0);
/// assert_eq!(grad(c[(0, 0)], a.as_slice()).unwrap(), vec![3.0, 4.0]);
/// ```
pub fn multiply<F: ContextThreadLocal>(
    a: &Matrix<Var<F>>,
    b: &Matrix<Var<F>>,
) -> Result<Matrix<Var<F>>> {
    check_matching_sizes("multiply", a.cols, b.rows)?;
    let cols: Vec<Vec<Var<F>>> = (0..b.cols).map(|j| b.col(j)).collect();
    let mut data = Vec::with_capacity(a.rows * b.cols);
    for i in 0..a.rows {
        for col in &cols {
            data.push(dot_product(a.row(i), col)?);
        }
    }
    Ok(Matrix {
        rows: a.rows,
        cols: b.cols,
        data,
    })
}

/// Matrix-vector product `a · v`, one node per row.
///
/// Fails with `SizeMismatch` unless `a.cols() == v.len()`.
pub fn multiply_vec<F: ContextThreadLocal>(
    a: &Matrix<Var<F>>,
    v: &[Var<F>],
) -> Result<Vec<Var<F>>> {
    check_matching_sizes("multiply", a.cols, v.len())?;
    (0..a.rows).map(|i| dot_product(a.row(i), v)).collect()
}

/// Dot product of each column of `a` with the same column of `b`.
///
/// Both matrices must have the same shape.
pub fn columns_dot_product<F: ContextThreadLocal>(
    a: &Matrix<Var<F>>,
    b: &Matrix<Var<F>>,
) -> Result<Vec<Var<F>>> {
    check_same_shape("columns_dot_product", a, b)?;
    (0..a.cols)
        .map(|j| dot_product(&a.col(j), &b.col(j)))
        .collect()
}

/// Dot product of each row of `a` with the same row of `b`.
///
/// Both matrices must have the same shape.
pub fn rows_dot_product<F: ContextThreadLocal>(
    a: &Matrix<Var<F>>,
    b: &Matrix<Var<F>>,
) -> Result<Vec<Var<F>>> {
    check_same_shape("rows_dot_product", a, b)?;
    (0..a.rows)
        .map(|i| dot_product(a.row(i), b.row(i)))
        .collect()
}

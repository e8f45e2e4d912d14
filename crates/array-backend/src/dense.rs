// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Default dense backend: [`Array`] for `ndarray::ArrayD<f64>`.

use crate::linalg;
use crate::{Array, ArrayError};
use ndarray::{Array2, ArrayD, ArrayView2, Axis, Ix2, IxDyn};

/// The default array type: a dynamically-ranked, owned `f64` ndarray.
pub type DenseArray = ArrayD<f64>;

/// Builds an owned array after checking the buffer length.
fn from_flat(shape: &[usize], data: Vec<f64>) -> Result<DenseArray, ArrayError> {
    let expected: usize = shape.iter().product();
    if data.len() != expected {
        return Err(ArrayError::BufferSizeMismatch {
            shape: shape.to_vec(),
            expected,
            actual: data.len(),
        });
    }
    ArrayD::from_shape_vec(IxDyn(shape), data).map_err(|_| ArrayError::BufferSizeMismatch {
        shape: shape.to_vec(),
        expected,
        actual: expected,
    })
}

fn check_same_shape(op: &'static str, lhs: &DenseArray, rhs: &DenseArray) -> Result<(), ArrayError> {
    if lhs.shape() != rhs.shape() {
        return Err(ArrayError::ShapeMismatch {
            op,
            lhs: lhs.shape().to_vec(),
            rhs: rhs.shape().to_vec(),
        });
    }
    Ok(())
}

fn check_rank(op: &'static str, array: &DenseArray, expected: usize) -> Result<(), ArrayError> {
    if array.ndim() != expected {
        return Err(ArrayError::RankMismatch {
            op,
            expected,
            actual: array.ndim(),
        });
    }
    Ok(())
}

fn matrix_view<'a>(op: &'static str, array: &'a DenseArray) -> Result<ArrayView2<'a, f64>, ArrayError> {
    array
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|_| ArrayError::RankMismatch {
            op,
            expected: 2,
            actual: array.ndim(),
        })
}

/// Checks that `rows` can index `other` and that one row of `other`
/// broadcasts onto one row of `target`.
fn check_row_broadcast(
    op: &'static str,
    target: &DenseArray,
    other: &DenseArray,
    rows: &[usize],
) -> Result<(), ArrayError> {
    if target.ndim() == 0 || other.ndim() == 0 {
        return Err(ArrayError::RankMismatch {
            op,
            expected: 1,
            actual: 0,
        });
    }
    if rows.len() != target.shape()[0] {
        return Err(ArrayError::BufferSizeMismatch {
            shape: target.shape().to_vec(),
            expected: target.shape()[0],
            actual: rows.len(),
        });
    }
    if let Some(&bad) = rows.iter().find(|&&r| r >= other.shape()[0]) {
        return Err(ArrayError::IndexOutOfBounds {
            index: bad,
            len: other.shape()[0],
        });
    }

    let target_row = &target.shape()[1..];
    let other_row = &other.shape()[1..];
    let compatible = other_row.len() <= target_row.len()
        && other_row
            .iter()
            .rev()
            .zip(target_row.iter().rev())
            .all(|(&o, &t)| o == t || o == 1);
    if !compatible {
        return Err(ArrayError::ShapeMismatch {
            op,
            lhs: target.shape().to_vec(),
            rhs: other.shape().to_vec(),
        });
    }
    Ok(())
}

impl Array for DenseArray {
    fn from_shape_vec(shape: &[usize], data: Vec<f64>) -> Result<Self, ArrayError> {
        from_flat(shape, data)
    }

    fn full(shape: &[usize], value: f64) -> Self {
        ArrayD::from_elem(IxDyn(shape), value)
    }

    fn shape(&self) -> &[usize] {
        ndarray::ArrayBase::shape(self)
    }

    fn to_vec(&self) -> Vec<f64> {
        self.iter().copied().collect()
    }

    fn add(&self, other: &Self) -> Result<Self, ArrayError> {
        check_same_shape("add", self, other)?;
        Ok(self + other)
    }

    fn sub(&self, other: &Self) -> Result<Self, ArrayError> {
        check_same_shape("sub", self, other)?;
        Ok(self - other)
    }

    fn mul(&self, other: &Self) -> Result<Self, ArrayError> {
        check_same_shape("mul", self, other)?;
        Ok(self * other)
    }

    fn div(&self, other: &Self) -> Result<Self, ArrayError> {
        check_same_shape("div", self, other)?;
        Ok(self / other)
    }

    fn add_scalar(&self, value: f64) -> Self {
        self.mapv(|x| x + value)
    }

    fn mul_scalar(&self, value: f64) -> Self {
        self.mapv(|x| x * value)
    }

    fn select(&self, axis: usize, indices: &[usize]) -> Result<Self, ArrayError> {
        if axis >= self.ndim() {
            return Err(ArrayError::AxisOutOfBounds {
                axis,
                rank: self.ndim(),
            });
        }
        let len = self.len_of(Axis(axis));
        if let Some(&bad) = indices.iter().find(|&&i| i >= len) {
            return Err(ArrayError::IndexOutOfBounds { index: bad, len });
        }
        if indices.is_empty() {
            let mut shape = self.shape().to_vec();
            shape[axis] = 0;
            return Ok(ArrayD::zeros(IxDyn(&shape)));
        }
        Ok(self.view().select(Axis(axis), indices))
    }

    fn mul_rows(&self, other: &Self, rows: &[usize]) -> Result<Self, ArrayError> {
        check_row_broadcast("mul_rows", self, other, rows)?;
        let mut out = self.clone();
        for (g, &r) in rows.iter().enumerate() {
            let parent = other.index_axis(Axis(0), r);
            let mut row = out.index_axis_mut(Axis(0), g);
            row *= &parent;
        }
        Ok(out)
    }

    fn div_rows(&self, other: &Self, rows: &[usize]) -> Result<Self, ArrayError> {
        check_row_broadcast("div_rows", self, other, rows)?;
        let mut out = self.clone();
        for (g, &r) in rows.iter().enumerate() {
            let parent = other.index_axis(Axis(0), r);
            let mut row = out.index_axis_mut(Axis(0), g);
            row /= &parent;
        }
        Ok(out)
    }

    fn dot(&self, other: &Self) -> Result<Self, ArrayError> {
        check_rank("dot", other, 2)?;
        if self.ndim() == 0 {
            return Err(ArrayError::RankMismatch {
                op: "dot",
                expected: 1,
                actual: 0,
            });
        }
        let k = self.shape()[self.ndim() - 1];
        let (n, other_k) = (other.shape()[0], other.shape()[1]);
        if k != other_k {
            return Err(ArrayError::ShapeMismatch {
                op: "dot",
                lhs: self.shape().to_vec(),
                rhs: other.shape().to_vec(),
            });
        }

        let lead = &self.shape()[..self.ndim() - 1];
        let m: usize = lead.iter().product();
        let lhs = Array2::from_shape_vec((m, k), self.iter().copied().collect()).map_err(|_| {
            ArrayError::BufferSizeMismatch {
                shape: vec![m, k],
                expected: m * k,
                actual: self.len(),
            }
        })?;
        let rhs = other
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| ArrayError::RankMismatch {
                op: "dot",
                expected: 2,
                actual: other.ndim(),
            })?;

        let product = lhs.dot(&rhs.t());

        let mut shape = lead.to_vec();
        shape.push(n);
        from_flat(&shape, product.iter().copied().collect())
    }

    fn solve(&self, rhs: &Self) -> Result<Self, ArrayError> {
        check_rank("solve", self, 2)?;
        check_rank("solve", rhs, 2)?;
        let n = self.shape()[0];
        if self.shape()[1] != n || rhs.shape()[0] != n {
            return Err(ArrayError::ShapeMismatch {
                op: "solve",
                lhs: self.shape().to_vec(),
                rhs: rhs.shape().to_vec(),
            });
        }
        let x = linalg::solve(matrix_view("solve", self)?, matrix_view("solve", rhs)?)?;
        Ok(x.into_dyn())
    }

    fn transpose(&self) -> Result<Self, ArrayError> {
        check_rank("transpose", self, 2)?;
        Ok(self.t().as_standard_layout().into_owned())
    }
}

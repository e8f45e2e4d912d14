// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Dense linear solve through `faer`.

use crate::ArrayError;
use faer::linalg::solvers::Solve;
use faer::Mat;
use ndarray::{Array2, ArrayView2};

/// Solves `a · x = b` with a fully pivoted LU factorisation.
///
/// `a` must be square and share its row count with `b`; the caller checks
/// shapes. There is no scale-dependent pivot threshold.
///
/// # Errors
/// Returns [`ArrayError::Singular`] when the factorisation hits an exact
/// zero pivot, which shows up as a non-finite solution.
pub(crate) fn solve(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> Result<Array2<f64>, ArrayError> {
    let (n, m) = (b.nrows(), b.ncols());
    let lhs = Mat::<f64>::from_fn(n, n, |i, j| a[[i, j]]);
    let rhs = Mat::<f64>::from_fn(n, m, |i, j| b[[i, j]]);

    let x = lhs.full_piv_lu().solve(rhs.as_ref());

    let solution = Array2::from_shape_fn((n, m), |(i, j)| x[(i, j)]);
    if let Some(((row, col), value)) = solution.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(ArrayError::Singular {
            op: "solve",
            detail: format!("solution entry ({row}, {col}) is {value}; the {n}x{n} matrix is singular"),
        });
    }
    Ok(solution)
}

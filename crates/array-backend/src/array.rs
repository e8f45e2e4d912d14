// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The array capability trait.

use crate::ArrayError;
use std::fmt;

/// A dense, row-major, `f64` n-dimensional array.
///
/// The labeled tensor layer stores one `Array` per block and performs every
/// numeric step through these methods, so any backend (a plain `ndarray`,
/// an accelerator tensor, a memory-mapped buffer) can be plugged in by
/// implementing this trait.
///
/// Implementations must treat `self` as immutable: every method returns a new
/// array.
pub trait Array: Clone + fmt::Debug + Send + Sync + Sized {
    /// Builds an array from row-major data.
    ///
    /// # Errors
    /// Returns [`ArrayError::BufferSizeMismatch`] if `data.len()` differs from
    /// the product of `shape`.
    fn from_shape_vec(shape: &[usize], data: Vec<f64>) -> Result<Self, ArrayError>;

    /// Builds an array of the given shape with every element set to `value`.
    fn full(shape: &[usize], value: f64) -> Self;

    /// Returns the dimensions of the array.
    fn shape(&self) -> &[usize];

    /// Returns all elements in row-major order.
    fn to_vec(&self) -> Vec<f64>;

    /// Elementwise `self + other`; shapes must be identical.
    fn add(&self, other: &Self) -> Result<Self, ArrayError>;

    /// Elementwise `self - other`; shapes must be identical.
    fn sub(&self, other: &Self) -> Result<Self, ArrayError>;

    /// Elementwise `self * other`; shapes must be identical.
    fn mul(&self, other: &Self) -> Result<Self, ArrayError>;

    /// Elementwise `self / other`; shapes must be identical.
    fn div(&self, other: &Self) -> Result<Self, ArrayError>;

    /// Adds `value` to every element.
    fn add_scalar(&self, value: f64) -> Self;

    /// Multiplies every element by `value`.
    fn mul_scalar(&self, value: f64) -> Self;

    /// Keeps the entries at `indices` (in that order) along `axis`.
    fn select(&self, axis: usize, indices: &[usize]) -> Result<Self, ArrayError>;

    /// Row-indexed broadcast product.
    ///
    /// `out[g, ...] = self[g, ...] * other[rows[g], ...]`, where the trailing
    /// dimensions of `other` are broadcast against the trailing dimensions of
    /// `self` (aligned from the right). `rows.len()` must equal `self.shape()[0]`.
    ///
    /// This is the kernel behind gradient propagation: a gradient row is
    /// combined with the parent row it refers to.
    fn mul_rows(&self, other: &Self, rows: &[usize]) -> Result<Self, ArrayError>;

    /// Row-indexed broadcast quotient, see [`Array::mul_rows`].
    fn div_rows(&self, other: &Self, rows: &[usize]) -> Result<Self, ArrayError>;

    /// Contracts the last axis of `self` with the last axis of the 2-D `other`.
    ///
    /// For `self` of shape `[..., K]` and `other` of shape `[N, K]` the result
    /// has shape `[..., N]`.
    fn dot(&self, other: &Self) -> Result<Self, ArrayError>;

    /// Solves `self · x = rhs` for a square 2-D `self` and 2-D `rhs`.
    ///
    /// # Errors
    /// Returns [`ArrayError::Singular`] if `self` has no inverse.
    fn solve(&self, rhs: &Self) -> Result<Self, ArrayError>;

    /// Transposes a 2-D array.
    fn transpose(&self) -> Result<Self, ArrayError>;

    /// Returns the rank (number of dimensions).
    fn rank(&self) -> usize {
        self.shape().len()
    }

    /// Returns the total number of elements.
    fn len(&self) -> usize {
        self.shape().iter().product()
    }

    /// Returns `true` if the array holds no element.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

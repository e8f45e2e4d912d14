// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for array operations.

/// Errors that can occur inside an array backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArrayError {
    /// The provided buffer length does not match the number of elements of the shape.
    #[error("buffer size mismatch: shape {shape:?} needs {expected} elements, got {actual}")]
    BufferSizeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    /// Two arrays have incompatible shapes for the requested operation.
    #[error("incompatible shapes for {op}: {lhs:?} vs {rhs:?}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Vec<usize>,
        rhs: Vec<usize>,
    },

    /// The operation needs an array of a specific rank.
    #[error("{op} expects a rank-{expected} array, got rank {actual}")]
    RankMismatch {
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An axis argument is past the array's rank.
    #[error("axis {axis} is out of bounds for an array of rank {rank}")]
    AxisOutOfBounds { axis: usize, rank: usize },

    /// An index along an axis is past that axis' length.
    #[error("index {index} is out of bounds for an axis of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A linear system has no unique solution.
    #[error("singular matrix in {op}: {detail}")]
    Singular { op: &'static str, detail: String },
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # array-backend
//!
//! The numeric capability the labeled tensor core is written against.
//!
//! This crate provides:
//! - [`Array`] — the small interface every backend implements: construction,
//!   shape, elementwise arithmetic, row-indexed broadcasting, contraction and
//!   linear solve.
//! - [`DenseArray`] — the default backend, `ndarray::ArrayD<f64>`.
//! - [`ArrayError`] — backend failures, including singular systems.
//!
//! # Design Goals
//! - The metadata layer never names a concrete array type; it only calls
//!   through [`Array`].
//! - Every operation returns a fresh array, inputs are never mutated.
//! - Clean error types via `thiserror`.

mod array;
mod dense;
mod error;
mod linalg;

pub use array::Array;
pub use dense::DenseArray;
pub use error::ArrayError;

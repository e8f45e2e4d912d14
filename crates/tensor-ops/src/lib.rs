// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-ops
//!
//! Operations over [`TensorMap`](labeled_tensor::TensorMap)s and their blocks.
//!
//! Binary operations share one alignment engine ([`checks`]): the key sets
//! of both maps must be equal, blocks are paired by key, and paired blocks
//! must agree on every axis and on their gradients. Results are always new
//! maps; inputs are never modified.
//!
//! | family      | functions                                            |
//! |-------------|------------------------------------------------------|
//! | arithmetic  | [`add`], [`subtract`], [`multiply`], [`divide`]      |
//! | selection   | [`slice`], [`split`]                                 |
//! | linear      | [`solve`], [`dot`]                                   |
//! | creation    | [`ones_like`], [`zeros_like`]                        |
//! | metadata    | [`unique_metadata`], [`equal_metadata`]              |
//! | comparison  | [`equal`], [`allclose`]                              |
//!
//! Every function has a `_block` counterpart working on a single block.

pub mod checks;

mod arithmetic;
mod comparison;
mod config;
mod creation;
mod linalg;
mod slice;
mod split;
mod unique;

pub use arithmetic::{
    add, add_block, divide, divide_block, multiply, multiply_block, subtract, subtract_block,
};
pub use checks::Operand;
pub use comparison::{
    allclose, allclose_block, check_allclose, check_allclose_block, check_equal,
    check_equal_block, check_equal_metadata, check_equal_metadata_block, equal, equal_block,
    equal_metadata, equal_metadata_block,
};
pub use config::OpsConfig;
pub use creation::{ones_like, ones_like_block, zeros_like, zeros_like_block};
pub use linalg::{dot, dot_block, solve, solve_block};
pub use slice::{slice, slice_block, Axis};
pub use split::{split, split_block};
pub use unique::{unique_metadata, unique_metadata_block};

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Constant tensors shaped like an existing one.

use crate::checks::{check_gradient_presence, map_blocks};
use array_backend::Array;
use labeled_tensor::{TensorBlock, TensorError, TensorMap};

/// Returns a map with the metadata of `map` and every value set to one.
///
/// `gradients` selects which gradients to carry over: `None` keeps all of
/// them, `Some(&[])` none.
///
/// # Errors
/// Returns [`TensorError::NotFound`] if a requested gradient does not exist.
pub fn ones_like<A: Array>(
    map: &TensorMap<A>,
    gradients: Option<&[&str]>,
) -> Result<TensorMap<A>, TensorError> {
    map_blocks(map, |block| ones_like_block(block, gradients))
}

/// Block form of [`ones_like`].
pub fn ones_like_block<A: Array>(
    block: &TensorBlock<A>,
    gradients: Option<&[&str]>,
) -> Result<TensorBlock<A>, TensorError> {
    full_like_block(block, 1.0, gradients, "ones_like")
}

/// Returns a map with the metadata of `map` and every value set to zero.
///
/// See [`ones_like`] for the meaning of `gradients`.
pub fn zeros_like<A: Array>(
    map: &TensorMap<A>,
    gradients: Option<&[&str]>,
) -> Result<TensorMap<A>, TensorError> {
    map_blocks(map, |block| zeros_like_block(block, gradients))
}

/// Block form of [`zeros_like`].
pub fn zeros_like_block<A: Array>(
    block: &TensorBlock<A>,
    gradients: Option<&[&str]>,
) -> Result<TensorBlock<A>, TensorError> {
    full_like_block(block, 0.0, gradients, "zeros_like")
}

fn full_like_block<A: Array>(
    block: &TensorBlock<A>,
    value: f64,
    gradients: Option<&[&str]>,
    fname: &str,
) -> Result<TensorBlock<A>, TensorError> {
    let all = block.gradients_list();
    let parameters = match gradients {
        Some(requested) => {
            check_gradient_presence(block, requested, fname)?;
            requested
        }
        None => all.as_slice(),
    };

    let mut result = TensorBlock::new(
        A::full(block.values().shape(), value),
        block.samples().clone(),
        block.components().to_vec(),
        block.properties().clone(),
    )?;
    for parameter in parameters {
        let gradient = block.gradient(parameter)?;
        let gradient = TensorBlock::new(
            A::full(gradient.values().shape(), value),
            gradient.samples().clone(),
            gradient.components().to_vec(),
            gradient.properties().clone(),
        )?;
        result.add_gradient(*parameter, gradient)?;
    }
    Ok(result)
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Linear solves and products between maps.

use crate::checks::zip_blocks;
use array_backend::Array;
use labeled_tensor::{TensorBlock, TensorError, TensorMap};

/// Solves `X w = Y` block by block.
///
/// Each result block holds `wᵀ`: its samples are `Y`'s properties and its
/// properties are `X`'s properties, so that `dot(X, solve(X, Y)) ≈ Y`.
///
/// # Errors
/// - [`TensorError::Validation`] if the key sets differ, if a block has
///   components, if `X` is not square or if `X` and `Y` samples differ.
/// - [`TensorError::NotImplemented`] if either block has gradients.
/// - [`TensorError::LinearAlgebra`] if an `X` block is singular.
pub fn solve<A: Array>(x: &TensorMap<A>, y: &TensorMap<A>) -> Result<TensorMap<A>, TensorError> {
    zip_blocks(x, y, "solve", solve_block)
}

/// Block form of [`solve`].
pub fn solve_block<A: Array>(
    x: &TensorBlock<A>,
    y: &TensorBlock<A>,
) -> Result<TensorBlock<A>, TensorError> {
    if !x.components().is_empty() || !y.components().is_empty() {
        return Err(TensorError::Validation(
            "blocks passed to 'solve' should not have components".into(),
        ));
    }
    if !x.gradients_list().is_empty() || !y.gradients_list().is_empty() {
        return Err(TensorError::NotImplemented(
            "'solve' does not support blocks with gradients".into(),
        ));
    }
    if x.samples() != y.samples() {
        return Err(TensorError::Validation(
            "inputs to 'solve' should have the same samples".into(),
        ));
    }
    let shape = x.values().shape();
    if shape[0] != shape[1] {
        return Err(TensorError::Validation(format!(
            "values of each X block in 'solve' should be square, got shape {shape:?}"
        )));
    }

    let w = x
        .values()
        .solve(y.values())
        .map_err(|source| TensorError::LinearAlgebra { op: "solve", source })?;
    TensorBlock::new(
        w.transpose()?,
        y.properties().clone(),
        Vec::new(),
        x.properties().clone(),
    )
}

/// Contracts the properties of `a` with the properties of `b`, block by block.
///
/// The result values are `A · Bᵀ`, with `A`'s samples and components and
/// `B`'s samples as properties. Gradients of `A` are contracted the same way.
///
/// # Errors
/// - [`TensorError::Validation`] if the key sets differ, if `B` has
///   components or if the properties of paired blocks differ.
/// - [`TensorError::NotImplemented`] if `B` has gradients.
pub fn dot<A: Array>(a: &TensorMap<A>, b: &TensorMap<A>) -> Result<TensorMap<A>, TensorError> {
    zip_blocks(a, b, "dot", dot_block)
}

/// Block form of [`dot`].
pub fn dot_block<A: Array>(
    a: &TensorBlock<A>,
    b: &TensorBlock<A>,
) -> Result<TensorBlock<A>, TensorError> {
    if !b.components().is_empty() {
        return Err(TensorError::Validation(
            "the second block passed to 'dot' should not have components".into(),
        ));
    }
    if !b.gradients_list().is_empty() {
        return Err(TensorError::NotImplemented(
            "'dot' does not support gradients on the second block".into(),
        ));
    }
    if a.properties() != b.properties() {
        return Err(TensorError::Validation(
            "inputs to 'dot' should have the same properties".into(),
        ));
    }

    let properties = b.samples().clone();
    let mut result = TensorBlock::new(
        a.values().dot(b.values())?,
        a.samples().clone(),
        a.components().to_vec(),
        properties.clone(),
    )?;
    for (parameter, gradient) in a.gradients() {
        let gradient = TensorBlock::new(
            gradient.values().dot(b.values())?,
            gradient.samples().clone(),
            gradient.components().to_vec(),
            properties.clone(),
        )?;
        result.add_gradient(parameter, gradient)?;
    }
    Ok(result)
}

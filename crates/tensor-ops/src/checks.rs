// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The alignment engine shared by every binary operation.
//!
//! Two maps are aligned key by key: their key sets must be equal (order does
//! not matter) and each block of the first map is paired with the block of
//! the same key in the second. Paired blocks must then agree exactly
//! (order-sensitive) on samples, components and properties, and carry the
//! same gradient parameters with the same gradient metadata.

use array_backend::Array;
use labeled_tensor::{TensorBlock, TensorError, TensorMap};

/// The second operand of an arithmetic operation.
///
/// Built implicitly from an `f64` or a reference to a map/block:
/// `add(&a, 2.0)` and `add(&a, &b)` both work.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a, T> {
    /// A constant applied to every element.
    Scalar(f64),
    /// A tensor with metadata identical to the first operand.
    Tensor(&'a T),
}

impl<T> From<f64> for Operand<'_, T> {
    fn from(value: f64) -> Self {
        Operand::Scalar(value)
    }
}

impl<'a, T> From<&'a T> for Operand<'a, T> {
    fn from(tensor: &'a T) -> Self {
        Operand::Tensor(tensor)
    }
}

/// Fails unless both maps have the same set of keys.
pub fn check_same_keys<A: Array>(
    a: &TensorMap<A>,
    b: &TensorMap<A>,
    fname: &str,
) -> Result<(), TensorError> {
    if a.keys().names() != b.keys().names() {
        return Err(TensorError::Validation(format!(
            "inputs to '{fname}' should have the same key names, got {:?} and {:?}",
            a.keys().names(),
            b.keys().names()
        )));
    }
    if !a.keys_values_match(b) {
        return Err(TensorError::Validation(format!(
            "inputs to '{fname}' should have the same keys"
        )));
    }
    Ok(())
}

/// Fails unless both blocks have identical samples, components and properties.
pub fn check_same_metadata<A: Array>(
    a: &TensorBlock<A>,
    b: &TensorBlock<A>,
    fname: &str,
) -> Result<(), TensorError> {
    if a.samples() != b.samples() {
        return Err(TensorError::Validation(format!(
            "inputs to '{fname}' should have the same samples"
        )));
    }
    if a.components() != b.components() {
        return Err(TensorError::Validation(format!(
            "inputs to '{fname}' should have the same components"
        )));
    }
    if a.properties() != b.properties() {
        return Err(TensorError::Validation(format!(
            "inputs to '{fname}' should have the same properties"
        )));
    }
    Ok(())
}

/// Fails unless both blocks carry gradients for the same parameters with the
/// same gradient samples and components.
///
/// A parameter present on only one side is reported as
/// [`TensorError::NotImplemented`]: no implicit zero gradient is assumed.
pub fn check_same_gradients<A: Array>(
    a: &TensorBlock<A>,
    b: &TensorBlock<A>,
    fname: &str,
) -> Result<(), TensorError> {
    for parameter in a.gradients_list() {
        if !b.has_gradient(parameter) {
            return Err(TensorError::NotImplemented(format!(
                "gradient with respect to '{parameter}' is present in the first input to '{fname}' but not in the second"
            )));
        }
    }
    for parameter in b.gradients_list() {
        if !a.has_gradient(parameter) {
            return Err(TensorError::NotImplemented(format!(
                "gradient with respect to '{parameter}' is present in the second input to '{fname}' but not in the first"
            )));
        }
    }
    for (parameter, gradient_a) in a.gradients() {
        let gradient_b = b.gradient(parameter)?;
        if gradient_a.samples() != gradient_b.samples() {
            return Err(TensorError::Validation(format!(
                "gradients with respect to '{parameter}' should have the same samples in '{fname}'"
            )));
        }
        if gradient_a.components() != gradient_b.components() {
            return Err(TensorError::Validation(format!(
                "gradients with respect to '{parameter}' should have the same components in '{fname}'"
            )));
        }
    }
    Ok(())
}

/// Fails if any of the requested gradient parameters is missing from `block`.
pub fn check_gradient_presence<A: Array>(
    block: &TensorBlock<A>,
    parameters: &[&str],
    fname: &str,
) -> Result<(), TensorError> {
    for parameter in parameters {
        if !block.has_gradient(parameter) {
            return Err(TensorError::NotFound(format!(
                "requested gradient '{parameter}' in '{fname}' is not defined in this tensor"
            )));
        }
    }
    Ok(())
}

/// Applies `f` to each pair of blocks sharing a key and collects the results
/// into a map with the keys of `a`, in `a`'s order.
pub fn zip_blocks<A, F>(
    a: &TensorMap<A>,
    b: &TensorMap<A>,
    fname: &str,
    mut f: F,
) -> Result<TensorMap<A>, TensorError>
where
    A: Array,
    F: FnMut(&TensorBlock<A>, &TensorBlock<A>) -> Result<TensorBlock<A>, TensorError>,
{
    check_same_keys(a, b, fname)?;
    let blocks = a
        .iter()
        .map(|(key, block_a)| {
            let block_b = b.block(key)?;
            f(block_a, block_b)
        })
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(op = fname, blocks = blocks.len(), "aligned tensor maps");
    TensorMap::new(a.keys().clone(), blocks)
}

/// Applies `f` to every block of `a`.
pub fn map_blocks<A, F>(a: &TensorMap<A>, mut f: F) -> Result<TensorMap<A>, TensorError>
where
    A: Array,
    F: FnMut(&TensorBlock<A>) -> Result<TensorBlock<A>, TensorError>,
{
    let blocks = a.blocks().iter().map(&mut f).collect::<Result<Vec<_>, _>>()?;
    TensorMap::new(a.keys().clone(), blocks)
}

/// Builds a block with the metadata of `template` and the given arrays:
/// `values` for the block and one array per gradient of `template`, in the
/// same order.
pub fn with_metadata_of<A: Array>(
    template: &TensorBlock<A>,
    values: A,
    gradient_values: Vec<A>,
) -> Result<TensorBlock<A>, TensorError> {
    debug_assert_eq!(gradient_values.len(), template.gradients_list().len());
    let mut block = TensorBlock::new(
        values,
        template.samples().clone(),
        template.components().to_vec(),
        template.properties().clone(),
    )?;
    for ((parameter, gradient), values) in template.gradients().zip(gradient_values) {
        let gradient = TensorBlock::new(
            values,
            gradient.samples().clone(),
            gradient.components().to_vec(),
            block.properties().clone(),
        )?;
        block.add_gradient(parameter, gradient)?;
    }
    Ok(block)
}

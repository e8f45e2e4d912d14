// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Metadata and value comparisons between maps and blocks.
//!
//! Each predicate comes in two flavours: `check_*` returns a
//! [`TensorError::Validation`] describing the first difference, the plain
//! form returns a `bool`.

use crate::checks::{check_same_gradients, check_same_keys, check_same_metadata};
use crate::config::OpsConfig;
use array_backend::Array;
use labeled_tensor::{TensorBlock, TensorError, TensorMap};

/// Fails unless both maps have the same keys (any order) and the paired
/// blocks have the same metadata, gradients included.
pub fn check_equal_metadata<A: Array>(
    a: &TensorMap<A>,
    b: &TensorMap<A>,
) -> Result<(), TensorError> {
    check_same_keys(a, b, "equal_metadata")?;
    for (key, block) in a.iter() {
        check_equal_metadata_block(block, b.block(key)?)?;
    }
    Ok(())
}

/// Block form of [`check_equal_metadata`].
pub fn check_equal_metadata_block<A: Array>(
    a: &TensorBlock<A>,
    b: &TensorBlock<A>,
) -> Result<(), TensorError> {
    check_same_metadata(a, b, "equal_metadata")?;
    check_same_gradients(a, b, "equal_metadata").map_err(|e| match e {
        TensorError::NotImplemented(message) => TensorError::Validation(message),
        other => other,
    })
}

/// Returns `true` if both maps have the same metadata.
pub fn equal_metadata<A: Array>(a: &TensorMap<A>, b: &TensorMap<A>) -> bool {
    check_equal_metadata(a, b).is_ok()
}

/// Block form of [`equal_metadata`].
pub fn equal_metadata_block<A: Array>(a: &TensorBlock<A>, b: &TensorBlock<A>) -> bool {
    check_equal_metadata_block(a, b).is_ok()
}

/// Fails unless both maps have the same metadata and exactly equal values.
pub fn check_equal<A: Array>(a: &TensorMap<A>, b: &TensorMap<A>) -> Result<(), TensorError> {
    check_values(a, b, |x, y| x == y)
}

/// Block form of [`check_equal`].
pub fn check_equal_block<A: Array>(
    a: &TensorBlock<A>,
    b: &TensorBlock<A>,
) -> Result<(), TensorError> {
    check_block_values(a, b, &mut |x, y| x == y)
}

/// Returns `true` if both maps have the same metadata and exactly equal values.
pub fn equal<A: Array>(a: &TensorMap<A>, b: &TensorMap<A>) -> bool {
    check_equal(a, b).is_ok()
}

/// Block form of [`equal`].
pub fn equal_block<A: Array>(a: &TensorBlock<A>, b: &TensorBlock<A>) -> bool {
    check_equal_block(a, b).is_ok()
}

/// Fails unless both maps have the same metadata and values close under
/// `config`'s tolerances.
pub fn check_allclose<A: Array>(
    a: &TensorMap<A>,
    b: &TensorMap<A>,
    config: &OpsConfig,
) -> Result<(), TensorError> {
    check_values(a, b, |x, y| config.is_close(x, y))
}

/// Block form of [`check_allclose`].
pub fn check_allclose_block<A: Array>(
    a: &TensorBlock<A>,
    b: &TensorBlock<A>,
    config: &OpsConfig,
) -> Result<(), TensorError> {
    check_block_values(a, b, &mut |x, y| config.is_close(x, y))
}

/// Returns `true` if both maps have the same metadata and close values.
pub fn allclose<A: Array>(a: &TensorMap<A>, b: &TensorMap<A>, config: &OpsConfig) -> bool {
    check_allclose(a, b, config).is_ok()
}

/// Block form of [`allclose`].
pub fn allclose_block<A: Array>(a: &TensorBlock<A>, b: &TensorBlock<A>, config: &OpsConfig) -> bool {
    check_allclose_block(a, b, config).is_ok()
}

fn check_values<A, F>(a: &TensorMap<A>, b: &TensorMap<A>, mut same: F) -> Result<(), TensorError>
where
    A: Array,
    F: FnMut(f64, f64) -> bool,
{
    check_same_keys(a, b, "compare")?;
    for (key, block) in a.iter() {
        check_block_values(block, b.block(key)?, &mut same).map_err(|e| match e {
            TensorError::Validation(message) => {
                TensorError::Validation(format!("block {key:?}: {message}"))
            }
            other => other,
        })?;
    }
    Ok(())
}

fn check_block_values<A, F>(
    a: &TensorBlock<A>,
    b: &TensorBlock<A>,
    same: &mut F,
) -> Result<(), TensorError>
where
    A: Array,
    F: FnMut(f64, f64) -> bool,
{
    check_equal_metadata_block(a, b)?;
    compare_arrays(a.values(), b.values(), "values", same)?;
    for (parameter, gradient) in a.gradients() {
        let other = b.gradient(parameter)?;
        compare_arrays(
            gradient.values(),
            other.values(),
            &format!("gradient with respect to '{parameter}'"),
            same,
        )?;
    }
    Ok(())
}

fn compare_arrays<A, F>(a: &A, b: &A, what: &str, same: &mut F) -> Result<(), TensorError>
where
    A: Array,
    F: FnMut(f64, f64) -> bool,
{
    if a.shape() != b.shape() {
        return Err(TensorError::Validation(format!(
            "{what} have different shapes: {:?} and {:?}",
            a.shape(),
            b.shape()
        )));
    }
    let (a, b) = (a.to_vec(), b.to_vec());
    if let Some((i, (x, y))) = a
        .iter()
        .zip(&b)
        .enumerate()
        .find(|&(_, (&x, &y))| !same(x, y))
    {
        return Err(TensorError::Validation(format!(
            "{what} differ at flat index {i}: {x} != {y}"
        )));
    }
    Ok(())
}

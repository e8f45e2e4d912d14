// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Elementwise arithmetic with gradient propagation.
//!
//! | operation | values  | gradients                         |
//! |-----------|---------|-----------------------------------|
//! | `A + B`   | `A + B` | `∇A + ∇B`                         |
//! | `A - B`   | `A - B` | `∇A - ∇B`                         |
//! | `A * B`   | `A * B` | `∇A·B + A·∇B`                     |
//! | `A / B`   | `A / B` | `(∇A - (A/B)·∇B) / B`             |
//!
//! Parent factors are read at the row referenced by the `"sample"` column of
//! each gradient row.

use crate::checks::{check_same_gradients, check_same_metadata, map_blocks, with_metadata_of, zip_blocks, Operand};
use array_backend::Array;
use labeled_tensor::{TensorBlock, TensorError, TensorMap};

/// Adds a scalar or a map with identical metadata to `a`.
///
/// Scalar addition leaves gradients unchanged.
///
/// # Examples
/// ```
/// use array_backend::{Array, DenseArray};
/// use labeled_tensor::{Labels, TensorBlock, TensorMap};
///
/// let block = TensorBlock::new(
///     <DenseArray as Array>::full(&[1, 2], 1.0),
///     Labels::range("s", 1).unwrap(),
///     vec![],
///     Labels::range("p", 2).unwrap(),
/// ).unwrap();
/// let map = TensorMap::new(Labels::single(), vec![block]).unwrap();
///
/// let shifted = tensor_ops::add(&map, 2.0).unwrap();
/// assert_eq!(shifted.block_by_id(0).unwrap().values().to_vec(), vec![3.0, 3.0]);
/// let doubled = tensor_ops::add(&map, &map).unwrap();
/// assert_eq!(doubled.block_by_id(0).unwrap().values().to_vec(), vec![2.0, 2.0]);
/// ```
pub fn add<'a, A: Array + 'a>(
    a: &TensorMap<A>,
    b: impl Into<Operand<'a, TensorMap<A>>>,
) -> Result<TensorMap<A>, TensorError> {
    match b.into() {
        Operand::Scalar(c) => map_blocks(a, |block| add_block(block, c)),
        Operand::Tensor(b) => zip_blocks(a, b, "add", |x, y| add_block(x, y)),
    }
}

/// Block form of [`add`].
pub fn add_block<'a, A: Array + 'a>(
    a: &TensorBlock<A>,
    b: impl Into<Operand<'a, TensorBlock<A>>>,
) -> Result<TensorBlock<A>, TensorError> {
    match b.into() {
        Operand::Scalar(c) => a.map_values(|parameter, values| {
            Ok(match parameter {
                None => values.add_scalar(c),
                Some(_) => values.clone(),
            })
        }),
        Operand::Tensor(b) => {
            check_same_metadata(a, b, "add")?;
            check_same_gradients(a, b, "add")?;
            let values = a.values().add(b.values())?;
            let gradients = a
                .gradients()
                .map(|(parameter, ga)| Ok(ga.values().add(b.gradient(parameter)?.values())?))
                .collect::<Result<Vec<_>, TensorError>>()?;
            with_metadata_of(a, values, gradients)
        }
    }
}

/// Subtracts a scalar or a map with identical metadata from `a`.
///
/// Computed as `add(a, -c)` for scalars and `add(a, multiply(b, -1))` for
/// maps.
pub fn subtract<'a, A: Array + 'a>(
    a: &TensorMap<A>,
    b: impl Into<Operand<'a, TensorMap<A>>>,
) -> Result<TensorMap<A>, TensorError> {
    match b.into() {
        Operand::Scalar(c) => add(a, -c),
        Operand::Tensor(b) => {
            let negated = multiply(b, -1.0)?;
            add(a, &negated)
        }
    }
}

/// Block form of [`subtract`].
pub fn subtract_block<'a, A: Array + 'a>(
    a: &TensorBlock<A>,
    b: impl Into<Operand<'a, TensorBlock<A>>>,
) -> Result<TensorBlock<A>, TensorError> {
    match b.into() {
        Operand::Scalar(c) => add_block(a, -c),
        Operand::Tensor(b) => {
            let negated = multiply_block(b, -1.0)?;
            add_block(a, &negated)
        }
    }
}

/// Multiplies `a` elementwise by a scalar or a map with identical metadata.
pub fn multiply<'a, A: Array + 'a>(
    a: &TensorMap<A>,
    b: impl Into<Operand<'a, TensorMap<A>>>,
) -> Result<TensorMap<A>, TensorError> {
    match b.into() {
        Operand::Scalar(c) => map_blocks(a, |block| multiply_block(block, c)),
        Operand::Tensor(b) => zip_blocks(a, b, "multiply", |x, y| multiply_block(x, y)),
    }
}

/// Block form of [`multiply`].
pub fn multiply_block<'a, A: Array + 'a>(
    a: &TensorBlock<A>,
    b: impl Into<Operand<'a, TensorBlock<A>>>,
) -> Result<TensorBlock<A>, TensorError> {
    match b.into() {
        Operand::Scalar(c) => a.map_values(|_, values| Ok(values.mul_scalar(c))),
        Operand::Tensor(b) => {
            check_same_metadata(a, b, "multiply")?;
            check_same_gradients(a, b, "multiply")?;
            let values = a.values().mul(b.values())?;
            let mut gradients = Vec::with_capacity(a.gradients_list().len());
            for (parameter, ga) in a.gradients() {
                let gb = b.gradient(parameter)?;
                let rows = ga.parent_rows()?;
                let lhs = ga.values().mul_rows(b.values(), &rows)?;
                let rhs = gb.values().mul_rows(a.values(), &rows)?;
                gradients.push(lhs.add(&rhs)?);
            }
            with_metadata_of(a, values, gradients)
        }
    }
}

/// Divides `a` elementwise by a scalar or a map with identical metadata.
///
/// Division by zero follows IEEE-754 and yields infinities or NaN.
pub fn divide<'a, A: Array + 'a>(
    a: &TensorMap<A>,
    b: impl Into<Operand<'a, TensorMap<A>>>,
) -> Result<TensorMap<A>, TensorError> {
    match b.into() {
        Operand::Scalar(c) => map_blocks(a, |block| divide_block(block, c)),
        Operand::Tensor(b) => zip_blocks(a, b, "divide", |x, y| divide_block(x, y)),
    }
}

/// Block form of [`divide`].
pub fn divide_block<'a, A: Array + 'a>(
    a: &TensorBlock<A>,
    b: impl Into<Operand<'a, TensorBlock<A>>>,
) -> Result<TensorBlock<A>, TensorError> {
    match b.into() {
        Operand::Scalar(c) => a.map_values(|_, values| Ok(values.mul_scalar(c.recip()))),
        Operand::Tensor(b) => {
            check_same_metadata(a, b, "divide")?;
            check_same_gradients(a, b, "divide")?;
            let quotient = a.values().div(b.values())?;
            let mut gradients = Vec::with_capacity(a.gradients_list().len());
            for (parameter, ga) in a.gradients() {
                let gb = b.gradient(parameter)?;
                let rows = ga.parent_rows()?;
                let lhs = ga.values().div_rows(b.values(), &rows)?;
                let rhs = gb
                    .values()
                    .mul_rows(&quotient, &rows)?
                    .div_rows(b.values(), &rows)?;
                gradients.push(lhs.sub(&rhs)?);
            }
            with_metadata_of(a, quotient, gradients)
        }
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Block-sparse tensor maps: one block per key.

use crate::{Labels, TensorBlock, TensorError};
use array_backend::{Array, DenseArray};
use std::fmt;

/// An ordered collection of blocks, one per row of the `keys` labels.
///
/// All blocks share the same sample names, component names, property names
/// and gradient parameters; their entries may differ.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorMap<A: Array = DenseArray> {
    keys: Labels,
    blocks: Vec<TensorBlock<A>>,
}

impl<A: Array> TensorMap<A> {
    /// Creates a map from its keys and the block of each key, in key order.
    ///
    /// # Errors
    /// Returns [`TensorError::Validation`] if the number of blocks differs
    /// from the number of keys, or if blocks disagree on axis names or
    /// gradient parameters.
    pub fn new(keys: Labels, blocks: Vec<TensorBlock<A>>) -> Result<Self, TensorError> {
        if keys.count() != blocks.len() {
            return Err(TensorError::Validation(format!(
                "{} keys but {} blocks",
                keys.count(),
                blocks.len()
            )));
        }

        if let Some((first, rest)) = blocks.split_first() {
            for (offset, block) in rest.iter().enumerate() {
                check_consistent(first, block, offset + 1)?;
            }
        }

        tracing::debug!(
            blocks = blocks.len(),
            keys = ?keys.names(),
            "built tensor map"
        );
        Ok(Self { keys, blocks })
    }

    /// Returns the keys.
    pub fn keys(&self) -> &Labels {
        &self.keys
    }

    /// Returns the blocks, in key order.
    pub fn blocks(&self) -> &[TensorBlock<A>] {
        &self.blocks
    }

    /// Returns the number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if the map holds no block.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterates over `(key row, block)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&[i32], &TensorBlock<A>)> + '_ {
        self.keys.iter().zip(self.blocks.iter())
    }

    /// Returns the block at position `index`.
    pub fn block_by_id(&self, index: usize) -> Result<&TensorBlock<A>, TensorError> {
        self.blocks.get(index).ok_or_else(|| {
            TensorError::NotFound(format!(
                "block index {index} is out of bounds for a map with {} blocks",
                self.blocks.len()
            ))
        })
    }

    /// Returns the block of the exact key row `key`.
    pub fn block(&self, key: &[i32]) -> Result<&TensorBlock<A>, TensorError> {
        let position = self.keys.position(key).ok_or_else(|| {
            TensorError::NotFound(format!(
                "no block for key {key:?} (key names {:?})",
                self.keys.names()
            ))
        })?;
        Ok(&self.blocks[position])
    }

    /// Returns the positions of all blocks whose key matches every
    /// `(dimension, value)` pair of `selection`.
    pub fn blocks_matching(&self, selection: &[(&str, i32)]) -> Result<Vec<usize>, TensorError> {
        let names: Vec<&str> = selection.iter().map(|(name, _)| *name).collect();
        let positions = self.keys.dimension_positions(&names)?;
        Ok((0..self.keys.count())
            .filter(|&i| {
                let row = self.keys.row(i);
                positions
                    .iter()
                    .zip(selection)
                    .all(|(&p, &(_, value))| row[p] == value)
            })
            .collect())
    }

    /// Returns the single block matching a partial key.
    ///
    /// # Errors
    /// Returns [`TensorError::NotFound`] if no block (or no such dimension)
    /// matches, and [`TensorError::Validation`] if more than one does.
    pub fn block_by_selection(&self, selection: &[(&str, i32)]) -> Result<&TensorBlock<A>, TensorError> {
        let matching = self.blocks_matching(selection)?;
        match matching.as_slice() {
            [single] => Ok(&self.blocks[*single]),
            [] => Err(TensorError::NotFound(format!(
                "no block matches the selection {selection:?}"
            ))),
            many => Err(TensorError::Validation(format!(
                "{} blocks match the selection {selection:?}, expected exactly one",
                many.len()
            ))),
        }
    }

    /// Returns `true` if both maps have the same key names and the same key
    /// rows, in any order.
    pub fn keys_values_match(&self, other: &TensorMap<A>) -> bool {
        self.keys.is_same_set(&other.keys)
    }

    /// Sample dimension names (empty for a map without blocks).
    pub fn sample_names(&self) -> Vec<&str> {
        self.blocks
            .first()
            .map(|b| b.samples().names().iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Names of each component axis (empty for a map without blocks).
    pub fn component_names(&self) -> Vec<Vec<&str>> {
        self.blocks
            .first()
            .map(|b| {
                b.components()
                    .iter()
                    .map(|c| c.names().iter().map(String::as_str).collect())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Property dimension names (empty for a map without blocks).
    pub fn property_names(&self) -> Vec<&str> {
        self.blocks
            .first()
            .map(|b| b.properties().names().iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Gradient parameters shared by all blocks, in the first block's order.
    pub fn gradients_list(&self) -> Vec<&str> {
        self.blocks
            .first()
            .map(TensorBlock::gradients_list)
            .unwrap_or_default()
    }

    /// Splits the map into its keys and blocks.
    pub fn into_parts(self) -> (Labels, Vec<TensorBlock<A>>) {
        (self.keys, self.blocks)
    }
}

/// Checks that `block` (at position `index`) matches `first` in axis names
/// and gradient structure.
fn check_consistent<A: Array>(
    first: &TensorBlock<A>,
    block: &TensorBlock<A>,
    index: usize,
) -> Result<(), TensorError> {
    if block.samples().names() != first.samples().names() {
        return Err(TensorError::Validation(format!(
            "block {index} has sample names {:?}, expected {:?}",
            block.samples().names(),
            first.samples().names()
        )));
    }
    if !same_component_names(block.components(), first.components()) {
        return Err(TensorError::Validation(format!(
            "block {index} has different component names than block 0"
        )));
    }
    if block.properties().names() != first.properties().names() {
        return Err(TensorError::Validation(format!(
            "block {index} has property names {:?}, expected {:?}",
            block.properties().names(),
            first.properties().names()
        )));
    }

    let mut expected = first.gradients_list();
    let mut actual = block.gradients_list();
    expected.sort_unstable();
    actual.sort_unstable();
    if expected != actual {
        return Err(TensorError::Validation(format!(
            "block {index} has gradients {actual:?}, expected {expected:?}"
        )));
    }
    for (parameter, gradient) in block.gradients() {
        let reference = first.gradient(parameter)?;
        if gradient.samples().names() != reference.samples().names()
            || !same_component_names(gradient.components(), reference.components())
        {
            return Err(TensorError::Validation(format!(
                "gradient '{parameter}' of block {index} has different sample or component names than block 0"
            )));
        }
    }
    Ok(())
}

fn same_component_names(lhs: &[Labels], rhs: &[Labels]) -> bool {
    lhs.len() == rhs.len() && lhs.iter().zip(rhs).all(|(l, r)| l.names() == r.names())
}

impl<A: Array> fmt::Display for TensorMap<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TensorMap with {} blocks", self.blocks.len())?;
        write!(f, "keys: {:?}", self.keys.names())?;
        for row in self.keys.iter() {
            write!(f, "\n  {row:?}")?;
        }
        Ok(())
    }
}

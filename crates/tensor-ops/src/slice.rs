// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Selecting a subset of samples or properties from every block.

use crate::checks::map_blocks;
use array_backend::Array;
use labeled_tensor::{Labels, TensorBlock, TensorError, TensorMap};
use std::fmt;
use std::str::FromStr;

/// The block axis an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Samples,
    Properties,
}

impl Axis {
    /// Returns the canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Axis::Samples => "samples",
            Axis::Properties => "properties",
        }
    }

    /// Returns the labels of `block` along this axis.
    pub fn labels<A: Array>(self, block: &TensorBlock<A>) -> &Labels {
        match self {
            Axis::Samples => block.samples(),
            Axis::Properties => block.properties(),
        }
    }
}

impl FromStr for Axis {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "samples" => Ok(Axis::Samples),
            "properties" => Ok(Axis::Properties),
            other => Err(TensorError::Validation(format!(
                "axis must be 'samples' or 'properties', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keeps, in every block, the entries of `axis` whose projection on
/// `labels.names()` appears in `labels`.
///
/// Original order is preserved and selection rows absent from a block are
/// ignored, so a block may end up with zero samples or properties.
///
/// # Errors
/// Returns [`TensorError::Validation`] if the names of `labels` are not all
/// dimensions of `axis`.
pub fn slice<A: Array>(
    map: &TensorMap<A>,
    axis: Axis,
    labels: &Labels,
) -> Result<TensorMap<A>, TensorError> {
    tracing::debug!(axis = %axis, selection = labels.count(), "slicing tensor map");
    map_blocks(map, |block| slice_block(block, axis, labels))
}

/// Block form of [`slice`].
pub fn slice_block<A: Array>(
    block: &TensorBlock<A>,
    axis: Axis,
    labels: &Labels,
) -> Result<TensorBlock<A>, TensorError> {
    match axis {
        Axis::Samples => block.select_samples(labels),
        Axis::Properties => block.select_properties(labels),
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # labeled-tensor
//!
//! The data model of block-sparse, metadata-labeled tensors:
//!
//! - [`Labels`] — an immutable set of named integer rows with O(1) lookup.
//! - [`TensorBlock`] — one dense array, the labels of each of its axes, and
//!   gradient blocks keyed by parameter name (one level deep).
//! - [`TensorMap`] — an ordered collection of blocks, one per key row.
//! - [`TensorError`] — the error taxonomy shared by construction and operations.
//!
//! Blocks and maps are generic over the array backend ([`array_backend::Array`])
//! and default to the dense `ndarray` backend.
//!
//! # Example
//! ```
//! use array_backend::{Array, DenseArray};
//! use labeled_tensor::{Labels, TensorBlock, TensorMap};
//!
//! let values = <DenseArray as Array>::from_shape_vec(&[2, 2], vec![1.0, 2.0, 3.0, 5.0]).unwrap();
//! let samples = Labels::new(["s"], vec![vec![0], vec![2]]).unwrap();
//! let block = TensorBlock::new(values, samples, vec![], Labels::range("p", 2).unwrap()).unwrap();
//!
//! let keys = Labels::new(["key"], vec![vec![0]]).unwrap();
//! let map = TensorMap::new(keys, vec![block]).unwrap();
//! assert_eq!(map.block(&[0]).unwrap().properties().count(), 2);
//! ```

mod block;
mod error;
mod labels;
mod map;

pub use block::{TensorBlock, GRADIENT_SAMPLE};
pub use error::TensorError;
pub use labels::Labels;
pub use map::TensorMap;

pub use array_backend::{Array, ArrayError, DenseArray};

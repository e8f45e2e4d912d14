// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-io
//!
//! Persistence for [`TensorMap`](labeled_tensor::TensorMap)s, in the layout
//! `numpy.savez` produces: an uncompressed zip archive with one `.npy` array
//! per entry.
//!
//! ```text
//! keys.npy
//! blocks/{i}/values.npy
//! blocks/{i}/samples.npy
//! blocks/{i}/components/{j}.npy
//! blocks/{i}/properties.npy
//! blocks/{i}/gradients/{parameter}/values.npy
//! blocks/{i}/gradients/{parameter}/samples.npy
//! blocks/{i}/gradients/{parameter}/components/{j}.npy
//! ```
//!
//! Labels are stored as structured arrays with one `'<i4'` field per
//! dimension, values as `'<f8'`. Gradient properties are not stored; they
//! are always the properties of the parent block.
//!
//! # Example
//! ```
//! use array_backend::{Array, DenseArray};
//! use labeled_tensor::{Labels, TensorBlock, TensorMap};
//!
//! let block = TensorBlock::new(
//!     <DenseArray as Array>::full(&[2, 3], 0.5),
//!     Labels::range("sample", 2).unwrap(),
//!     vec![],
//!     Labels::range("property", 3).unwrap(),
//! ).unwrap();
//! let map = TensorMap::new(Labels::single(), vec![block]).unwrap();
//!
//! let bytes = tensor_io::save_buffer(&map).unwrap();
//! assert_eq!(tensor_io::load_buffer(&bytes).unwrap(), map);
//! ```

mod archive;
mod error;
mod npy;

pub use archive::{
    load, load_buffer, load_buffer_custom_array, load_custom_array, save, save_buffer, EXTENSION,
};
pub use error::IoError;

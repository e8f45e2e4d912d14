// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for archive encoding and decoding.

use array_backend::ArrayError;
use labeled_tensor::TensorError;

/// Errors raised while saving or loading a tensor map archive.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Reading or writing the underlying file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The zip container is malformed or could not be written.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A required array is absent from the archive.
    #[error("missing entry '{name}' in tensor map archive")]
    MissingEntry { name: String },

    /// An entry exists but is not a valid array of the expected kind.
    #[error("invalid entry '{entry}': {detail}")]
    Format { entry: String, detail: String },

    /// The decoded arrays do not form a valid map.
    #[error(transparent)]
    Tensor(#[from] TensorError),

    /// The array constructor rejected decoded data.
    #[error("array error: {0}")]
    Array(#[from] ArrayError),
}

impl IoError {
    pub(crate) fn format(entry: &str, detail: impl Into<String>) -> Self {
        IoError::Format {
            entry: entry.to_string(),
            detail: detail.into(),
        }
    }
}

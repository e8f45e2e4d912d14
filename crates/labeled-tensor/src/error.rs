// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for labeled tensors and the operations built on them.

use array_backend::ArrayError;

/// Errors raised by label, block and map construction and by tensor operations.
///
/// None of these are transient: a metadata mismatch is a data or programmer
/// error and is reported at the call that detected it.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// Shape, name or metadata mismatch on construction or alignment.
    #[error("invalid tensor metadata: {0}")]
    Validation(String),

    /// A key, block, gradient parameter or dimension name does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request is well-formed but not supported (e.g. gradients of gradients).
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// A linear-algebra kernel failed; the backend error is carried verbatim.
    #[error("linear algebra error in {op}: {source}")]
    LinearAlgebra {
        op: &'static str,
        #[source]
        source: ArrayError,
    },

    /// Any other failure reported by the array backend.
    #[error("array error: {0}")]
    Array(#[from] ArrayError),

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

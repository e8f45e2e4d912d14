// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Comparison tolerances loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! rtol = 1e-13
//! atol = 1e-12
//! equal_nan = false
//! ```
//!
//! Missing keys fall back to their defaults.

use labeled_tensor::TensorError;
use std::path::Path;

/// Tolerances used by [`crate::allclose`] and friends.
///
/// Two values `a` and `b` are close when `|a - b| <= atol + rtol * |b|`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OpsConfig {
    /// Relative tolerance.
    #[serde(default = "default_rtol")]
    pub rtol: f64,
    /// Absolute tolerance.
    #[serde(default = "default_atol")]
    pub atol: f64,
    /// Whether two NaN in the same position compare as close.
    #[serde(default)]
    pub equal_nan: bool,
}

fn default_rtol() -> f64 {
    1e-13
}

fn default_atol() -> f64 {
    1e-12
}

impl OpsConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, TensorError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TensorError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, TensorError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| TensorError::Config(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, TensorError> {
        toml::to_string_pretty(self)
            .map_err(|e| TensorError::Config(format!("TOML serialise error: {e}")))
    }

    /// Rejects negative or non-finite tolerances.
    pub fn validate(&self) -> Result<(), TensorError> {
        for (name, value) in [("rtol", self.rtol), ("atol", self.atol)] {
            if !value.is_finite() || value < 0.0 {
                return Err(TensorError::Config(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Returns `true` if `a` is close to `b` under these tolerances.
    pub fn is_close(&self, a: f64, b: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return self.equal_nan && a.is_nan() && b.is_nan();
        }
        if a == b {
            // covers equal infinities
            return true;
        }
        (a - b).abs() <= self.atol + self.rtol * b.abs()
    }
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            rtol: default_rtol(),
            atol: default_atol(),
            equal_nan: false,
        }
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tmap compare` command: check two archives against each other.
//!
//! Metadata must match exactly; values (gradients included) must agree
//! within the tolerances of [`OpsConfig`], read from `--config` when given.

use std::path::PathBuf;
use tensor_ops::OpsConfig;

pub fn execute(
    reference: PathBuf,
    candidate: PathBuf,
    config: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => OpsConfig::from_file(&path)?,
        None => OpsConfig::default(),
    };
    tracing::info!(
        rtol = config.rtol,
        atol = config.atol,
        equal_nan = config.equal_nan,
        "comparing archives"
    );

    let load = |path: &PathBuf| {
        tensor_io::load(path)
            .map_err(|e| anyhow::anyhow!("failed to load '{}': {e}", path.display()))
    };
    let a = load(&reference)?;
    let b = load(&candidate)?;

    tensor_ops::check_allclose(&a, &b, &config).map_err(|e| {
        anyhow::anyhow!(
            "'{}' and '{}' differ: {e}",
            reference.display(),
            candidate.display()
        )
    })?;

    println!(
        "  '{}' and '{}' match ({} blocks, rtol = {:e}, atol = {:e})",
        reference.display(),
        candidate.display(),
        a.len(),
        config.rtol,
        config.atol,
    );
    Ok(())
}

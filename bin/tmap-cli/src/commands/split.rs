// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tmap split` command: write one archive per group of samples/properties.

use labeled_tensor::Labels;
use std::path::PathBuf;
use tensor_ops::Axis;

pub fn execute(
    file: PathBuf,
    axis: String,
    names: String,
    groups: String,
    output: PathBuf,
) -> anyhow::Result<()> {
    let axis: Axis = axis.parse()?;
    let names: Vec<&str> = names.split(',').map(str::trim).collect();
    let groups = parse_groups(&names, &groups)?;

    let map = tensor_io::load(&file)
        .map_err(|e| anyhow::anyhow!("failed to load '{}': {e}", file.display()))?;
    let parts = tensor_ops::split(&map, axis, &groups)?;

    for (i, part) in parts.iter().enumerate() {
        let mut target = output.as_os_str().to_owned();
        target.push(format!("_{i}.{}", tensor_io::EXTENSION));
        let written = tensor_io::save(PathBuf::from(target), part)?;
        let entries: usize = part.blocks().iter().map(|b| axis.labels(b).count()).sum();
        println!(
            "  group {i}: {} {axis} entries -> {}",
            entries,
            written.display()
        );
    }
    Ok(())
}

/// Parses `"0,6;2,3"` into one [`Labels`] per `;`-separated group.
///
/// With several dimension names, values of one entry are separated by `:`
/// (`"0:1,2:0"`).
pub fn parse_groups(names: &[&str], spec: &str) -> anyhow::Result<Vec<Labels>> {
    spec.split(';')
        .map(str::trim)
        .filter(|group| !group.is_empty())
        .map(|group| -> anyhow::Result<Labels> {
            let rows = group
                .split(',')
                .map(|entry| -> anyhow::Result<Vec<i32>> {
                    let row = entry
                        .split(':')
                        .map(|v| {
                            v.trim()
                                .parse::<i32>()
                                .map_err(|e| anyhow::anyhow!("invalid value '{v}' in group '{group}': {e}"))
                        })
                        .collect::<anyhow::Result<Vec<_>>>()?;
                    if row.len() != names.len() {
                        anyhow::bail!(
                            "entry '{entry}' has {} values but {} names were given",
                            row.len(),
                            names.len()
                        );
                    }
                    Ok(row)
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            Ok(Labels::new(names.iter().copied(), rows)?)
        })
        .collect()
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tmap inspect` command: summarise the blocks of an archive.

use labeled_tensor::{Labels, TensorBlock, TensorMap};
use std::path::PathBuf;

/// Machine-readable summary printed by `--json`.
#[derive(Debug, serde::Serialize)]
pub struct MapSummary {
    pub key_names: Vec<String>,
    pub sample_names: Vec<String>,
    pub component_names: Vec<Vec<String>>,
    pub property_names: Vec<String>,
    pub gradients: Vec<String>,
    pub blocks: Vec<BlockSummary>,
}

#[derive(Debug, serde::Serialize)]
pub struct BlockSummary {
    pub key: Vec<i32>,
    pub shape: Vec<usize>,
    pub samples: usize,
    pub properties: usize,
    pub gradients: Vec<GradientSummary>,
}

#[derive(Debug, serde::Serialize)]
pub struct GradientSummary {
    pub parameter: String,
    pub sample_names: Vec<String>,
    pub shape: Vec<usize>,
}

impl MapSummary {
    pub fn new(map: &TensorMap) -> Self {
        let owned = |names: Vec<&str>| names.into_iter().map(str::to_string).collect::<Vec<_>>();
        Self {
            key_names: map.keys().names().to_vec(),
            sample_names: owned(map.sample_names()),
            component_names: map.component_names().into_iter().map(owned).collect(),
            property_names: owned(map.property_names()),
            gradients: owned(map.gradients_list()),
            blocks: map
                .iter()
                .map(|(key, block)| BlockSummary::new(key, block))
                .collect(),
        }
    }
}

impl BlockSummary {
    fn new(key: &[i32], block: &TensorBlock) -> Self {
        Self {
            key: key.to_vec(),
            shape: block.values().shape().to_vec(),
            samples: block.samples().count(),
            properties: block.properties().count(),
            gradients: block
                .gradients()
                .map(|(parameter, gradient)| GradientSummary {
                    parameter: parameter.to_string(),
                    sample_names: gradient.samples().names().to_vec(),
                    shape: gradient.values().shape().to_vec(),
                })
                .collect(),
        }
    }
}

pub fn execute(file: PathBuf, json: bool) -> anyhow::Result<()> {
    let map = tensor_io::load(&file)
        .map_err(|e| anyhow::anyhow!("failed to load '{}': {e}", file.display()))?;
    let summary = MapSummary::new(&map);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("  File: {}", file.display());
    println!("  Blocks: {}", map.len());
    println!("  Keys: {}", quoted(&summary.key_names));
    println!("  Samples: {}", quoted(&summary.sample_names));
    for (i, names) in summary.component_names.iter().enumerate() {
        println!("  Components[{i}]: {}", quoted(names));
    }
    println!("  Properties: {}", quoted(&summary.property_names));
    println!("  Gradients: {}", quoted(&summary.gradients));
    println!();

    // ── Per-Block Detail ───────────────────────────────────────
    println!(
        "  {:<4} {:<20} {:<20} {:>8} {:>10}",
        "Idx", "Key", "Shape", "Samples", "Properties",
    );
    println!("  {}", "-".repeat(66));
    for (i, block) in summary.blocks.iter().enumerate() {
        println!(
            "  {:<4} {:<20} {:<20} {:>8} {:>10}",
            i,
            format!("{:?}", block.key),
            format!("{:?}", block.shape),
            block.samples,
            block.properties,
        );
        for gradient in &block.gradients {
            println!(
                "       ∂/∂{:<16} {:<20} {:>8}",
                gradient.parameter,
                format!("{:?}", gradient.shape),
                quoted(&gradient.sample_names),
            );
        }
    }
    println!();

    tracing::debug!(keys = %keys_preview(map.keys()), "inspected archive");
    Ok(())
}

fn quoted(names: &[String]) -> String {
    let inner: Vec<String> = names.iter().map(|n| format!("'{n}'")).collect();
    format!("[{}]", inner.join(", "))
}

fn keys_preview(keys: &Labels) -> String {
    const SHOWN: usize = 4;
    let mut rows: Vec<String> = keys.iter().take(SHOWN).map(|r| format!("{r:?}")).collect();
    if keys.count() > SHOWN {
        rows.push("...".into());
    }
    rows.join(" ")
}

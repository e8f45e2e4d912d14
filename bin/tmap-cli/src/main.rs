// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tmap
//!
//! Command-line interface for tensor map archives.
//!
//! ## Usage
//! ```bash
//! # Summarise an archive
//! tmap inspect descriptor.npz
//! tmap inspect descriptor.npz --json
//!
//! # Compare two archives with tolerances from a TOML file
//! tmap --config tolerances.toml compare reference.npz candidate.npz
//!
//! # Split samples into train/test archives
//! tmap split descriptor.npz --axis samples --name structure --groups "0,6;2,3" --output part
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tmap",
    about = "Inspect, compare and split block-sparse tensor map archives",
    version,
    author
)]
struct Cli {
    /// Path to a TOML file with comparison tolerances (rtol, atol, equal_nan).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the keys, axes and gradients of every block.
    Inspect {
        /// Archive to read.
        file: PathBuf,

        /// Emit a JSON summary instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Check that two archives hold the same metadata and close values.
    Compare {
        /// Reference archive.
        reference: PathBuf,

        /// Archive compared against the reference.
        candidate: PathBuf,
    },

    /// Split an archive into one archive per group of entries.
    Split {
        /// Archive to split.
        file: PathBuf,

        /// Axis to split along: samples or properties.
        #[arg(short, long, default_value = "samples")]
        axis: String,

        /// Comma-separated dimension names the groups refer to.
        #[arg(short, long)]
        name: String,

        /// Groups separated by ';', entries by ',', multi-dimension values by ':'.
        #[arg(short, long)]
        groups: String,

        /// Output prefix; group `i` is written to `<prefix>_<i>.npz`.
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect { file, json } => commands::inspect::execute(file, json),
        Commands::Compare {
            reference,
            candidate,
        } => commands::compare::execute(reference, candidate, cli.config),
        Commands::Split {
            file,
            axis,
            name,
            groups,
            output,
        } => commands::split::execute(file, axis, name, groups, output),
    }
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use chrono::NaiveDate;
use gex_levels::config::FocusWindow;
use gex_levels::schema::SchemaKind;

/// GEX levels: dealer gamma exposure per strike, call and put walls, the
/// gamma flip and ranked key levels from CBOE option chain exports.
#[derive(Parser)]
#[command(name = "gex-levels", version, about)]
pub struct Cli {
    /// Debug logging and gamma profile tables (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute metrics from one or more CBOE quote exports
    Analyze {
        /// CBOE option chain CSV files, one per asset
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Override the last price, once per file in file order (e.g. "6,466.91")
        #[arg(long = "last-price")]
        last_prices: Vec<String>,

        /// Override the asset id, once per file in file order
        #[arg(long = "asset")]
        assets: Vec<String>,

        /// Valuation date (YYYY-MM-DD), default: the export's own date
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Keep only contracts expiring on the valuation date
        #[arg(long)]
        zero_dte: bool,

        /// Solve the gamma flip (Black-Scholes sweep)
        #[arg(long)]
        flip_point: bool,

        /// Focus window: strikes on each side of the nearest strike
        #[arg(long, conflicts_with = "window_preset")]
        window: Option<usize>,

        /// Focus window preset
        #[arg(long, value_enum)]
        window_preset: Option<FocusWindow>,

        /// Analytics config JSON (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory for processed per-asset artifacts
        #[arg(long, default_value = "data/processed")]
        processed_dir: PathBuf,

        /// Skip writing processed artifacts
        #[arg(long)]
        no_artifacts: bool,

        /// Write the merged metrics as JSON to this file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print a Pine Script indicator per asset
        #[arg(long)]
        pine: bool,
    },

    /// Recompute walls and levels from processed artifacts
    FromArtifact {
        /// processed_<asset>.json files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Focus window: strikes on each side of the nearest strike
        #[arg(long, conflicts_with = "window_preset")]
        window: Option<usize>,

        /// Focus window preset
        #[arg(long, value_enum)]
        window_preset: Option<FocusWindow>,

        /// Analytics config JSON (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the merged metrics as JSON to this file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print a Pine Script indicator per asset
        #[arg(long)]
        pine: bool,
    },

    /// Output the JSON schema for a metrics record, config or artifact
    Schema {
        #[arg(value_enum, default_value = "metrics")]
        kind: SchemaKind,
    },
}

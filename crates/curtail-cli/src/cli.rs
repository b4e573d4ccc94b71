use clap::{Parser, Subcommand};
use std::path::PathBuf;

use curtail_check::DEFAULT_AUTO_OK_TOLERANCE_PCT;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch raw interval data and update the monthly curtailment history
    Update {
        /// Source feed ("wind" or "solar")
        source: String,

        /// Directory holding the monthly history and the raw cache
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// First period to compute when no history exists yet (YYYY-MM)
        #[arg(long, default_value = "2025-01")]
        start: String,

        /// Trailing periods re-fetched even when already persisted
        #[arg(long, default_value_t = 2)]
        refresh_last: usize,

        /// Build from cached raw files only, skipping downloads
        #[arg(long)]
        offline: bool,

        /// JSON file mapping entity ids to company ids; switches the
        /// history to company level
        #[arg(long)]
        company_map: Option<PathBuf>,

        /// Also write the normalized interval rows next to the raw cache
        #[arg(long)]
        audit: bool,
    },
    /// Compare two monthly snapshots and print a drift verdict
    Check {
        /// Source feed ("wind" or "solar")
        source: String,

        /// Directory holding the monthly history
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Baseline snapshot; defaults to the persisted history
        #[arg(long)]
        baseline: Option<PathBuf>,

        /// Candidate snapshot; defaults to the `_test` sibling of the
        /// baseline
        #[arg(long)]
        candidate: Option<PathBuf>,

        /// Max relative change (percent) of the latest period's curtailed
        /// energy still accepted without review
        #[arg(long, default_value_t = DEFAULT_AUTO_OK_TOLERANCE_PCT)]
        tolerance: f64,
    },
}

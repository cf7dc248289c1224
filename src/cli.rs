//! CLI argument parsing for seedrun

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for comparison reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Self-contained HTML page (default)
    Html,
    /// Aligned text table
    Text,
    /// JSON for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "seedrun")]
#[command(version)]
#[command(about = "Run a candidate over many seeds and compare against a baseline", long_about = None)]
pub struct Cli {
    /// Enable debug logging to stderr
    #[arg(long)]
    pub debug: bool,

    /// Harness configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding recorded runs (overrides the config file)
    #[arg(long = "store-dir", value_name = "DIR")]
    pub store_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the candidate once per seed and record the results as a new run
    Run {
        /// Candidate command; `{seed}` is replaced by the seed, otherwise the
        /// seed is appended as the last argument
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },

    /// List recorded runs, newest first
    List,

    /// Compare a recorded run against a baseline run
    Compare {
        /// Run to report on
        run_id: String,

        /// Baseline run id
        #[arg(short, long, value_name = "ID")]
        baseline: Option<String>,

        /// Output format
        #[arg(long = "format", value_enum, default_value = "html")]
        format: OutputFormat,
    },
}

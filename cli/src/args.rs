//! CLI argument definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// What to print when the run finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Complete experiment record as pretty JSON
    Json,
    /// One paragraph per experiment
    Summary,
}

/// CLI arguments for veil-council
#[derive(Parser, Debug)]
#[command(name = "veil-council")]
#[command(
    author,
    version,
    about = "Veil-of-ignorance deliberation experiments with LLM participants"
)]
#[command(long_about = r#"
veil-council runs a group of LLM participants through a veil-of-ignorance
experiment: each privately ranks four principles of distributive justice,
earns payouts in individual rounds, then deliberates as a group until it
agrees (or votes by secret ballot), and is paid by the group's choice.

Configuration files are loaded from (in priority order):
1. VEIL_* environment variables   e.g. VEIL_EXPERIMENT__MAX_ROUNDS=6
2. --config <path>                Explicit config file
3. ./veil.toml                    Project-level config
4. ~/.config/veil-council/config.toml   User config

Example:
  veil-council --config experiment.toml --seed 7
  veil-council --config experiment.toml --repeat 10 --max-concurrent-experiments 3 -o summary
"#)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files (use built-in defaults only)
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Seed for the run's random generator (overrides the config)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of independent runs (seeds increase by one per run when a seed is set)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub repeat: u32,

    /// Runs in flight at once when --repeat is greater than 1
    #[arg(long, default_value_t = 2, value_name = "N")]
    pub max_concurrent_experiments: usize,

    /// Write the structured event log (JSONL) to this path
    #[arg(long, value_name = "PATH")]
    pub conversation_log: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub output: OutputFormat,

    /// Write the output to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress phase progress lines
    #[arg(short, long)]
    pub quiet: bool,
}

//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Distributed load testing with adaptive saturation search", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a plan on this machine and print the aggregated result
    Run {
        /// Plan file (YAML, or JSON with a .json extension)
        #[arg(long, value_name = "PATH")]
        plan: PathBuf,

        /// Number of parallel executors
        #[arg(long, value_name = "N")]
        threads: Option<usize>,

        /// Recurrences per executor
        #[arg(long, value_name = "N")]
        recurrences: Option<u64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ramp up concurrency on every host until one of them saturates
    Saturate {
        /// Plan file (YAML, or JSON with a .json extension)
        #[arg(long, value_name = "PATH")]
        plan: PathBuf,

        /// Comma-separated execution hosts (host:port or URL)
        #[arg(long, value_name = "HOSTS", value_delimiter = ',', conflicts_with = "local")]
        hosts: Vec<String>,

        /// Run every round in this process instead of on remote hosts
        #[arg(long)]
        local: bool,

        /// Highest thread count to try
        #[arg(long, value_name = "N")]
        max_threads: Option<usize>,

        /// Threads added per round
        #[arg(long, value_name = "N")]
        increment: Option<usize>,

        /// Recurrences per executor in each round
        #[arg(long, value_name = "N")]
        recurrences: Option<u64>,

        /// Median recurrence duration that marks a host as saturated
        #[arg(long, value_name = "MS")]
        threshold_ms: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Write a sample configuration with every default filled in
    Generate {
        /// Output file path
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration in use
    Show {
        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}

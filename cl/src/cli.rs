//! CLI argument parsing for the cascade simulator

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cl")]
#[command(author, version, about = "Cascading lifecycle coordinator simulator", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the configured node graph in-process
    Simulate {
        /// How long to run in milliseconds
        #[arg(short, long, default_value = "3000")]
        duration_ms: u64,

        /// Node to crash mid-run (it sends no REMOVE)
        #[arg(long)]
        crash: Option<String>,

        /// When to crash the node, in milliseconds after start
        #[arg(long, default_value = "1500")]
        crash_after_ms: u64,
    },

    /// Check the configured graph and print a summary
    Validate,
}

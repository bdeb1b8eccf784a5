//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// stovepaneld - pellet stove and zone thermostat automation
#[derive(Debug, Parser)]
#[command(name = "stovepaneld", version, about)]
pub struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true, default_value = "stovepanel.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the HTTP API
    Serve,

    /// Run one engine cycle and print its outcome as JSON
    RunCycle {
        #[arg(value_enum)]
        cycle: Cycle,
    },
}

/// Engine cycles that can be triggered from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Cycle {
    Coordination,
    Power,
    Scheduler,
}

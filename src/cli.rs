// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use muster::output::OutputMode;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "muster")]
#[command(about = "Staged service deployment with readiness verification")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "normal", global = true)]
    pub output: OutputMode,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new muster.yml registry
    Init {
        /// Platform name written into the template
        #[arg(long)]
        platform: Option<String>,

        /// Overwrite an existing muster.yml
        #[arg(long)]
        force: bool,
    },

    /// Start every service tier by tier and verify readiness
    Deploy {
        /// Registry file (defaults to muster.yml in the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Abort the run after this long (e.g. "10m")
        #[arg(long, value_parser = humantime::parse_duration)]
        abort_timeout: Option<Duration>,

        /// Validate the registry and print the tier plan without starting anything
        #[arg(long)]
        dry_run: bool,

        /// Fraction of services that must be ready, overriding the registry
        #[arg(long)]
        quorum: Option<f64>,

        /// Serve the status endpoint on this address until Ctrl-C
        #[arg(long)]
        serve: Option<SocketAddr>,

        /// Stop already-started services when the run is aborted
        #[arg(long)]
        stop_on_abort: bool,
    },

    /// Stop every service in reverse tier order
    Down {
        /// Registry file (defaults to muster.yml in the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

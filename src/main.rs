// ABOUTME: Entry point for the muster CLI application.
// ABOUTME: Parses arguments, sets up logging, and maps results to exit codes.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use muster::output::Output;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbose flag when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let output = Output::new(cli.output);

    let code = match run(cli.command, output).await {
        Ok(code) => code,
        Err(e) => {
            Output::new(cli.output).error(&e.to_string());
            e.exit_code()
        }
    };

    std::process::exit(code);
}

async fn run(command: Commands, output: Output) -> muster::error::Result<i32> {
    let cwd = std::env::current_dir()?;

    match command {
        Commands::Init { platform, force } => {
            commands::init(&cwd, platform.as_deref(), force, output)?;
            Ok(0)
        }
        Commands::Deploy {
            config,
            abort_timeout,
            dry_run,
            quorum,
            serve,
            stop_on_abort,
        } => {
            let options = commands::DeployOptions {
                config,
                abort_timeout,
                dry_run,
                quorum,
                serve,
                stop_on_abort,
            };
            commands::deploy(&cwd, options, output).await
        }
        Commands::Down { config } => commands::down(&cwd, config.as_deref(), output).await,
    }
}

//! JobHands - job scheduling service
//!
//! Main entry point for the JobHands CLI and server.

mod cli;
mod jobs;
mod server;

use clap::Parser;

use jobhands_config::{ConfigLoader, ConfigValidator};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load_or_default(&cli.config)?;

    match cli.command {
        Some(Commands::CheckConfig) => check_config(&cli, &config),
        Some(Commands::Run { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            server::init_tracing(&config.logging)?;
            server::run_server(config).await
        }
        None => {
            server::init_tracing(&config.logging)?;
            server::run_server(config).await
        }
    }
}

/// Print validation warnings and errors; fails if any error was found.
fn check_config(
    cli: &Cli,
    config: &jobhands_config::Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = ConfigValidator::validate(config)?;
    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }
    match result.into_error() {
        Some(error) => Err(error.into()),
        None => {
            println!("{}: ok", cli.config.display());
            Ok(())
        }
    }
}

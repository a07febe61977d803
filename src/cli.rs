//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// JobHands CLI.
#[derive(Parser)]
#[command(name = "jobhands")]
#[command(about = "Job scheduling service over persisted job definitions")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true, env = "JOBHANDS_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the scheduler and HTTP API in foreground (default)
    Run {
        /// Server host, overrides `[server].host`
        #[arg(long)]
        host: Option<String>,

        /// Server port, overrides `[server].port`
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate the configuration file and exit
    CheckConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        let cli = Cli::try_parse_from(["jobhands"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("config/default.toml"));
    }

    #[test]
    fn test_run_overrides() {
        let cli =
            Cli::try_parse_from(["jobhands", "run", "--host", "0.0.0.0", "--port", "9000"]).unwrap();
        match cli.command {
            Some(Commands::Run { host, port }) => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(9000));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_check_config_with_global_flag() {
        let cli = Cli::try_parse_from(["jobhands", "check-config", "--config", "/etc/jobhands.toml"])
            .unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
        assert_eq!(cli.config, PathBuf::from("/etc/jobhands.toml"));
    }
}

//! Command execution and runtime logic.
//!
//! Contains the main command dispatch and logging initialization.

use anyhow::Result;
use edgelink_core::cli::{ExitCode, OutputFormat};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Commands;
use crate::commands;

/// Initializes logging infrastructure.
///
/// `RUST_LOG` controls the filter (default `info`); `verbose` forces
/// `debug`. Logs go to stderr so stdout carries only command output.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}

/// Executes the specified CLI command.
///
/// # Errors
///
/// Returns an error if command execution fails.
pub async fn execute_command(command: Commands, output_format: OutputFormat) -> Result<ExitCode> {
    match command {
        Commands::Build(args) => commands::build::run(args, output_format).await,
        Commands::Inspect(args) => commands::inspect::run(args, output_format).await,
        Commands::Completions { shell } => {
            use crate::cli::Cli;
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            commands::completions::run(shell, &mut cmd).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap_complete::Shell;

    #[tokio::test]
    async fn test_execute_completions() {
        let code = execute_command(Commands::Completions { shell: Shell::Bash }, OutputFormat::Text)
            .await
            .unwrap();
        assert!(code.is_success());
    }
}

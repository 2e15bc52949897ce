//! edgelink CLI.
//!
//! Links a Nitro server build and its public tree into one edge-deploy
//! script.
//!
//! # Examples
//!
//! ```bash
//! # Build with defaults (.output/server + .output/public -> dist/deploy.ts)
//! edgelink build
//!
//! # See what would be bundled, as JSON
//! edgelink --format json inspect
//! ```

use anyhow::Result;
use clap::Parser;
use edgelink_cli::cli::Cli;
use edgelink_cli::runner::{execute_command, init_logging};
use edgelink_core::cli::OutputFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let output_format = cli
        .format
        .parse::<OutputFormat>()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let exit_code = execute_command(cli.command, output_format).await?;

    std::process::exit(exit_code.as_i32());
}

//! Build command implementation.
//!
//! Runs the full link pipeline and writes the bundle.

use super::common::{resolve_config, run_blocking};
use crate::cli::LinkArgs;
use crate::formatters::format_output;
use anyhow::{Context, Result};
use edgelink_core::cli::{ExitCode, OutputFormat};
use edgelink_linker::{BundleReport, Linker};
use std::path::Path;
use tracing::info;

/// Runs the build command.
///
/// Prints the [`BundleReport`] in the requested format on success.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or any fatal link step
/// fails; nothing is written in that case.
pub async fn run(args: LinkArgs, output_format: OutputFormat) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let report = build(&args, &cwd).await?;

    info!("Bundle size: {:.1} KiB", report.kib());
    let formatted = format_output(&report, output_format).context("failed to format build report")?;
    println!("{formatted}");
    Ok(ExitCode::SUCCESS)
}

/// Resolves the configuration against `cwd` and builds the bundle.
///
/// # Errors
///
/// See [`run`].
pub async fn build(args: &LinkArgs, cwd: &Path) -> Result<BundleReport> {
    let config = resolve_config(args, cwd)?;
    let output = config.output.clone();

    run_blocking(move || Linker::new(config)?.build())
        .await
        .with_context(|| format!("failed to build {}", output.display()))
}

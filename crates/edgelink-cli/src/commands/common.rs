//! Common utilities shared across CLI commands.
//!
//! Resolves the effective [`LinkerConfig`] from an optional TOML file and
//! command-line overrides, and runs the blocking link pipeline off the async
//! runtime.

use crate::cli::LinkArgs;
use anyhow::{Context, Result};
use edgelink_core::{DEFAULT_CONFIG_FILE, LinkerConfig};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Builds the effective configuration for a link run.
///
/// Precedence: command-line flags, then the file named by `--config`, then
/// `edgelink.toml` in `cwd` when present, then built-in defaults.
///
/// # Errors
///
/// Returns an error if an explicitly named config file is missing, any
/// config file is invalid, or the merged configuration fails validation.
///
/// # Examples
///
/// ```
/// use edgelink_cli::cli::LinkArgs;
/// use edgelink_cli::commands::common::resolve_config;
/// use std::path::PathBuf;
///
/// let args = LinkArgs {
///     output: Some(PathBuf::from("out/edge.ts")),
///     strict: true,
///     ..LinkArgs::default()
/// };
/// let dir = tempfile::tempdir().unwrap();
/// let config = resolve_config(&args, dir.path()).unwrap();
///
/// assert_eq!(config.output, PathBuf::from("out/edge.ts"));
/// assert!(config.strict_references);
/// assert_eq!(config.entry_module, "index.mjs");
/// ```
pub fn resolve_config(args: &LinkArgs, cwd: &Path) -> Result<LinkerConfig> {
    let mut config = match config_file(args, cwd) {
        Some(path) => LinkerConfig::from_toml_file(&path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => LinkerConfig::default(),
    };

    if let Some(server_dir) = &args.server_dir {
        config.server_dir.clone_from(server_dir);
    }
    if let Some(public_dir) = &args.public_dir {
        config.public_dir.clone_from(public_dir);
    }
    if let Some(output) = &args.output {
        config.output.clone_from(output);
    }
    if let Some(entry) = &args.entry {
        config.entry_module.clone_from(entry);
    }
    if args.strict {
        config.strict_builtins = true;
        config.strict_references = true;
    }

    config.validate().context("invalid configuration")?;
    debug!("Effective configuration: {config:?}");
    Ok(config)
}

fn config_file(args: &LinkArgs, cwd: &Path) -> Option<PathBuf> {
    args.config.clone().or_else(|| {
        let candidate = cwd.join(DEFAULT_CONFIG_FILE);
        candidate.is_file().then_some(candidate)
    })
}

/// Runs `job` on the blocking thread pool.
///
/// The link pipeline is synchronous filesystem and CPU work.
///
/// # Errors
///
/// Returns the job's error, or an error if the job panicked.
pub async fn run_blocking<T, F>(job: F) -> Result<T>
where
    F: FnOnce() -> edgelink_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let output = tokio::task::spawn_blocking(job)
        .await
        .context("link task panicked")??;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let config = resolve_config(&LinkArgs::default(), dir.path()).unwrap();
        assert_eq!(config, LinkerConfig::default());
    }

    #[test]
    fn test_picks_up_default_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "edge_global = \"EdgeHost\"\n").unwrap();

        let config = resolve_config(&LinkArgs::default(), dir.path()).unwrap();
        assert_eq!(config.edge_global, "EdgeHost");
    }

    #[test]
    fn test_flags_override_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("custom.toml");
        fs::write(&file, "output = \"from-file.ts\"\nentry_module = \"main.mjs\"\n").unwrap();

        let args = LinkArgs {
            config: Some(file),
            output: Some(PathBuf::from("from-flag.ts")),
            ..LinkArgs::default()
        };
        let config = resolve_config(&args, dir.path()).unwrap();

        assert_eq!(config.output, PathBuf::from("from-flag.ts"));
        assert_eq!(config.entry_module, "main.mjs");
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = TempDir::new().unwrap();
        let args = LinkArgs {
            config: Some(dir.path().join("absent.toml")),
            ..LinkArgs::default()
        };
        assert!(resolve_config(&args, dir.path()).is_err());
    }

    #[test]
    fn test_empty_entry_flag_fails_validation() {
        let dir = TempDir::new().unwrap();
        let args = LinkArgs {
            entry: Some(String::new()),
            ..LinkArgs::default()
        };
        let err = resolve_config(&args, dir.path()).unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }

    #[tokio::test]
    async fn test_run_blocking_propagates_errors() {
        let value = run_blocking(|| Ok(7)).await.unwrap();
        assert_eq!(value, 7);

        let err = run_blocking::<(), _>(|| {
            Err(edgelink_core::Error::InvalidArgument("boom".to_string()))
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}

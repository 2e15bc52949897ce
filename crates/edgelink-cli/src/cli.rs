//! CLI argument definitions and parsing.
//!
//! Defines the command-line interface structure using clap:
//! - `Cli` - Main CLI entry point
//! - `Commands` - Available subcommands
//! - `LinkArgs` - Input/output options shared by `build` and `inspect`

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// edgelink - link a Nitro server build into one edge-deploy script.
///
/// Collapses the compiled server tree and the public tree into a single
/// self-contained bundle with an embedded virtual filesystem.
#[derive(Parser, Debug)]
#[command(name = "edgelink")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (json, text, pretty)
    #[arg(long = "format", global = true, default_value = "pretty")]
    pub format: String,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Link the build output and write the bundle.
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Defaults: .output/server + .output/public -> dist/deploy.ts
    /// edgelink build
    ///
    /// # Custom layout, failing on any unsatisfied reference
    /// edgelink build --server-dir build/server --output out/edge.ts --strict
    /// ```
    Build(LinkArgs),

    /// Link the build output without writing anything.
    ///
    /// Prints link order, embedded files, dropped client bundles, reference
    /// findings and patch results.
    Inspect(LinkArgs),

    /// Generate shell completions.
    ///
    /// Generates completion scripts for various shells that can be
    /// sourced or saved to enable tab completion for this CLI.
    Completions {
        /// Target shell for completion generation
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options locating the inputs and the output of a link run.
///
/// Flags override values from the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct LinkArgs {
    /// Configuration file (default: ./edgelink.toml when present)
    #[arg(short, long, env = "EDGELINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root of the compiled server tree
    #[arg(long)]
    pub server_dir: Option<PathBuf>,

    /// Root of the public/static tree
    #[arg(long)]
    pub public_dir: Option<PathBuf>,

    /// Bundle output path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Entry module path, relative to the server tree
    #[arg(long)]
    pub entry: Option<String>,

    /// Fail on unknown builtins and unsatisfied references
    #[arg(long)]
    pub strict: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_build_defaults() {
        let cli = Cli::parse_from(["edgelink", "build"]);
        if let Commands::Build(args) = cli.command {
            assert!(args.config.is_none());
            assert!(args.output.is_none());
            assert!(!args.strict);
        } else {
            panic!("Expected Build command");
        }
    }

    #[test]
    fn test_cli_parsing_build_with_args() {
        let cli = Cli::parse_from([
            "edgelink",
            "build",
            "--server-dir",
            "build/server",
            "--public-dir",
            "build/public",
            "-o",
            "out/edge.ts",
            "--entry",
            "main.mjs",
            "--strict",
        ]);
        if let Commands::Build(args) = cli.command {
            assert_eq!(args.server_dir, Some(PathBuf::from("build/server")));
            assert_eq!(args.public_dir, Some(PathBuf::from("build/public")));
            assert_eq!(args.output, Some(PathBuf::from("out/edge.ts")));
            assert_eq!(args.entry.as_deref(), Some("main.mjs"));
            assert!(args.strict);
        } else {
            panic!("Expected Build command");
        }
    }

    #[test]
    fn test_cli_parsing_inspect() {
        let cli = Cli::parse_from(["edgelink", "inspect", "--config", "edge.toml"]);
        if let Commands::Inspect(args) = cli.command {
            assert_eq!(args.config, Some(PathBuf::from("edge.toml")));
        } else {
            panic!("Expected Inspect command");
        }
    }

    #[test]
    fn test_cli_parsing_completions() {
        let cli = Cli::parse_from(["edgelink", "completions", "zsh"]);
        assert!(matches!(cli.command, Commands::Completions { shell: Shell::Zsh }));
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from(["edgelink", "build", "--verbose", "--format", "json"]);
        assert!(cli.verbose);
        assert_eq!(cli.format, "json");
    }

    #[test]
    fn test_cli_output_format_default() {
        let cli = Cli::parse_from(["edgelink", "inspect"]);
        assert_eq!(cli.format, "pretty");
    }

    #[test]
    fn test_cli_rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["edgelink", "deploy"]).is_err());
    }
}

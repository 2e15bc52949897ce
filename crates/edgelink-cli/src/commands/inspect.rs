//! Inspect command implementation.
//!
//! Runs the link pipeline without writing and reports what the bundle would
//! contain.

use super::common::{resolve_config, run_blocking};
use crate::cli::LinkArgs;
use crate::formatters::format_output;
use anyhow::{Context, Result};
use edgelink_core::cli::{ExitCode, OutputFormat};
use edgelink_files::FilePath;
use edgelink_linker::{LinkOutput, LinkPriority, Linker, Orderer, PatchOutcome, ReferenceFinding, digest};
use serde::Serialize;
use std::path::Path;

/// One module in link order.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleSummary {
    /// Registry key
    pub path: FilePath,
    /// Ordering bucket
    pub priority: LinkPriority,
    /// Published names
    pub exports: Vec<String>,
    /// Registry references
    pub references: usize,
}

/// One embedded file.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddedFile {
    /// VFS key
    pub path: FilePath,
    /// Content size in bytes
    pub bytes: usize,
}

/// Everything `inspect` reports.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    /// Modules in link order
    pub link_order: Vec<ModuleSummary>,
    /// Embedded files in key order
    pub vfs: Vec<EmbeddedFile>,
    /// Client bundles dropped from the server tree
    pub dropped: Vec<FilePath>,
    /// Unsatisfied references
    pub findings: Vec<ReferenceFinding>,
    /// Structural patch results
    pub patches: Vec<PatchOutcome>,
    /// Size of the bundle that would be written
    pub bundle_bytes: usize,
    /// BLAKE3 digest of that bundle
    pub digest: String,
}

impl InspectReport {
    /// Summarizes a link result.
    #[must_use]
    pub fn new(output: &LinkOutput, orderer: &Orderer) -> Self {
        Self {
            link_order: output
                .modules
                .iter()
                .map(|module| ModuleSummary {
                    path: module.path.clone(),
                    priority: orderer.priority(&module.path),
                    exports: module.exports.clone(),
                    references: module.references.len(),
                })
                .collect(),
            vfs: output
                .vfs
                .paths()
                .map(|path| EmbeddedFile {
                    path: path.clone(),
                    bytes: output.vfs.get(path.as_str()).map_or(0, str::len),
                })
                .collect(),
            dropped: output.dropped.clone(),
            findings: output.findings.clone(),
            patches: output.patches.clone(),
            bundle_bytes: output.bundle.len(),
            digest: digest(&output.bundle),
        }
    }
}

/// Runs the inspect command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or any fatal link step
/// fails.
pub async fn run(args: LinkArgs, output_format: OutputFormat) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let report = inspect(&args, &cwd).await?;

    let formatted = format_output(&report, output_format).context("failed to format inspect report")?;
    println!("{formatted}");
    Ok(ExitCode::SUCCESS)
}

/// Resolves the configuration against `cwd` and links without writing.
///
/// # Errors
///
/// See [`run`].
pub async fn inspect(args: &LinkArgs, cwd: &Path) -> Result<InspectReport> {
    let config = resolve_config(args, cwd)?;
    let orderer = Orderer::new(&config);

    let output = run_blocking(move || Linker::new(config)?.link())
        .await
        .context("failed to link build output")?;
    Ok(InspectReport::new(&output, &orderer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_inspect_reports_without_writing() {
        let dir = TempDir::new().unwrap();
        let server = dir.path().join("server");
        let public = dir.path().join("public");
        write(&server, "index.mjs", "import { a } from './chunks/_libs/a.mjs';\nexport default a;\n");
        write(&server, "chunks/_libs/a.mjs", "export const a = 1;\n");
        write(&public, "favicon.svg", "<svg/>");

        let args = LinkArgs {
            server_dir: Some(server),
            public_dir: Some(public),
            output: Some(dir.path().join("deploy.ts")),
            ..LinkArgs::default()
        };
        let report = inspect(&args, dir.path()).await.unwrap();

        assert_eq!(report.link_order.len(), 2);
        assert_eq!(report.link_order[0].priority, LinkPriority::Library);
        assert_eq!(report.link_order[1].priority, LinkPriority::Entry);
        assert_eq!(report.link_order[1].exports, vec!["default"]);
        assert_eq!(report.vfs.len(), 1);
        assert_eq!(report.vfs[0].path.as_str(), "public/favicon.svg");
        assert_eq!(report.vfs[0].bytes, 6);
        assert!(report.findings.is_empty());
        assert!(!dir.path().join("deploy.ts").exists());
    }

    #[test]
    fn test_report_serializes() {
        let report = InspectReport {
            link_order: Vec::new(),
            vfs: Vec::new(),
            dropped: Vec::new(),
            findings: Vec::new(),
            patches: Vec::new(),
            bundle_bytes: 0,
            digest: String::new(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("link_order").is_some());
        assert!(json.get("bundle_bytes").is_some());
    }
}

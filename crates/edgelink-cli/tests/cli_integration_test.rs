//! Integration tests for the build and inspect commands.

use clap::Parser;
use edgelink_cli::commands::{build, inspect};
use edgelink_cli::formatters::format_output;
use edgelink_cli::{Cli, Commands, LinkArgs};
use edgelink_core::cli::OutputFormat;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Project directory with an `edgelink.toml` pointing at a small build.
fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "edgelink.toml",
        &format!(
            "server_dir = {:?}\npublic_dir = {:?}\noutput = {:?}\n",
            dir.path().join("build/server"),
            dir.path().join("build/public"),
            dir.path().join("dist/edge.ts"),
        ),
    );
    write(
        dir.path(),
        "build/server/index.mjs",
        "import { routes } from './chunks/_routes/all.mjs';\nexport default routes;\n",
    );
    write(dir.path(), "build/server/chunks/_routes/all.mjs", "export const routes = [];\n");
    write(dir.path(), "build/public/index.html", "<html></html>");
    dir
}

#[tokio::test]
async fn test_build_uses_project_config() {
    let dir = project();
    let report = build::build(&LinkArgs::default(), dir.path()).await.unwrap();

    assert_eq!(report.output, dir.path().join("dist/edge.ts"));
    assert_eq!(report.modules_bundled, 2);
    assert_eq!(report.static_files, 1);

    let bundle = fs::read_to_string(dir.path().join("dist/edge.ts")).unwrap();
    assert!(bundle.contains(r#"const { routes } = __MODS__["chunks/_routes/all.mjs"] || {};"#));
    assert!(bundle.contains(r#""public/index.html":"<html></html>""#));
}

#[tokio::test]
async fn test_build_report_formats() {
    let dir = project();
    let report = build::build(&LinkArgs::default(), dir.path()).await.unwrap();

    let json = format_output(&report, OutputFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["modules_bundled"], 2);
    assert_eq!(value["digest"].as_str().unwrap().len(), 64);

    let text = format_output(&report, OutputFormat::Text).unwrap();
    assert!(!text.contains('\n'));
}

#[tokio::test]
async fn test_strict_flag_turns_findings_into_errors() {
    let dir = project();
    write(
        dir.path(),
        "build/server/chunks/_routes/extra.mjs",
        "import { gone } from './nowhere.mjs';\n",
    );

    let report = inspect::inspect(&LinkArgs::default(), dir.path()).await.unwrap();
    assert_eq!(report.findings.len(), 1);

    let strict = LinkArgs {
        strict: true,
        ..LinkArgs::default()
    };
    assert!(build::build(&strict, dir.path()).await.is_err());
    assert!(!dir.path().join("dist/edge.ts").exists());
}

#[tokio::test]
async fn test_parsed_args_reach_the_linker() {
    let dir = project();
    let output = dir.path().join("elsewhere.ts");
    let cli = Cli::parse_from(["edgelink", "build", "--output", output.to_str().unwrap()]);

    let Commands::Build(args) = cli.command else {
        panic!("Expected Build command");
    };
    let report = build::build(&args, dir.path()).await.unwrap();

    assert_eq!(report.output, output);
    assert!(output.is_file());
    assert!(!dir.path().join("dist/edge.ts").exists());
}

#[tokio::test]
async fn test_invalid_config_file_is_reported() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "edgelink.toml", "unknown_key = 1\n");

    let err = build::build(&LinkArgs::default(), dir.path()).await.unwrap_err();
    assert!(format!("{err:#}").contains("edgelink.toml"));
}

//! The end-to-end link pipeline.
//!
//! ```text
//! collect -> classify -> { order -> rewrite -> check references }
//!                     -> { embeddable -> VFS }
//!                     -> assemble (+ patches) -> write
//! ```
//!
//! Nothing is written unless every step succeeds.

use crate::assembler::BundleAssembler;
use crate::order::Orderer;
use crate::patch::PatchOutcome;
use crate::references::{ReferenceFinding, check_references};
use crate::rewriter::{ModuleRewriter, RewrittenModule};
use crate::writer::{BundleReport, digest, write_atomic};
use edgelink_core::{LinkerConfig, Result};
use edgelink_files::{Classifier, FilePath, FileRecord, VfsBuilder, VirtualFs, collect_inputs};

/// Everything a link run produced, before anything is written.
#[derive(Debug, Clone)]
pub struct LinkOutput {
    /// The bundle text
    pub bundle: String,
    /// Rewritten modules in link order
    pub modules: Vec<RewrittenModule>,
    /// The embedded filesystem
    pub vfs: VirtualFs,
    /// Client bundles dropped from the server tree
    pub dropped: Vec<FilePath>,
    /// References the link order cannot satisfy
    pub findings: Vec<ReferenceFinding>,
    /// Structural patch results
    pub patches: Vec<PatchOutcome>,
    /// Number of collected input files
    pub files_discovered: usize,
}

impl LinkOutput {
    /// Module paths in link order.
    pub fn link_order(&self) -> impl Iterator<Item = &FilePath> {
        self.modules.iter().map(|module| &module.path)
    }
}

/// Links a server build into one bundle.
///
/// # Examples
///
/// ```
/// use edgelink_core::LinkerConfig;
/// use edgelink_files::{FilePath, FileRecord, Origin};
/// use edgelink_linker::Linker;
///
/// let linker = Linker::new(LinkerConfig::default()).unwrap();
/// let output = linker
///     .link_records(vec![FileRecord::new(
///         FilePath::new("index.mjs").unwrap(),
///         "export default 1;",
///         Origin::Server,
///     )])
///     .unwrap();
///
/// assert_eq!(output.modules.len(), 1);
/// assert!(output.bundle.contains(r#"__MODS__["index.mjs"] = { default: __DEFAULT_EXPORT__ };"#));
/// ```
#[derive(Debug)]
pub struct Linker {
    config: LinkerConfig,
    classifier: Classifier,
    orderer: Orderer,
    rewriter: ModuleRewriter,
    assembler: BundleAssembler<'static>,
}

impl Linker {
    /// Creates a linker for `config`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the configuration is invalid, or a
    /// template error if the bundle templates fail to compile.
    pub fn new(config: LinkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: Classifier::new(config.client_asset_prefix.clone()),
            orderer: Orderer::new(&config),
            rewriter: ModuleRewriter::new(&config),
            assembler: BundleAssembler::new(&config)?,
            config,
        })
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &LinkerConfig {
        &self.config
    }

    /// Collects both input trees and links them.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error from collection, rewriting, reference
    /// checking (when strict) or assembly.
    pub fn link(&self) -> Result<LinkOutput> {
        let records = collect_inputs(&self.config.server_dir, &self.config.public_dir)?;
        self.link_records(records)
    }

    /// Links already collected records, server tree first.
    ///
    /// # Errors
    ///
    /// See [`link`](Self::link).
    pub fn link_records(&self, records: Vec<FileRecord>) -> Result<LinkOutput> {
        let files_discovered = records.len();
        let classified = self.classifier.partition(records);

        let vfs = VfsBuilder::from_records(classified.embeddable).build()?;
        let ordered = self.orderer.order(classified.executable);
        let modules = self.rewrite_all(&ordered)?;
        let findings = check_references(&modules, self.config.strict_references)?;

        tracing::info!(
            "Bundling {} modules + {} static files",
            modules.len(),
            vfs.file_count()
        );
        let assembled = self.assembler.assemble(&modules, &vfs)?;

        Ok(LinkOutput {
            bundle: assembled.text,
            modules,
            vfs,
            dropped: classified.dropped,
            findings,
            patches: assembled.patches,
            files_discovered,
        })
    }

    #[cfg(feature = "parallel")]
    fn rewrite_all(&self, ordered: &[FileRecord]) -> Result<Vec<RewrittenModule>> {
        use rayon::prelude::*;

        let rewriter = &self.rewriter;
        ordered.par_iter().map(|record| rewriter.rewrite(record)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn rewrite_all(&self, ordered: &[FileRecord]) -> Result<Vec<RewrittenModule>> {
        ordered
            .iter()
            .map(|record| self.rewriter.rewrite(record))
            .collect()
    }

    /// Writes a link result to the configured output path.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the bundle cannot be written.
    pub fn write(&self, output: &LinkOutput) -> Result<BundleReport> {
        let path = write_atomic(&self.config.output, &output.bundle)?;
        Ok(BundleReport {
            output: path,
            files_discovered: output.files_discovered,
            modules_bundled: output.modules.len(),
            static_files: output.vfs.file_count(),
            dropped_client_assets: output.dropped.len(),
            patches_applied: output.patches.iter().filter(|p| p.is_applied()).count(),
            bytes: output.bundle.len(),
            digest: digest(&output.bundle),
        })
    }

    /// Links and writes in one step.
    ///
    /// # Errors
    ///
    /// See [`link`](Self::link) and [`write`](Self::write).
    pub fn build(&self) -> Result<BundleReport> {
        let output = self.link()?;
        self.write(&output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgelink_files::Origin;

    fn server(path: &str, content: &str) -> FileRecord {
        FileRecord::new(FilePath::new(path).unwrap(), content, Origin::Server)
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = LinkerConfig {
            entry_module: String::new(),
            ..LinkerConfig::default()
        };
        assert!(Linker::new(config).unwrap_err().is_config_error());
    }

    #[test]
    fn test_modules_never_reach_the_vfs() {
        let linker = Linker::new(LinkerConfig::default()).unwrap();
        let output = linker
            .link_records(vec![
                server("index.mjs", "export {};"),
                server("nitro.json", "{}"),
                server("public/assets/client.js", "client();"),
            ])
            .unwrap();

        let keys: Vec<_> = output.vfs.paths().map(FilePath::as_str).collect();
        assert_eq!(keys, vec!["nitro.json"]);
        assert_eq!(output.dropped.len(), 1);
        assert!(!output.bundle.contains("client();"));
    }

    #[test]
    fn test_rewrite_error_aborts() {
        let linker = Linker::new(LinkerConfig::default()).unwrap();
        let err = linker
            .link_records(vec![server("index.mjs", "export = 1;")])
            .unwrap_err();
        assert!(err.is_unsupported_syntax());
    }

    #[test]
    fn test_strict_references() {
        let config = LinkerConfig {
            strict_references: true,
            ..LinkerConfig::default()
        };
        let linker = Linker::new(config).unwrap();
        let err = linker
            .link_records(vec![server("index.mjs", "import x from './missing.mjs';")])
            .unwrap_err();
        assert!(err.is_unresolved_reference());
    }
}

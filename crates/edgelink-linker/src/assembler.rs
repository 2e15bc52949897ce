//! Final bundle assembly.
//!
//! The bundle is one script. Everything runs inside a single
//! `initializeApp()` function which, in order, creates the module registry,
//! embeds the VFS literal, defines the filesystem, URL and path polyfills
//! plus a permissive `process` substitute, installs a `serve()` shim, runs
//! every wrapped module in link order and returns the effective request
//! handler. A bootstrap after the function either registers a lazy,
//! single-flight handler with the edge platform or runs the initializer
//! eagerly on a local runtime.

use crate::patch::{EDGE_PLATFORM_FLAG, PatchApplier, PatchOutcome};
use crate::rewriter::{REGISTRY, RewrittenModule};
use crate::template_engine::{BUNDLE_TEMPLATE, TemplateEngine};
use edgelink_core::{LinkerConfig, Result};
use edgelink_files::VirtualFs;
use edgelink_files::vfs::MIN_CONTAINED_KEY_LEN;
use serde::Serialize;

const GENERATOR: &str = concat!("edgelink ", env!("CARGO_PKG_VERSION"));

/// Assembled bundle text with the patch results that shaped it.
#[derive(Debug, Clone)]
pub struct AssembledBundle {
    /// Complete script
    pub text: String,
    /// One outcome per structural patch, in order
    pub patches: Vec<PatchOutcome>,
}

#[derive(Debug, Serialize)]
struct BundleContext<'a> {
    generator: &'static str,
    module_count: usize,
    static_count: usize,
    registry: &'static str,
    vfs: String,
    min_contained_len: usize,
    edge_flag: &'static str,
    edge_global: &'a str,
    main_url: String,
    modules: String,
}

/// Emits the bundle from rewritten modules and the VFS.
#[derive(Debug)]
pub struct BundleAssembler<'a> {
    engine: TemplateEngine<'a>,
    patches: PatchApplier,
    edge_global: String,
    main_url: String,
}

impl BundleAssembler<'_> {
    /// Creates an assembler with the default structural patches.
    ///
    /// # Errors
    ///
    /// Returns an error if the templates or patch anchors fail to compile.
    pub fn new(config: &LinkerConfig) -> Result<Self> {
        Ok(Self {
            engine: TemplateEngine::new()?,
            patches: PatchApplier::with_defaults()?,
            edge_global: config.edge_global.clone(),
            main_url: config.main_url.clone(),
        })
    }

    /// Replaces the structural patch list.
    #[must_use]
    pub fn with_patches(mut self, patches: PatchApplier) -> Self {
        self.patches = patches;
        self
    }

    /// Concatenates `modules` (already in link order), patches the result
    /// and renders the bundle around it.
    ///
    /// # Errors
    ///
    /// Returns `Error::SerializationError` if the VFS cannot be serialized
    /// and `Error::TemplateError` if rendering fails.
    pub fn assemble(&self, modules: &[RewrittenModule], vfs: &VirtualFs) -> Result<AssembledBundle> {
        let joined = modules
            .iter()
            .map(|module| module.code.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let (patched, outcomes) = self.patches.apply(&joined);

        let context = BundleContext {
            generator: GENERATOR,
            module_count: modules.len(),
            static_count: vfs.file_count(),
            registry: REGISTRY,
            vfs: vfs.to_json_literal()?,
            min_contained_len: MIN_CONTAINED_KEY_LEN,
            edge_flag: EDGE_PLATFORM_FLAG,
            edge_global: &self.edge_global,
            main_url: serde_json::to_string(&self.main_url)?,
            modules: patched,
        };

        let text = self.engine.render(BUNDLE_TEMPLATE, &context)?;
        tracing::debug!(
            "Assembled bundle: {} modules, {} embedded files, {} bytes",
            modules.len(),
            vfs.file_count(),
            text.len()
        );

        Ok(AssembledBundle {
            text,
            patches: outcomes,
        })
    }
}

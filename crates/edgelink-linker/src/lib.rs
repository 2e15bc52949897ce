//! Module linking and bundle emission for edgelink.
//!
//! Takes the classified output of `edgelink-files` and produces one
//! self-contained edge-deploy script:
//!
//! 1. [`Orderer`] puts modules in link order (libraries, routes, the rest,
//!    entry last)
//! 2. [`ModuleRewriter`] turns each module's `import`/`export` statements
//!    into registry operations and wraps it in an initializer
//! 3. [`check_references`] reports references the link order cannot satisfy
//! 4. [`BundleAssembler`] applies the [`PatchApplier`] shims and renders the
//!    bundle with its runtime support layer
//! 5. [`write_atomic`] persists the result
//!
//! [`Linker`] runs all of it.
//!
//! # Examples
//!
//! ```
//! use edgelink_core::LinkerConfig;
//! use edgelink_files::{FilePath, FileRecord, Origin};
//! use edgelink_linker::Linker;
//!
//! let records = vec![
//!     FileRecord::new(
//!         FilePath::new("index.mjs").unwrap(),
//!         "import { greet } from './chunks/_libs/util.mjs';\nexport default greet;\n",
//!         Origin::Server,
//!     ),
//!     FileRecord::new(
//!         FilePath::new("chunks/_libs/util.mjs").unwrap(),
//!         "export const greet = () => 'hi';\n",
//!         Origin::Server,
//!     ),
//! ];
//!
//! let output = Linker::new(LinkerConfig::default())
//!     .unwrap()
//!     .link_records(records)
//!     .unwrap();
//!
//! let order: Vec<_> = output.link_order().map(|p| p.as_str()).collect();
//! assert_eq!(order, vec!["chunks/_libs/util.mjs", "index.mjs"]);
//! assert!(output.findings.is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod assembler;
pub mod lexer;
pub mod order;
pub mod patch;
pub mod pipeline;
pub mod references;
pub mod rewriter;
pub mod specifier;
pub mod template_engine;
pub mod writer;

pub use assembler::{AssembledBundle, BundleAssembler};
pub use order::{LinkPriority, Orderer};
pub use patch::{EDGE_PLATFORM_FLAG, PatchApplier, PatchOutcome, PatchStatus, StructuralPatch};
pub use pipeline::{LinkOutput, Linker};
pub use references::{ModuleReference, ReferenceFinding, ReferenceKind, ReferenceProblem, check_references};
pub use rewriter::{DEFAULT_SENTINEL, ModuleRewriter, REGISTRY, RewrittenModule};
pub use specifier::Specifier;
pub use template_engine::TemplateEngine;
pub use writer::{BundleReport, digest, write_atomic};
